//!
//! # Chip
//!
//! Top-level exposure data: a [Canvas] of cells prior to partitioning,
//! and the ordered [Field]s produced by [Chip::fracture].
//!

// Crates.io
use log::info;

// Local imports
use crate::config::ConverterConfig;
use crate::data::Canvas;
use crate::error::{LayoutError, LayoutResult};
use crate::field::{assign, sort_serpentine, Field, FieldGrid};
use crate::geom::Point;

/// # Chip
#[derive(Debug, Clone, Default)]
pub struct Chip {
    /// Flat cells, prior to field partitioning
    pub canvas: Canvas,
    /// Populated exposure fields, in write order
    pub fields: Vec<Field>,
    /// Overall size, in device points, as of the last [Chip::fracture]
    pub chip_size: Point,
    /// Exposure field size, in device points
    pub field_size: Point,
    /// Database-unit to device-point scale factor
    pub scale: f64,
    /// Field grid rows and columns
    pub n_rows: usize,
    pub n_cols: usize,
}
impl Chip {
    /// Create a new [Chip] from `canvas`, in database units, scaled by `scale` into device points
    pub fn new(canvas: Canvas, scale: f64) -> Self {
        Self {
            canvas,
            scale,
            ..Default::default()
        }
    }
    ///
    /// Run the conversion pipeline:
    /// scale, flip to image coordinates, split arrays, slice along field boundaries,
    /// fracture into primitives, then assign and order exposure fields.
    ///
    /// Each stage completes for all cells before the next begins.
    ///
    pub fn fracture(&mut self, config: &ConverterConfig) -> LayoutResult<()> {
        config.validate()?;
        if !(self.scale > 0.0) || !self.scale.is_finite() {
            return Err(LayoutError::input(format!(
                "Chip scale must be positive, got {}",
                self.scale
            )));
        }
        let fs = config.field_size();
        self.field_size = Point::new(fs, fs);

        info!("Scaling {} cells by {}", self.canvas.len(), self.scale);
        self.canvas.scale(self.scale)?;
        self.canvas.cart2img();

        info!("Array fracturing");
        self.canvas
            .array_fracture(self.field_size, config.max_array_length)?;
        info!("Field fracturing into {}x{} fields", fs, fs);
        self.canvas.field_fracture(self.field_size)?;
        info!("Primitive fracturing");
        self.canvas.fracture(&config.fracture)?;

        let bbox = self.canvas.update_boundary();
        self.chip_size = if bbox.is_empty() { Point::default() } else { bbox.p1 };
        let grid = FieldGrid::new(self.chip_size, self.field_size)?;
        self.n_rows = grid.n_rows;
        self.n_cols = grid.n_cols;

        let fields = assign(&self.canvas, &grid)?;
        self.fields = sort_serpentine(fields, &grid);
        info!(
            "Chip of size {:?} written in {} fields",
            self.chip_size,
            self.fields.len()
        );
        Ok(())
    }
    /// The field grid of the last [Chip::fracture]
    pub fn grid(&self) -> FieldGrid {
        FieldGrid {
            field_size: self.field_size,
            n_rows: self.n_rows,
            n_cols: self.n_cols,
        }
    }
}
