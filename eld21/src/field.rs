//!
//! # Exposure Fields
//!
//! Buckets fractured geometry into the device's square exposure fields,
//! and orders the populated fields for writing.
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io
use log::debug;
use serde::{Deserialize, Serialize};

// Local imports
use crate::bbox::{BoundBox, BoundBoxTrait};
use crate::data::{Canvas, Cell, CellId};
use crate::error::{LayoutError, LayoutResult};
use crate::geom::{Point, Polygon};
use crate::Int;

/// Field identifier: `row * n_cols + col`
pub type FieldId = usize;

///
/// # Exposure Field
///
/// Cells assigned to one square of the field grid.
/// Cell coordinates are relative to the field's `displacement`, its lower-left corner.
///
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub id: FieldId,
    pub row: usize,
    pub col: usize,
    pub displacement: Point,
    pub cells: Vec<Cell>,
    /// Position in `cells` per source cell id
    #[serde(skip)]
    index: HashMap<CellId, usize>,
}
impl Field {
    /// Create a new, empty [Field]
    pub fn new(id: FieldId, row: usize, col: usize, displacement: Point) -> Self {
        Self {
            id,
            row,
            col,
            displacement,
            ..Default::default()
        }
    }
    /// Add `poly`, already relative to our origin, to our counterpart of `source`
    pub fn add_polygon(&mut self, source: &Cell, shot_rank: u8, poly: Polygon) {
        let idx = match self.index.get(&source.id) {
            Some(idx) => *idx,
            None => {
                let mut cell = Cell::new(source.id);
                cell.array = source.array;
                cell.source = source.source.clone();
                self.cells.push(cell);
                self.index.insert(source.id, self.cells.len() - 1);
                self.cells.len() - 1
            }
        };
        self.cells[idx].add_polygon(shot_rank, poly);
    }
    /// Retrieve our counterpart of cell `id`
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.index.get(&id).map(|idx| &self.cells[*idx])
    }
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }
    /// Bounding box of all cells and array elements, relative to our origin
    pub fn bbox(&self) -> BoundBox {
        self.cells
            .iter()
            .fold(BoundBox::empty(), |b, c| c.placed_extent().union(&b))
    }
}

/// # Field Grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldGrid {
    pub field_size: Point,
    pub n_rows: usize,
    pub n_cols: usize,
}
impl FieldGrid {
    /// Create the grid covering `chip_size`, with one extra row and column for content on its far edges
    pub fn new(chip_size: Point, field_size: Point) -> LayoutResult<Self> {
        if field_size.x <= 0 || field_size.y <= 0 {
            return Err(LayoutError::input(format!(
                "Field size must be positive, got {:?}",
                field_size
            )));
        }
        Ok(Self {
            field_size,
            n_rows: (chip_size.y.max(0) / field_size.y) as usize + 1,
            n_cols: (chip_size.x.max(0) / field_size.x) as usize + 1,
        })
    }
    /// (row, col) of the field holding `pt`, if within the grid
    pub fn locate(&self, pt: &Point) -> Option<(usize, usize)> {
        let row = pt.y.div_euclid(self.field_size.y);
        let col = pt.x.div_euclid(self.field_size.x);
        if row < 0 || col < 0 || row as usize >= self.n_rows || col as usize >= self.n_cols {
            return None;
        }
        Some((row as usize, col as usize))
    }
    /// Field id of (`row`, `col`)
    pub fn id(&self, row: usize, col: usize) -> FieldId {
        row * self.n_cols + col
    }
    /// Lower-left corner of field (`row`, `col`)
    pub fn origin(&self, row: usize, col: usize) -> Point {
        Point::new(
            col as Int * self.field_size.x,
            row as Int * self.field_size.y,
        )
    }
}

///
/// Assign every polygon in `canvas` to the field holding its bounding-box midpoint.
/// Fields are allocated on first use. Returns them in id order.
///
pub fn assign(canvas: &Canvas, grid: &FieldGrid) -> LayoutResult<Vec<Field>> {
    let mut fields: HashMap<FieldId, Field> = HashMap::new();
    for cell in canvas.cells() {
        for pattern in cell.patterns.iter() {
            for poly in pattern.polygons.iter() {
                let centroid = poly.centroid().shift(&cell.displacement);
                let (row, col) = grid.locate(&centroid).ok_or_else(|| {
                    cell.contextualize(LayoutError::device(
                        format!("Polygon centered at {:?} lies outside the field grid", centroid),
                        Some(poly.bbox().shift(&cell.displacement)),
                    ))
                })?;
                let id = grid.id(row, col);
                let field = fields
                    .entry(id)
                    .or_insert_with(|| Field::new(id, row, col, grid.origin(row, col)));
                let mut local = poly.clone();
                local.shift(&cell.displacement.unshift(&field.displacement));
                field.add_polygon(cell, pattern.shot_rank, local);
            }
        }
    }
    let mut rv: Vec<Field> = fields.into_values().collect();
    rv.sort_by_key(|f| f.id);
    debug!("Assigned geometry to {} fields", rv.len());
    Ok(rv)
}

///
/// Order `fields` in a serpentine scan: rows in decreasing order,
/// odd rows left-to-right and even rows right-to-left.
/// Empty fields are dropped.
///
/// A heuristic stand-in for true travel-time optimization.
///
pub fn sort_serpentine(fields: Vec<Field>, grid: &FieldGrid) -> Vec<Field> {
    let mut slots: Vec<Option<Field>> = (0..grid.n_rows * grid.n_cols).map(|_| None).collect();
    for f in fields.into_iter() {
        if f.is_empty() {
            continue;
        }
        if let Some(slot) = slots.get_mut(grid.id(f.row, f.col)) {
            *slot = Some(f);
        }
    }
    let mut rv = Vec::with_capacity(slots.len());
    for row in (0..grid.n_rows).rev() {
        let cols: Box<dyn Iterator<Item = usize>> = if row % 2 == 1 {
            Box::new(0..grid.n_cols)
        } else {
            Box::new((0..grid.n_cols).rev())
        };
        for col in cols {
            if let Some(f) = slots[grid.id(row, col)].take() {
                rv.push(f);
            }
        }
    }
    rv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: Int, y: Int, size: Int) -> LayoutResult<Polygon> {
        Polygon::from_pairs(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
    }

    #[test]
    fn grid() -> LayoutResult<()> {
        let g = FieldGrid::new(Point::new(250, 100), Point::new(100, 100))?;
        assert_eq!((g.n_rows, g.n_cols), (2, 3));
        assert_eq!(g.locate(&Point::new(150, 50)), Some((0, 1)));
        assert_eq!(g.locate(&Point::new(-1, 50)), None);
        assert_eq!(g.id(1, 2), 5);
        assert_eq!(g.origin(1, 2), Point::new(200, 100));
        assert!(FieldGrid::new(Point::new(1, 1), Point::new(0, 10)).is_err());
        Ok(())
    }
    #[test]
    fn assign_relative() -> LayoutResult<()> {
        let mut canvas = Canvas::new();
        let id = canvas.create_cell();
        canvas.set_cell_displacement(id, Point::new(100, 0))?;
        let cell = canvas.cell_mut(id).ok_or("missing cell")?;
        cell.add_polygon(3, square(10, 10, 20)?);
        cell.add_polygon(3, square(120, 110, 20)?);
        let grid = FieldGrid::new(Point::new(300, 200), Point::new(100, 100))?;
        let fields = assign(&canvas, &grid)?;
        assert_eq!(fields.len(), 2);
        assert_eq!((fields[0].row, fields[0].col), (0, 1));
        assert_eq!(fields[0].displacement, Point::new(100, 0));
        let c = fields[0].cell(id).ok_or("missing cell")?;
        assert_eq!(c.patterns[0].shot_rank, 3);
        assert_eq!(c.patterns[0].polygons[0], square(10, 10, 20)?);
        assert_eq!((fields[1].row, fields[1].col), (1, 2));
        let c = fields[1].cell(id).ok_or("missing cell")?;
        assert_eq!(c.patterns[0].polygons[0], square(20, 10, 20)?);
        Ok(())
    }
    #[test]
    fn serpentine() -> LayoutResult<()> {
        let grid = FieldGrid::new(Point::new(250, 250), Point::new(100, 100))?;
        let mut fields = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                if (row, col) == (1, 1) {
                    continue;
                }
                let mut f = Field::new(grid.id(row, col), row, col, grid.origin(row, col));
                f.add_polygon(&Cell::new(0), 0, square(0, 0, 10)?);
                fields.push(f);
            }
        }
        let order: Vec<(usize, usize)> = sort_serpentine(fields, &grid)
            .iter()
            .map(|f| (f.row, f.col))
            .collect();
        assert_eq!(
            order,
            vec![(2, 2), (2, 1), (2, 0), (1, 0), (1, 2), (0, 2), (0, 1), (0, 0)]
        );
        Ok(())
    }
}
