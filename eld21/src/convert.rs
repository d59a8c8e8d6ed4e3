//!
//! # Library to Canvas Conversion
//!
//! Flattens a [Library] below a root structure into the [Cell]s of a [Canvas].
//!
//! Every concrete placement of a structure holding boundaries becomes one cell,
//! with the placement's translation as its displacement and its reflection, magnification
//! and rotation applied to the polygons. The innermost array reference along each path
//! is kept as the cell's array; any outer arrays are expanded into per-element placements.
//!

// Std-Lib
use std::collections::HashSet;

// Crates.io
use log::{debug, info, warn};

// Local imports
use crate::chip::Chip;
use crate::config::ConverterConfig;
use crate::data::{to_int, Canvas, Cell};
use crate::error::{ErrorContext, LayoutError, LayoutResult};
use crate::geom::{Point, Transform};
use crate::hier::{AccessCode, Flattener, HierarchyBranch};
use crate::library::{ArrayRef, Library, Structure};
use crate::utils::{ErrorHelper, Unwrapper};
use crate::Int;

/// Array lattice in root coordinates
#[derive(Debug, Clone, Copy)]
struct Lattice {
    col: Point,
    row: Point,
    cols: u32,
    rows: u32,
}

/// One concrete placement of a structure
#[derive(Debug, Clone, Copy)]
struct Placement {
    /// Transform from the structure's coordinates into the root's
    trans: Transform,
    /// Repetition of the whole placement, if inside an array
    lattice: Option<Lattice>,
}
impl Placement {
    fn root() -> Self {
        Self {
            trans: Transform::identity(),
            lattice: None,
        }
    }
    /// Expand our lattice, if any, into per-element placements
    fn expand(self) -> Vec<Placement> {
        let lattice = match self.lattice {
            None => return vec![self],
            Some(l) => l,
        };
        let mut rv = Vec::with_capacity((lattice.cols * lattice.rows) as usize);
        for r in 0..lattice.rows as Int {
            for c in 0..lattice.cols as Int {
                let dx = c as f64 * lattice.col.x as f64 + r as f64 * lattice.row.x as f64;
                let dy = c as f64 * lattice.col.y as f64 + r as f64 * lattice.row.y as f64;
                rv.push(Placement {
                    trans: Transform::cascade(&Transform::translate(dx, dy), &self.trans),
                    lattice: None,
                });
            }
        }
        rv
    }
}

///
/// # Library Converter
///
/// Walks each flattened hierarchy branch, placing its structures into a [Canvas].
///
pub struct Converter<'lib> {
    lib: &'lib Library,
    canvas: Canvas,
    /// Access-path prefixes already placed
    placed: HashSet<Vec<AccessCode>>,
    ctx: Vec<ErrorContext>,
}
impl<'lib> Converter<'lib> {
    pub fn new(lib: &'lib Library) -> Self {
        Self {
            lib,
            canvas: Canvas::new(),
            placed: HashSet::new(),
            ctx: vec![ErrorContext::Library(lib.name.clone())],
        }
    }
    /// Convert everything below the structure named `root`
    pub fn convert(mut self, root: &str) -> LayoutResult<Canvas> {
        let branches = Flattener::new(self.lib)?.flatten(root)?;
        for branch in branches.iter() {
            for path in branch.access.iter() {
                self.convert_path(branch, path)?;
            }
        }
        self.canvas.update_boundary();
        info!(
            "Converted {} into {} cells spanning {:?}",
            root,
            self.canvas.len(),
            self.canvas.boundary
        );
        Ok(self.canvas)
    }
    /// Place every structure along the path `codes` through `branch`
    fn convert_path(&mut self, branch: &HierarchyBranch, codes: &[AccessCode]) -> LayoutResult<()> {
        let mut placements = vec![Placement::root()];
        for (level, code) in codes.iter().enumerate() {
            let lib = self.lib;
            let strukt = &lib.structs[branch.structures[level]];
            if level > 0 {
                let parent = &lib.structs[branch.structures[level - 1]];
                self.ctx.push(ErrorContext::Structure(parent.name.clone()));
                placements = self.descend(parent, code, placements)?;
                self.ctx.pop();
            }
            let prefix = codes[..=level].to_vec();
            if strukt.boundaries.is_empty() || self.placed.contains(&prefix) {
                continue;
            }
            self.ctx.push(ErrorContext::Structure(strukt.name.clone()));
            for placement in placements.iter() {
                self.place(strukt, placement)?;
            }
            self.ctx.pop();
            self.placed.insert(prefix);
        }
        Ok(())
    }
    /// Descend from `parent` through the reference selected by `code`
    fn descend(
        &mut self,
        parent: &Structure,
        code: &AccessCode,
        placements: Vec<Placement>,
    ) -> LayoutResult<Vec<Placement>> {
        match code {
            AccessCode::Root(_) => self.fail("Root access code below the root"),
            AccessCode::Single(i) => {
                let sref = parent
                    .srefs
                    .get(*i)
                    .unwrapper(self, format!("Invalid reference index {}", i))?;
                let child = sref.transform();
                Ok(placements
                    .into_iter()
                    .map(|p| Placement {
                        trans: Transform::cascade(&p.trans, &child),
                        lattice: p.lattice,
                    })
                    .collect())
            }
            AccessCode::Array(i) => {
                let aref = parent
                    .arefs
                    .get(*i)
                    .unwrapper(self, format!("Invalid array index {}", i))?;
                self.ctx.push(ErrorContext::ArrayRef(aref.name.clone()));
                let rv = self.descend_array(aref, placements);
                self.ctx.pop();
                rv
            }
        }
    }
    /// Descend through array reference `aref`, expanding any enclosing array
    fn descend_array(&self, aref: &ArrayRef, placements: Vec<Placement>) -> LayoutResult<Vec<Placement>> {
        let (col, row) = aref.pitches()?;
        let child = aref.transform();
        let before = placements.len();
        let mut rv = Vec::with_capacity(before);
        for p in placements.into_iter().flat_map(|p| p.expand()) {
            rv.push(Placement {
                trans: Transform::cascade(&p.trans, &child),
                lattice: Some(Lattice {
                    col: p.trans.apply_vec(&col),
                    row: p.trans.apply_vec(&row),
                    cols: aref.cols as u32,
                    rows: aref.rows as u32,
                }),
            });
        }
        if rv.len() > before {
            debug!("Expanded enclosing array of {} into {} placements", aref.name, rv.len());
        }
        Ok(rv)
    }
    /// Add one cell holding `strukt`'s boundaries, at `placement`
    fn place(&mut self, strukt: &Structure, placement: &Placement) -> LayoutResult<()> {
        let linear = placement.trans.linear();
        let mut cell = Cell::new(self.canvas.len());
        cell.displacement = placement.trans.offset();
        cell.source = Some(strukt.name.clone());
        for boundary in strukt.boundaries.iter() {
            let rank = u8::try_from(boundary.datatype).unwrapper(
                self,
                format!("Datatype {} outside the shot-rank range [0, 255]", boundary.datatype),
            )?;
            let mut poly = boundary.polygon().map_err(|e| self.contextualize(e))?;
            poly = poly.transform(&linear);
            poly.clean();
            if poly.len() < 3 {
                warn!("Dropping boundary of {} degenerate after transformation", strukt.name);
                continue;
            }
            poly.make_ccw();
            cell.add_polygon(rank, poly);
        }
        if let Some(lattice) = placement.lattice {
            self.set_lattice(&mut cell, &lattice)?;
        }
        if !cell.is_empty() {
            self.canvas.add_cell(cell)?;
        }
        Ok(())
    }
    /// Convert `lattice` into axis-aligned array parameters for `cell`.
    /// Negative pitches are flipped, moving the displacement to the lowest element.
    fn set_lattice(&self, cell: &mut Cell, lattice: &Lattice) -> LayoutResult<()> {
        let mut x: Option<(Int, u32)> = None;
        let mut y: Option<(Int, u32)> = None;
        for (v, n) in [(lattice.col, lattice.cols), (lattice.row, lattice.rows)] {
            if n <= 1 {
                continue;
            }
            let slot = match (v.x != 0, v.y != 0) {
                (true, true) => return self.fail(format!("Array vector {:?} is not axis-aligned", v)),
                (_, true) => &mut y,
                (true, false) => &mut x,
                (false, false) if x.is_none() => &mut x,
                (false, false) => &mut y,
            };
            if slot.is_some() {
                return self.fail("Array vectors are parallel");
            }
            *slot = Some((v.x + v.y, n));
        }
        let (px, nx) = x.unwrap_or((0, 1));
        let (py, ny) = y.unwrap_or((0, 1));
        if px < 0 {
            cell.displacement.x = to_int(cell.displacement.x as i64 + px as i64 * (nx as i64 - 1))?;
        }
        if py < 0 {
            cell.displacement.y = to_int(cell.displacement.y as i64 + py as i64 * (ny as i64 - 1))?;
        }
        cell.set_array(Point::new(px.abs(), py.abs()), nx, ny)
            .map_err(|e| self.contextualize(e))
    }
    /// Push our context onto error `e`
    fn contextualize(&self, e: LayoutError) -> LayoutError {
        self.ctx.iter().cloned().fold(e, |e, c| e.context(c))
    }
}
impl ErrorHelper for Converter<'_> {
    type Error = LayoutError;
    fn err(&self, msg: impl Into<String>) -> LayoutError {
        LayoutError::Input {
            message: msg.into(),
            stack: self.ctx.clone(),
        }
    }
}

/// Convert everything below structure `root` of `lib` into a [Canvas]
pub fn convert(lib: &Library, root: &str) -> LayoutResult<Canvas> {
    Converter::new(lib).convert(root)
}

/// Convert structure `root` of `lib` into a [Chip], scaled for the writer mode of `config`
pub fn chip(lib: &Library, root: &str, config: &ConverterConfig) -> LayoutResult<Chip> {
    if !(lib.units > 0.0) || !lib.units.is_finite() {
        return Err(LayoutError::input(format!("Invalid database unit {}", lib.units))
            .context(ErrorContext::Units)
            .context(ErrorContext::Library(lib.name.clone())));
    }
    let canvas = convert(lib, root)?;
    Ok(Chip::new(canvas, config.mode.scale(lib.units)))
}
