//!
//! # Exposure Layout Data
//!
//! [Pattern]s of polygons sharing a shot rank, grouped into [Cell]s with an optional
//! array repetition and a displacement, all owned by a flat [Canvas].
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io
use log::debug;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

// Local imports
use crate::array;
use crate::bbox::{BoundBox, BoundBoxTrait};
use crate::config::FractureLimits;
use crate::error::{ErrorContext, LayoutError, LayoutResult};
use crate::fracture::fracture;
use crate::geom::{Dir, Point, Polygon};
use crate::slice::slice_grid;
use crate::Int;

new_key_type! {
    /// Keys for [Cell] entries in a [Canvas]
    pub struct CellKey;
}

/// Cell identifier, unique within a [Canvas]
pub type CellId = usize;

/// Convert a wide intermediate coordinate back to [Int], failing beyond its range
pub(crate) fn to_int(v: i64) -> LayoutResult<Int> {
    Int::try_from(v).map_err(|_| LayoutError::device(format!("Coordinate {} overflows", v), None))
}

///
/// # Pattern
///
/// Polygons sharing a single shot rank, i.e. exposure dose class.
///
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Pattern {
    pub shot_rank: u8,
    pub polygons: Vec<Polygon>,
    /// Bounding box of `polygons`, as of the last [Pattern::update_boundary]
    pub boundary: BoundBox,
}
impl Pattern {
    /// Create a new, empty [Pattern]
    pub fn new(shot_rank: u8) -> Self {
        Self {
            shot_rank,
            polygons: Vec::new(),
            boundary: BoundBox::empty(),
        }
    }
    /// Add a polygon, expanding our boundary to include it
    pub fn add_polygon(&mut self, poly: Polygon) {
        self.boundary = poly.union(&self.boundary);
        self.polygons.push(poly);
    }
    /// Recompute our boundary from scratch
    pub fn update_boundary(&mut self) -> BoundBox {
        self.boundary = self
            .polygons
            .iter()
            .fold(BoundBox::empty(), |b, p| p.union(&b));
        self.boundary
    }
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
    /// Shift all polygons by `pt`
    pub fn shift(&mut self, pt: &Point) {
        for p in self.polygons.iter_mut() {
            p.shift(pt);
        }
        self.boundary = self.boundary.shift(pt);
    }
    /// Total polygon area
    pub fn area(&self) -> f64 {
        self.polygons.iter().map(|p| p.area()).sum()
    }
    /// Slice all polygons along the grid of pitch `size`
    pub fn field_fracture(&mut self, size: Point) -> LayoutResult<()> {
        let mut polys = Vec::with_capacity(self.polygons.len());
        for p in self.polygons.iter() {
            polys.extend(slice_grid(p, size)?);
        }
        self.polygons = polys;
        self.update_boundary();
        Ok(())
    }
    /// Fracture all polygons into device primitives
    pub fn fracture(&mut self, limits: &FractureLimits) -> LayoutResult<()> {
        let mut polys = Vec::with_capacity(self.polygons.len());
        for p in self.polygons.iter() {
            polys.extend(fracture(p, limits)?.iter().map(|prim| prim.to_polygon()));
        }
        self.polygons = polys;
        self.update_boundary();
        Ok(())
    }
}

/// # Array Repetition Parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArrayParams {
    /// Element-to-element pitch along x and y, non-negative
    pub pitch: Point,
    /// Repeat counts along x and y, at least one
    pub nx: u32,
    pub ny: u32,
}
impl Default for ArrayParams {
    fn default() -> Self {
        Self {
            pitch: Point::new(0, 0),
            nx: 1,
            ny: 1,
        }
    }
}
impl ArrayParams {
    /// Create and validate new [ArrayParams]
    pub fn new(pitch: Point, nx: u32, ny: u32) -> LayoutResult<Self> {
        if nx < 1 || ny < 1 {
            return Err(LayoutError::input(format!(
                "Array repeat counts must be positive, got ({}, {})",
                nx, ny
            )));
        }
        if pitch.x < 0 || pitch.y < 0 {
            return Err(LayoutError::input(format!(
                "Array pitch must be non-negative, got {:?}",
                pitch
            )));
        }
        Ok(Self { pitch, nx, ny })
    }
    /// Boolean indication of more than one element
    pub fn is_array(&self) -> bool {
        self.nx > 1 || self.ny > 1
    }
    /// Total element count
    pub fn count(&self) -> u64 {
        self.nx as u64 * self.ny as u64
    }
    /// Repeat count along `dir`
    pub fn n(&self, dir: Dir) -> u32 {
        match dir {
            Dir::Horiz => self.nx,
            Dir::Vert => self.ny,
        }
    }
    /// Mutable repeat count along `dir`
    pub fn n_mut(&mut self, dir: Dir) -> &mut u32 {
        match dir {
            Dir::Horiz => &mut self.nx,
            Dir::Vert => &mut self.ny,
        }
    }
    /// Extent beyond the first element: pitch times (n - 1), per axis
    pub fn span(&self) -> (i64, i64) {
        (
            self.pitch.x as i64 * (self.nx as i64 - 1),
            self.pitch.y as i64 * (self.ny as i64 - 1),
        )
    }
}

///
/// # Cell
///
/// Patterns placed at `displacement`, optionally repeated as an array.
/// Pattern coordinates are relative to the displacement, and describe the first array element.
///
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub patterns: Vec<Pattern>,
    pub array: ArrayParams,
    pub displacement: Point,
    /// Bounding box of the first element, as of the last [Cell::update_boundary]
    pub boundary: BoundBox,
    /// Name of the library structure placed by this cell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
impl Cell {
    /// Create a new, empty [Cell]
    pub fn new(id: CellId) -> Self {
        Self {
            id,
            boundary: BoundBox::empty(),
            ..Default::default()
        }
    }
    /// Add `pattern`, merging it into any existing pattern of the same shot rank
    pub fn add_pattern(&mut self, pattern: Pattern) {
        self.boundary = pattern.boundary.union(&self.boundary);
        match self
            .patterns
            .iter_mut()
            .find(|p| p.shot_rank == pattern.shot_rank)
        {
            Some(p) => {
                for poly in pattern.polygons {
                    p.add_polygon(poly);
                }
            }
            None => self.patterns.push(pattern),
        }
    }
    /// Add polygon `poly` with shot rank `shot_rank`
    pub fn add_polygon(&mut self, shot_rank: u8, poly: Polygon) {
        self.boundary = poly.union(&self.boundary);
        match self.patterns.iter_mut().find(|p| p.shot_rank == shot_rank) {
            Some(p) => p.add_polygon(poly),
            None => {
                let mut p = Pattern::new(shot_rank);
                p.add_polygon(poly);
                self.patterns.push(p);
            }
        }
    }
    /// Set our array parameters
    pub fn set_array(&mut self, pitch: Point, nx: u32, ny: u32) -> LayoutResult<()> {
        self.array = ArrayParams::new(pitch, nx, ny)?;
        Ok(())
    }
    /// Boolean indication of having no polygons
    pub fn is_empty(&self) -> bool {
        self.patterns.iter().all(|p| p.is_empty())
    }
    /// Push our id, and our source structure if known, onto error `e`
    pub fn contextualize(&self, e: LayoutError) -> LayoutError {
        let e = e.context(ErrorContext::Cell(self.id));
        match &self.source {
            Some(name) => e.context(ErrorContext::Structure(name.clone())),
            None => e,
        }
    }
    /// Recompute our boundary, bottom-up from our patterns
    pub fn update_boundary(&mut self) -> BoundBox {
        self.boundary = self
            .patterns
            .iter_mut()
            .fold(BoundBox::empty(), |b, p| p.update_boundary().union(&b));
        self.boundary
    }
    /// Bounding box of all array elements, relative to our displacement
    pub fn extent(&self) -> BoundBox {
        if self.boundary.is_empty() {
            return self.boundary;
        }
        let (sx, sy) = self.array.span();
        let clamp = |v: i64| v.clamp(Int::MIN as i64, Int::MAX as i64) as Int;
        BoundBox {
            p0: self.boundary.p0,
            p1: Point::new(
                clamp(self.boundary.p1.x as i64 + sx),
                clamp(self.boundary.p1.y as i64 + sy),
            ),
        }
    }
    /// Bounding box of all array elements, in parent coordinates
    pub fn placed_extent(&self) -> BoundBox {
        self.extent().shift(&self.displacement)
    }
    /// Shift all patterns by `pt`
    pub fn shift_patterns(&mut self, pt: &Point) {
        for p in self.patterns.iter_mut() {
            p.shift(pt);
        }
        self.boundary = self.boundary.shift(pt);
    }
    /// Move our displacement into our pattern coordinates, leaving a zero displacement
    pub fn displace_patterns(&mut self) {
        let d = self.displacement;
        if d != Point::default() {
            self.shift_patterns(&d);
            self.displacement = Point::default();
        }
    }
    /// Move our patterns' lower-left corner to the origin, compensating in our displacement
    pub fn zero_patterns(&mut self) {
        self.update_boundary();
        if self.boundary.is_empty() {
            return;
        }
        let p0 = self.boundary.p0;
        self.shift_patterns(&Point::new(-p0.x, -p0.y));
        self.displacement = self.displacement.shift(&p0);
    }
    /// Convert to image coordinates: zero our patterns, then mirror them top-to-bottom
    pub fn cart2img(&mut self) {
        self.zero_patterns();
        let top = self.boundary.p1.y;
        for pattern in self.patterns.iter_mut() {
            for poly in pattern.polygons.iter_mut() {
                poly.mirror_y(top);
            }
            pattern.update_boundary();
        }
        self.update_boundary();
    }
    /// Uniformly scale patterns, displacement and pitch by `factor`
    pub fn scale(&mut self, factor: f64) {
        for pattern in self.patterns.iter_mut() {
            for poly in pattern.polygons.iter_mut() {
                poly.scale(factor);
            }
        }
        self.displacement = self.displacement.scale(factor);
        self.array.pitch = self.array.pitch.scale(factor);
        self.update_boundary();
    }
    /// Slice our patterns along the absolute grid of pitch `size`
    pub fn field_fracture(&mut self, size: Point) -> LayoutResult<()> {
        self.displace_patterns();
        for p in self.patterns.iter_mut() {
            p.field_fracture(size)?;
        }
        self.update_boundary();
        Ok(())
    }
    /// Fracture our patterns into device primitives
    pub fn fracture(&mut self, limits: &FractureLimits) -> LayoutResult<()> {
        for p in self.patterns.iter_mut() {
            p.fracture(limits)?;
        }
        self.patterns.retain(|p| !p.is_empty());
        self.update_boundary();
        Ok(())
    }
    /// Exposed area per shot rank, including all array elements
    pub fn area_by_rank(&self) -> [f64; 256] {
        let mut rv = [0.0; 256];
        let count = self.array.count() as f64;
        for p in self.patterns.iter() {
            rv[p.shot_rank as usize] += p.area() * count;
        }
        rv
    }
}

///
/// # Canvas
///
/// Flat collection of all [Cell]s, prior to field partitioning.
/// Cells are stored in an arena, keyed by [CellKey], and addressed externally by unique [CellId].
///
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    cells: SlotMap<CellKey, Cell>,
    /// Placement order
    order: Vec<CellKey>,
    ids: HashMap<CellId, CellKey>,
    next_id: CellId,
    pub boundary: BoundBox,
}
impl Canvas {
    /// Create a new, empty [Canvas]
    pub fn new() -> Self {
        Self {
            boundary: BoundBox::empty(),
            ..Default::default()
        }
    }
    /// Add `cell`. Fails if its id is already in use.
    pub fn add_cell(&mut self, cell: Cell) -> LayoutResult<CellKey> {
        if self.ids.contains_key(&cell.id) {
            return Err(LayoutError::input(format!("Duplicate cell id {}", cell.id))
                .context(ErrorContext::Cell(cell.id)));
        }
        self.next_id = self.next_id.max(cell.id + 1);
        self.boundary = cell.placed_extent().union(&self.boundary);
        let id = cell.id;
        let key = self.cells.insert(cell);
        self.ids.insert(id, key);
        self.order.push(key);
        Ok(key)
    }
    /// Create and add a new, empty cell with a fresh id
    pub fn create_cell(&mut self) -> CellId {
        let id = self.next_id;
        let cell = Cell::new(id);
        let key = self.cells.insert(cell);
        self.ids.insert(id, key);
        self.order.push(key);
        self.next_id += 1;
        id
    }
    /// Number of cells
    pub fn len(&self) -> usize {
        self.order.len()
    }
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
    /// Retrieve the cell with id `id`
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.ids.get(&id).and_then(|k| self.cells.get(*k))
    }
    /// Retrieve a mutable reference to the cell with id `id`
    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        match self.ids.get(&id) {
            Some(k) => self.cells.get_mut(*k),
            None => None,
        }
    }
    /// Retrieve the cell with id `id`, or an input error
    fn lookup(&mut self, id: CellId) -> LayoutResult<&mut Cell> {
        self.cell_mut(id).ok_or_else(|| {
            LayoutError::input(format!("Unknown cell id {}", id)).context(ErrorContext::Cell(id))
        })
    }
    /// Iterate over cells, in placement order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.order.iter().filter_map(move |k| self.cells.get(*k))
    }
    /// Add `pattern` to cell `id`
    pub fn add_pattern(&mut self, id: CellId, pattern: Pattern) -> LayoutResult<()> {
        self.lookup(id)?.add_pattern(pattern);
        Ok(())
    }
    /// Set the array parameters of cell `id`
    pub fn set_cell_array(&mut self, id: CellId, pitch: Point, nx: u32, ny: u32) -> LayoutResult<()> {
        self.lookup(id)?.set_array(pitch, nx, ny)
    }
    /// Set the displacement of cell `id`
    pub fn set_cell_displacement(&mut self, id: CellId, displacement: Point) -> LayoutResult<()> {
        self.lookup(id)?.displacement = displacement;
        Ok(())
    }
    /// Offset the displacement of cell `id` by `offset`
    pub fn offset_cell_displacement(&mut self, id: CellId, offset: Point) -> LayoutResult<()> {
        let cell = self.lookup(id)?;
        cell.displacement = cell.displacement.shift(&offset);
        Ok(())
    }
    /// Move every cell's displacement into its pattern coordinates
    pub fn displace_patterns(&mut self) {
        for cell in self.cells.values_mut() {
            cell.displace_patterns();
        }
    }
    /// Recompute all boundaries, bottom-up
    pub fn update_boundary(&mut self) -> BoundBox {
        let mut bbox = BoundBox::empty();
        for cell in self.cells.values_mut() {
            cell.update_boundary();
            bbox = cell.placed_extent().union(&bbox);
        }
        self.boundary = bbox;
        bbox
    }
    /// Uniformly scale all current content by `factor`.
    /// Applies to cells present now; cells added later are unaffected.
    pub fn scale(&mut self, factor: f64) -> LayoutResult<()> {
        if !(factor > 0.0) || !factor.is_finite() {
            return Err(LayoutError::input(format!(
                "Scale factor must be positive, got {}",
                factor
            )));
        }
        for cell in self.cells.values_mut() {
            cell.scale(factor);
        }
        self.update_boundary();
        Ok(())
    }
    ///
    /// Convert from Cartesian to image coordinates:
    /// shift all content to the origin, then mirror top-to-bottom.
    /// Each cell mirrors its own patterns, and its array extent is re-placed about the overall boundary.
    /// Leaves all displacements folded into pattern coordinates.
    ///
    pub fn cart2img(&mut self) {
        let bbox = self.update_boundary();
        if bbox.is_empty() {
            return;
        }
        let min = bbox.p0;
        for cell in self.cells.values_mut() {
            cell.displacement = cell.displacement.unshift(&min);
        }
        let top = self.update_boundary().p1.y;
        for cell in self.cells.values_mut() {
            cell.cart2img();
            let extent_top = cell.extent().p1.y;
            cell.displacement.y = top
                .saturating_sub(cell.displacement.y)
                .saturating_sub(extent_top);
            cell.displace_patterns();
        }
        self.update_boundary();
    }
    /// Replace the cell at `key` with `pieces`, in its place in placement order.
    /// The first piece retains the original id; the rest receive fresh ids.
    fn replace(&mut self, key: CellKey, pieces: Vec<Cell>) {
        let pos = match self.order.iter().position(|k| *k == key) {
            Some(pos) => pos,
            None => return,
        };
        let original = match self.cells.remove(key) {
            Some(c) => c,
            None => return,
        };
        self.ids.remove(&original.id);
        self.order.remove(pos);
        for (idx, mut piece) in pieces.into_iter().enumerate() {
            piece.id = if idx == 0 {
                original.id
            } else {
                let id = self.next_id;
                self.next_id += 1;
                id
            };
            let id = piece.id;
            let k = self.cells.insert(piece);
            self.ids.insert(id, k);
            self.order.insert(pos + idx, k);
        }
    }
    ///
    /// Split array cells which exceed `max_len` repeats per axis,
    /// or which straddle the boundaries of the exposure-field grid of pitch `field`.
    ///
    pub fn array_fracture(&mut self, field: Point, max_len: u32) -> LayoutResult<()> {
        for key in self.order.clone() {
            let cell = match self.cells.get(key) {
                Some(c) if c.array.is_array() => c,
                _ => continue,
            };
            let id = cell.id;
            let mut pieces = Vec::new();
            for chunk in array::resize(cell, max_len).map_err(|e| cell.contextualize(e))? {
                pieces.extend(
                    array::field_fracture(&chunk, field).map_err(|e| cell.contextualize(e))?,
                );
            }
            for piece in pieces.iter_mut() {
                piece.displace_patterns();
            }
            debug!("Array cell {} split into {} cells", id, pieces.len());
            if pieces.len() == 1 {
                if let (Some(piece), Some(cell)) = (pieces.pop(), self.cells.get_mut(key)) {
                    *cell = piece;
                }
            } else {
                self.replace(key, pieces);
            }
        }
        self.update_boundary();
        Ok(())
    }
    /// Slice all polygons along the exposure-field grid of pitch `field`
    pub fn field_fracture(&mut self, field: Point) -> LayoutResult<()> {
        for cell in self.cells.values_mut() {
            cell.field_fracture(field)
                .map_err(|e| cell.contextualize(e))?;
        }
        self.update_boundary();
        Ok(())
    }
    /// Fracture all polygons into device primitives
    pub fn fracture(&mut self, limits: &FractureLimits) -> LayoutResult<()> {
        for cell in self.cells.values_mut() {
            cell.fracture(limits).map_err(|e| cell.contextualize(e))?;
        }
        self.update_boundary();
        Ok(())
    }
    /// Exposed area per shot rank, over all cells and array elements
    pub fn area_by_rank(&self) -> Vec<f64> {
        let mut rv = vec![0.0; 256];
        for cell in self.cells() {
            for (total, a) in rv.iter_mut().zip(cell.area_by_rank().iter()) {
                *total += a;
            }
        }
        rv
    }
    /// Total exposed area, over all shot ranks
    pub fn area(&self) -> f64 {
        self.area_by_rank().iter().sum()
    }
}
