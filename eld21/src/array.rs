//!
//! # Array Fracturing
//!
//! Splits array [Cell]s which exceed the device repeat limit,
//! or which straddle the boundaries of the exposure-field grid,
//! into conforming sub-arrays.
//!

// Crates.io
use log::debug;

// Local imports
use crate::bbox::BoundBoxTrait;
use crate::data::{to_int, Cell, Pattern};
use crate::error::{LayoutError, LayoutResult};
use crate::geom::{Dir, Point};
use crate::slice::{grid_lines, slice, Line};
use crate::Int;

///
/// Split `cell` into arrays of at most `max` repeats per axis.
/// Each axis is split into full chunks of `max`, followed by a chunk holding the (non-zero) remainder.
/// Chunk displacements are offset by chunk-index times `max` pitches.
///
pub fn resize(cell: &Cell, max: u32) -> LayoutResult<Vec<Cell>> {
    if max == 0 {
        return Err(LayoutError::input("Max array length must be positive"));
    }
    let xs = chunks(cell.array.nx, max);
    let ys = chunks(cell.array.ny, max);
    let mut rv = Vec::with_capacity(xs.len() * ys.len());
    for &(x0, nx) in xs.iter() {
        for &(y0, ny) in ys.iter() {
            let mut c = cell.clone();
            c.array.nx = nx;
            c.array.ny = ny;
            c.displacement.x = to_int(c.displacement.x as i64 + x0 as i64 * cell.array.pitch.x as i64)?;
            c.displacement.y = to_int(c.displacement.y as i64 + y0 as i64 * cell.array.pitch.y as i64)?;
            rv.push(c);
        }
    }
    if rv.len() > 1 {
        debug!("Resized {}x{} array into {} chunks", cell.array.nx, cell.array.ny, rv.len());
    }
    Ok(rv)
}

/// Split `n` into (first-index, count) chunks of at most `max`
fn chunks(n: u32, max: u32) -> Vec<(u32, u32)> {
    let mut rv = Vec::with_capacity((n / max + 1) as usize);
    let mut first = 0;
    while first < n {
        let count = max.min(n - first);
        rv.push((first, count));
        first += count;
    }
    rv
}

///
/// Split array `cell` along every line of the field grid of pitch `field` crossing its extent.
/// Row lines are applied first, then column lines.
/// Non-array cells are returned unchanged.
///
pub fn field_fracture(cell: &Cell, field: Point) -> LayoutResult<Vec<Cell>> {
    if !cell.array.is_array() {
        return Ok(vec![cell.clone()]);
    }
    let mut base = cell.clone();
    base.zero_patterns();
    let extent = base.placed_extent();
    let mut pieces = vec![base];
    for dir in [Dir::Vert, Dir::Horiz] {
        let lines = grid_lines(extent.p0.coord(dir), extent.p1.coord(dir), field.coord(dir));
        for at in lines {
            let mut next = Vec::with_capacity(pieces.len() + 3);
            for p in pieces.iter() {
                next.extend(slice_axis(p, dir, at)?);
            }
            pieces = next;
        }
    }
    Ok(pieces)
}

///
/// Split `cell` along the line perpendicular to `dir` at absolute coordinate `at`.
///
/// * Lines missing the array extent leave it whole.
/// * Lines between repeats split it into two arrays at the pitch boundary.
/// * Lines through an element produce up to four cells: the elements before,
///   the lower and upper halves of the straddling element, and the elements after.
/// * Overlapping arrays, with pitch less than the element extent, are first expanded along `dir`.
///
pub fn slice_axis(cell: &Cell, dir: Dir, at: Int) -> LayoutResult<Vec<Cell>> {
    if cell.is_empty() {
        return Ok(Vec::new());
    }
    let n = cell.array.n(dir);
    let pitch = cell.array.pitch.coord(dir) as i64;
    let lo = cell.boundary.p0.coord(dir) as i64 + cell.displacement.coord(dir) as i64;
    let w = (cell.boundary.p1.coord(dir) - cell.boundary.p0.coord(dir)) as i64;
    let hi = lo + w + pitch * (n as i64 - 1);
    let at64 = at as i64;
    if at64 <= lo || at64 >= hi {
        return Ok(vec![cell.clone()]);
    }
    if n == 1 {
        return slice_body(cell, dir, at);
    }
    if pitch == 0 || pitch < w {
        let mut rv = Vec::new();
        for k in 0..n {
            let element = repeat(cell, dir, k, 1)?;
            rv.extend(slice_axis(&element, dir, at)?);
        }
        return Ok(rv);
    }
    let rel = at64 - lo;
    let k = (rel / pitch) as u32;
    let t = rel % pitch;
    let pieces = if t == 0 {
        vec![repeat(cell, dir, 0, k)?, repeat(cell, dir, k, n - k)?]
    } else if t >= w {
        vec![repeat(cell, dir, 0, k + 1)?, repeat(cell, dir, k + 1, n - k - 1)?]
    } else {
        let mut rv = vec![repeat(cell, dir, 0, k)?];
        rv.extend(slice_body(&repeat(cell, dir, k, 1)?, dir, at)?);
        rv.push(repeat(cell, dir, k + 1, n - k - 1)?);
        rv
    };
    Ok(pieces
        .into_iter()
        .filter(|c| c.array.n(dir) > 0 && !c.is_empty())
        .collect())
}

/// Copy of `cell` holding `count` of its repeats along `dir`, starting from repeat `first`
fn repeat(cell: &Cell, dir: Dir, first: u32, count: u32) -> LayoutResult<Cell> {
    let mut c = cell.clone();
    *c.array.n_mut(dir) = count;
    let offset = first as i64 * cell.array.pitch.coord(dir) as i64;
    let d = c.displacement.coord_mut(dir);
    *d = to_int(*d as i64 + offset)?;
    Ok(c)
}

/// Slice the body of single-repeat (along `dir`) `cell` at absolute coordinate `at`,
/// returning its lower and upper halves
fn slice_body(cell: &Cell, dir: Dir, at: Int) -> LayoutResult<Vec<Cell>> {
    let local = at.saturating_sub(cell.displacement.coord(dir));
    let line = match dir {
        Dir::Vert => Line::Horiz(local),
        Dir::Horiz => Line::Vert(local),
    };
    let mut lower = Cell {
        patterns: Vec::with_capacity(cell.patterns.len()),
        ..cell.clone()
    };
    let mut upper = lower.clone();
    for pattern in cell.patterns.iter() {
        let mut below = Pattern::new(pattern.shot_rank);
        let mut above = Pattern::new(pattern.shot_rank);
        for poly in pattern.polygons.iter() {
            for piece in slice(poly, line)? {
                if piece.bbox().p1.coord(dir) <= local {
                    below.add_polygon(piece);
                } else {
                    above.add_polygon(piece);
                }
            }
        }
        if !below.is_empty() {
            lower.patterns.push(below);
        }
        if !above.is_empty() {
            upper.patterns.push(above);
        }
    }
    let mut rv = Vec::with_capacity(2);
    for mut c in [lower, upper] {
        c.update_boundary();
        if !c.is_empty() {
            rv.push(c);
        }
    }
    Ok(rv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Polygon;

    /// 100x100 square element, arrayed with the given pitch and counts
    fn square_array(pitch: Point, nx: u32, ny: u32) -> LayoutResult<Cell> {
        let mut cell = Cell::new(0);
        cell.add_polygon(0, Polygon::from_pairs(&[(0, 0), (100, 0), (100, 100), (0, 100)])?);
        cell.set_array(pitch, nx, ny)?;
        Ok(cell)
    }
    fn count(cells: &[Cell]) -> u64 {
        cells.iter().map(|c| c.array.count()).sum()
    }

    #[test]
    fn resize_remainder() -> LayoutResult<()> {
        let cell = square_array(Point::new(200, 0), 5000, 1)?;
        let chunks = resize(&cell, 2000)?;
        let ns: Vec<u32> = chunks.iter().map(|c| c.array.nx).collect();
        assert_eq!(ns, vec![2000, 2000, 1000]);
        let xs: Vec<Int> = chunks.iter().map(|c| c.displacement.x).collect();
        assert_eq!(xs, vec![0, 400_000, 800_000]);
        assert_eq!(count(&chunks), 5000);
        Ok(())
    }
    #[test]
    fn resize_both_axes() -> LayoutResult<()> {
        let cell = square_array(Point::new(200, 200), 3, 5)?;
        let chunks = resize(&cell, 2)?;
        assert_eq!(chunks.len(), 2 * 3);
        assert_eq!(count(&chunks), 15);
        assert!(resize(&cell, 0).is_err());
        Ok(())
    }
    #[test]
    fn slice_between_repeats() -> LayoutResult<()> {
        let cell = square_array(Point::new(200, 0), 10, 1)?;
        // Line at 350 falls in the gap after the second element
        let pieces = slice_axis(&cell, Dir::Horiz, 350)?;
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].array.nx, 2);
        assert_eq!(pieces[1].array.nx, 8);
        assert_eq!(pieces[1].displacement.x, 400);
        // Line exactly on an element's lower edge
        let pieces = slice_axis(&cell, Dir::Horiz, 400)?;
        assert_eq!(pieces[0].array.nx, 2);
        assert_eq!(pieces[1].array.nx, 8);
        Ok(())
    }
    #[test]
    fn slice_through_element() -> LayoutResult<()> {
        let cell = square_array(Point::new(200, 0), 10, 1)?;
        let pieces = slice_axis(&cell, Dir::Horiz, 450)?;
        assert_eq!(pieces.len(), 4);
        let ns: Vec<u32> = pieces.iter().map(|c| c.array.nx).collect();
        assert_eq!(ns, vec![2, 1, 1, 7]);
        let area: f64 = pieces
            .iter()
            .map(|c| c.area_by_rank()[0])
            .sum();
        assert_eq!(area, 10.0 * 10_000.0);
        // First element sliced: no empty "before" piece
        let pieces = slice_axis(&cell, Dir::Horiz, 50)?;
        assert_eq!(pieces.len(), 3);
        Ok(())
    }
    #[test]
    fn slice_overlapping() -> LayoutResult<()> {
        let cell = square_array(Point::new(50, 0), 4, 1)?;
        let pieces = slice_axis(&cell, Dir::Horiz, 120)?;
        assert_eq!(count(&pieces), 6);
        for p in pieces.iter() {
            assert_eq!(p.array.nx, 1);
        }
        Ok(())
    }
    #[test]
    fn field_fracture_grid() -> LayoutResult<()> {
        let cell = square_array(Point::new(200, 200), 10, 10)?;
        let pieces = field_fracture(&cell, Point::new(1000, 1000))?;
        let area: f64 = pieces.iter().map(|c| c.area_by_rank()[0]).sum();
        assert_eq!(area, 100.0 * 10_000.0);
        for p in pieces.iter() {
            let e = p.placed_extent();
            assert_eq!(e.p0.x.div_euclid(1000), (e.p1.x - 1).div_euclid(1000));
            assert_eq!(e.p0.y.div_euclid(1000), (e.p1.y - 1).div_euclid(1000));
        }
        // Non-arrays pass through
        let single = square_array(Point::new(0, 0), 1, 1)?;
        assert_eq!(field_fracture(&single, Point::new(50, 50))?, vec![single]);
        Ok(())
    }
}
