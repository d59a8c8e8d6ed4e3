//!
//! # Line & Field Slicing
//!
//! Cuts polygons along axis-aligned lines, such as the boundaries of the exposure-field grid.
//! Crossings of the line are inserted as vertices, then every on-line vertex whose ray along
//! the line enters the interior is split to its nearest hit.
//! Lines coinciding with an edge, or merely touching the polygon, leave it whole.
//!

// Local imports
use crate::bbox::BoundBoxTrait;
use crate::error::LayoutResult;
use crate::fracture::{along, split_once, Budget};
use crate::geom::{Dir, Point, Polygon, Ratio};
use crate::Int;

/// # Axis-Aligned Cutting Line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    /// Horizontal line `y = value`
    Horiz(Int),
    /// Vertical line `x = value`
    Vert(Int),
}
impl Line {
    /// Axis along which the line runs
    pub fn dir(&self) -> Dir {
        match self {
            Self::Horiz(_) => Dir::Horiz,
            Self::Vert(_) => Dir::Vert,
        }
    }
    /// Coordinate of the line, perpendicular to its direction
    pub fn at(&self) -> Int {
        match self {
            Self::Horiz(v) | Self::Vert(v) => *v,
        }
    }
}

/// Step budget per slice, relative to the polygon's vertex count
const STEPS_PER_VERTEX: usize = 16;

///
/// Slice `poly` along `line`.
/// Returns the pieces, each lying entirely on one side of the line.
/// Polygons not strictly straddling the line are returned whole.
///
pub fn slice(poly: &Polygon, line: Line) -> LayoutResult<Vec<Polygon>> {
    let bbox = poly.bbox();
    let (lo, hi) = match line {
        Line::Horiz(_) => (bbox.p0.y, bbox.p1.y),
        Line::Vert(_) => (bbox.p0.x, bbox.p1.x),
    };
    let at = line.at();
    if at <= lo || at >= hi {
        return Ok(vec![poly.clone()]);
    }
    let mut budget = Budget::new(STEPS_PER_VERTEX * (poly.len() + 4));
    along(poly.clone(), line.dir(), |p| slice_horiz(p, at, &mut budget))
        .map_err(|e| e.with_bbox(bbox))
}

/// Slice counter-clockwise `poly` along the horizontal line `y = at`
fn slice_horiz(poly: Polygon, at: Int, budget: &mut Budget) -> LayoutResult<Vec<Polygon>> {
    let mut rv = Vec::new();
    let mut stack = vec![poly];
    while let Some(p) = stack.pop() {
        budget.step()?;
        // Splitting cleans each piece, dropping any crossings on straight edges. Re-insert them.
        let p = with_crossings(&p, at);
        if p.len() < 3 {
            continue;
        }
        match split_once(&p, Some(at)) {
            Some((a, b)) => {
                stack.push(b);
                stack.push(a);
            }
            None => {
                let mut p = p;
                p.clean();
                if p.len() >= 3 {
                    rv.push(p);
                }
            }
        }
    }
    Ok(rv)
}

/// Copy of `poly` with a vertex inserted at each strict crossing of the line `y = at`.
/// Colinear vertices are kept, as the new crossings on straight edges are exactly those.
fn with_crossings(poly: &Polygon, at: Int) -> Polygon {
    let n = poly.len();
    let mut points = Vec::with_capacity(n + 4);
    for i in 0..n {
        let (a, b) = (poly.points[i], poly.points[(i + 1) % n]);
        points.push(a);
        if (a.y < at && b.y > at) || (a.y > at && b.y < at) {
            let dy = b.y as i128 - a.y as i128;
            let num = a.x as i128 * dy + (b.x as i128 - a.x as i128) * (at as i128 - a.y as i128);
            points.push(Point::new(Ratio::new(num, dy).round(), at));
        }
    }
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Polygon { points }
}

///
/// Slice `poly` along every line of a grid with pitch `size` that crosses it.
/// Rows are sliced first, then columns.
///
pub fn slice_grid(poly: &Polygon, size: Point) -> LayoutResult<Vec<Polygon>> {
    let mut pieces = vec![poly.clone()];
    for dir in [Dir::Horiz, Dir::Vert] {
        let pitch = match dir {
            Dir::Horiz => size.y,
            Dir::Vert => size.x,
        };
        let bbox = pieces
            .iter()
            .fold(crate::bbox::BoundBox::empty(), |b, p| p.union(&b));
        let (lo, hi) = match dir {
            Dir::Horiz => (bbox.p0.y, bbox.p1.y),
            Dir::Vert => (bbox.p0.x, bbox.p1.x),
        };
        for line in grid_lines(lo, hi, pitch) {
            let line = match dir {
                Dir::Horiz => Line::Horiz(line),
                Dir::Vert => Line::Vert(line),
            };
            let mut next = Vec::with_capacity(pieces.len() + 1);
            for p in pieces.iter() {
                next.extend(slice(p, line)?);
            }
            pieces = next;
        }
    }
    Ok(pieces)
}

/// Multiples of `pitch` strictly between `lo` and `hi`
pub fn grid_lines(lo: Int, hi: Int, pitch: Int) -> impl Iterator<Item = Int> {
    let pitch = pitch.max(1) as i64;
    let first = (lo as i64).div_euclid(pitch) + 1;
    let last = (hi as i64 - 1).div_euclid(pitch);
    (first..=last).map(move |k| (k * pitch) as Int)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BoundBox;

    #[test]
    fn grid_lines_strictly_inside() {
        assert_eq!(grid_lines(0, 100, 100).collect::<Vec<_>>(), Vec::<Int>::new());
        assert_eq!(grid_lines(0, 101, 100).collect::<Vec<_>>(), vec![100]);
        assert_eq!(grid_lines(-50, 250, 100).collect::<Vec<_>>(), vec![0, 100, 200]);
    }
    #[test]
    fn slice_rectangle() -> LayoutResult<()> {
        let p = Polygon::from_pairs(&[(0, 0), (100, 0), (100, 50), (0, 50)])?;
        let pieces = slice(&p, Line::Vert(30))?;
        assert_eq!(pieces.len(), 2);
        let mut boxes: Vec<BoundBox> = pieces.iter().map(|p| p.bbox()).collect();
        boxes.sort_by_key(|b| b.p0.x);
        assert_eq!(boxes[0], BoundBox::from_points(Point::new(0, 0), Point::new(30, 50)));
        assert_eq!(boxes[1], BoundBox::from_points(Point::new(30, 0), Point::new(100, 50)));
        // Along an edge, or outside, nothing happens
        assert_eq!(slice(&p, Line::Horiz(50))?.len(), 1);
        assert_eq!(slice(&p, Line::Horiz(80))?.len(), 1);
        Ok(())
    }
    #[test]
    fn slice_u_through_both_arms() -> LayoutResult<()> {
        let u = Polygon::from_pairs(&[
            (0, 0),
            (0, 10),
            (2, 10),
            (2, 2),
            (8, 2),
            (8, 10),
            (10, 10),
            (10, 0),
        ])?;
        let pieces = slice(&u, Line::Horiz(6))?;
        assert_eq!(pieces.len(), 3);
        let area: f64 = pieces.iter().map(|p| p.area()).sum();
        assert_eq!(area, u.area());
        for p in pieces.iter() {
            let b = p.bbox();
            assert!(b.p1.y <= 6 || b.p0.y >= 6);
        }
        Ok(())
    }
    #[test]
    fn slice_diamond_through_vertices() -> LayoutResult<()> {
        let d = Polygon::from_pairs(&[(10, 0), (20, 10), (10, 20), (0, 10)])?;
        let pieces = slice(&d, Line::Horiz(10))?;
        assert_eq!(pieces.len(), 2);
        assert!(pieces.iter().all(|p| p.area() == 100.0));
        Ok(())
    }
    #[test]
    fn slice_grid_square() -> LayoutResult<()> {
        let p = Polygon::from_pairs(&[(50, 50), (250, 50), (250, 150), (50, 150)])?;
        let pieces = slice_grid(&p, Point::new(100, 100))?;
        assert_eq!(pieces.len(), 6);
        let area: f64 = pieces.iter().map(|p| p.area()).sum();
        assert_eq!(area, 20_000.0);
        for piece in pieces.iter() {
            let b = piece.bbox();
            assert_eq!(b.p0.x.div_euclid(100), (b.p1.x - 1).div_euclid(100));
            assert_eq!(b.p0.y.div_euclid(100), (b.p1.y - 1).div_euclid(100));
        }
        Ok(())
    }
}
