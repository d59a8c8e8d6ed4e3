//!
//! # Polygon Fracturing
//!
//! Decomposes simple polygons into device [Primitive]s.
//!
//! Each vertex is tested for whether the horizontal direction immediately to its left or right
//! enters the polygon's interior. Where it does, the polygon is split along a ray from that vertex
//! to the nearest edge it crosses. Repeating until no such vertex remains leaves pieces with
//! vertices only on their top and bottom lines: horizontal trapezoids and triangles.
//! Pieces which fail classification are re-sliced along the other axis, alternating until
//! each is either a primitive or a sliver small enough to drop.
//!
//! All tests are exact. Ray crossings of slanted edges are held as rationals,
//! and rounded to integers only when inserted as new vertices.
//!

// Crates.io
use log::{debug, warn};

// Local imports
use crate::bbox::BoundBoxTrait;
use crate::config::FractureLimits;
use crate::error::{LayoutError, LayoutResult};
use crate::geom::{Dir, Point, Polygon, Ratio};
use crate::primitive::{classify, Primitive};
use crate::Int;

/// 2D cross product of vectors `u` and `w`
fn cross2(u: (i64, i64), w: (i64, i64)) -> i64 {
    u.0 * w.1 - u.1 * w.0
}
fn vec2(from: &Point, to: &Point) -> (i64, i64) {
    (to.x as i64 - from.x as i64, to.y as i64 - from.y as i64)
}

///
/// Boolean indication of whether direction `d` from vertex `i` of counter-clockwise polygon `pts`
/// points strictly into its interior.
/// Directions running along either adjacent edge are not inside.
///
pub(crate) fn enters_interior(pts: &[Point], i: usize, d: (i64, i64)) -> bool {
    let n = pts.len();
    let v = &pts[i];
    let e1 = vec2(v, &pts[(i + 1) % n]);
    let e2 = vec2(v, &pts[(i + n - 1) % n]);
    let c = cross2(e1, e2);
    if c > 0 {
        // Convex. Interior is the wedge sweeping counter-clockwise from `e1` to `e2`.
        cross2(e1, d) > 0 && cross2(d, e2) > 0
    } else if c < 0 {
        // Reflex. Interior is everything outside the closed wedge from `e2` to `e1`.
        !(cross2(e2, d) >= 0 && cross2(d, e1) >= 0)
    } else if e1.0 * e2.0 + e1.1 * e2.1 < 0 {
        // Straight-through vertex. Interior is the left half-plane of `e1`.
        cross2(e1, d) > 0
    } else {
        false
    }
}

/// Nearest boundary hit of a horizontal ray
#[derive(Debug, Clone, Copy)]
enum Hit {
    /// At an existing vertex
    Vertex(usize),
    /// Within the edge starting at the given vertex, at the given x-coordinate
    Edge(usize, Ratio),
}

/// Find the nearest boundary crossing of the horizontal ray from vertex `i`, heading right if `right`.
fn ray_hit(pts: &[Point], i: usize, right: bool) -> Option<Hit> {
    let n = pts.len();
    let v = pts[i];
    let y = v.y;
    let vx = Ratio::int(v.x);
    let ahead = |x: &Ratio| if right { *x > vx } else { *x < vx };
    let nearer = |x: &Ratio, than: &Ratio| if right { *x < *than } else { *x > *than };

    let mut best: Option<(Ratio, Hit)> = None;
    let consider = |x: Ratio, hit: Hit, best: &mut Option<(Ratio, Hit)>| {
        if !ahead(&x) {
            return;
        }
        let better = match &*best {
            None => true,
            // Prefer existing vertices at equal distance
            Some((bx, Hit::Edge(..))) => nearer(&x, bx) || (x == *bx && matches!(hit, Hit::Vertex(_))),
            Some((bx, Hit::Vertex(_))) => nearer(&x, bx),
        };
        if better {
            *best = Some((x, hit));
        }
    };
    for j in 0..n {
        let k = (j + 1) % n;
        if j == i || k == i {
            continue; // Edges incident to the ray's origin
        }
        let (a, b) = (pts[j], pts[k]);
        if a.y.min(b.y) > y || a.y.max(b.y) < y {
            continue;
        }
        if a.y == y {
            consider(Ratio::int(a.x), Hit::Vertex(j), &mut best);
        }
        if b.y == y {
            consider(Ratio::int(b.x), Hit::Vertex(k), &mut best);
        }
        if a.y != y && b.y != y {
            let dy = b.y as i128 - a.y as i128;
            let num = a.x as i128 * dy + (b.x as i128 - a.x as i128) * (y as i128 - a.y as i128);
            consider(Ratio::new(num, dy), Hit::Edge(j, Ratio::new(num, dy)), &mut best);
        }
    }
    best.map(|(_, hit)| hit)
}

///
/// Attempt to split counter-clockwise polygon `poly` with a horizontal cut from vertex `i`,
/// heading right if `right`. Returns `None` if the ray does not enter the interior,
/// or if no valid cut exists.
///
pub(crate) fn cut_at(poly: &Polygon, i: usize, right: bool) -> Option<(Polygon, Polygon)> {
    let d = if right { (1, 0) } else { (-1, 0) };
    if !enters_interior(&poly.points, i, d) {
        return None;
    }
    let hit = ray_hit(&poly.points, i, right)?;
    let mut pts = poly.points.clone();
    let n = pts.len();
    let (i, k) = match hit {
        Hit::Vertex(k) => (i, k),
        Hit::Edge(j, x) => {
            let x = x.round();
            if x == pts[i].x {
                return None; // Rounds onto ourselves
            }
            let new = Point::new(x, pts[i].y);
            if new == pts[j] || new == pts[(j + 1) % n] {
                return None;
            }
            pts.insert(j + 1, new);
            let i = if i > j { i + 1 } else { i };
            (i, j + 1)
        }
    };
    let n = pts.len();
    if k == i || k == (i + 1) % n || i == (k + 1) % n {
        return None;
    }
    let walk = |from: usize, to: usize| {
        let mut rv = Vec::new();
        let mut idx = from;
        loop {
            rv.push(pts[idx]);
            if idx == to {
                break;
            }
            idx = (idx + 1) % n;
        }
        let mut p = Polygon { points: rv };
        p.clean();
        p
    };
    Some((walk(i, k), walk(k, i)))
}

/// Find the first vertex of `poly` supporting a horizontal cut, rightward before leftward, and split there.
/// Vertices may be restricted to a single line by `only_at`.
pub(crate) fn split_once(poly: &Polygon, only_at: Option<Int>) -> Option<(Polygon, Polygon)> {
    for i in 0..poly.points.len() {
        if let Some(y) = only_at {
            if poly.points[i].y != y {
                continue;
            }
        }
        for right in [true, false] {
            if let Some(pieces) = cut_at(poly, i, right) {
                return Some(pieces);
            }
        }
    }
    None
}

/// Step budget shared by the passes of a single fracture
pub(crate) struct Budget {
    used: usize,
    max: usize,
}
impl Budget {
    pub fn new(max: usize) -> Self {
        Self { used: 0, max }
    }
    pub fn step(&mut self) -> LayoutResult<()> {
        self.used += 1;
        if self.used > self.max {
            return Err(LayoutError::iteration(
                format!("fracturing exceeded {} steps", self.max),
                None,
            ));
        }
        Ok(())
    }
}

/// Split counter-clockwise `poly` along horizontal rays until no vertex supports a cut.
/// Pieces with fewer than three vertices are discarded.
pub(crate) fn trapezoidalize(poly: Polygon, budget: &mut Budget) -> LayoutResult<Vec<Polygon>> {
    let mut rv = Vec::new();
    let mut stack = vec![poly];
    while let Some(p) = stack.pop() {
        budget.step()?;
        if p.len() < 3 {
            continue;
        }
        match split_once(&p, None) {
            Some((a, b)) => {
                stack.push(b);
                stack.push(a);
            }
            None => rv.push(p),
        }
    }
    Ok(rv)
}

/// Run `f` in a frame where `dir` is horizontal, transposing in and out for [Dir::Vert]
pub(crate) fn along<F>(poly: Polygon, dir: Dir, f: F) -> LayoutResult<Vec<Polygon>>
where
    F: FnOnce(Polygon) -> LayoutResult<Vec<Polygon>>,
{
    match dir {
        Dir::Horiz => {
            let mut poly = poly;
            poly.make_ccw();
            f(poly)
        }
        Dir::Vert => {
            let mut t = poly.transposed();
            t.make_ccw();
            let pieces = f(t)?;
            Ok(pieces
                .into_iter()
                .map(|p| {
                    let mut p = p.transposed();
                    p.make_ccw();
                    p
                })
                .collect())
        }
    }
}

/// Worklist entry
struct Piece {
    poly: Polygon,
    /// Axis of the next slicing pass
    dir: Dir,
    depth: usize,
    /// Set when the previous pass, along the other axis, found no cut
    stalled: bool,
}

///
/// Fracture simple polygon `poly` into device [Primitive]s.
///
/// Slivers whose bounding area is at most `limits.area_floor`, and pieces with no cut on either axis,
/// are dropped with a warning. Exceeding `limits.max_steps` or `limits.max_depth` fails.
///
pub fn fracture(poly: &Polygon, limits: &FractureLimits) -> LayoutResult<Vec<Primitive>> {
    let extent = poly.bbox();
    let mut budget = Budget::new(limits.max_steps);
    let mut rv = Vec::new();
    let mut work = vec![Piece {
        poly: poly.clone(),
        dir: Dir::Horiz,
        depth: 0,
        stalled: false,
    }];
    while let Some(Piece {
        mut poly,
        dir,
        depth,
        stalled,
    }) = work.pop()
    {
        budget.step().map_err(|e| e.with_bbox(extent))?;
        poly.clean();
        if poly.len() < 3 {
            continue;
        }
        if let Ok(prim) = classify(&poly.points) {
            rv.push(prim);
            continue;
        }
        let bbox = poly.bbox();
        if bbox.area() <= limits.area_floor {
            debug!("Dropping sliver {:?}", bbox);
            continue;
        }
        if depth >= limits.max_depth {
            return Err(LayoutError::iteration(
                format!("fracturing exceeded depth {}", limits.max_depth),
                Some(bbox),
            ));
        }
        let pieces = along(poly.clone(), dir, |p| trapezoidalize(p, &mut budget))
            .map_err(|e| e.with_bbox(extent))?;
        if pieces.len() <= 1 {
            if stalled {
                warn!("No cut found on either axis for polygon {:?}, dropping", poly.points);
                continue;
            }
            work.push(Piece {
                poly,
                dir: !dir,
                depth: depth + 1,
                stalled: true,
            });
            continue;
        }
        for p in pieces.into_iter().rev() {
            work.push(Piece {
                poly: p,
                dir: !dir,
                depth: depth + 1,
                stalled: false,
            });
        }
    }
    Ok(rv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::PrimitiveKind;

    fn total_area(prims: &[Primitive]) -> f64 {
        prims.iter().map(|p| p.area()).sum()
    }

    #[test]
    fn interior_directions() -> LayoutResult<()> {
        // L-shape, counter-clockwise, with its reflex corner at (5,5)
        let l = Polygon::from_pairs(&[(0, 0), (10, 0), (10, 5), (5, 5), (5, 10), (0, 10)])?;
        assert!(!enters_interior(&l.points, 3, (1, 0)));
        assert!(enters_interior(&l.points, 3, (-1, 0)));
        assert!(!enters_interior(&l.points, 0, (1, 0)));
        Ok(())
    }
    #[test]
    fn cut_l_shape() -> LayoutResult<()> {
        let l = Polygon::from_pairs(&[(0, 0), (10, 0), (10, 5), (5, 5), (5, 10), (0, 10)])?;
        let (a, b) = cut_at(&l, 3, false).unwrap();
        assert_eq!(a.points, vec![
            Point::new(5, 5),
            Point::new(5, 10),
            Point::new(0, 10),
            Point::new(0, 5)
        ]);
        assert_eq!(b.points, vec![
            Point::new(0, 5),
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5)
        ]);
        Ok(())
    }
    #[test]
    fn fracture_rectangle() -> LayoutResult<()> {
        let p = Polygon::from_pairs(&[(0, 0), (10, 0), (10, 10), (0, 10)])?;
        let prims = fracture(&p, &FractureLimits::default())?;
        assert_eq!(prims.len(), 1);
        assert_eq!(prims[0].kind, PrimitiveKind::Rectangle);
        Ok(())
    }
    #[test]
    fn fracture_l_shape() -> LayoutResult<()> {
        let p = Polygon::from_pairs(&[(0, 0), (20, 0), (20, 10), (10, 10), (10, 20), (0, 20)])?;
        let prims = fracture(&p, &FractureLimits::default())?;
        assert_eq!(prims.len(), 2);
        assert!(prims.iter().all(|p| p.kind == PrimitiveKind::Rectangle));
        assert_eq!(total_area(&prims), 300.0);
        Ok(())
    }
    #[test]
    fn fracture_u_shape() -> LayoutResult<()> {
        let p = Polygon::from_pairs(&[
            (0, 0),
            (0, 10),
            (2, 10),
            (2, 2),
            (8, 2),
            (8, 10),
            (10, 10),
            (10, 0),
        ])?;
        let prims = fracture(&p, &FractureLimits::default())?;
        assert_eq!(prims.len(), 3);
        assert_eq!(total_area(&prims), 100.0 - 48.0);
        Ok(())
    }
    #[test]
    fn fracture_shallow_trapezoid() -> LayoutResult<()> {
        // Legs at 80 degrees from vertical. Re-sliced vertically into a rectangle and two right triangles.
        let p = Polygon::from_pairs(&[(0, 0), (200, 0), (150, 10), (50, 10)])?;
        let prims = fracture(&p, &FractureLimits::default())?;
        assert_eq!(prims.len(), 3);
        assert_eq!(total_area(&prims), p.area());
        let kinds: Vec<_> = prims.iter().map(|p| p.kind).collect();
        assert!(kinds.contains(&PrimitiveKind::Rectangle));
        assert_eq!(
            kinds.iter().filter(|k| **k == PrimitiveKind::RightTriangleY).count(),
            2
        );
        Ok(())
    }
    #[test]
    fn fracture_octagon() -> LayoutResult<()> {
        let p = Polygon::from_pairs(&[
            (10, 0),
            (20, 0),
            (30, 10),
            (30, 20),
            (20, 30),
            (10, 30),
            (0, 20),
            (0, 10),
        ])?;
        let prims = fracture(&p, &FractureLimits::default())?;
        assert_eq!(prims.len(), 3);
        assert_eq!(total_area(&prims), p.area());
        Ok(())
    }
    #[test]
    fn drops_slivers() -> LayoutResult<()> {
        // Too flat for a triangle, with bounding area at the floor
        let p = Polygon::from_pairs(&[(0, 0), (10, 0), (5, 1)])?;
        assert!(fracture(&p, &FractureLimits::default())?.is_empty());
        // Scaled up, it splits at its apex into two right triangles
        let p = Polygon::from_pairs(&[(0, 0), (100, 0), (50, 10)])?;
        let prims = fracture(&p, &FractureLimits::default())?;
        assert_eq!(prims.len(), 2);
        assert!(prims.iter().all(|p| p.kind == PrimitiveKind::RightTriangleY));
        assert_eq!(total_area(&prims), 500.0);
        Ok(())
    }
    #[test]
    fn iteration_limit() -> LayoutResult<()> {
        let p = Polygon::from_pairs(&[(0, 0), (20, 0), (20, 10), (10, 10), (10, 20), (0, 20)])?;
        let limits = FractureLimits {
            max_steps: 1,
            ..FractureLimits::default()
        };
        match fracture(&p, &limits) {
            Err(LayoutError::IterationLimit { bbox, .. }) => assert_eq!(bbox, Some(p.bbox())),
            other => panic!("Expected an iteration limit, got {:?}", other),
        }
        Ok(())
    }
}
