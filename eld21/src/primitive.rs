//!
//! # Device Primitives
//!
//! The pattern generator exposes a small set of shapes: rectangles, and trapezoids or triangles
//! with a pair of axis-aligned bases. [classify] decides whether a three or four vertex shape
//! is one of them.
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::bbox::{BoundBox, BoundBoxTrait};
use crate::geom::{cross, Dir, Point, Polygon};
use crate::Int;

/// # Primitive Kinds
///
/// The `X` kinds have horizontal bases, i.e. parallel to the x-axis.
/// The `Y` kinds have vertical bases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Rectangle,
    TrapezoidX,
    TrapezoidY,
    RightTriangleX,
    RightTriangleY,
    TriangleX,
    TriangleY,
}
impl PrimitiveKind {
    /// Direction of our parallel bases
    pub fn base_dir(&self) -> Dir {
        match self {
            Self::Rectangle | Self::TrapezoidX | Self::RightTriangleX | Self::TriangleX => {
                Dir::Horiz
            }
            Self::TrapezoidY | Self::RightTriangleY | Self::TriangleY => Dir::Vert,
        }
    }
}

/// Reasons a shape is not a device primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Not three or four vertices
    VertexCount(usize),
    /// Repeated or colinear vertices, or zero area
    Degenerate,
    /// Triangle without an axis-aligned edge
    NoAlignedEdge,
    /// Quadrilateral without a pair of axis-aligned bases
    NoParallelBases,
    /// A leg deviates more than 60 degrees from the perpendicular of the bases
    LegAngle,
}
impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::VertexCount(n) => write!(f, "{} vertices", n),
            Self::Degenerate => write!(f, "degenerate shape"),
            Self::NoAlignedEdge => write!(f, "no axis-aligned edge"),
            Self::NoParallelBases => write!(f, "no axis-aligned parallel bases"),
            Self::LegAngle => write!(f, "leg angle exceeds 60 degrees"),
        }
    }
}

///
/// # Device Primitive
///
/// Vertices are held in four canonical slots.
/// For horizontal-base kinds: bottom-left, bottom-right, top-right, top-left.
/// For vertical-base kinds: left-bottom, left-top, right-top, right-bottom.
/// Triangles collapse one base to a point, which then fills both of its slots.
///
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub points: [Point; 4],
}
impl Primitive {
    /// Our first canonical vertex
    pub fn origin(&self) -> Point {
        self.points[0]
    }
    /// Width and height of our bounding box
    pub fn size(&self) -> (Int, Int) {
        self.bbox().size()
    }
    /// Area, from the shoelace formula over our canonical slots
    pub fn area(&self) -> f64 {
        let p = &self.points;
        let mut sum: i64 = 0;
        for i in 0..4 {
            let (a, b) = (&p[i], &p[(i + 1) % 4]);
            sum += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        }
        sum.abs() as f64 / 2.0
    }
    /// Shift all vertices by `pt`
    pub fn shift(&mut self, pt: &Point) {
        for p in self.points.iter_mut() {
            *p = p.shift(pt);
        }
    }
    /// Convert to a counter-clockwise [Polygon], collapsing repeated slots
    pub fn to_polygon(&self) -> Polygon {
        let mut points = self.points.to_vec();
        points.dedup();
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        let mut poly = Polygon { points };
        poly.make_ccw();
        poly
    }
}
impl BoundBoxTrait for Primitive {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().intersection(bbox)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().union(bbox)
    }
    fn bbox(&self) -> BoundBox {
        self.points
            .iter()
            .fold(BoundBox::empty(), |b, p| b.union(&p.bbox()))
    }
}

/// Classify polygon `poly`. Shorthand for [classify] on its points.
pub fn classify_polygon(poly: &Polygon) -> Result<Primitive, Rejection> {
    classify(&poly.points)
}

///
/// Classify the shape with vertices `pts` as a device [Primitive], or return the reason it is not one.
///
/// * Four vertices with two horizontal and two vertical edges form a rectangle.
/// * Four vertices with one pair of parallel axis-aligned edges form a trapezoid.
/// * Three vertices with a horizontal and a vertical edge form a right triangle,
///   with horizontal base if at least as tall as wide.
/// * Three vertices with one axis-aligned edge form a triangle.
///
/// Non-rectangular primitives must keep each leg within 60 degrees of the bases' perpendicular.
///
pub fn classify(pts: &[Point]) -> Result<Primitive, Rejection> {
    let n = pts.len();
    if n != 3 && n != 4 {
        return Err(Rejection::VertexCount(n));
    }
    for i in 0..n {
        let (prev, cur, next) = (&pts[(i + n - 1) % n], &pts[i], &pts[(i + 1) % n]);
        if cur == next || cross(prev, cur, next) == 0 {
            return Err(Rejection::Degenerate);
        }
    }
    let horiz = (0..n).filter(|&i| pts[i].y == pts[(i + 1) % n].y).count();
    let vert = (0..n).filter(|&i| pts[i].x == pts[(i + 1) % n].x).count();

    let kind = match (n, horiz, vert) {
        (4, 2, 2) => PrimitiveKind::Rectangle,
        (4, 2, _) => PrimitiveKind::TrapezoidX,
        (4, _, 2) => PrimitiveKind::TrapezoidY,
        (4, _, _) => return Err(Rejection::NoParallelBases),
        (3, 1, 1) => {
            let (w, h) = pts.bbox().size();
            if h >= w {
                PrimitiveKind::RightTriangleX
            } else {
                PrimitiveKind::RightTriangleY
            }
        }
        (3, 1, 0) => PrimitiveKind::TriangleX,
        (3, 0, 1) => PrimitiveKind::TriangleY,
        _ => return Err(Rejection::NoAlignedEdge),
    };
    let points = canonical(pts, kind.base_dir());
    if kind != PrimitiveKind::Rectangle {
        check_legs(&points, kind.base_dir())?;
    }
    Ok(Primitive { kind, points })
}

/// Sort `pts` into the four canonical slots, for bases parallel to `dir`.
/// Slots hold (low base, low end), (low base, high end), (high base, high end), (high base, low end),
/// where "base" is the coordinate perpendicular to `dir` and "end" the coordinate along it.
fn canonical(pts: &[Point], dir: Dir) -> [Point; 4] {
    let perp = !dir;
    let lo = pts.iter().map(|p| p.coord(perp)).min().unwrap_or(0);
    let hi = pts.iter().map(|p| p.coord(perp)).max().unwrap_or(0);
    let ends = |level: Int| {
        let on: Vec<&Point> = pts.iter().filter(|p| p.coord(perp) == level).collect();
        let first = on.iter().min_by_key(|p| p.coord(dir)).map(|p| **p);
        let last = on.iter().max_by_key(|p| p.coord(dir)).map(|p| **p);
        (first.unwrap_or_default(), last.unwrap_or_default())
    };
    let (lo_first, lo_last) = ends(lo);
    let (hi_first, hi_last) = ends(hi);
    [lo_first, lo_last, hi_last, hi_first]
}

/// Check both legs joining the bases stay within 60 degrees of the bases' perpendicular.
/// For a leg spanning `along` parallel to the bases and `across` perpendicular to them,
/// this is `|along| <= sqrt(3) * |across|`, compared exactly as squares.
fn check_legs(slots: &[Point; 4], dir: Dir) -> Result<(), Rejection> {
    let legs = [(slots[0], slots[3]), (slots[1], slots[2])];
    for (a, b) in legs.iter() {
        let along = (b.coord(dir) as i64 - a.coord(dir) as i64).abs() as i128;
        let across = (b.coord(!dir) as i64 - a.coord(!dir) as i64).abs() as i128;
        if along * along > 3 * across * across {
            return Err(Rejection::LegAngle);
        }
    }
    Ok(())
}

impl BoundBoxTrait for [Point] {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().intersection(bbox)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().union(bbox)
    }
    fn bbox(&self) -> BoundBox {
        self.iter().fold(BoundBox::empty(), |b, p| b.union(&p.bbox()))
    }
}
