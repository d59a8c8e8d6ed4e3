//!
//! # Integer Geometry
//!
//! [Point]s, [Polygon]s and placement [Transform]s in integer layout units,
//! plus the exact arithmetic shared by the slicing and fracturing passes.
//!

// Std-Lib
use std::cmp::Ordering;

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::{
    bbox::{BoundBox, BoundBoxTrait},
    error::{LayoutError, LayoutResult},
    Int,
};

/// # Layout Point
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub x: Int,
    pub y: Int,
}
impl Point {
    pub fn new(x: Int, y: Int) -> Self {
        Self { x, y }
    }
    /// Vector of length `val` along `dir`
    pub fn offset(val: Int, dir: Dir) -> Self {
        let mut pt = Self::default();
        *pt.coord_mut(dir) = val;
        pt
    }
    /// Sum of `self` and `p`, saturating at the integer bounds
    pub fn shift(&self, p: &Point) -> Point {
        Point::new(self.x.saturating_add(p.x), self.y.saturating_add(p.y))
    }
    /// Difference of `self` and `p`, saturating at the integer bounds
    pub fn unshift(&self, p: &Point) -> Point {
        Point::new(self.x.saturating_sub(p.x), self.y.saturating_sub(p.y))
    }
    /// Both coordinates times `factor`, rounded
    pub fn scale(&self, factor: f64) -> Point {
        let f = |v: Int| (v as f64 * factor).round() as Int;
        Point::new(f(self.x), f(self.y))
    }
    /// Coordinate along `dir`
    pub fn coord(&self, dir: Dir) -> Int {
        if dir == Dir::Horiz {
            self.x
        } else {
            self.y
        }
    }
    pub fn coord_mut(&mut self, dir: Dir) -> &mut Int {
        match dir {
            Dir::Horiz => &mut self.x,
            Dir::Vert => &mut self.y,
        }
    }
    /// Swap our x and y coordinates
    pub fn transpose(&self) -> Point {
        Point::new(self.y, self.x)
    }
    /// Placed by `trans`, in floating point, then rounded
    pub fn transform(&self, trans: &Transform) -> Point {
        let [x, y] = trans.apply(self.x as f64, self.y as f64);
        Point::new(x.round() as Int, y.round() as Int)
    }
}

/// # Axis Direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Dir {
    Horiz,
    Vert,
}
impl std::ops::Not for Dir {
    type Output = Self;
    /// The perpendicular direction
    fn not(self) -> Self {
        match self {
            Self::Horiz => Self::Vert,
            Self::Vert => Self::Horiz,
        }
    }
}

/// Cross product of (b - a) and (c - a)
pub(crate) fn cross(a: &Point, b: &Point, c: &Point) -> i64 {
    let (abx, aby) = (b.x as i64 - a.x as i64, b.y as i64 - a.y as i64);
    let (acx, acy) = (c.x as i64 - a.x as i64, c.y as i64 - a.y as i64);
    abx * acy - aby * acx
}

///
/// # Exact Rational Coordinate
///
/// Intersections of rays with slanted edges land on rational coordinates.
/// These are compared exactly, and only rounded once a vertex is inserted.
///
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ratio {
    num: i128,
    /// Always positive
    den: i128,
}
impl Ratio {
    pub fn new(num: i128, den: i128) -> Self {
        if den < 0 {
            Self { num: -num, den: -den }
        } else {
            Self { num, den }
        }
    }
    pub fn int(v: Int) -> Self {
        Self {
            num: v as i128,
            den: 1,
        }
    }
    /// Round to the nearest integer, ties away from negative infinity
    pub fn round(&self) -> Int {
        let v = (2 * self.num + self.den).div_euclid(2 * self.den);
        v.clamp(Int::MIN as i128, Int::MAX as i128) as Int
    }
    pub fn is_integer(&self) -> bool {
        self.num % self.den == 0
    }
}
impl PartialEq for Ratio {
    fn eq(&self, other: &Self) -> bool {
        self.num * other.den == other.num * self.den
    }
}
impl Eq for Ratio {}
impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num * other.den).cmp(&(other.num * self.den))
    }
}

/// # Polygon
///
/// Simple polygon as an ordered vertex list. The edge from the last vertex
/// back to the first is implicit, so the first vertex is never repeated.
/// [Polygon::from_closed] and [Polygon::to_closed] convert to and from
/// the repeated-point form used in layout libraries.
///
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Polygon {
    pub points: Vec<Point>,
}
impl Polygon {
    /// Create a [Polygon] from `points`, stripping any repeated closing point.
    /// Fails if fewer than three distinct points remain.
    pub fn new(points: impl Into<Vec<Point>>) -> LayoutResult<Self> {
        let mut points = points.into();
        points.dedup();
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return Err(LayoutError::input(format!(
                "Polygon requires at least three distinct points, got {:?}",
                points
            )));
        }
        Ok(Self { points })
    }
    /// Create from a closed point-list, in which the first point is repeated at the end
    pub fn from_closed(points: &[Point]) -> LayoutResult<Self> {
        if points.len() < 4 || points.first() != points.last() {
            return Err(LayoutError::input(format!(
                "Closed polygon must repeat its first point, got {:?}",
                points
            )));
        }
        Self::new(points)
    }
    /// Create from (x,y) integer pairs
    pub fn from_pairs(pairs: &[(Int, Int)]) -> LayoutResult<Self> {
        Self::new(pairs.iter().map(|(x, y)| Point::new(*x, *y)).collect::<Vec<_>>())
    }
    /// Closed point-list, with the first point repeated at the end
    pub fn to_closed(&self) -> Vec<Point> {
        let mut pts = self.points.clone();
        if let Some(p) = self.points.first() {
            pts.push(*p);
        }
        pts
    }
    /// Number of vertices
    pub fn len(&self) -> usize {
        self.points.len()
    }
    /// Twice the signed area. Positive for counter-clockwise vertex order.
    pub fn area2(&self) -> i64 {
        let n = self.points.len();
        let mut sum: i64 = 0;
        for i in 0..n {
            let (a, b) = (&self.points[i], &self.points[(i + 1) % n]);
            sum += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        }
        sum
    }
    /// Unsigned area
    pub fn area(&self) -> f64 {
        self.area2().abs() as f64 / 2.0
    }
    /// Boolean indication of counter-clockwise vertex order
    pub fn is_ccw(&self) -> bool {
        self.area2() > 0
    }
    /// Reorder our vertices counter-clockwise, if they are not already
    pub fn make_ccw(&mut self) {
        if self.area2() < 0 {
            self.points.reverse();
        }
    }
    /// Shift all vertices by `pt`
    pub fn shift(&mut self, pt: &Point) {
        for p in self.points.iter_mut() {
            *p = p.shift(pt);
        }
    }
    /// Multiply all coordinates by `factor`
    pub fn scale(&mut self, factor: f64) {
        for p in self.points.iter_mut() {
            *p = p.scale(factor);
        }
    }
    /// Mirror about the horizontal line `y = axis / 2`, i.e. map `y` to `axis - y`.
    /// Vertex order is reversed to retain orientation.
    pub fn mirror_y(&mut self, axis: Int) {
        for p in self.points.iter_mut() {
            p.y = axis.saturating_sub(p.y);
        }
        self.points.reverse();
    }
    /// New polygon with x and y swapped
    pub fn transposed(&self) -> Polygon {
        Polygon {
            points: self.points.iter().map(|p| p.transpose()).collect(),
        }
    }
    /// Midpoint of our bounding box
    pub fn centroid(&self) -> Point {
        let b = self.bbox();
        Point::new(
            ((b.p0.x as i64 + b.p1.x as i64) / 2) as Int,
            ((b.p0.y as i64 + b.p1.y as i64) / 2) as Int,
        )
    }
    /// Remove repeated consecutive vertices and colinear runs.
    /// May leave fewer than three points for degenerate input.
    pub fn clean(&mut self) {
        let pts = &mut self.points;
        pts.dedup();
        while pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        loop {
            let n = pts.len();
            if n < 3 {
                return;
            }
            let colinear = (0..n).find(|&i| {
                let (prev, cur, next) = (&pts[(i + n - 1) % n], &pts[i], &pts[(i + 1) % n]);
                cross(prev, cur, next) == 0
            });
            match colinear {
                Some(i) => {
                    pts.remove(i);
                }
                None => return,
            }
        }
    }
    /// Boolean indication of whether any edge has zero length
    pub fn has_zero_edge(&self) -> bool {
        let n = self.points.len();
        (0..n).any(|i| self.points[i] == self.points[(i + 1) % n])
    }
}
impl BoundBoxTrait for Polygon {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().intersection(bbox)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().union(bbox)
    }
    fn bbox(&self) -> BoundBox {
        self.points
            .iter()
            .fold(BoundBox::empty(), |b, pt| b.union(&pt.bbox()))
    }
}

/// # Placement Transform
///
/// Affine map `p -> a * p + b`, with `a` a row-major 2x2 matrix.
/// Reference placements compose these down the hierarchy.
///
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: [[f64; 2]; 2],
    pub b: [f64; 2],
}
impl Transform {
    pub fn identity() -> Self {
        Self::translate(0., 0.)
    }
    /// Pure translation
    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            a: [[1., 0.], [0., 1.]],
            b: [x, y],
        }
    }
    /// Transform for a reference placed at `loc`.
    /// Reflection about the x-axis applies first, then magnification, then rotation by
    /// `angle` degrees counter-clockwise, then translation.
    pub fn from_ref(loc: &Point, reflect_vert: bool, mag: Option<f64>, angle: Option<f64>) -> Self {
        let (sin, cos) = sincos(angle.unwrap_or(0.));
        let m = mag.unwrap_or(1.);
        let r = if reflect_vert { -1. } else { 1. };
        Self {
            a: [[m * cos, -m * sin * r], [m * sin, m * cos * r]],
            b: [loc.x as f64, loc.y as f64],
        }
    }
    /// Composition applying `child` first, then `parent`
    pub fn cascade(parent: &Transform, child: &Transform) -> Transform {
        let [bx, by] = parent.apply(child.b[0], child.b[1]);
        let col = |j: usize| parent.linear().apply(child.a[0][j], child.a[1][j]);
        let (c0, c1) = (col(0), col(1));
        Self {
            a: [[c0[0], c1[0]], [c0[1], c1[1]]],
            b: [bx, by],
        }
    }
    /// Map (x, y)
    fn apply(&self, x: f64, y: f64) -> [f64; 2] {
        let a = &self.a;
        [
            a[0][0] * x + a[0][1] * y + self.b[0],
            a[1][0] * x + a[1][1] * y + self.b[1],
        ]
    }
    /// Map vector `v` through the linear part only, rounding the result
    pub fn apply_vec(&self, v: &Point) -> Point {
        let [x, y] = self.linear().apply(v.x as f64, v.y as f64);
        Point::new(x.round() as Int, y.round() as Int)
    }
    /// Translation, rounded to integer coordinates
    pub fn offset(&self) -> Point {
        Point::new(self.b[0].round() as Int, self.b[1].round() as Int)
    }
    /// Copy with the translation removed
    pub fn linear(&self) -> Transform {
        Self { a: self.a, b: [0., 0.] }
    }
    /// Negative for mirroring transforms
    fn determinant(&self) -> f64 {
        self.a[0][0] * self.a[1][1] - self.a[0][1] * self.a[1][0]
    }
}
/// Sine and cosine of `angle` degrees, exact at multiples of 90
fn sincos(angle: f64) -> (f64, f64) {
    let quarter = angle / 90.;
    if quarter.fract() == 0. {
        return match (quarter as i64).rem_euclid(4) {
            0 => (0., 1.),
            1 => (1., 0.),
            2 => (0., -1.),
            _ => (-1., 0.),
        };
    }
    let rad = angle.to_radians();
    (rad.sin(), rad.cos())
}
impl Polygon {
    /// Placed copy under `trans`, keeping our orientation for mirroring transforms
    pub fn transform(&self, trans: &Transform) -> Polygon {
        let mut points: Vec<Point> = self.points.iter().map(|p| p.transform(trans)).collect();
        if trans.determinant() < 0. {
            points.reverse();
        }
        Polygon { points }
    }
}
