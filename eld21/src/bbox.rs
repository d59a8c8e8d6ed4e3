//!
//! # Bounding Boxes
//!
//! Axis-aligned extents of polygons, patterns and cells.
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::{geom::Point, Int};

/// # Bounding Box
///
/// `p0` is the lower-left corner and `p1` the upper-right.
///
/// Empty boxes carry the sentinel corners `(Int::MAX, Int::MAX)` and `(0, 0)`,
/// and act as the identity under [BoundBoxTrait::union].
///
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct BoundBox {
    pub p0: Point,
    pub p1: Point,
}
impl BoundBox {
    /// Zero-size box at `pt`
    pub fn from_point(pt: Point) -> Self {
        Self { p0: pt, p1: pt }
    }
    /// Box spanning two opposite corners, given in any order
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            p0: lower(&a, &b),
            p1: upper(&a, &b),
        }
    }
    /// The empty sentinel box
    pub fn empty() -> Self {
        Self {
            p0: Point::new(Int::MAX, Int::MAX),
            p1: Point::new(0, 0),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.p0.x > self.p1.x || self.p0.y > self.p1.y
    }
    /// Whether `pt` is inside or on the edge
    pub fn contains(&self, pt: &Point) -> bool {
        (self.p0.x..=self.p1.x).contains(&pt.x) && (self.p0.y..=self.p1.y).contains(&pt.y)
    }
    /// Whether `other` lies entirely inside
    pub fn encloses(&self, other: &BoundBox) -> bool {
        other.is_empty() || (self.contains(&other.p0) && self.contains(&other.p1))
    }
    /// Width and height, zero if empty
    pub fn size(&self) -> (Int, Int) {
        if self.is_empty() {
            return (0, 0);
        }
        (
            self.p1.x.saturating_sub(self.p0.x),
            self.p1.y.saturating_sub(self.p0.y),
        )
    }
    /// Area of the box, zero if empty
    pub fn area(&self) -> i64 {
        let (w, h) = self.size();
        w as i64 * h as i64
    }
    /// Midpoint
    pub fn center(&self) -> Point {
        Point::new(
            ((self.p0.x as i64 + self.p1.x as i64) / 2) as Int,
            ((self.p0.y as i64 + self.p1.y as i64) / 2) as Int,
        )
    }
    /// Create a new box shifted by `pt`. Empty boxes stay empty.
    pub fn shift(&self, pt: &Point) -> BoundBox {
        if self.is_empty() {
            return *self;
        }
        Self {
            p0: self.p0.shift(pt),
            p1: self.p1.shift(pt),
        }
    }
}
impl Default for BoundBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// Per-axis minimum of two points
fn lower(a: &Point, b: &Point) -> Point {
    Point::new(a.x.min(b.x), a.y.min(b.y))
}
/// Per-axis maximum of two points
fn upper(a: &Point, b: &Point) -> Point {
    Point::new(a.x.max(b.x), a.y.max(b.y))
}

///
/// # Bounding Box Trait
///
/// Extent queries shared by [Point]s, [crate::Polygon]s and [BoundBox]es.
///
pub trait BoundBoxTrait {
    /// Overlap with `bbox`, empty if there is none
    fn intersection(&self, bbox: &BoundBox) -> BoundBox;
    /// Smallest box enclosing both ourselves and `bbox`
    fn union(&self, bbox: &BoundBox) -> BoundBox;
    /// Our own extent
    fn bbox(&self) -> BoundBox;
}

impl BoundBoxTrait for BoundBox {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        if self.is_empty() || bbox.is_empty() {
            return BoundBox::empty();
        }
        let overlap = BoundBox {
            p0: upper(&self.p0, &bbox.p0),
            p1: lower(&self.p1, &bbox.p1),
        };
        if overlap.is_empty() {
            return BoundBox::empty();
        }
        overlap
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        if self.is_empty() {
            return *bbox;
        }
        if bbox.is_empty() {
            return *self;
        }
        BoundBox {
            p0: lower(&self.p0, &bbox.p0),
            p1: upper(&self.p1, &bbox.p1),
        }
    }
    fn bbox(&self) -> BoundBox {
        *self
    }
}

impl BoundBoxTrait for Point {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        match bbox.contains(self) {
            true => BoundBox::from_point(*self),
            false => BoundBox::empty(),
        }
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        BoundBox::from_point(*self).union(bbox)
    }
    fn bbox(&self) -> BoundBox {
        BoundBox::from_point(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sentinel() {
        let e = BoundBox::empty();
        assert!(e.is_empty());
        assert_eq!(e.p0, Point::new(Int::MAX, Int::MAX));
        assert_eq!(e.p1, Point::new(0, 0));
        assert_eq!(e.size(), (0, 0));
    }
    #[test]
    fn union_with_empty_is_identity() {
        // Including boxes entirely in negative space
        let b = BoundBox::from_points(Point::new(-10, -20), Point::new(-5, -1));
        assert_eq!(BoundBox::empty().union(&b), b);
        assert_eq!(b.union(&BoundBox::empty()), b);
        let c = BoundBox::from_points(Point::new(0, 0), Point::new(3, 3));
        assert_eq!(
            b.union(&c),
            BoundBox::from_points(Point::new(-10, -20), Point::new(3, 3))
        );
        assert!(b.union(&c).encloses(&b));
        assert!(b.intersection(&c).is_empty());
    }
}
