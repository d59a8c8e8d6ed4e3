//!
//! # Input Layout Library
//!
//! Hierarchical layout data, as handed over by a stream-format reader:
//! named [Structure]s holding [Boundary] polygons,
//! and single ([StructRef]) and array ([ArrayRef]) references to other structures.
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::error::{ErrorContext, LayoutError, LayoutResult};
use crate::geom::{Point, Polygon, Transform};
use crate::utils::SerdeFile;

fn is_false(b: &bool) -> bool {
    !b
}

///
/// # Library
///
/// Collection of [Structure]s, in database units of `units` meters each.
///
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Library {
    pub name: String,
    /// Database unit, in meters
    pub units: f64,
    pub structs: Vec<Structure>,
}
impl Library {
    /// Create a new and empty [Library]
    pub fn new(name: impl Into<String>, units: f64) -> Self {
        Self {
            name: name.into(),
            units,
            structs: Vec::new(),
        }
    }
    /// Map from structure name to index in `structs`.
    /// Fails on duplicate names.
    pub fn index(&self) -> LayoutResult<HashMap<&str, usize>> {
        let mut rv = HashMap::with_capacity(self.structs.len());
        for (idx, s) in self.structs.iter().enumerate() {
            if rv.insert(s.name.as_str(), idx).is_some() {
                return Err(LayoutError::input(format!("Duplicate structure name {}", s.name))
                    .context(ErrorContext::Library(self.name.clone())));
            }
        }
        Ok(rv)
    }
    /// Retrieve the structure named `name`
    pub fn structure(&self, name: &str) -> Option<&Structure> {
        self.structs.iter().find(|s| s.name == name)
    }
}
impl SerdeFile for Library {}

/// # Structure
/// Named collection of boundaries and references
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Structure {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boundaries: Vec<Boundary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub srefs: Vec<StructRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arefs: Vec<ArrayRef>,
}
impl Structure {
    /// Create a new and empty [Structure]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

///
/// # Boundary
///
/// Closed polygon on layer `layer`. Its `datatype` selects the exposure shot rank.
///
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Boundary {
    pub layer: i16,
    pub datatype: i16,
    /// Vertices, with the first repeated at the end
    pub xy: Vec<Point>,
}
impl Boundary {
    /// Convert to a [Polygon]
    pub fn polygon(&self) -> LayoutResult<Polygon> {
        Polygon::from_closed(&self.xy)
    }
}

/// # Reflection, Magnification and Rotation Settings
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Strans {
    /// Reflection about the x-axis, applied before rotation
    #[serde(default, skip_serializing_if = "is_false")]
    pub reflected: bool,
    /// Magnification factor, unity if unspecified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag: Option<f64>,
    /// Angle, in degrees counter-clockwise, zero if unspecified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}

/// Placement transform at `origin` with optional settings `strans`
fn placement(origin: &Point, strans: &Option<Strans>) -> Transform {
    match strans {
        Some(s) => Transform::from_ref(origin, s.reflected, s.mag, s.angle),
        None => Transform::translate(origin.x as f64, origin.y as f64),
    }
}

/// # Single Structure Reference
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StructRef {
    /// Referenced structure name
    pub name: String,
    /// Placement origin
    pub xy: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strans: Option<Strans>,
}
impl StructRef {
    /// Transform placing the referenced structure into ours
    pub fn transform(&self) -> Transform {
        placement(&self.xy, &self.strans)
    }
}

///
/// # Array Structure Reference
///
/// `xy` holds three points: the origin, the origin displaced by `cols` column pitches,
/// and the origin displaced by `rows` row pitches.
///
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ArrayRef {
    /// Referenced structure name
    pub name: String,
    pub xy: [Point; 3],
    pub cols: i16,
    pub rows: i16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strans: Option<Strans>,
}
impl ArrayRef {
    /// Transform placing the first element of the referenced structure into ours
    pub fn transform(&self) -> Transform {
        placement(&self.xy[0], &self.strans)
    }
    /// Check repeat counts are positive
    pub fn validate(&self) -> LayoutResult<()> {
        if self.cols < 1 || self.rows < 1 {
            return Err(LayoutError::input(format!(
                "Array reference to {} has non-positive repeat counts ({}, {})",
                self.name, self.cols, self.rows
            ))
            .context(ErrorContext::ArrayRef(self.name.clone())));
        }
        Ok(())
    }
    /// Column and row pitch vectors, in our coordinates
    pub fn pitches(&self) -> LayoutResult<(Point, Point)> {
        self.validate()?;
        let per = |end: &Point, n: i16| {
            let d = end.unshift(&self.xy[0]);
            Point::new(d.x / n as crate::Int, d.y / n as crate::Int)
        };
        Ok((per(&self.xy[1], self.cols), per(&self.xy[2], self.rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SerializationFormat;

    #[test]
    fn parse_library() -> LayoutResult<()> {
        let lib: Library = SerializationFormat::Yaml.from_str(
            r#"
            name: lib
            units: 1.0e-9
            structs:
              - name: top
                arefs:
                  - name: unit
                    xy: [{x: 0, y: 0}, {x: 1000, y: 0}, {x: 0, y: 600}]
                    cols: 10
                    rows: 3
              - name: unit
                boundaries:
                  - layer: 1
                    datatype: 2
                    xy: [{x: 0, y: 0}, {x: 50, y: 0}, {x: 50, y: 50}, {x: 0, y: 50}, {x: 0, y: 0}]
            "#,
        )?;
        assert_eq!(lib.structs.len(), 2);
        assert_eq!(lib.index()?["unit"], 1);
        let aref = &lib.structs[0].arefs[0];
        assert_eq!(aref.pitches()?, (Point::new(100, 0), Point::new(0, 200)));
        let unit = lib.structure("unit").ok_or("missing unit")?;
        assert_eq!(unit.boundaries[0].polygon()?.len(), 4);
        // Open point-lists are rejected
        let mut open = unit.boundaries[0].clone();
        open.xy.pop();
        assert!(open.polygon().is_err());
        Ok(())
    }
    #[test]
    fn invalid_refs() {
        let aref = ArrayRef {
            name: "x".into(),
            cols: 0,
            rows: 1,
            ..Default::default()
        };
        assert!(aref.pitches().is_err());
        let mut lib = Library::new("dup", 1e-9);
        lib.structs.push(Structure::new("a"));
        lib.structs.push(Structure::new("a"));
        assert!(lib.index().is_err());
    }
}
