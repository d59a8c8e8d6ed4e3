//!
//! # Electron-Beam Lithography Data
//!
//! Converts hierarchical layout libraries into flat, device-constrained exposure data
//! for an electron-beam pattern generator.
//!
//! The conversion pipeline, driven by [Chip::fracture]:
//! * Flatten the reference hierarchy into one [Cell] per concrete placement ([hier], [convert])
//! * Scale into device units and flip into image coordinates
//! * Split arrays exceeding the device repeat limit, or straddling field boundaries ([array])
//! * Slice polygons along field boundaries ([slice])
//! * Fracture polygons into device primitives ([fracture], [primitive])
//! * Assign geometry to exposure fields and order them ([field])
//!
//! The resulting [Chip] is summarized for the stream writer by [export::Exposure].
//!

// Internal modules & re-exports
pub use eld21utils as utils;

pub mod array;
pub mod bbox;
pub mod chip;
pub mod config;
pub mod convert;
pub mod data;
pub mod error;
pub mod export;
pub mod field;
pub mod fracture;
pub mod geom;
pub mod hier;
pub mod library;
pub mod primitive;
pub mod slice;

pub use bbox::{BoundBox, BoundBoxTrait};
pub use chip::Chip;
pub use config::{ConverterConfig, FractureLimits, WriterMode};
pub use data::{ArrayParams, Canvas, Cell, CellId, CellKey, Pattern};
pub use error::{LayoutError, LayoutResult};
pub use export::Exposure;
pub use field::{Field, FieldGrid, FieldId};
pub use geom::{Dir, Point, Polygon, Transform};
pub use hier::{AccessCode, HierarchyBranch};
pub use library::Library;
pub use primitive::{Primitive, PrimitiveKind, Rejection};

#[cfg(test)]
mod tests;

/// Integer coordinate type
pub type Int = i32;
