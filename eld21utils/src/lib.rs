//!
//! # Eld21 Internal Utilities Crate
//!
//! Shared helpers for the `eld21` fracturing engine:
//! error-reporting helpers for tree-walkers, reference-graph ordering with cycle detection,
//! serialized file IO, and enum-string mapping.
//!

pub mod ser;
pub use ser::*;

pub mod error;
pub use error::*;

pub mod context;
pub use context::*;

pub mod dep_order;
pub use dep_order::*;

pub mod enumstr;
pub use enumstr::*;
