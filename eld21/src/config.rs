//!
//! # Converter Configuration
//!
//! Writer modes, exposure field size, array repeat limits and fracturing bounds.
//! Loadable from JSON, YAML or TOML through [SerdeFile].
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::error::{LayoutError, LayoutResult};
use crate::utils::{enumstr, EnumStr, SerdeFile};
use crate::Int;

enumstr!(
    /// # Pattern-Generator Writer Modes
    ///
    /// Each mode fixes the pattern-data resolution, and with it the size of an exposure field.
    WriterMode {
        Mode2: "2",
        Mode4: "4",
    }
);
impl WriterMode {
    /// Pattern-data resolution, in points per micron
    pub fn points_per_um(&self) -> u32 {
        match self {
            Self::Mode2 => 200,
            Self::Mode4 => 2000,
        }
    }
    /// Default exposure field size, in points
    pub fn field_size(&self) -> Int {
        200_000
    }
    /// Scale factor converting database units of `db_unit` meters into our pattern-data points
    pub fn scale(&self, db_unit: f64) -> f64 {
        db_unit / (1e-6 / self.points_per_um() as f64)
    }
}
impl Default for WriterMode {
    fn default() -> Self {
        Self::Mode4
    }
}

/// Pattern-generator hardware limits
pub mod limits {
    use crate::Int;
    /// Largest repeat count along either array axis
    pub const MAX_REPEAT: u32 = 2047;
    /// Largest array extent, repeat count times pitch, along either axis
    pub const MAX_ARRAY_EXTENT: i64 = 1_000_000;
    /// Largest primitive vertex coordinate, relative to its field
    pub const MAX_VERTEX: Int = 1 << 20;
    /// Largest absolute pattern position
    pub const MAX_POSITION: Int = 2_000_000;
    /// Smallest and largest exposure field sizes.
    /// Primitive vertices are field-relative, so no field may exceed the vertex range.
    pub const MIN_FIELD: Int = 50;
    pub const MAX_FIELD: Int = MAX_VERTEX;
}

/// # Fracturing Bounds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FractureLimits {
    /// Non-primitive pieces with bounding area at or below this are dropped
    pub area_floor: i64,
    /// Largest number of worklist steps fracturing a single polygon
    pub max_steps: usize,
    /// Largest number of axis alternations for any piece
    pub max_depth: usize,
}
impl Default for FractureLimits {
    fn default() -> Self {
        Self {
            area_floor: 10,
            max_steps: 1_000_000,
            max_depth: 64,
        }
    }
}

/// # Converter Configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConverterConfig {
    /// Writer mode, setting resolution and default field size
    pub mode: WriterMode,
    /// Exposure field size in points, overriding the mode's default
    pub field_size: Option<Int>,
    /// Largest repeat count per array axis before splitting
    pub max_array_length: u32,
    /// Fracturing bounds
    pub fracture: FractureLimits,
}
impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            mode: WriterMode::default(),
            field_size: None,
            max_array_length: 2000,
            fracture: FractureLimits::default(),
        }
    }
}
impl ConverterConfig {
    /// Exposure field size, in points
    pub fn field_size(&self) -> Int {
        self.field_size.unwrap_or_else(|| self.mode.field_size())
    }
    /// Check all settings lie within hardware range
    pub fn validate(&self) -> LayoutResult<()> {
        let fs = self.field_size();
        if fs < limits::MIN_FIELD || fs > limits::MAX_FIELD {
            return Err(LayoutError::input(format!(
                "Field size {} outside [{}, {}]",
                fs,
                limits::MIN_FIELD,
                limits::MAX_FIELD
            )));
        }
        if self.max_array_length == 0 || self.max_array_length > limits::MAX_REPEAT {
            return Err(LayoutError::input(format!(
                "Max array length {} outside [1, {}]",
                self.max_array_length,
                limits::MAX_REPEAT
            )));
        }
        Ok(())
    }
    /// Parse a writer mode from its string value, e.g. "2" or "4"
    pub fn with_mode_str(mut self, mode: &str) -> LayoutResult<Self> {
        self.mode = WriterMode::from_str(mode).ok_or_else(|| {
            LayoutError::input(format!(
                "Unknown writer mode {}, expected one of {:?}",
                mode,
                WriterMode::names()
            ))
        })?;
        Ok(self)
    }
}
impl SerdeFile for ConverterConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SerializationFormat;

    #[test]
    fn writer_modes() {
        assert_eq!(WriterMode::Mode2.points_per_um(), 200);
        assert_eq!(WriterMode::Mode4.points_per_um(), 2000);
        // One nanometer database units, in mode 4 half-nanometer points
        assert!((WriterMode::Mode4.scale(1e-9) - 2.0).abs() < 1e-12);
        assert!((WriterMode::Mode2.scale(1e-9) - 0.2).abs() < 1e-12);
    }
    #[test]
    fn parse_config() -> LayoutResult<()> {
        let cfg: ConverterConfig = SerializationFormat::Yaml.from_str(
            r#"
            mode: Mode2
            field_size: 100000
            fracture:
              area_floor: 4
            "#,
        )?;
        assert_eq!(cfg.mode, WriterMode::Mode2);
        assert_eq!(cfg.field_size(), 100_000);
        assert_eq!(cfg.max_array_length, 2000);
        assert_eq!(cfg.fracture.area_floor, 4);
        assert_eq!(cfg.fracture.max_depth, 64);
        cfg.validate()?;
        Ok(())
    }
    #[test]
    fn invalid_config() -> LayoutResult<()> {
        let cfg = ConverterConfig {
            max_array_length: 5000,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        // Fields beyond the primitive vertex range
        let cfg = ConverterConfig {
            field_size: Some(limits::MAX_VERTEX + 1),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = ConverterConfig {
            field_size: Some(limits::MAX_VERTEX),
            ..Default::default()
        };
        cfg.validate()?;
        let cfg = ConverterConfig::default().with_mode_str("2")?;
        assert_eq!(cfg.mode, WriterMode::Mode2);
        assert!(ConverterConfig::default().with_mode_str("3").is_err());
        Ok(())
    }
}
