//!
//! # Settings & Data File IO
//!
//! Reads and writes converter settings, input libraries and exposure descriptions
//! in any of the text formats listed in [SerializationFormat].
//!

// Std-Lib
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

// Crates.io
use serde::de::DeserializeOwned;
use serde::Serialize;
use textwrap::dedent;

/// # Supported Text Formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationFormat {
    Json,
    Yaml,
    Toml,
}
impl SerializationFormat {
    /// Infer the format from the extension of `fname`
    pub fn from_path(fname: impl AsRef<Path>) -> Result<Self, Error> {
        let path = fname.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(Error::msg(format!("Unknown data-file extension: {:?}", path))),
        }
    }
    /// Encode `data` as text
    pub fn to_string(&self, data: &impl Serialize) -> Result<String, Error> {
        let text = match self {
            Self::Json => serde_json::to_string_pretty(data)?,
            Self::Yaml => serde_yaml::to_string(data)?,
            Self::Toml => toml::to_string(data)?,
        };
        Ok(text)
    }
    /// Decode `txt`, after stripping any indentation shared by all its lines.
    /// Inline YAML in tests can then be indented along with the code around it.
    pub fn from_str<T: DeserializeOwned>(&self, txt: &str) -> Result<T, Error> {
        self.decode(&dedent(txt))
    }
    fn decode<T: DeserializeOwned>(&self, txt: &str) -> Result<T, Error> {
        let data = match self {
            Self::Json => serde_json::from_str(txt)?,
            Self::Yaml => serde_yaml::from_str(txt)?,
            Self::Toml => toml::from_str(txt)?,
        };
        Ok(data)
    }
    /// Write `data` to `fname`, replacing any existing content
    pub fn save(&self, data: &impl Serialize, fname: impl AsRef<Path>) -> Result<(), Error> {
        let text = self.to_string(data)?;
        let mut out = BufWriter::new(fs::File::create(fname)?);
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }
    /// Read and decode the content of `fname`
    pub fn open<T: DeserializeOwned>(&self, fname: impl AsRef<Path>) -> Result<T, Error> {
        let text = fs::read_to_string(fname)?;
        self.decode(&text)
    }
}

///
/// # Data-File Trait
///
/// Every method has a default, so serde-capable types opt in with an empty `impl`.
///
pub trait SerdeFile: Serialize + DeserializeOwned {
    /// Write to `fname` as `fmt`
    fn save(&self, fmt: SerializationFormat, fname: impl AsRef<Path>) -> Result<(), Error> {
        fmt.save(self, fname)
    }
    /// Read from `fname` as `fmt`
    fn open(fname: impl AsRef<Path>, fmt: SerializationFormat) -> Result<Self, Error> {
        fmt.open(fname)
    }
    /// Read from `fname`, in the format named by its extension
    fn load(fname: impl AsRef<Path>) -> Result<Self, Error> {
        SerializationFormat::from_path(&fname)?.open(fname)
    }
}

/// Boxed error from the IO or any of the format back-ends
#[derive(Debug)]
pub struct Error(Box<dyn std::error::Error + Send + Sync>);
impl Error {
    /// Create an [Error] from a string message
    pub fn msg(s: impl Into<String>) -> Self {
        let s: String = s.into();
        Self(s.into())
    }
}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for Error {}

macro_rules! boxed_from {
    ($($src:ty),* $(,)?) => {
        $(
            impl From<$src> for Error {
                fn from(e: $src) -> Self {
                    Self(Box::new(e))
                }
            }
        )*
    };
}
boxed_from!(
    std::io::Error,
    serde_json::Error,
    serde_yaml::Error,
    toml::de::Error,
    toml::ser::Error,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(
            SerializationFormat::from_path("mode.YML").ok(),
            Some(SerializationFormat::Yaml)
        );
        assert_eq!(
            SerializationFormat::from_path("chip.json").ok(),
            Some(SerializationFormat::Json)
        );
        assert!(SerializationFormat::from_path("chip.gds").is_err());
        assert!(SerializationFormat::from_path("noext").is_err());
    }
    #[test]
    fn parses_indented_yaml() -> Result<(), Error> {
        let v: Vec<i32> = SerializationFormat::Yaml.from_str(
            "
            - 1
            - 2
            ",
        )?;
        assert_eq!(v, vec![1, 2]);
        Ok(())
    }
}
