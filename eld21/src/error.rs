//!
//! # Conversion Errors
//!
//! Failures are split by who must act on them: malformed input, content the
//! pattern generator cannot write, and fracturing that failed to converge.
//!

// Local Imports
use crate::bbox::BoundBox;
pub use crate::utils::{self, ErrorContext};

pub type LayoutResult<T> = Result<T, LayoutError>;

/// # Conversion Error
pub enum LayoutError {
    /// Invalid input data: malformed polygons, unknown ids, bad scale or repeat counts,
    /// undefined or cyclic references. Reported before any mutation.
    Input {
        message: String,
        stack: Vec<ErrorContext>,
    },
    /// Fractured data exceeding the pattern generator's limits
    DeviceLimit {
        message: String,
        bbox: Option<BoundBox>,
        stack: Vec<ErrorContext>,
    },
    /// Fracturing exceeded its iteration bound
    IterationLimit {
        message: String,
        bbox: Option<BoundBox>,
        stack: Vec<ErrorContext>,
    },
    /// File IO and parsing errors
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// Anything else
    Str(String),
}
impl LayoutError {
    /// Create a [LayoutError::Input] without context
    pub fn input(s: impl Into<String>) -> Self {
        Self::Input {
            message: s.into(),
            stack: Vec::new(),
        }
    }
    /// Create a [LayoutError::DeviceLimit] without context
    pub fn device(s: impl Into<String>, bbox: Option<BoundBox>) -> Self {
        Self::DeviceLimit {
            message: s.into(),
            bbox,
            stack: Vec::new(),
        }
    }
    /// Create a [LayoutError::IterationLimit] without context
    pub fn iteration(s: impl Into<String>, bbox: Option<BoundBox>) -> Self {
        Self::IterationLimit {
            message: s.into(),
            bbox,
            stack: Vec::new(),
        }
    }
    /// Push `ctx` onto our context-stack, if we have one
    pub fn context(mut self, ctx: ErrorContext) -> Self {
        match &mut self {
            Self::Input { stack, .. }
            | Self::DeviceLimit { stack, .. }
            | Self::IterationLimit { stack, .. } => stack.push(ctx),
            _ => (),
        }
        self
    }
    /// Set the offending extent to `extent`, unless already set
    pub fn with_bbox(mut self, extent: BoundBox) -> Self {
        match &mut self {
            Self::DeviceLimit { bbox, .. } | Self::IterationLimit { bbox, .. } => {
                bbox.get_or_insert(extent);
            }
            _ => (),
        }
        self
    }
}
impl std::fmt::Debug for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LayoutError::Input { message, stack } => {
                write!(f, "Input Error: \n - {} \n - {:?}", message, stack)
            }
            LayoutError::DeviceLimit {
                message,
                bbox,
                stack,
            } => match bbox {
                Some(b) => write!(
                    f,
                    "Device Limit Exceeded: \n - {} \n - extent ({}, {}) to ({}, {}) \n - {:?}",
                    message, b.p0.x, b.p0.y, b.p1.x, b.p1.y, stack
                ),
                None => write!(f, "Device Limit Exceeded: \n - {} \n - {:?}", message, stack),
            },
            LayoutError::IterationLimit {
                message,
                bbox,
                stack,
            } => match bbox {
                Some(b) => write!(
                    f,
                    "Iteration Limit Exceeded: \n - {} \n - extent ({}, {}) to ({}, {}) \n - {:?}",
                    message, b.p0.x, b.p0.y, b.p1.x, b.p1.y, stack
                ),
                None => write!(f, "Iteration Limit Exceeded: \n - {} \n - {:?}", message, stack),
            },
            LayoutError::Boxed(err) => write!(f, "{}", err),
            LayoutError::Str(err) => f.write_str(err),
        }
    }
}
impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Boxed(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<String> for LayoutError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for LayoutError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<utils::ser::Error> for LayoutError {
    fn from(e: utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
