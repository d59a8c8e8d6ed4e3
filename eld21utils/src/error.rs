//!
//! # Walker Error Helpers
//!
//! Library walkers (the hierarchy flattener and the canvas converter) carry a
//! stack of what they are currently visiting. [ErrorHelper] turns a message into
//! an error annotated with that stack, and [Unwrapper] applies it post-fix.
//!
//! ```rust
//! use eld21utils::error::{ErrorHelper, Unwrapper};
//!
//! struct Walker {
//!     structure: String,
//! }
//! impl ErrorHelper for Walker {
//!     type Error = String;
//!     fn err(&self, msg: impl Into<String>) -> Self::Error {
//!         format!("In structure {}: {}", self.structure, msg.into())
//!     }
//! }
//! impl Walker {
//!     fn walk(&self) -> Result<usize, String> {
//!         let idx = Some(3).unwrapper(self, "Undefined reference")?;
//!         self.assert(idx < 5, "Index out of range")?;
//!         Ok(idx)
//!     }
//! }
//! ```
//!

///
/// # ErrorHelper
///
/// Implementers supply `err`, building their error type from a message plus
/// whatever context they hold. The remaining methods are built on it.
///
pub trait ErrorHelper {
    type Error;

    /// Build an error from `msg`
    fn err(&self, msg: impl Into<String>) -> Self::Error;
    /// Build an error from `msg`, wrapped in `Err`
    fn fail<T>(&self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Extract the value of `opt`, or fail with `msg`
    fn unwrap<T>(&self, opt: Option<T>, msg: impl Into<String>) -> Result<T, Self::Error> {
        opt.ok_or_else(|| self.err(msg))
    }
    /// Fail with `msg` unless `cond` holds
    fn assert(&self, cond: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        if cond {
            Ok(())
        } else {
            self.fail(msg)
        }
    }
}

///
/// # Unwrapper
///
/// Post-fix form of [ErrorHelper::unwrap], for both [Option] and [Result].
/// Failures are reported through the helper's error type; for [Result]
/// the original error value is dropped in favor of `msg`.
///
pub trait Unwrapper: Sized {
    type Ok;
    /// Convert into an [Option], discarding any error value
    fn into_option(self) -> Option<Self::Ok>;
    /// Extract the success value, or fail through `helper` with `msg`
    fn unwrapper<H: ErrorHelper>(
        self,
        helper: &H,
        msg: impl Into<String>,
    ) -> Result<Self::Ok, H::Error> {
        helper.unwrap(self.into_option(), msg)
    }
}
impl<T> Unwrapper for Option<T> {
    type Ok = T;
    fn into_option(self) -> Option<T> {
        self
    }
}
impl<T, E> Unwrapper for Result<T, E> {
    type Ok = T;
    fn into_option(self) -> Option<T> {
        self.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(usize);
    impl ErrorHelper for Counter {
        type Error = String;
        fn err(&self, msg: impl Into<String>) -> String {
            format!("[{}] {}", self.0, msg.into())
        }
    }

    #[test]
    fn unwrapper_routes_to_helper() {
        let h = Counter(7);
        let none: Option<u8> = None;
        assert_eq!(none.unwrapper(&h, "missing"), Err("[7] missing".to_string()));
        let bad: Result<u8, ()> = Err(());
        assert_eq!(bad.unwrapper(&h, "bad"), Err("[7] bad".to_string()));
        assert_eq!(Some(3).unwrapper(&h, "unused"), Ok(3));
        assert_eq!(h.assert(false, "nope"), Err("[7] nope".to_string()));
        assert_eq!(h.assert(true, "fine"), Ok(()));
    }
}
