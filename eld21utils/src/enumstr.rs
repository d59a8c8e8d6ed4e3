//!
//! # Named Settings Enums
//!
//! Settings such as the pattern-generator writer mode arrive as text.
//! The [enumstr] macro declares a fieldless enum together with the table
//! of its string names, and [EnumStr] looks names up in either direction.
//!
//! ```rs
//! use eld21utils::enumstr;
//!
//! enumstr!(
//!     /// # Beam Blanking States
//!     Blanking {
//!         On: "on",
//!         Off: "off",
//!     }
//! );
//! ```
//!

///
/// # Name-Table Lookups
///
/// Implementers provide `table`, pairing every variant with its name in
/// declaration order. Lookups are case-sensitive.
///
pub trait EnumStr: Copy + PartialEq + Sized + 'static {
    /// All variants with their names
    fn table() -> &'static [(Self, &'static str)];

    /// Name of this variant
    fn to_str(&self) -> &'static str {
        Self::table()
            .iter()
            .find(|(v, _)| v == self)
            .map_or("", |(_, name)| name)
    }
    /// Variant named `txt`, if any
    fn from_str(txt: &str) -> Option<Self> {
        Self::table()
            .iter()
            .find(|(_, name)| *name == txt)
            .map(|(v, _)| *v)
    }
    /// All variants, in declaration order
    fn variants() -> Vec<Self> {
        Self::table().iter().map(|(v, _)| *v).collect()
    }
    /// All names, in declaration order
    fn names() -> Vec<&'static str> {
        Self::table().iter().map(|(_, name)| *name).collect()
    }
}

///
/// # Named-Enum Declaration Macro
///
/// Declares the enum, implements [EnumStr] from its name table, and displays
/// variants by name. The derived traits include `serde::{Serialize, Deserialize}`,
/// which must be in scope where the macro is invoked.
///
#[macro_export]
macro_rules! enumstr {
    (
        $(#[$attr:meta])*
        $name:ident { $( $variant:ident : $text:literal ),* $(,)? }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( #[doc = $text] $variant, )*
        }
        impl EnumStr for $name {
            fn table() -> &'static [(Self, &'static str)] {
                &[ $( (Self::$variant, $text), )* ]
            }
        }
        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.to_str())
            }
        }
    };
}
