/// Enumerated conversion contexts
/// Generally used for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorContext {
    /// Input library, by name
    Library(String),
    /// Library structure, by name
    Structure(String),
    /// Single reference to the named structure
    StructRef(String),
    /// Array reference to the named structure
    ArrayRef(String),
    /// Canvas or field cell, by id
    Cell(usize),
    /// Exposure field, by id
    Field(usize),
    Units,
}
