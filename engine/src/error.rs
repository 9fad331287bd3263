//! FILENAME: engine/src/error.rs
//! PURPOSE: The error kinds a sheet operation can raise to its caller.
//! CONTEXT: Arithmetic/reference failures inside a formula never surface
//! here — they are embedded as `parser::FormulaError` values instead. Only
//! the three kinds below abort an operation and leave the sheet untouched.

use thiserror::Error;

use position::Position;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum SheetError {
    #[error("invalid position: {0:?}")]
    InvalidPosition(Position),

    #[error("formula parse error at {0:?}: {1}")]
    FormulaParseError(Position, String),

    #[error("circular dependency detected at {0:?}")]
    CircularDependency(Position),
}
