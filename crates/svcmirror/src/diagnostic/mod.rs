//! Diagnostic types for error and warning reporting.

mod error;
mod warning;

pub use error::GeneratorError;
pub use warning::GenerateWarning;
