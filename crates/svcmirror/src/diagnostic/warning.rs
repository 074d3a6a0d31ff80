//! Non-fatal conditions surfaced by a generation run.

use std::fmt;

/// A condition that did not abort the run but that callers should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateWarning {
    /// A substitution marker was absent from the destination data file, so
    /// that block was left unchanged.
    MarkerMissing { marker: &'static str },

    /// A catalogue path was a strict prefix of a deeper path; its leaf
    /// definition was displaced by the branch the deeper path needed.
    PrefixConflict { service: String, path: String },

    /// A rewrite target no longer contained the bare dependency reference.
    DependencyReferenceMissing { file: String, package: String },
}

impl fmt::Display for GenerateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkerMissing { marker } => {
                write!(f, "marker {} not found in the data file, block left unchanged", marker)
            }
            Self::PrefixConflict { service, path } => {
                write!(
                    f,
                    "service '{}': leaf at '{}' replaced by the paths nested beneath it",
                    service, path
                )
            }
            Self::DependencyReferenceMissing { file, package } => {
                write!(f, "'{}' has no bare require('{}') left to rewrite", file, package)
            }
        }
    }
}
