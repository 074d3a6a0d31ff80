//! Generator error types.

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that abort a generation run.
#[derive(Error, Diagnostic, Debug)]
pub enum GeneratorError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to access '{}': {message}", path.display())]
    #[diagnostic(code(svcmirror::io::error))]
    Io {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Registry Errors
    // =========================================================================
    #[error("Service registry at '{url}' is unavailable: {message}")]
    #[diagnostic(
        code(svcmirror::registry::unavailable),
        help("Check the registry URL and that the registry is reachable from this host")
    )]
    RegistryUnavailable {
        url: String,
        message: String,
    },

    #[error("Service '{name}' has no registry entry")]
    #[diagnostic(
        code(svcmirror::registry::record_not_found),
        help("Run `svcmirror list` to see the names the registry currently knows")
    )]
    RecordNotFound {
        name: String,
    },

    #[error("Registry record for '{name}' is malformed: {message}")]
    #[diagnostic(code(svcmirror::registry::invalid_record))]
    InvalidRecord {
        name: String,
        message: String,
    },

    // =========================================================================
    // Generated Tree Errors
    // =========================================================================
    #[error("No ancestor of '{}' contains a node_modules directory", start.display())]
    #[diagnostic(
        code(svcmirror::rewrite::dependency_root_not_found),
        help("Generated imports resolve against the nearest node_modules directory; run inside a project with installed dependencies")
    )]
    DependencyRootNotFound {
        start: PathBuf,
    },
}

impl GeneratorError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }
}
