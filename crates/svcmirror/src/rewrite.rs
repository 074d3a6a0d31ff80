//! Rewrites generated dependency references relative to the host project's
//! dependency root.
//!
//! The generated modules ship with bare `require('<package>')` references.
//! Those only resolve when the tree sits directly inside the host project;
//! re-pointing them at the nearest `node_modules` directory keeps the tree
//! loadable from wherever it was written.

use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostic::{GenerateWarning, GeneratorError};

/// Subdirectory whose presence marks a dependency root.
pub const DEPENDENCY_ROOT_MARKER: &str = "node_modules";

/// One generated file whose bare dependency reference gets rewritten.
#[derive(Debug, Clone, Copy)]
pub struct RewriteTarget {
    /// Path of the file, relative to the generated tree.
    pub file: &'static str,
    /// Package the file references by bare name.
    pub package: &'static str,
}

/// The fixed set of references the template tree ships with.
pub const REWRITE_TARGETS: &[RewriteTarget] = &[
    RewriteTarget {
        file: "index.js",
        package: "keypaths",
    },
    RewriteTarget {
        file: "rpc/call.js",
        package: "@grpc/grpc-js",
    },
];

/// Walks upward from `start` until an ancestor contains the marker
/// directory and returns that marker directory. The nearest ancestor wins.
pub fn find_dependency_root(start: &Path) -> Result<PathBuf, GeneratorError> {
    let canonical = start
        .canonicalize()
        .map_err(|e| GeneratorError::io(start, e.to_string()))?;

    let mut dir = canonical.as_path();
    loop {
        let marker = dir.join(DEPENDENCY_ROOT_MARKER);
        if marker.is_dir() {
            return Ok(marker);
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => {
                return Err(GeneratorError::DependencyRootNotFound {
                    start: canonical.clone(),
                })
            }
        }
    }
}

/// Rewrites every target's bare reference into one relative to the nearest
/// dependency root. Runs after injection; only the first occurrence in each
/// file is touched, and a reference that is already gone is reported rather
/// than treated as fatal.
pub fn rewrite_dependency_paths(dest: &Path) -> Result<Vec<GenerateWarning>, GeneratorError> {
    let root = find_dependency_root(dest)?;
    let dest = dest
        .canonicalize()
        .map_err(|e| GeneratorError::io(dest, e.to_string()))?;

    let mut warnings = Vec::new();

    for target in REWRITE_TARGETS {
        let path = dest.join(target.file);
        let parent = path.parent().unwrap_or(&dest).to_path_buf();

        let content =
            fs::read_to_string(&path).map_err(|e| GeneratorError::io(&path, e.to_string()))?;

        let bare = format!("require('{}')", target.package);
        if !content.contains(&bare) {
            warnings.push(GenerateWarning::DependencyReferenceMissing {
                file: target.file.to_string(),
                package: target.package.to_string(),
            });
            continue;
        }

        let relative = pathdiff::diff_paths(&root, &parent).unwrap_or_else(|| root.clone());
        let rewritten = format!("require('{}/{}')", relative.display(), target.package);
        let content = content.replacen(&bare, &rewritten, 1);
        fs::write(&path, content).map_err(|e| GeneratorError::io(&path, e.to_string()))?;
    }

    Ok(warnings)
}
