//! Materializes the template tree at the destination.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::assets;
use crate::diagnostic::GeneratorError;

/// Seeds `dest` with the template tree, creating missing directories and
/// overwriting template files that already exist. Files at the destination
/// the template does not carry are left alone; there is no merge beyond
/// that.
pub fn scaffold(dest: &Path, template_dir: Option<&Path>) -> Result<(), GeneratorError> {
    fs::create_dir_all(dest).map_err(|e| GeneratorError::io(dest, e.to_string()))?;

    match template_dir {
        Some(dir) => copy_tree(dir, dest),
        None => write_embedded(dest),
    }
}

fn write_embedded(dest: &Path) -> Result<(), GeneratorError> {
    for (relative, content) in assets::template_files() {
        let path = dest.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e.to_string()))?;
        }
        fs::write(&path, content).map_err(|e| GeneratorError::io(&path, e.to_string()))?;
    }
    Ok(())
}

/// Recursive overwrite-copy of a caller-supplied template directory.
fn copy_tree(from: &Path, dest: &Path) -> Result<(), GeneratorError> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| GeneratorError::io(from, e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| GeneratorError::io(entry.path(), e.to_string()))?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| GeneratorError::io(&target, e.to_string()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| GeneratorError::io(parent, e.to_string()))?;
            }
            fs::copy(entry.path(), &target)
                .map_err(|e| GeneratorError::io(&target, e.to_string()))?;
        }
    }
    Ok(())
}
