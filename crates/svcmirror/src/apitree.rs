//! Builds nested callable trees out of flat dotted key paths.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::registry::ApiCatalogue;

/// Separator between key-path segments.
pub const PATH_DELIMITER: &str = ".";

/// A catalogue path whose leaf definition was displaced by deeper paths
/// nested beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixConflict {
    /// The dotted path whose leaf was dropped.
    pub path: String,
}

/// Converts one service's flat catalogue into its nested tree form.
///
/// Each dotted path becomes one nesting level per segment with the leaf
/// definition attached at the terminal segment. Keys are taken in sorted
/// order, so a path that is a strict prefix of another is visited first and
/// its leaf gets replaced by the branch the deeper paths need; every such
/// displacement is reported. An empty catalogue yields an empty tree, and a
/// single-segment path sits directly at the top level.
pub fn build(catalogue: &ApiCatalogue) -> (Value, Vec<PrefixConflict>) {
    let mut root = Map::new();
    let mut leaves = HashSet::new();
    let mut conflicts = Vec::new();

    for (path, leaf) in catalogue {
        insert(&mut root, path, leaf.clone(), &mut leaves, &mut conflicts);
    }

    (Value::Object(root), conflicts)
}

fn insert(
    root: &mut Map<String, Value>,
    path: &str,
    leaf: Value,
    leaves: &mut HashSet<String>,
    conflicts: &mut Vec<PrefixConflict>,
) {
    let mut segments: Vec<&str> = path.split(PATH_DELIMITER).collect();
    let last = match segments.pop() {
        Some(last) => last,
        None => return,
    };

    let mut node = root;
    let mut walked = String::new();

    for segment in segments {
        if !walked.is_empty() {
            walked.push_str(PATH_DELIMITER);
        }
        walked.push_str(segment);

        let entry = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        // A shorter path owns a leaf here; the deeper path wins. The leaf
        // set, not the value's shape, decides: an object-valued leaf is
        // displaced the same as a scalar one, never merged into.
        if leaves.remove(&walked) {
            conflicts.push(PrefixConflict {
                path: walked.clone(),
            });
            *entry = Value::Object(Map::new());
        }
        node = entry
            .as_object_mut()
            .expect("non-leaf entries are branch objects");
    }

    node.insert(last.to_string(), leaf);
    leaves.insert(path.to_string());
}

/// Flattens a nested tree back into sorted dotted key paths.
///
/// The inverse of [`build`] for catalogues whose leaf definitions are not
/// themselves non-empty objects; a non-empty object reads as a branch.
pub fn flatten(tree: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    if let Value::Object(map) = tree {
        for (key, child) in map {
            collect(key.clone(), child, &mut paths);
        }
    }
    paths
}

fn collect(prefix: String, node: &Value, paths: &mut Vec<String>) {
    match node {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                collect(format!("{}{}{}", prefix, PATH_DELIMITER, key), child, paths);
            }
        }
        _ => paths.push(prefix),
    }
}
