//! Substitutes captured registry data into the generated data file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};

use crate::diagnostic::GeneratorError;
use crate::registry::Endpoint;

/// Marker replaced by the connection-metadata block.
pub const ENDPOINTS_MARKER: &str = "`{endpoints}`";

/// Marker replaced by the API-tree block.
pub const APIS_MARKER: &str = "`{apis}`";

/// Name of the data file inside the generated tree.
pub const DATA_FILE: &str = "data.js";

/// Which of the two substitutions actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectOutcome {
    pub endpoints_replaced: bool,
    pub apis_replaced: bool,
}

impl InjectOutcome {
    /// True when both markers were found and replaced.
    pub fn complete(&self) -> bool {
        self.endpoints_replaced && self.apis_replaced
    }
}

/// Replaces the first occurrence of each marker in `<dest>/data.js` with
/// the serialized endpoint map and API trees. A marker that is absent
/// leaves its block untouched and is reported through the outcome, never
/// as an error; a freshly scaffolded tree always carries both markers.
pub fn inject_data_file(
    dest: &Path,
    endpoints: &BTreeMap<String, Endpoint>,
    apis: &BTreeMap<String, Value>,
) -> Result<InjectOutcome, GeneratorError> {
    let path = dest.join(DATA_FILE);
    let content =
        fs::read_to_string(&path).map_err(|e| GeneratorError::io(&path, e.to_string()))?;

    let (content, endpoints_replaced) =
        replace_first(&content, ENDPOINTS_MARKER, &to_pretty_json(&path, endpoints)?);
    let (content, apis_replaced) =
        replace_first(&content, APIS_MARKER, &to_pretty_json(&path, apis)?);

    fs::write(&path, content).map_err(|e| GeneratorError::io(&path, e.to_string()))?;

    Ok(InjectOutcome {
        endpoints_replaced,
        apis_replaced,
    })
}

fn replace_first(content: &str, marker: &str, replacement: &str) -> (String, bool) {
    if content.contains(marker) {
        (content.replacen(marker, replacement, 1), true)
    } else {
        (content.to_string(), false)
    }
}

/// Pretty-prints with the four-space indent the data file convention uses.
fn to_pretty_json<T: Serialize>(path: &Path, value: &T) -> Result<String, GeneratorError> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| GeneratorError::io(path, format!("failed to serialize data block: {}", e)))?;
    String::from_utf8(out).map_err(|e| GeneratorError::io(path, e.to_string()))
}
