//! Template assets embedded at compile time.
//!
//! The files live under `templates/` and seed every generated tree. The
//! data file carries the two substitution markers the injector fills in,
//! and two of the modules carry bare dependency references the rewriter
//! re-points at the host project's dependency root.

/// Proxy-tree entry module.
pub const INDEX_JS: &str = include_str!("../templates/index.js");

/// Data file carrying the substitution markers.
pub const DATA_JS: &str = include_str!("../templates/data.js");

/// Transport shim the proxy leaves call through.
pub const RPC_CALL_JS: &str = include_str!("../templates/rpc/call.js");

/// Readme dropped next to the generated files.
pub const README_MD: &str = include_str!("../templates/README.md");

/// All template files as (relative path, content) pairs.
pub fn template_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("index.js", INDEX_JS),
        ("data.js", DATA_JS),
        ("rpc/call.js", RPC_CALL_JS),
        ("README.md", README_MD),
    ]
}
