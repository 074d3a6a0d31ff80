//! End-to-end pipeline tests against the in-memory registry backend.

use std::fs;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;

use svcmirror::registry::ApiCatalogue;
use svcmirror::{
    GenerateWarning, Generator, GeneratorConfig, GeneratorError, MemoryRegistry, RefreshScheduler,
    ServiceRecord,
};

fn record(name: &str, host: &str, port: u16, apis: &[(&str, Value)]) -> ServiceRecord {
    let apis: ApiCatalogue = apis
        .iter()
        .map(|(path, leaf)| (path.to_string(), leaf.clone()))
        .collect();
    ServiceRecord {
        name: name.to_string(),
        host: host.to_string(),
        port,
        apis,
    }
}

/// A host project root carrying the dependency marker, with the default
/// destination resolving inside it.
fn host_project(dir: &TempDir) -> GeneratorConfig {
    fs::create_dir_all(dir.path().join("node_modules")).unwrap();
    GeneratorConfig {
        base_dir: dir.path().to_path_buf(),
        ..GeneratorConfig::default()
    }
}

/// Extracts the JSON block assigned right after `anchor` in the generated
/// data file by balancing braces.
fn json_block_after(content: &str, anchor: &str) -> Value {
    let start = content.find(anchor).expect("anchor present") + anchor.len();
    let bytes = content[start..].as_bytes();
    assert_eq!(bytes[0], b'{', "block starts with an object");

    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate() {
        match *b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return serde_json::from_str(&content[start..start + i + 1])
                        .expect("block parses as JSON");
                }
            }
            _ => {}
        }
    }
    panic!("unbalanced block after {}", anchor);
}

#[tokio::test]
async fn end_to_end_writes_parseable_blocks() {
    let dir = TempDir::new().unwrap();
    let registry = MemoryRegistry::new();
    registry.insert(record("s1", "127.0.0.1", 9000, &[("say.hi", json!({}))]));

    let generator = Generator::new(host_project(&dir));
    let report = generator.run_once(&registry).await.unwrap();

    assert_eq!(report.services, 1);
    assert_eq!(report.procedures, 1);
    assert!(report.warnings.is_empty());
    assert!(report.dest.ends_with("lib/services"));

    let content = fs::read_to_string(report.dest.join("data.js")).unwrap();
    assert_eq!(
        json_block_after(&content, "const endpoints = "),
        json!({"s1": {"host": "127.0.0.1", "port": 9000}})
    );
    assert_eq!(
        json_block_after(&content, "const apis = "),
        json!({"s1": {"say": {"hi": {}}}})
    );
}

#[tokio::test]
async fn mirrors_only_the_requested_services() {
    let dir = TempDir::new().unwrap();
    let registry = MemoryRegistry::new();
    registry.insert(record("s1", "10.0.0.1", 9001, &[("a", json!({}))]));
    registry.insert(record("s2", "10.0.0.2", 9002, &[("b", json!({}))]));

    let config = GeneratorConfig {
        services: vec!["s2".to_string()],
        ..host_project(&dir)
    };
    let report = Generator::new(config).run_once(&registry).await.unwrap();
    assert_eq!(report.services, 1);

    let content = fs::read_to_string(report.dest.join("data.js")).unwrap();
    let endpoints = json_block_after(&content, "const endpoints = ");
    assert_eq!(endpoints, json!({"s2": {"host": "10.0.0.2", "port": 9002}}));
}

#[tokio::test]
async fn empty_registry_yields_empty_blocks() {
    let dir = TempDir::new().unwrap();
    let registry = MemoryRegistry::new();

    let report = Generator::new(host_project(&dir))
        .run_once(&registry)
        .await
        .unwrap();

    assert_eq!(report.services, 0);
    assert_eq!(report.procedures, 0);

    let content = fs::read_to_string(report.dest.join("data.js")).unwrap();
    assert_eq!(json_block_after(&content, "const endpoints = "), json!({}));
    assert_eq!(json_block_after(&content, "const apis = "), json!({}));
}

#[tokio::test]
async fn unknown_service_aborts_the_run() {
    let dir = TempDir::new().unwrap();
    let registry = MemoryRegistry::new();

    let config = GeneratorConfig {
        services: vec!["ghost".to_string()],
        ..host_project(&dir)
    };
    let err = Generator::new(config).run_once(&registry).await.unwrap_err();
    assert!(matches!(err, GeneratorError::RecordNotFound { name } if name == "ghost"));
}

#[tokio::test]
async fn rewritten_references_point_at_the_project_root() {
    let dir = TempDir::new().unwrap();
    let registry = MemoryRegistry::new();
    registry.insert(record("s1", "127.0.0.1", 9000, &[("say.hi", json!({}))]));

    let report = Generator::new(host_project(&dir))
        .run_once(&registry)
        .await
        .unwrap();

    // dest sits two levels below the project root, call.js one deeper.
    let index = fs::read_to_string(report.dest.join("index.js")).unwrap();
    assert!(index.contains("require('../../node_modules/keypaths')"));

    let call = fs::read_to_string(report.dest.join("rpc/call.js")).unwrap();
    assert!(call.contains("require('../../../node_modules/@grpc/grpc-js')"));
}

#[tokio::test]
async fn repeated_runs_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let registry = MemoryRegistry::new();
    registry.insert(record(
        "s1",
        "127.0.0.1",
        9000,
        &[("say.hi", json!({})), ("about", json!({}))],
    ));

    let generator = Generator::new(host_project(&dir));

    let first = generator.run_once(&registry).await.unwrap();
    let before = fs::read(first.dest.join("data.js")).unwrap();

    let second = generator.run_once(&registry).await.unwrap();
    let after = fs::read(second.dest.join("data.js")).unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn prefix_conflicts_surface_as_warnings() {
    let dir = TempDir::new().unwrap();
    let registry = MemoryRegistry::new();
    registry.insert(record(
        "s1",
        "127.0.0.1",
        9000,
        &[("say", json!("leaf")), ("say.hi", json!({}))],
    ));

    let report = Generator::new(host_project(&dir))
        .run_once(&registry)
        .await
        .unwrap();

    assert!(report.warnings.iter().any(|w| matches!(
        w,
        GenerateWarning::PrefixConflict { service, path } if service == "s1" && path == "say"
    )));

    let content = fs::read_to_string(report.dest.join("data.js")).unwrap();
    assert_eq!(
        json_block_after(&content, "const apis = "),
        json!({"s1": {"say": {"hi": {}}}})
    );
}

#[tokio::test]
async fn refresh_tick_picks_up_registry_changes() {
    let dir = TempDir::new().unwrap();
    let registry = MemoryRegistry::new();
    registry.insert(record("s1", "127.0.0.1", 9000, &[("say.hi", json!({}))]));

    let generator = Generator::new(host_project(&dir));
    let mut scheduler =
        RefreshScheduler::new(generator, registry.clone(), Duration::from_millis(20));

    let first = scheduler.run_now().await.unwrap();
    let before = fs::read_to_string(first.dest.join("data.js")).unwrap();
    assert_eq!(
        json_block_after(&before, "const endpoints = ")["s1"]["port"],
        json!(9000)
    );

    registry.insert(record(
        "s1",
        "127.0.0.1",
        9001,
        &[("say.hi", json!({})), ("about", json!({}))],
    ));

    let second = scheduler.tick().await.unwrap();
    assert_eq!(second.procedures, 2);

    let after = fs::read_to_string(second.dest.join("data.js")).unwrap();
    assert_eq!(
        json_block_after(&after, "const endpoints = "),
        json!({"s1": {"host": "127.0.0.1", "port": 9001}})
    );
    assert_eq!(
        json_block_after(&after, "const apis = "),
        json!({"s1": {"about": {}, "say": {"hi": {}}}})
    );
}

#[tokio::test]
async fn failed_tick_leaves_the_scheduler_usable() {
    let dir = TempDir::new().unwrap();
    let registry = MemoryRegistry::new();

    let config = GeneratorConfig {
        services: vec!["s1".to_string()],
        ..host_project(&dir)
    };
    let mut scheduler = RefreshScheduler::new(
        Generator::new(config),
        registry.clone(),
        Duration::from_millis(10),
    );

    assert!(scheduler.run_now().await.is_err());

    registry.insert(record("s1", "127.0.0.1", 9000, &[("say.hi", json!({}))]));
    let report = scheduler.tick().await.unwrap();
    assert_eq!(report.services, 1);
}
