//! Service registry boundary.
//!
//! The pipeline talks to the registry through the [`RegistryConnector`] and
//! [`Registry`] pair: one connection per run, sequential lookups, an
//! explicit close before generation continues. Backends are pluggable;
//! [`RedisRegistry`] serves production and [`MemoryRegistry`] serves
//! embedding and tests.

mod memory;
mod redis;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::diagnostic::GeneratorError;

pub use memory::MemoryRegistry;
pub use self::redis::{RedisConnector, RedisRegistry};

/// Flat catalogue of one service's callable procedures, dotted key path to
/// leaf definition, exactly as the registry stores it.
pub type ApiCatalogue = BTreeMap<String, Value>;

/// Everything the registry knows about one service.
#[derive(Debug, Clone)]
pub struct ServiceRecord {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub apis: ApiCatalogue,
}

impl ServiceRecord {
    /// The connection-metadata slice of this record.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

/// Connection metadata injected into the generated data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// An open registry connection, live for exactly one pipeline run.
#[async_trait]
pub trait Registry: Send {
    /// Every service name the registry currently knows, sorted.
    async fn service_names(&mut self) -> Result<Vec<String>, GeneratorError>;

    /// The record stored under `name`.
    async fn service_record(&mut self, name: &str) -> Result<ServiceRecord, GeneratorError>;

    /// Releases the connection. Dropping the value has the same effect;
    /// calling this makes the hand-off visible at the call site.
    async fn close(self: Box<Self>) -> Result<(), GeneratorError>;
}

/// Opens one [`Registry`] connection per pipeline run.
#[async_trait]
pub trait RegistryConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Registry>, GeneratorError>;
}
