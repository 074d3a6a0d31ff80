//! In-memory registry backend.
//!
//! Serves records straight from process memory, which is what tests and
//! embedders holding their own records want. The connector handle stays
//! live across runs while every connection reads the state as it is at
//! lookup time.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::diagnostic::GeneratorError;
use crate::registry::{Registry, RegistryConnector, ServiceRecord};

/// Shared in-memory record store. Cloning yields another handle onto the
/// same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    records: Arc<Mutex<BTreeMap<String, ServiceRecord>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, record: ServiceRecord) {
        self.records
            .lock()
            .expect("record store poisoned")
            .insert(record.name.clone(), record);
    }

    /// Removes a record, returning it if it was present.
    pub fn remove(&self, name: &str) -> Option<ServiceRecord> {
        self.records.lock().expect("record store poisoned").remove(name)
    }
}

#[async_trait]
impl RegistryConnector for MemoryRegistry {
    async fn connect(&self) -> Result<Box<dyn Registry>, GeneratorError> {
        Ok(Box::new(MemorySession {
            records: Arc::clone(&self.records),
        }))
    }
}

/// One connection onto the shared store.
struct MemorySession {
    records: Arc<Mutex<BTreeMap<String, ServiceRecord>>>,
}

#[async_trait]
impl Registry for MemorySession {
    async fn service_names(&mut self) -> Result<Vec<String>, GeneratorError> {
        Ok(self
            .records
            .lock()
            .expect("record store poisoned")
            .keys()
            .cloned()
            .collect())
    }

    async fn service_record(&mut self, name: &str) -> Result<ServiceRecord, GeneratorError> {
        self.records
            .lock()
            .expect("record store poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| GeneratorError::RecordNotFound {
                name: name.to_string(),
            })
    }

    async fn close(self: Box<Self>) -> Result<(), GeneratorError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ApiCatalogue;

    fn record(name: &str, port: u16) -> ServiceRecord {
        ServiceRecord {
            name: name.to_string(),
            host: "127.0.0.1".to_string(),
            port,
            apis: ApiCatalogue::new(),
        }
    }

    #[tokio::test]
    async fn lists_names_sorted() {
        let registry = MemoryRegistry::new();
        registry.insert(record("s2", 9002));
        registry.insert(record("s1", 9001));

        let mut session = registry.connect().await.unwrap();
        assert_eq!(session.service_names().await.unwrap(), vec!["s1", "s2"]);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_record_is_reported_by_name() {
        let registry = MemoryRegistry::new();
        let mut session = registry.connect().await.unwrap();

        let err = session.service_record("ghost").await.unwrap_err();
        assert!(matches!(err, GeneratorError::RecordNotFound { name } if name == "ghost"));
    }

    #[tokio::test]
    async fn connections_see_changes_made_after_connect() {
        let registry = MemoryRegistry::new();
        let mut session = registry.connect().await.unwrap();

        registry.insert(record("s1", 9001));
        assert_eq!(session.service_record("s1").await.unwrap().port, 9001);
    }
}
