//! Redis-backed registry.
//!
//! Records live in hashes keyed `services:<name>` with `host`, `port` and
//! `apis` fields, where `apis` is a JSON object mapping dotted key paths to
//! leaf definitions. Names are enumerated with a cursor scan over
//! `services:*`.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::config::RegistryConfig;
use crate::diagnostic::GeneratorError;
use crate::registry::{ApiCatalogue, Registry, RegistryConnector, ServiceRecord};

/// Key prefix under which service records are stored.
pub const SERVICE_KEY_PREFIX: &str = "services:";

/// Opens one Redis connection per pipeline run.
#[derive(Debug, Clone)]
pub struct RedisConnector {
    config: RegistryConfig,
}

impl RedisConnector {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    /// The URL this connector dials.
    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl RegistryConnector for RedisConnector {
    async fn connect(&self) -> Result<Box<dyn Registry>, GeneratorError> {
        let client = redis::Client::open(self.config.url.as_str())
            .map_err(|e| unavailable(&self.config.url, &e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| unavailable(&self.config.url, &e))?;

        Ok(Box::new(RedisRegistry {
            url: self.config.url.clone(),
            conn,
        }))
    }
}

/// One live Redis connection.
pub struct RedisRegistry {
    url: String,
    conn: MultiplexedConnection,
}

impl RedisRegistry {
    fn key(name: &str) -> String {
        format!("{}{}", SERVICE_KEY_PREFIX, name)
    }
}

#[async_trait]
impl Registry for RedisRegistry {
    async fn service_names(&mut self) -> Result<Vec<String>, GeneratorError> {
        let pattern = format!("{}*", SERVICE_KEY_PREFIX);
        let mut names = Vec::new();
        {
            let mut keys = self
                .conn
                .scan_match::<_, String>(pattern)
                .await
                .map_err(|e| unavailable(&self.url, &e))?;
            while let Some(key) = keys.next_item().await {
                names.push(key[SERVICE_KEY_PREFIX.len()..].to_string());
            }
        }
        // SCAN may return a key more than once while the keyspace moves.
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn service_record(&mut self, name: &str) -> Result<ServiceRecord, GeneratorError> {
        let fields: HashMap<String, String> = self
            .conn
            .hgetall(Self::key(name))
            .await
            .map_err(|e| unavailable(&self.url, &e))?;

        // HGETALL returns an empty map for a missing key.
        if fields.is_empty() {
            return Err(GeneratorError::RecordNotFound {
                name: name.to_string(),
            });
        }

        parse_record(name, &fields)
    }

    async fn close(self: Box<Self>) -> Result<(), GeneratorError> {
        // The multiplexed connection shuts down once the last handle drops.
        drop(self);
        Ok(())
    }
}

fn unavailable(url: &str, err: &redis::RedisError) -> GeneratorError {
    GeneratorError::RegistryUnavailable {
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// Builds a [`ServiceRecord`] out of the raw hash fields.
fn parse_record(
    name: &str,
    fields: &HashMap<String, String>,
) -> Result<ServiceRecord, GeneratorError> {
    let host = fields
        .get("host")
        .ok_or_else(|| invalid(name, "missing 'host' field"))?
        .clone();

    let port = fields
        .get("port")
        .ok_or_else(|| invalid(name, "missing 'port' field"))?
        .parse::<u16>()
        .map_err(|e| invalid(name, format!("bad 'port' field: {}", e)))?;

    // A service with no callable procedures is legal. No 'apis' field means
    // an empty catalogue.
    let apis: ApiCatalogue = match fields.get("apis") {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| invalid(name, format!("bad 'apis' JSON: {}", e)))?,
        None => ApiCatalogue::new(),
    };

    Ok(ServiceRecord {
        name: name.to_string(),
        host,
        port,
        apis,
    })
}

fn invalid(name: &str, message: impl Into<String>) -> GeneratorError {
    GeneratorError::InvalidRecord {
        name: name.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_complete_record() {
        let record = parse_record(
            "s1",
            &fields(&[
                ("host", "10.0.0.5"),
                ("port", "9000"),
                ("apis", r#"{"say.hi": {}, "about": {}}"#),
            ]),
        )
        .unwrap();

        assert_eq!(record.name, "s1");
        assert_eq!(record.host, "10.0.0.5");
        assert_eq!(record.port, 9000);
        assert_eq!(
            record.apis.keys().collect::<Vec<_>>(),
            vec!["about", "say.hi"]
        );
    }

    #[test]
    fn missing_apis_field_means_empty_catalogue() {
        let record =
            parse_record("s1", &fields(&[("host", "10.0.0.5"), ("port", "9000")])).unwrap();
        assert!(record.apis.is_empty());
    }

    #[test]
    fn rejects_missing_host() {
        let err = parse_record("s1", &fields(&[("port", "9000")])).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidRecord { .. }));
    }

    #[test]
    fn rejects_unparseable_port() {
        let err =
            parse_record("s1", &fields(&[("host", "10.0.0.5"), ("port", "http")])).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidRecord { .. }));
    }

    #[test]
    fn service_key_carries_prefix() {
        assert_eq!(RedisRegistry::key("s1"), "services:s1");
    }
}
