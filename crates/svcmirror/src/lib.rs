//! svcmirror generates a local proxy module tree for remote services
//! registered in a service registry.
//!
//! One run of the pipeline:
//! 1. Scaffold the destination from the template tree.
//! 2. Fetch each requested service record over one registry connection,
//!    sequentially, and close the connection again.
//! 3. Convert each flat catalogue into its nested callable tree.
//! 4. Inject connection metadata and trees into the generated data file.
//! 5. Rewrite generated dependency references relative to the nearest
//!    dependency root.
//!
//! ## Usage
//! ```rust,ignore
//! use svcmirror::{Generator, GeneratorConfig, RedisConnector, RegistryConfig};
//!
//! let generator = Generator::new(GeneratorConfig::default());
//! let connector = RedisConnector::new(RegistryConfig::from_env());
//! let report = generator.run_once(&connector).await?;
//! println!("saved to {}", report.dest.display());
//! ```

pub mod apitree;
pub mod assets;
pub mod config;
pub mod diagnostic;
pub mod inject;
pub mod refresh;
pub mod registry;
pub mod rewrite;
pub mod scaffold;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

pub use config::{GeneratorConfig, RegistryConfig};
pub use diagnostic::{GenerateWarning, GeneratorError};
pub use refresh::RefreshScheduler;
pub use registry::{
    Endpoint, MemoryRegistry, RedisConnector, Registry, RegistryConnector, ServiceRecord,
};

/// Runs the generation pipeline against one destination.
pub struct Generator {
    config: GeneratorConfig,
}

/// Result of one successful pipeline run.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    /// Where the tree was written.
    pub dest: PathBuf,
    /// Number of services mirrored.
    pub services: usize,
    /// Total procedures across all mirrored catalogues.
    pub procedures: usize,
    /// Non-fatal conditions observed during the run.
    pub warnings: Vec<GenerateWarning>,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// The configuration this generator was built with.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Runs the full pipeline once.
    ///
    /// Every run starts from a fresh scaffold and a fresh registry
    /// snapshot; nothing is cached between runs.
    pub async fn run_once<C: RegistryConnector>(
        &self,
        connector: &C,
    ) -> Result<GenerateReport, GeneratorError> {
        let dest = self.config.resolved_dest();
        scaffold::scaffold(&dest, self.config.template_dir.as_deref())?;

        let records = self.fetch_records(connector).await?;

        let mut warnings = Vec::new();
        let mut endpoints = BTreeMap::new();
        let mut apis: BTreeMap<String, Value> = BTreeMap::new();
        let mut procedures = 0;

        for record in &records {
            procedures += record.apis.len();
            endpoints.insert(record.name.clone(), record.endpoint());

            let (tree, conflicts) = apitree::build(&record.apis);
            warnings.extend(conflicts.into_iter().map(|conflict| {
                GenerateWarning::PrefixConflict {
                    service: record.name.clone(),
                    path: conflict.path,
                }
            }));
            apis.insert(record.name.clone(), tree);
        }

        let outcome = inject::inject_data_file(&dest, &endpoints, &apis)?;
        if !outcome.endpoints_replaced {
            warnings.push(GenerateWarning::MarkerMissing {
                marker: inject::ENDPOINTS_MARKER,
            });
        }
        if !outcome.apis_replaced {
            warnings.push(GenerateWarning::MarkerMissing {
                marker: inject::APIS_MARKER,
            });
        }

        // Rewriting must come last; it touches files injection just wrote.
        warnings.extend(rewrite::rewrite_dependency_paths(&dest)?);

        Ok(GenerateReport {
            dest,
            services: records.len(),
            procedures,
            warnings,
        })
    }

    /// Opens one registry connection, resolves the requested names, reads
    /// each record in turn and closes the connection again. Lookups are
    /// sequential so at most one request is in flight against the registry;
    /// an error drops the connection on the way out.
    async fn fetch_records<C: RegistryConnector>(
        &self,
        connector: &C,
    ) -> Result<Vec<ServiceRecord>, GeneratorError> {
        let mut registry = connector.connect().await?;

        let names = if self.config.services.is_empty() {
            registry.service_names().await?
        } else {
            self.config.services.clone()
        };

        let mut records = Vec::with_capacity(names.len());
        for name in &names {
            records.push(registry.service_record(name).await?);
        }

        registry.close().await?;
        Ok(records)
    }
}
