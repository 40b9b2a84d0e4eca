#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Earthquake keys lookup.
//!
//! [`KeysLookup`] loads a model's keys data (hazard-zone catalog and
//! vulnerability dictionary) once and resolves exposure locations to
//! `(area peril, vulnerability)` keys, one [`ResolvedKey`] per location in
//! input order.
//!
//! Resolution is synchronous and lazy through
//! [`KeysLookup::process_locations`], or chunked across blocking workers
//! through [`KeysLookup::resolve_batch`].

mod batch;
pub mod config;
pub mod input;
pub mod output;
pub mod progress;
pub mod reconcile;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use quake_keys_area_peril::{AreaPerilError, AreaPerilResolver};
use quake_keys_catalog::{Catalog, CatalogError};
use quake_keys_keys_models::ResolvedKey;
use quake_keys_location_models::{LocationError, LocationRecord};
use quake_keys_vulnerability::{VulnerabilityDictionary, VulnerabilityError};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

pub use config::{BatchOptions, LookupConfig};
pub use output::{KeySummary, KeysCsvWriter, write_json_lines};
pub use progress::{NullProgress, ProgressCallback, null_progress};
pub use reconcile::{KeyResolutionReconciler, ResolvedKeys, merge};

/// Errors that can occur while building or running a keys lookup.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The hazard-zone catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The area peril resolver could not be built.
    #[error(transparent)]
    AreaPeril(#[from] AreaPerilError),

    /// The vulnerability dictionary could not be loaded.
    #[error(transparent)]
    Vulnerability(#[from] VulnerabilityError),

    /// A location row was invalid.
    #[error(transparent)]
    Location(#[from] LocationError),

    /// CSV decoding or encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration was invalid.
    #[error("Invalid lookup config: {0}")]
    Config(String),

    /// A batch worker panicked or was aborted.
    #[error("Batch worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The batch was cancelled before it completed.
    #[error("Batch cancelled")]
    Cancelled,
}

/// Identifies the model a lookup serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Model supplier.
    pub supplier: String,
    /// Model name.
    pub model_name: String,
    /// Model version, if configured.
    pub model_version: Option<String>,
}

/// A loaded keys lookup.
///
/// Immutable once built; share it through [`Arc`] for batch resolution.
pub struct KeysLookup {
    info: ModelInfo,
    area_peril: AreaPerilResolver,
    vulnerabilities: VulnerabilityDictionary,
}

impl KeysLookup {
    /// Creates a lookup from prebuilt parts.
    #[must_use]
    pub const fn new(
        info: ModelInfo,
        area_peril: AreaPerilResolver,
        vulnerabilities: VulnerabilityDictionary,
    ) -> Self {
        Self {
            info,
            area_peril,
            vulnerabilities,
        }
    }

    /// Loads the catalog and vulnerability dictionary named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if either file is missing or malformed.
    pub fn from_config(config: &LookupConfig) -> Result<Self, LookupError> {
        let catalog = Catalog::load(&config.areaperil_path())?;
        let area_peril = AreaPerilResolver::from_catalog(&catalog, config.admin_key_policy)?;
        let vulnerabilities = VulnerabilityDictionary::load(&config.vulnerability_path())?;

        let info = ModelInfo {
            supplier: config.supplier.clone(),
            model_name: config.model_name.clone(),
            model_version: config.model_version.clone(),
        };
        log::info!(
            "Keys lookup ready: {}/{} from {}",
            info.supplier,
            info.model_name,
            config.keys_data_directory.display()
        );

        Ok(Self::new(info, area_peril, vulnerabilities))
    }

    /// Model metadata.
    #[must_use]
    pub const fn model_info(&self) -> &ModelInfo {
        &self.info
    }

    /// The area peril resolver.
    #[must_use]
    pub const fn area_peril(&self) -> &AreaPerilResolver {
        &self.area_peril
    }

    /// The vulnerability dictionary.
    #[must_use]
    pub const fn vulnerabilities(&self) -> &VulnerabilityDictionary {
        &self.vulnerabilities
    }

    /// A reconciler borrowing this lookup's resolvers.
    #[must_use]
    pub fn reconciler(&self) -> KeyResolutionReconciler<'_> {
        KeyResolutionReconciler::new(&self.area_peril, &self.vulnerabilities)
    }

    /// Lazily resolves locations, one key per location in input order.
    pub fn process_locations<I>(&self, locations: I) -> ResolvedKeys<'_, I::IntoIter>
    where
        I: IntoIterator<Item = LocationRecord>,
    {
        self.reconciler().resolve_all(locations)
    }

    /// Reads a location CSV source, joining taxonomy and hazard-metric tags.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] on the first invalid row.
    pub fn read_locations(&self, reader: impl Read) -> Result<Vec<LocationRecord>, LookupError> {
        input::read_locations(reader, &self.vulnerabilities)
    }

    /// Reads a location CSV file, joining taxonomy and hazard-metric tags.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the file cannot be read or a row is
    /// invalid.
    pub fn load_locations(&self, path: &Path) -> Result<Vec<LocationRecord>, LookupError> {
        input::load_locations(path, &self.vulnerabilities)
    }

    /// Resolves locations concurrently on blocking workers.
    ///
    /// Output order matches input order regardless of scheduling.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Cancelled`] if `cancel` fires before every
    /// location is resolved, or [`LookupError::Join`] if a worker dies.
    pub async fn resolve_batch(
        self: Arc<Self>,
        locations: Vec<LocationRecord>,
        options: &BatchOptions,
        cancel: &CancellationToken,
        progress: Arc<dyn ProgressCallback>,
    ) -> Result<Vec<ResolvedKey>, LookupError> {
        batch::resolve_batch(self, locations, options, cancel, progress).await
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    use quake_keys_keys_models::KeyStatus;

    use super::*;

    const AREAPERIL_DICT: &str = "\
areaperil_id,xmin,ymin,xmax,ymax,IMTs,NAME_1,NAME_2
1,10,10,20,20,PGA,StateA,CountyA
2,-9999,-9999,-9999,-9999,PGA,StateB,CountyB
3,10,10,20,20,SA(0.3),StateA,CountyA
";

    const VULNERABILITY_DICT: &str = "\
vulnerability_id,taxonomy,type
11,MR_LWAL-DUH_H1,PGA
12,CR_LFINF-DNO_H2,SA(0.3)
";

    const LOCATIONS: &str = "\
LocNumber,Longitude,Latitude,GeogName1,AreaName1,ConstructionCode,NumberOfStoreys
1,15,15,CountyB,StateB,5105,1
2,999,999,CountyA,,5105,1
3,15,15,,,5150,2
4,50,50,Nowhere,Nothing,5105,1
5,15,15,,,9999,1
";

    fn keys_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("quake_keys_lookup_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("areaperil_dict.csv"), AREAPERIL_DICT).unwrap();
        std::fs::write(dir.join("vulnerability_dict.csv"), VULNERABILITY_DICT).unwrap();
        dir
    }

    fn lookup(name: &str) -> KeysLookup {
        KeysLookup::from_config(&LookupConfig::new(keys_dir(name))).unwrap()
    }

    #[test]
    fn end_to_end_statuses() {
        let lookup = lookup("end_to_end");
        let locations = lookup.read_locations(LOCATIONS.as_bytes()).unwrap();
        let keys: Vec<_> = lookup.process_locations(locations).collect();

        let summary: Vec<_> = keys
            .iter()
            .map(|k| (k.locnumber, k.status, k.area_peril_id, k.vulnerability_id))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, KeyStatus::Success, Some(1), Some(11)),
                (2, KeyStatus::Success, Some(1), Some(11)),
                (3, KeyStatus::Success, Some(3), Some(12)),
                (4, KeyStatus::NoMatch, None, Some(11)),
                (5, KeyStatus::Fail, None, None),
            ]
        );
        assert_eq!(keys[4].message, ", Missing taxonomy for location 5");
    }

    #[test]
    fn model_info_comes_from_config() {
        let mut config = LookupConfig::new(keys_dir("model_info"));
        config.model_version = Some("1.0".to_string());
        let lookup = KeysLookup::from_config(&config).unwrap();
        assert_eq!(
            lookup.model_info(),
            &ModelInfo {
                supplier: "GEMFoundation".to_string(),
                model_name: "GMO".to_string(),
                model_version: Some("1.0".to_string()),
            }
        );
    }

    #[test]
    fn missing_keys_data_is_an_error() {
        let config = LookupConfig::new(std::env::temp_dir().join("quake_keys_no_such_dir"));
        assert!(matches!(
            KeysLookup::from_config(&config),
            Err(LookupError::Catalog(CatalogError::Io { .. }))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn batch_matches_sequential_order() {
        let lookup = Arc::new(lookup("batch_order"));
        let mut locations = Vec::new();
        for _ in 0..20 {
            locations.extend(lookup.read_locations(LOCATIONS.as_bytes()).unwrap());
        }
        let expected: Vec<_> = lookup.process_locations(locations.clone()).collect();

        let options = BatchOptions {
            concurrency: 4,
            chunk_size: 7,
        };
        let keys = Arc::clone(&lookup)
            .resolve_batch(locations, &options, &CancellationToken::new(), null_progress())
            .await
            .unwrap();
        assert_eq!(keys, expected);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let lookup = Arc::new(lookup("batch_cancel_early"));
        let locations = lookup.read_locations(LOCATIONS.as_bytes()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = lookup
            .resolve_batch(locations, &BatchOptions::default(), &cancel, null_progress())
            .await;
        assert!(matches!(result, Err(LookupError::Cancelled)));
    }

    struct CancelAfter {
        token: CancellationToken,
        limit: u64,
        seen: AtomicU64,
    }

    impl ProgressCallback for CancelAfter {
        fn set_total(&self, _total: u64) {}
        fn inc(&self, delta: u64) {
            if self.seen.fetch_add(delta, Ordering::SeqCst) + delta >= self.limit {
                self.token.cancel();
            }
        }
        fn set_message(&self, _msg: String) {}
        fn finish(&self, _msg: String) {}
    }

    #[tokio::test]
    async fn cancelled_mid_batch() {
        let lookup = Arc::new(lookup("batch_cancel_mid"));
        let locations = lookup.read_locations(LOCATIONS.as_bytes()).unwrap();
        let cancel = CancellationToken::new();
        let progress = Arc::new(CancelAfter {
            token: cancel.clone(),
            limit: 2,
            seen: AtomicU64::new(0),
        });

        let options = BatchOptions {
            concurrency: 1,
            chunk_size: 1,
        };
        let result = lookup
            .resolve_batch(locations, &options, &cancel, progress)
            .await;
        assert!(matches!(result, Err(LookupError::Cancelled)));
        assert!(cancel.is_cancelled());
    }

    #[derive(Default)]
    struct Recorded {
        events: std::sync::Mutex<Vec<String>>,
    }

    impl Recorded {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl ProgressCallback for Recorded {
        fn set_total(&self, total: u64) {
            self.push(format!("total {total}"));
        }
        fn inc(&self, delta: u64) {
            self.push(format!("inc {delta}"));
        }
        fn set_message(&self, msg: String) {
            self.push(format!("message {msg}"));
        }
        fn finish(&self, msg: String) {
            self.push(format!("finish {msg}"));
        }
    }

    #[tokio::test]
    async fn batch_reports_progress() {
        let lookup = Arc::new(lookup("batch_progress"));
        let locations = lookup.read_locations(LOCATIONS.as_bytes()).unwrap();
        let progress = Arc::new(Recorded::default());

        let options = BatchOptions {
            concurrency: 1,
            chunk_size: 2,
        };
        let keys = lookup
            .resolve_batch(
                locations,
                &options,
                &CancellationToken::new(),
                Arc::clone(&progress) as Arc<dyn ProgressCallback>,
            )
            .await
            .unwrap();
        assert_eq!(keys.len(), 5);

        let events = progress.events.lock().unwrap().clone();
        assert_eq!(events[0], "total 5");
        assert_eq!(events[1], "message Resolving 5 locations in 3 chunks");
        assert_eq!(events.iter().filter(|e| *e == "inc 1").count(), 5);
        assert_eq!(events.last().map(String::as_str), Some("finish Resolved 5 locations"));
    }
}
