#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Vulnerability function lookup.
//!
//! A location's structural taxonomy, paired with its hazard-metric tag,
//! selects a vulnerability function from the model's vulnerability
//! dictionary (`vulnerability_dict.csv`).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use quake_keys_keys_models::VulnerabilityResult;
use quake_keys_location_models::LocationRecord;
use quake_keys_location_models::values::{parse_int, parse_text};

/// Column headers of the vulnerability dictionary.
pub mod columns {
    /// Vulnerability function id.
    pub const VULNERABILITY_ID: &str = "vulnerability_id";
    /// GEM taxonomy string.
    pub const TAXONOMY: &str = "taxonomy";
    /// Hazard-metric tag.
    pub const IMT: &str = "type";
}

/// Errors that can occur while loading the vulnerability dictionary.
#[derive(Debug, thiserror::Error)]
pub enum VulnerabilityError {
    /// The dictionary file could not be opened.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path to the dictionary file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header.
    #[error("Missing required vulnerability column: {0}")]
    MissingColumn(&'static str),

    /// A required field is absent or has the wrong type.
    #[error("Vulnerability line {line}: invalid {column}: {value:?}")]
    InvalidField {
        /// 1-based line number.
        line: u64,
        /// Column name.
        column: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Resolves a location to a vulnerability function.
///
/// Implementations must be pure with respect to the record so that keys can
/// be resolved from several threads at once.
pub trait VulnerabilityResolver: Send + Sync {
    /// Resolves one location.
    fn resolve(&self, location: &LocationRecord) -> VulnerabilityResult;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    imt: Option<String>,
    vulnerability_id: i64,
}

/// Taxonomy-keyed vulnerability dictionary.
#[derive(Debug, Clone, Default)]
pub struct VulnerabilityDictionary {
    // taxonomy -> entries in file order
    by_taxonomy: BTreeMap<String, Vec<Entry>>,
    rows: usize,
}

impl VulnerabilityDictionary {
    /// Loads the dictionary from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`VulnerabilityError`] if the file cannot be read or any row
    /// is malformed.
    pub fn load(path: &Path) -> Result<Self, VulnerabilityError> {
        let file = std::fs::File::open(path).map_err(|e| VulnerabilityError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let dict = Self::from_reader(file)?;
        log::info!(
            "Loaded {} vulnerability rows ({} taxonomies) from {}",
            dict.rows,
            dict.by_taxonomy.len(),
            path.display()
        );
        Ok(dict)
    }

    /// Loads the dictionary from any CSV source.
    ///
    /// # Errors
    ///
    /// Returns [`VulnerabilityError`] if decoding fails or any row is
    /// malformed.
    pub fn from_reader(reader: impl Read) -> Result<Self, VulnerabilityError> {
        let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(VulnerabilityError::MissingColumn(name))
        };
        let id_col = find(columns::VULNERABILITY_ID)?;
        let taxonomy_col = find(columns::TAXONOMY)?;
        let imt_col = headers.iter().position(|h| h.trim() == columns::IMT);

        let mut dict = Self::default();
        for (i, result) in csv_reader.records().enumerate() {
            let record = result?;
            let line = i as u64 + 2;
            let invalid = |column: &'static str, idx: usize| VulnerabilityError::InvalidField {
                line,
                column,
                value: record.get(idx).unwrap_or_default().to_string(),
            };

            let vulnerability_id = parse_int(columns::VULNERABILITY_ID, record.get(id_col))
                .ok()
                .flatten()
                .ok_or_else(|| invalid(columns::VULNERABILITY_ID, id_col))?;
            let taxonomy = parse_text(record.get(taxonomy_col))
                .ok_or_else(|| invalid(columns::TAXONOMY, taxonomy_col))?;
            let imt = imt_col.and_then(|idx| parse_text(record.get(idx)));

            dict.insert(&taxonomy, imt.as_deref(), vulnerability_id);
        }

        Ok(dict)
    }

    /// Adds an entry. Later entries for an existing `(taxonomy, tag)` pair
    /// never shadow earlier ones.
    pub fn insert(&mut self, taxonomy: &str, imt: Option<&str>, vulnerability_id: i64) {
        self.by_taxonomy
            .entry(taxonomy.to_string())
            .or_default()
            .push(Entry {
                imt: imt.map(str::to_string),
                vulnerability_id,
            });
        self.rows += 1;
    }

    /// The hazard-metric tag recorded for a taxonomy (first row wins).
    #[must_use]
    pub fn imt_for(&self, taxonomy: &str) -> Option<&str> {
        self.by_taxonomy
            .get(taxonomy)?
            .iter()
            .find_map(|e| e.imt.as_deref())
    }

    /// Looks up the vulnerability id for a taxonomy and optional tag.
    #[must_use]
    pub fn lookup(&self, taxonomy: &str, imt: Option<&str>) -> Option<i64> {
        let entries = self.by_taxonomy.get(taxonomy)?;
        let entry = match imt {
            Some(imt) => entries.iter().find(|e| e.imt.as_deref() == Some(imt)),
            None => entries.first(),
        };
        entry.map(|e| e.vulnerability_id)
    }

    /// Number of rows loaded.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows
    }

    /// Returns `true` if no rows were loaded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

impl VulnerabilityResolver for VulnerabilityDictionary {
    fn resolve(&self, location: &LocationRecord) -> VulnerabilityResult {
        let Some(taxonomy) = location.taxonomy.as_deref() else {
            return VulnerabilityResult::fail(format!(
                "Missing taxonomy for location {}",
                location.id
            ));
        };

        match self.lookup(taxonomy, location.imt.as_deref()) {
            Some(id) => VulnerabilityResult::success(id),
            None => {
                log::debug!("Location {}: no vulnerability for {taxonomy}", location.id);
                VulnerabilityResult::no_match(format!(
                    "No vulnerability match for taxonomy {taxonomy}"
                ))
            }
        }
    }
}
