//! Key output writers.
//!
//! Successful keys go to `keys.csv`; no-match and failed keys go to a
//! separate `keys-errors.csv` with their status and message. JSON-lines
//! output keeps every key in a single stream.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use quake_keys_keys_models::{KeyStatus, ResolvedKey};
use serde::Serialize;

use crate::LookupError;

/// File name for successful keys.
pub const KEYS_FILE: &str = "keys.csv";
/// File name for unsuccessful keys.
pub const KEYS_ERRORS_FILE: &str = "keys-errors.csv";
/// File name for JSON-lines output.
pub const KEYS_JSON_FILE: &str = "keys.jsonl";

const KEYS_HEADER: [&str; 5] = [
    "LocID",
    "PerilID",
    "CoverageTypeID",
    "AreaPerilID",
    "VulnerabilityID",
];
const ERRORS_HEADER: [&str; 5] = ["LocID", "PerilID", "CoverageTypeID", "Status", "Message"];

/// Counts of keys by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeySummary {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl KeySummary {
    /// Records one key.
    pub fn record(&mut self, key: &ResolvedKey) {
        *self.counts.entry(key.status.to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    /// Number of keys recorded with this status.
    #[must_use]
    pub fn count(&self, status: KeyStatus) -> u64 {
        let name: &str = status.as_ref();
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Total number of keys recorded.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }
}

impl<'a> FromIterator<&'a ResolvedKey> for KeySummary {
    fn from_iter<T: IntoIterator<Item = &'a ResolvedKey>>(iter: T) -> Self {
        let mut summary = Self::default();
        for key in iter {
            summary.record(key);
        }
        summary
    }
}

impl fmt::Display for KeySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} keys", self.total)?;
        for status in KeyStatus::all() {
            write!(f, ", {} {status}", self.count(*status))?;
        }
        Ok(())
    }
}

/// Splits keys between the success and error CSV files.
pub struct KeysCsvWriter<W: Write> {
    keys: csv::Writer<W>,
    errors: csv::Writer<W>,
    summary: KeySummary,
}

impl KeysCsvWriter<std::fs::File> {
    /// Creates `keys.csv` and `keys-errors.csv` in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the directory or either file cannot be
    /// created.
    pub fn create(dir: &Path) -> Result<Self, LookupError> {
        std::fs::create_dir_all(dir).map_err(|e| io_error(dir.to_path_buf(), e))?;
        let open = |name: &str| {
            let path = dir.join(name);
            std::fs::File::create(&path).map_err(|e| io_error(path, e))
        };
        Self::new(open(KEYS_FILE)?, open(KEYS_ERRORS_FILE)?)
    }
}

impl<W: Write> KeysCsvWriter<W> {
    /// Wraps two sinks and writes their header rows.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Csv`] if a header cannot be written.
    pub fn new(keys: W, errors: W) -> Result<Self, LookupError> {
        let mut keys = csv::Writer::from_writer(keys);
        let mut errors = csv::Writer::from_writer(errors);
        keys.write_record(KEYS_HEADER)?;
        errors.write_record(ERRORS_HEADER)?;
        Ok(Self {
            keys,
            errors,
            summary: KeySummary::default(),
        })
    }

    /// Writes one key to the appropriate file.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Csv`] on write failure.
    pub fn write(&mut self, key: &ResolvedKey) -> Result<(), LookupError> {
        let loc_id = key.locnumber.to_string();
        let peril_id = key.peril_id.id();
        let coverage = key.coverage_type.id().to_string();

        match (key.status, key.area_peril_id, key.vulnerability_id) {
            (KeyStatus::Success, Some(area_peril_id), Some(vulnerability_id)) => {
                self.keys.write_record([
                    loc_id.as_str(),
                    peril_id,
                    coverage.as_str(),
                    area_peril_id.to_string().as_str(),
                    vulnerability_id.to_string().as_str(),
                ])?;
            }
            (status, ..) => {
                self.errors.write_record([
                    loc_id.as_str(),
                    peril_id,
                    coverage.as_str(),
                    status.as_ref(),
                    key.message.as_str(),
                ])?;
            }
        }

        self.summary.record(key);
        Ok(())
    }

    /// Writes every key from an iterator.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Csv`] on the first write failure.
    pub fn write_all<'k>(
        &mut self,
        keys: impl IntoIterator<Item = &'k ResolvedKey>,
    ) -> Result<(), LookupError> {
        for key in keys {
            self.write(key)?;
        }
        Ok(())
    }

    /// Flushes both files and returns the status counts.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if flushing fails.
    pub fn finish(mut self) -> Result<KeySummary, LookupError> {
        self.keys.flush().map_err(|e| io_error(PathBuf::from(KEYS_FILE), e))?;
        self.errors
            .flush()
            .map_err(|e| io_error(PathBuf::from(KEYS_ERRORS_FILE), e))?;
        Ok(self.summary)
    }
}

/// Writes one JSON object per key, one per line.
///
/// # Errors
///
/// Returns [`LookupError`] on serialization or write failure.
pub fn write_json_lines<'k>(
    mut writer: impl Write,
    keys: impl IntoIterator<Item = &'k ResolvedKey>,
) -> Result<KeySummary, LookupError> {
    let mut summary = KeySummary::default();
    for key in keys {
        serde_json::to_writer(&mut writer, key)?;
        writer
            .write_all(b"\n")
            .map_err(|e| io_error(PathBuf::from(KEYS_JSON_FILE), e))?;
        summary.record(key);
    }
    writer
        .flush()
        .map_err(|e| io_error(PathBuf::from(KEYS_JSON_FILE), e))?;
    Ok(summary)
}

fn io_error(path: PathBuf, source: std::io::Error) -> LookupError {
    LookupError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use quake_keys_keys_models::{CoverageKind, PerilKind};

    use super::*;

    fn key(id: i64, status: KeyStatus, ap: Option<i64>, v: Option<i64>, msg: &str) -> ResolvedKey {
        ResolvedKey {
            locnumber: id,
            peril_id: PerilKind::Earthquake,
            coverage_type: CoverageKind::Buildings,
            area_peril_id: ap,
            vulnerability_id: v,
            status,
            message: msg.to_string(),
        }
    }

    fn sample() -> Vec<ResolvedKey> {
        vec![
            key(1, KeyStatus::Success, Some(10), Some(3), ""),
            key(2, KeyStatus::NoMatch, None, Some(3), "No area peril or vulnerability match"),
            key(3, KeyStatus::Fail, None, None, ", Missing taxonomy for location 3"),
        ]
    }

    #[test]
    fn splits_success_and_errors() {
        let mut keys_buf = Vec::new();
        let mut errors_buf = Vec::new();
        let mut writer = KeysCsvWriter::new(&mut keys_buf, &mut errors_buf).unwrap();
        writer.write_all(&sample()).unwrap();
        let summary = writer.finish().unwrap();

        let keys = String::from_utf8(keys_buf).unwrap();
        let errors = String::from_utf8(errors_buf).unwrap();
        assert_eq!(
            keys,
            "LocID,PerilID,CoverageTypeID,AreaPerilID,VulnerabilityID\n1,QEQ,1,10,3\n"
        );
        assert_eq!(
            errors,
            "LocID,PerilID,CoverageTypeID,Status,Message\n\
             2,QEQ,1,nomatch,No area peril or vulnerability match\n\
             3,QEQ,1,fail,\", Missing taxonomy for location 3\"\n"
        );
        assert_eq!(summary.count(KeyStatus::Success), 1);
        assert_eq!(summary.count(KeyStatus::NoMatch), 1);
        assert_eq!(summary.count(KeyStatus::Fail), 1);
    }

    #[test]
    fn json_lines_keep_every_key() {
        let mut buf = Vec::new();
        let summary = write_json_lines(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["locnumber"], 1);
        assert_eq!(first["area_peril_id"], 10);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn summary_display_lists_every_status() {
        let summary: KeySummary = sample().iter().collect();
        assert_eq!(summary.to_string(), "3 keys, 1 success, 1 fail, 1 nomatch");
    }

    #[test]
    fn creates_files_in_directory() {
        let dir = std::env::temp_dir().join("quake_keys_output_test");
        let mut writer = KeysCsvWriter::create(&dir).unwrap();
        writer.write_all(&sample()).unwrap();
        writer.finish().unwrap();
        assert!(dir.join(KEYS_FILE).exists());
        assert!(dir.join(KEYS_ERRORS_FILE).exists());
    }
}
