#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard-zone catalog loading.
//!
//! Reads the area peril dictionary (`areaperil_dict.csv`) once and splits
//! it into the distinct cells used by the spatial index and the ordered,
//! denormalized rows used for county/state fallback. Any malformed row
//! aborts the load; a partially loaded catalog is never returned.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use quake_keys_catalog_models::{AdministrativeFallbackRow, AreaPerilCell, BoundingBox};
use quake_keys_location_models::values::{parse_float, parse_int, parse_text};

/// Column headers of the area peril dictionary.
pub mod columns {
    /// Area peril id.
    pub const AREA_PERIL_ID: &str = "areaperil_id";
    /// Western edge.
    pub const XMIN: &str = "xmin";
    /// Southern edge.
    pub const YMIN: &str = "ymin";
    /// Eastern edge.
    pub const XMAX: &str = "xmax";
    /// Northern edge.
    pub const YMAX: &str = "ymax";
    /// Hazard-metric tag.
    pub const IMT: &str = "IMTs";
    /// State name.
    pub const STATE: &str = "NAME_1";
    /// County name.
    pub const COUNTY: &str = "NAME_2";
}

/// Errors that can occur while loading the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be opened.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path to the catalog file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header.
    #[error("Missing required catalog column: {0}")]
    MissingColumn(&'static str),

    /// A required field is absent or has the wrong type.
    #[error("Catalog line {line}: invalid {column}: {value:?}")]
    InvalidField {
        /// 1-based line number.
        line: u64,
        /// Column name.
        column: &'static str,
        /// Raw value.
        value: String,
    },

    /// The same id appears with a different extent or tag.
    #[error("Catalog line {line}: area peril {id} conflicts with an earlier row")]
    ConflictingId {
        /// 1-based line number.
        line: u64,
        /// Area peril id.
        id: i64,
    },
}

/// The loaded hazard-zone catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cells: Vec<AreaPerilCell>,
    fallback_rows: Vec<AdministrativeFallbackRow>,
}

struct CatalogColumns {
    id: usize,
    xmin: usize,
    ymin: usize,
    xmax: usize,
    ymax: usize,
    imt: usize,
    state: usize,
    county: usize,
}

impl CatalogColumns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, CatalogError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &'static str| find(name).ok_or(CatalogError::MissingColumn(name));

        Ok(Self {
            id: require(columns::AREA_PERIL_ID)?,
            xmin: require(columns::XMIN)?,
            ymin: require(columns::YMIN)?,
            xmax: require(columns::XMAX)?,
            ymax: require(columns::YMAX)?,
            imt: require(columns::IMT)?,
            state: require(columns::STATE)?,
            county: require(columns::COUNTY)?,
        })
    }
}

impl Catalog {
    /// Loads the catalog from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be read or any row is
    /// malformed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let catalog = Self::from_reader(file)?;
        log::info!(
            "Loaded {} area peril cells ({} fallback rows) from {}",
            catalog.cells.len(),
            catalog.fallback_rows.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Loads the catalog from any CSV source.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if decoding fails or any row is malformed.
    pub fn from_reader(reader: impl Read) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);
        let cols = CatalogColumns::from_headers(csv_reader.headers()?)?;

        let mut builder = CatalogBuilder::default();
        for (i, result) in csv_reader.records().enumerate() {
            let record = result?;
            // header is line 1
            let line = i as u64 + 2;
            let (cell, row) = parse_row(&cols, &record, line)?;
            builder.push(cell, row, line)?;
        }

        Ok(builder.finish())
    }

    /// Builds a catalog from in-memory `(cell, state, county)` rows,
    /// applying the same consistency checks as a file load.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ConflictingId`] if an id repeats with a
    /// different extent or tag.
    pub fn from_rows(
        rows: impl IntoIterator<Item = (AreaPerilCell, Option<String>, Option<String>)>,
    ) -> Result<Self, CatalogError> {
        let mut builder = CatalogBuilder::default();
        for (i, (cell, state, county)) in rows.into_iter().enumerate() {
            let row = AdministrativeFallbackRow {
                county,
                state,
                imt: cell.imt.clone(),
                area_peril_id: cell.id,
            };
            builder.push(cell, row, i as u64 + 1)?;
        }
        Ok(builder.finish())
    }

    /// Distinct cells, in first-appearance order.
    #[must_use]
    pub fn cells(&self) -> &[AreaPerilCell] {
        &self.cells
    }

    /// All administrative rows, in file order.
    #[must_use]
    pub fn fallback_rows(&self) -> &[AdministrativeFallbackRow] {
        &self.fallback_rows
    }

    /// Number of cells carrying usable geometry.
    #[must_use]
    pub fn spatial_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_non_spatial()).count()
    }

    /// Distinct hazard-metric tags with their cell counts.
    #[must_use]
    pub fn imt_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for cell in &self.cells {
            *counts.entry(cell.imt.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Default)]
struct CatalogBuilder {
    catalog: Catalog,
    positions: BTreeMap<i64, usize>,
}

impl CatalogBuilder {
    fn push(
        &mut self,
        cell: AreaPerilCell,
        row: AdministrativeFallbackRow,
        line: u64,
    ) -> Result<(), CatalogError> {
        if let Some(&pos) = self.positions.get(&cell.id) {
            let existing = &self.catalog.cells[pos];
            if existing.bounds != cell.bounds || existing.imt != cell.imt {
                return Err(CatalogError::ConflictingId { line, id: cell.id });
            }
        } else {
            self.positions.insert(cell.id, self.catalog.cells.len());
            self.catalog.cells.push(cell);
        }
        self.catalog.fallback_rows.push(row);
        Ok(())
    }

    fn finish(self) -> Catalog {
        self.catalog
    }
}

fn parse_row(
    cols: &CatalogColumns,
    record: &csv::StringRecord,
    line: u64,
) -> Result<(AreaPerilCell, AdministrativeFallbackRow), CatalogError> {
    let invalid = |column: &'static str, idx: usize| CatalogError::InvalidField {
        line,
        column,
        value: record.get(idx).unwrap_or_default().to_string(),
    };

    let id = parse_int(columns::AREA_PERIL_ID, record.get(cols.id))
        .ok()
        .flatten()
        .ok_or_else(|| invalid(columns::AREA_PERIL_ID, cols.id))?;

    let edge = |column: &'static str, idx: usize| {
        parse_float(column, record.get(idx))
            .ok()
            .flatten()
            .ok_or_else(|| invalid(column, idx))
    };
    let bounds = BoundingBox::new(
        edge(columns::XMIN, cols.xmin)?,
        edge(columns::YMIN, cols.ymin)?,
        edge(columns::XMAX, cols.xmax)?,
        edge(columns::YMAX, cols.ymax)?,
    );

    let imt = parse_text(record.get(cols.imt)).ok_or_else(|| invalid(columns::IMT, cols.imt))?;

    let state = parse_text(record.get(cols.state));
    let county = parse_text(record.get(cols.county));

    let row = AdministrativeFallbackRow {
        county,
        state,
        imt: imt.clone(),
        area_peril_id: id,
    };

    Ok((AreaPerilCell { id, bounds, imt }, row))
}
