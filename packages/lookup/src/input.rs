//! Location file reading.
//!
//! Parses exposure rows and joins each one with its structural taxonomy and
//! hazard-metric tag, producing resolver-ready [`LocationRecord`]s.

use std::io::Read;
use std::path::Path;

use quake_keys_location_models::{LocationColumns, LocationRecord, RawLocation};
use quake_keys_vulnerability::VulnerabilityDictionary;

use crate::LookupError;

/// Joins a parsed row with its taxonomy and hazard-metric tag.
///
/// An explicit `taxonomy` column wins over the construction code / storey
/// count mapping; an explicit `type` column wins over the tag recorded in
/// the vulnerability dictionary.
#[must_use]
pub fn join_location(raw: RawLocation, vulnerabilities: &VulnerabilityDictionary) -> LocationRecord {
    let taxonomy = raw.taxonomy.or_else(|| {
        let code = raw.construction_code.as_deref()?;
        let storeys = raw.number_of_storeys?;
        quake_keys_taxonomy::taxonomy_for(code, storeys).map(str::to_string)
    });
    if taxonomy.is_none() {
        log::debug!(
            "Location {}: no taxonomy for construction code {:?}, {:?} storeys",
            raw.id,
            raw.construction_code,
            raw.number_of_storeys
        );
    }

    let imt = raw.imt.or_else(|| {
        taxonomy
            .as_deref()
            .and_then(|t| vulnerabilities.imt_for(t))
            .map(str::to_string)
    });

    LocationRecord {
        id: raw.id,
        lon: raw.lon,
        lat: raw.lat,
        county: raw.county,
        state: raw.state,
        country: raw.country,
        coverage: raw.coverage,
        taxonomy,
        occupancy: raw.occupancy,
        imt,
    }
}

/// Reads and joins every location from a CSV source, in file order.
///
/// # Errors
///
/// Returns [`LookupError`] on CSV decoding failures or the first invalid
/// row.
pub fn read_locations(
    reader: impl Read,
    vulnerabilities: &VulnerabilityDictionary,
) -> Result<Vec<LocationRecord>, LookupError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let cols = LocationColumns::from_headers(csv_reader.headers()?.iter())?;

    let mut locations = Vec::new();
    for (i, result) in csv_reader.records().enumerate() {
        let record = result?;
        let line = i as u64 + 2;
        let fields: Vec<&str> = record.iter().collect();
        let raw = RawLocation::parse(&cols, line, &fields)?;
        locations.push(join_location(raw, vulnerabilities));
    }

    Ok(locations)
}

/// Reads and joins every location from a CSV file.
///
/// # Errors
///
/// Returns [`LookupError`] if the file cannot be opened or any row is
/// invalid.
pub fn load_locations(
    path: &Path,
    vulnerabilities: &VulnerabilityDictionary,
) -> Result<Vec<LocationRecord>, LookupError> {
    let file = std::fs::File::open(path).map_err(|e| LookupError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let locations = read_locations(file, vulnerabilities)?;
    log::info!("Read {} locations from {}", locations.len(), path.display());
    Ok(locations)
}
