#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Exposure location types.
//!
//! A [`RawLocation`] is one typed row of the location file before the
//! taxonomy and hazard-metric joins. A [`LocationRecord`] is the immutable,
//! fully joined record handed to the resolvers.

pub mod values;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A field value that failed type validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {expected} in column {column}: {value:?}")]
pub struct FieldError {
    /// Source column name.
    pub column: &'static str,
    /// Offending raw value.
    pub value: String,
    /// Expected type name.
    pub expected: &'static str,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(column: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            column,
            value: value.to_string(),
            expected,
        }
    }
}

/// Errors raised while reading location rows.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    /// A required column is absent from the header row.
    #[error("Missing required location column: {0}")]
    MissingColumn(&'static str),

    /// A field on a specific row failed validation.
    #[error("Location row {line}: {source}")]
    Field {
        /// 1-based line number in the source file.
        line: u64,
        /// The field failure.
        source: FieldError,
    },

    /// The location id is absent.
    #[error("Location row {line}: missing LocNumber")]
    MissingId {
        /// 1-based line number in the source file.
        line: u64,
    },
}

/// Source column names for location files.
///
/// Matching against the header row is case-insensitive.
pub mod columns {
    /// Location id.
    pub const LOC_NUMBER: &str = "LocNumber";
    /// Longitude.
    pub const LONGITUDE: &str = "Longitude";
    /// Latitude.
    pub const LATITUDE: &str = "Latitude";
    /// County name.
    pub const COUNTY: &str = "GeogName1";
    /// State name.
    pub const STATE: &str = "AreaName1";
    /// Country code.
    pub const COUNTRY: &str = "CountryCode";
    /// Building coverage value.
    pub const COVERAGE: &str = "BuildingTIV";
    /// Construction code used for the taxonomy join.
    pub const CONSTRUCTION_CODE: &str = "ConstructionCode";
    /// Storey count used for the taxonomy join.
    pub const NUMBER_OF_STOREYS: &str = "NumberOfStoreys";
    /// Occupancy code.
    pub const OCCUPANCY: &str = "OccupancyCode";
    /// Explicit taxonomy, overriding the construction/storeys join.
    pub const TAXONOMY: &str = "taxonomy";
    /// Hazard-metric tag.
    pub const IMT: &str = "type";
}

/// Positions of known columns within a header row.
#[derive(Debug, Clone)]
pub struct LocationColumns {
    positions: BTreeMap<&'static str, usize>,
}

impl LocationColumns {
    const KNOWN: &[&'static str] = &[
        columns::LOC_NUMBER,
        columns::LONGITUDE,
        columns::LATITUDE,
        columns::COUNTY,
        columns::STATE,
        columns::COUNTRY,
        columns::COVERAGE,
        columns::CONSTRUCTION_CODE,
        columns::NUMBER_OF_STOREYS,
        columns::OCCUPANCY,
        columns::TAXONOMY,
        columns::IMT,
    ];

    /// Resolves column positions from a header row.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::MissingColumn`] if `LocNumber` is absent.
    pub fn from_headers<'a>(
        headers: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, LocationError> {
        let lowered: Vec<String> = headers
            .into_iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mut positions = BTreeMap::new();
        for name in Self::KNOWN {
            let wanted = name.to_lowercase();
            if let Some(idx) = lowered.iter().position(|h| *h == wanted) {
                positions.insert(*name, idx);
            }
        }

        if !positions.contains_key(columns::LOC_NUMBER) {
            return Err(LocationError::MissingColumn(columns::LOC_NUMBER));
        }

        Ok(Self { positions })
    }

    /// Returns `true` if the header row carried this column.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    fn get<'a>(&self, fields: &[&'a str], name: &str) -> Option<&'a str> {
        self.positions
            .get(name)
            .and_then(|&idx| fields.get(idx).copied())
    }
}

/// A typed location row prior to the taxonomy / hazard-metric joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    /// Location id.
    pub id: i64,
    /// Longitude; `None` when absent or unparsable.
    pub lon: Option<f64>,
    /// Latitude; `None` when absent or unparsable.
    pub lat: Option<f64>,
    /// County name.
    pub county: Option<String>,
    /// State name.
    pub state: Option<String>,
    /// Country code.
    pub country: Option<String>,
    /// Building coverage value.
    pub coverage: Option<i64>,
    /// Construction code.
    pub construction_code: Option<String>,
    /// Number of storeys.
    pub number_of_storeys: Option<i64>,
    /// Occupancy code.
    pub occupancy: Option<String>,
    /// Explicit taxonomy, if the file supplies one.
    pub taxonomy: Option<String>,
    /// Explicit hazard-metric tag, if the file supplies one.
    pub imt: Option<String>,
}

impl RawLocation {
    /// Parses one row of fields using previously resolved columns.
    ///
    /// Coordinates that fail to parse are treated as absent so that the
    /// row can still resolve through administrative fallback.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError`] if the id is missing or an integer field
    /// is malformed.
    pub fn parse(
        cols: &LocationColumns,
        line: u64,
        fields: &[&str],
    ) -> Result<Self, LocationError> {
        use values::{parse_float, parse_int, parse_text};

        let field_err = |source| LocationError::Field { line, source };

        let id = parse_int(columns::LOC_NUMBER, cols.get(fields, columns::LOC_NUMBER))
            .map_err(field_err)?
            .ok_or(LocationError::MissingId { line })?;

        let coordinate = |name: &'static str| {
            parse_float(name, cols.get(fields, name)).unwrap_or_else(|e| {
                log::debug!("Location {id}: {e}, treating as absent");
                None
            })
        };
        let lon = coordinate(columns::LONGITUDE);
        let lat = coordinate(columns::LATITUDE);

        let coverage =
            parse_int(columns::COVERAGE, cols.get(fields, columns::COVERAGE)).map_err(field_err)?;
        let number_of_storeys = parse_int(
            columns::NUMBER_OF_STOREYS,
            cols.get(fields, columns::NUMBER_OF_STOREYS),
        )
        .map_err(field_err)?;

        let text = |name: &str| parse_text(cols.get(fields, name));

        Ok(Self {
            id,
            lon,
            lat,
            county: text(columns::COUNTY),
            state: text(columns::STATE),
            country: text(columns::COUNTRY),
            coverage,
            construction_code: text(columns::CONSTRUCTION_CODE),
            number_of_storeys,
            occupancy: text(columns::OCCUPANCY),
            taxonomy: text(columns::TAXONOMY),
            imt: text(columns::IMT),
        })
    }
}

/// A fully joined exposure location, ready for resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    /// Location id.
    pub id: i64,
    /// Longitude.
    pub lon: Option<f64>,
    /// Latitude.
    pub lat: Option<f64>,
    /// County name (`GeogName1`).
    pub county: Option<String>,
    /// State name (`AreaName1`).
    pub state: Option<String>,
    /// Country code.
    pub country: Option<String>,
    /// Building coverage value.
    pub coverage: Option<i64>,
    /// Structural taxonomy string.
    pub taxonomy: Option<String>,
    /// Occupancy code.
    pub occupancy: Option<String>,
    /// Hazard-metric tag (IMT).
    pub imt: Option<String>,
}

impl LocationRecord {
    /// Creates a record with only an id; every other attribute is absent.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self {
            id,
            lon: None,
            lat: None,
            county: None,
            state: None,
            country: None,
            coverage: None,
            taxonomy: None,
            occupancy: None,
            imt: None,
        }
    }

    /// Sets coordinates.
    #[must_use]
    pub const fn with_coordinates(mut self, lon: f64, lat: f64) -> Self {
        self.lon = Some(lon);
        self.lat = Some(lat);
        self
    }

    /// Sets the hazard-metric tag.
    #[must_use]
    pub fn with_imt(mut self, imt: &str) -> Self {
        self.imt = Some(imt.to_string());
        self
    }

    /// Sets the county name.
    #[must_use]
    pub fn with_county(mut self, county: &str) -> Self {
        self.county = Some(county.to_string());
        self
    }

    /// Sets the state name.
    #[must_use]
    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    /// Sets the taxonomy.
    #[must_use]
    pub fn with_taxonomy(mut self, taxonomy: &str) -> Self {
        self.taxonomy = Some(taxonomy.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &[&str] = &[
        "LOCNUMBER",
        "longitude",
        "latitude",
        "GeogName1",
        "AreaName1",
        "CountryCode",
        "BuildingTIV",
        "ConstructionCode",
        "NumberOfStoreys",
        "OccupancyCode",
    ];

    #[test]
    fn header_matching_ignores_case() {
        let cols = LocationColumns::from_headers(HEADER.iter().copied()).unwrap();
        assert!(cols.has(columns::LOC_NUMBER));
        assert!(cols.has(columns::LONGITUDE));
        assert!(!cols.has(columns::IMT));
    }

    #[test]
    fn missing_id_column_is_rejected() {
        let err = LocationColumns::from_headers(["Longitude", "Latitude"]).unwrap_err();
        assert!(matches!(err, LocationError::MissingColumn("LocNumber")));
    }

    #[test]
    fn parses_full_row() {
        let cols = LocationColumns::from_headers(HEADER.iter().copied()).unwrap();
        let row = [
            "7", "-78.5", "-0.2", "Quito", "Pichincha", "EC", "250000", "5105", "2", "1050",
        ];
        let raw = RawLocation::parse(&cols, 2, &row).unwrap();
        assert_eq!(raw.id, 7);
        assert_eq!(raw.lon, Some(-78.5));
        assert_eq!(raw.county.as_deref(), Some("Quito"));
        assert_eq!(raw.coverage, Some(250_000));
        assert_eq!(raw.number_of_storeys, Some(2));
        assert_eq!(raw.imt, None);
    }

    #[test]
    fn null_tokens_map_to_absent() {
        let cols = LocationColumns::from_headers(HEADER.iter().copied()).unwrap();
        let row = ["8", "NULL", "n/a", "", "N/A", "null", "", "5000", "1", "Null"];
        let raw = RawLocation::parse(&cols, 3, &row).unwrap();
        assert_eq!(raw.lon, None);
        assert_eq!(raw.lat, None);
        assert_eq!(raw.county, None);
        assert_eq!(raw.state, None);
        assert_eq!(raw.coverage, None);
        assert_eq!(raw.occupancy, None);
    }

    #[test]
    fn unparsable_coordinates_degrade_to_absent() {
        let cols = LocationColumns::from_headers(HEADER.iter().copied()).unwrap();
        let row = ["9", "east", "12.5", "", "", "", "", "", "", ""];
        let raw = RawLocation::parse(&cols, 4, &row).unwrap();
        assert_eq!(raw.lon, None);
        assert_eq!(raw.lat, Some(12.5));
    }

    #[test]
    fn invalid_integer_field_reports_line_and_column() {
        let cols = LocationColumns::from_headers(HEADER.iter().copied()).unwrap();
        let row = ["10", "1", "1", "", "", "", "lots", "", "", ""];
        let err = RawLocation::parse(&cols, 5, &row).unwrap_err();
        match err {
            LocationError::Field { line, source } => {
                assert_eq!(line, 5);
                assert_eq!(source.column, "BuildingTIV");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_id_value_is_rejected() {
        let cols = LocationColumns::from_headers(HEADER.iter().copied()).unwrap();
        let row = ["NULL", "1", "1", "", "", "", "", "", "", ""];
        assert!(matches!(
            RawLocation::parse(&cols, 6, &row),
            Err(LocationError::MissingId { line: 6 })
        ));
    }
}
