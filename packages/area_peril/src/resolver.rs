//! Area peril resolution.
//!
//! Resolution short-circuits through three levels: a point match in the
//! spatial index, then the county fallback, then the state fallback. Each
//! level only accepts candidates whose hazard-metric tag equals the
//! location's tag.

use quake_keys_catalog::Catalog;
use quake_keys_keys_models::LookupResult;
use quake_keys_location_models::LocationRecord;
use quake_keys_spatial::SpatialCellIndex;

use crate::AreaPerilError;
use crate::fallback::AdministrativeFallbackTable;
use crate::normalize::KeyPolicy;

/// Coordinates within this distance of the origin on both axes are
/// treated as placeholders.
pub const ORIGIN_TOLERANCE: f64 = 0.01;

/// Which level of the fallback chain produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLevel {
    /// Point-in-box match.
    Point,
    /// County name match.
    County,
    /// State name match.
    State,
}

/// Returns the coordinates if they are usable for a spatial lookup.
///
/// Both values must be present, finite, within lat/lon range, and not
/// both within [`ORIGIN_TOLERANCE`] of zero.
#[must_use]
pub fn usable_coordinates(lon: Option<f64>, lat: Option<f64>) -> Option<(f64, f64)> {
    let (lon, lat) = (lon?, lat?);
    let in_range = (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat);
    let off_origin = lon.abs() > ORIGIN_TOLERANCE || lat.abs() > ORIGIN_TOLERANCE;
    (in_range && off_origin).then_some((lon, lat))
}

/// Resolves locations to area peril ids.
///
/// Owns its spatial index and fallback table; both are immutable after
/// construction.
pub struct AreaPerilResolver {
    index: SpatialCellIndex,
    table: AdministrativeFallbackTable,
}

impl AreaPerilResolver {
    /// Creates a resolver from prebuilt parts.
    #[must_use]
    pub const fn new(index: SpatialCellIndex, table: AdministrativeFallbackTable) -> Self {
        Self { index, table }
    }

    /// Builds the spatial index and fallback table from a loaded catalog.
    ///
    /// # Errors
    ///
    /// Returns [`AreaPerilError`] if the spatial index cannot be built.
    pub fn from_catalog(catalog: &Catalog, policy: KeyPolicy) -> Result<Self, AreaPerilError> {
        let index = SpatialCellIndex::build(catalog.cells())?;
        let table =
            AdministrativeFallbackTable::with_normalizer(catalog.fallback_rows(), policy.normalizer());
        log::info!(
            "Area peril resolver ready: {} spatial cells, {policy} admin key policy",
            index.len()
        );
        Ok(Self::new(index, table))
    }

    /// The spatial index backing this resolver.
    #[must_use]
    pub const fn index(&self) -> &SpatialCellIndex {
        &self.index
    }

    /// Resolves a location. Never returns a `Fail` status.
    #[must_use]
    pub fn resolve(&self, location: &LocationRecord) -> LookupResult {
        match self.resolve_with_level(location) {
            Some((id, _)) => LookupResult::success(id),
            None => LookupResult::no_match(),
        }
    }

    /// Resolves a location, also reporting which level matched.
    #[must_use]
    pub fn resolve_with_level(&self, location: &LocationRecord) -> Option<(i64, MatchLevel)> {
        let Some(imt) = location.imt.as_deref() else {
            log::debug!("Location {}: no hazard-metric tag", location.id);
            return None;
        };

        if let Some((lon, lat)) = usable_coordinates(location.lon, location.lat) {
            if let Some(cell) = self
                .index
                .query_point(lon, lat)
                .into_iter()
                .find(|cell| cell.imt == imt)
            {
                log::trace!("Location {}: point match {}", location.id, cell.id);
                return Some((cell.id, MatchLevel::Point));
            }
        } else {
            log::trace!(
                "Location {}: unusable coordinates ({:?}, {:?})",
                location.id,
                location.lon,
                location.lat
            );
        }

        if let Some(county) = present(location.county.as_deref())
            && let Some(id) = self.table.lookup_by_county(county, imt)
        {
            log::trace!("Location {}: county match {id}", location.id);
            return Some((id, MatchLevel::County));
        }

        if let Some(state) = present(location.state.as_deref())
            && let Some(id) = self.table.lookup_by_state(state, imt)
        {
            log::trace!("Location {}: state match {id}", location.id);
            return Some((id, MatchLevel::State));
        }

        log::debug!("Location {}: no area peril match", location.id);
        None
    }
}

fn present(name: Option<&str>) -> Option<&str> {
    name.filter(|s| !s.is_empty())
}
