#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard-zone catalog types.
//!
//! An area peril is a discretized geographic hazard zone. Each catalog row
//! describes one cell (its id, bounding box, and hazard-metric tag) along
//! with the administrative names it belongs to. The same cell may be
//! listed on several rows when it spans more than one county or state.

use serde::{Deserialize, Serialize};

/// Cells whose `xmin` is at or below this value carry no usable geometry.
///
/// They never enter the spatial index but remain available for
/// county/state fallback lookups.
pub const NON_SPATIAL_XMIN: f64 = -9990.0;

/// Axis-aligned bounding box in lon/lat degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western edge (minimum longitude).
    pub xmin: f64,
    /// Southern edge (minimum latitude).
    pub ymin: f64,
    /// Eastern edge (maximum longitude).
    pub xmax: f64,
    /// Northern edge (maximum latitude).
    pub ymax: f64,
}

impl BoundingBox {
    /// Creates a bounding box from its four edges.
    #[must_use]
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Returns `true` when the box is a placeholder without geometry.
    #[must_use]
    pub fn is_non_spatial(&self) -> bool {
        self.xmin <= NON_SPATIAL_XMIN
    }

    /// Returns `true` when all edges are finite and min <= max on both axes.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|v| v.is_finite())
            && self.xmin <= self.xmax
            && self.ymin <= self.ymax
    }

    /// Inclusive point containment.
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.xmin && lon <= self.xmax && lat >= self.ymin && lat <= self.ymax
    }
}

/// A single area peril cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaPerilCell {
    /// Catalog-unique area peril id.
    pub id: i64,
    /// Cell extent.
    pub bounds: BoundingBox,
    /// Hazard-metric tag (IMT), e.g. `"PGA"`.
    pub imt: String,
}

impl AreaPerilCell {
    /// Returns `true` when this cell should be excluded from spatial
    /// queries.
    #[must_use]
    pub fn is_non_spatial(&self) -> bool {
        self.bounds.is_non_spatial()
    }
}

/// One row of the administrative fallback table.
///
/// Load order matters: the first row matching a lookup wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministrativeFallbackRow {
    /// County name (`NAME_2`), if any.
    pub county: Option<String>,
    /// State name (`NAME_1`), if any.
    pub state: Option<String>,
    /// Hazard-metric tag of the referenced cell.
    pub imt: String,
    /// Referenced area peril id.
    pub area_peril_id: i64,
}
