#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for area peril cells.
//!
//! Bulk-loads the bounding boxes of every cell that carries geometry into an
//! R-tree and answers point-containment queries. The index is built once and
//! never mutated, so it can be shared freely between threads.

use quake_keys_catalog_models::AreaPerilCell;
use rstar::{AABB, RTree, RTreeObject};

/// Errors that can occur while building the index.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// A cell has a non-finite or inverted bounding box.
    #[error("Area peril {id} has an invalid bounding box")]
    InvalidBounds {
        /// Offending cell id.
        id: i64,
    },
}

/// A cell envelope stored in the R-tree.
///
/// `order` is the cell's position in the catalog and defines the iteration
/// order of query results.
struct CellEntry {
    order: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for CellEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Bounding-box index over area peril cells.
pub struct SpatialCellIndex {
    cells: Vec<AreaPerilCell>,
    tree: RTree<CellEntry>,
}

impl SpatialCellIndex {
    /// Builds the index from catalog cells.
    ///
    /// Non-spatial sentinel cells are skipped. Any remaining cell with an
    /// unusable box aborts the build so that a partial index is never served.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidBounds`] for a malformed cell.
    pub fn build<'a>(
        cells: impl IntoIterator<Item = &'a AreaPerilCell>,
    ) -> Result<Self, SpatialError> {
        let mut kept = Vec::new();
        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for cell in cells {
            if cell.is_non_spatial() {
                skipped += 1;
                continue;
            }
            if !cell.bounds.is_well_formed() {
                return Err(SpatialError::InvalidBounds { id: cell.id });
            }

            let b = cell.bounds;
            entries.push(CellEntry {
                order: kept.len(),
                envelope: AABB::from_corners([b.xmin, b.ymin], [b.xmax, b.ymax]),
            });
            kept.push(cell.clone());
        }

        let tree = RTree::bulk_load(entries);
        log::info!(
            "Loaded {} area peril cells into spatial index ({skipped} non-spatial skipped)",
            tree.size()
        );

        Ok(Self { cells: kept, tree })
    }

    /// Returns every cell whose box contains the point, boundaries
    /// included, in catalog order.
    #[must_use]
    pub fn query_point(&self, lon: f64, lat: f64) -> Vec<&AreaPerilCell> {
        let query_env = AABB::from_point([lon, lat]);

        let mut orders: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_env)
            .map(|entry| entry.order)
            .collect();
        orders.sort_unstable();

        orders.into_iter().map(|i| &self.cells[i]).collect()
    }

    /// Number of indexed cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if no cell carries geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use quake_keys_catalog_models::BoundingBox;

    use super::*;

    fn cell(id: i64, bounds: (f64, f64, f64, f64), imt: &str) -> AreaPerilCell {
        AreaPerilCell {
            id,
            bounds: BoundingBox::new(bounds.0, bounds.1, bounds.2, bounds.3),
            imt: imt.to_string(),
        }
    }

    fn ids(index: &SpatialCellIndex, lon: f64, lat: f64) -> Vec<i64> {
        index.query_point(lon, lat).iter().map(|c| c.id).collect()
    }

    #[test]
    fn finds_containing_cell() {
        let cells = [
            cell(1, (10.0, 10.0, 20.0, 20.0), "PGA"),
            cell(2, (30.0, 30.0, 40.0, 40.0), "PGA"),
        ];
        let index = SpatialCellIndex::build(&cells).unwrap();
        assert_eq!(ids(&index, 15.0, 15.0), vec![1]);
        assert_eq!(ids(&index, 35.0, 31.0), vec![2]);
        assert!(ids(&index, 25.0, 25.0).is_empty());
    }

    #[test]
    fn overlapping_cells_come_back_in_catalog_order() {
        let cells = [
            cell(7, (0.0, 0.0, 10.0, 10.0), "SA(0.3)"),
            cell(3, (5.0, 5.0, 15.0, 15.0), "PGA"),
            cell(5, (4.0, 4.0, 6.0, 6.0), "PGA"),
        ];
        let index = SpatialCellIndex::build(&cells).unwrap();
        assert_eq!(ids(&index, 5.5, 5.5), vec![7, 3, 5]);
    }

    #[test]
    fn boundary_points_are_contained() {
        let cells = [cell(1, (10.0, 10.0, 20.0, 20.0), "PGA")];
        let index = SpatialCellIndex::build(&cells).unwrap();
        assert_eq!(ids(&index, 10.0, 20.0), vec![1]);
    }

    #[test]
    fn sentinel_cells_are_excluded() {
        let cells = [
            cell(1, (-9999.0, -9999.0, 9999.0, 9999.0), "PGA"),
            cell(2, (10.0, 10.0, 20.0, 20.0), "PGA"),
        ];
        let index = SpatialCellIndex::build(&cells).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(ids(&index, 15.0, 15.0), vec![2]);
        assert!(ids(&index, 0.0, 0.0).is_empty());
    }

    #[test]
    fn malformed_box_aborts_build() {
        let cells = [
            cell(1, (10.0, 10.0, 20.0, 20.0), "PGA"),
            cell(2, (20.0, 10.0, 10.0, 20.0), "PGA"),
        ];
        assert!(matches!(
            SpatialCellIndex::build(&cells),
            Err(SpatialError::InvalidBounds { id: 2 })
        ));
    }

    #[test]
    fn empty_catalog_builds_empty_index() {
        let cells: [AreaPerilCell; 0] = [];
        let index = SpatialCellIndex::build(&cells).unwrap();
        assert!(index.is_empty());
        assert!(index.query_point(1.0, 1.0).is_empty());
    }
}
