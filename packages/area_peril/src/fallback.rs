//! Administrative fallback table.
//!
//! Maps `(county, tag)` and `(state, tag)` to an area peril id. When
//! several rows share a key, the first row in load order wins.

use std::collections::BTreeMap;

use quake_keys_catalog_models::AdministrativeFallbackRow;

use crate::normalize::{Exact, KeyNormalizer};

/// tag -> normalized name -> area peril id
type NameIndex = BTreeMap<String, BTreeMap<String, i64>>;

/// County/state lookup table built once from catalog rows.
pub struct AdministrativeFallbackTable {
    normalizer: Box<dyn KeyNormalizer>,
    by_county: NameIndex,
    by_state: NameIndex,
}

impl AdministrativeFallbackTable {
    /// Builds the table with exact, case-sensitive name matching.
    #[must_use]
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a AdministrativeFallbackRow>) -> Self {
        Self::with_normalizer(rows, Box::new(Exact))
    }

    /// Builds the table with a custom name normalizer.
    #[must_use]
    pub fn with_normalizer<'a>(
        rows: impl IntoIterator<Item = &'a AdministrativeFallbackRow>,
        normalizer: Box<dyn KeyNormalizer>,
    ) -> Self {
        let mut by_county = NameIndex::new();
        let mut by_state = NameIndex::new();

        for row in rows {
            let key = (row.imt.as_str(), row.area_peril_id);
            if let Some(county) = row.county.as_deref() {
                insert_first(&mut by_county, normalizer.as_ref(), key, county);
            }
            if let Some(state) = row.state.as_deref() {
                insert_first(&mut by_state, normalizer.as_ref(), key, state);
            }
        }

        log::debug!(
            "Built fallback table: {} county keys, {} state keys",
            by_county.values().map(BTreeMap::len).sum::<usize>(),
            by_state.values().map(BTreeMap::len).sum::<usize>()
        );

        Self {
            normalizer,
            by_county,
            by_state,
        }
    }

    /// Looks up an area peril by county name and hazard-metric tag.
    #[must_use]
    pub fn lookup_by_county(&self, name: &str, imt: &str) -> Option<i64> {
        self.lookup(&self.by_county, name, imt)
    }

    /// Looks up an area peril by state name and hazard-metric tag.
    #[must_use]
    pub fn lookup_by_state(&self, name: &str, imt: &str) -> Option<i64> {
        self.lookup(&self.by_state, name, imt)
    }

    fn lookup(&self, index: &NameIndex, name: &str, imt: &str) -> Option<i64> {
        let key = self.normalizer.normalize(name);
        index.get(imt)?.get(key.as_ref()).copied()
    }
}

fn insert_first(
    index: &mut NameIndex,
    normalizer: &dyn KeyNormalizer,
    (imt, area_peril_id): (&str, i64),
    name: &str,
) {
    index
        .entry(imt.to_string())
        .or_default()
        .entry(normalizer.normalize(name).into_owned())
        .or_insert(area_peril_id);
}
