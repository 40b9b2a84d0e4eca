#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Construction code to GEM taxonomy mapping.
//!
//! Exposure files describe structures by OED construction code and storey
//! count. Vulnerability functions are keyed by GEM building taxonomy
//! strings. This fixed table bridges the two.

use serde::Serialize;

/// One row of the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyEntry {
    /// OED construction code.
    pub construction_code: &'static str,
    /// Number of storeys (`-1` for unknown).
    pub number_of_storeys: i64,
    /// GEM taxonomy string.
    pub taxonomy: &'static str,
}

impl TaxonomyEntry {
    const fn new(
        construction_code: &'static str,
        number_of_storeys: i64,
        taxonomy: &'static str,
    ) -> Self {
        Self {
            construction_code,
            number_of_storeys,
            taxonomy,
        }
    }
}

// Several (code, storeys) pairs list more than one ductility class; the
// first listed class is the one used.
static ENTRIES: &[TaxonomyEntry] = &[
    TaxonomyEntry::new("5156", 1, "CR-PC_LWAL-DNO_H1"),
    TaxonomyEntry::new("5150", 2, "CR_LFINF-DNO_H2"),
    TaxonomyEntry::new("5150", 2, "CR_LFINF-DUH_H2"),
    TaxonomyEntry::new("5150", 3, "CR_LFINF-DUH_H3"),
    TaxonomyEntry::new("5150", 2, "CR_LFINF-DUM_H2"),
    TaxonomyEntry::new("5150", 3, "CR_LFINF-DUM_H3"),
    TaxonomyEntry::new("5150", 1, "CR_LFM-DNO_H1"),
    TaxonomyEntry::new("5109", 2, "MCF_LWAL-DNO_H2"),
    TaxonomyEntry::new("5109", 3, "MCF_LWAL-DNO_H3"),
    TaxonomyEntry::new("5109", 2, "MCF_LWAL-DUH_H2"),
    TaxonomyEntry::new("5109", 3, "MCF_LWAL-DUH_H3"),
    TaxonomyEntry::new("5109", 2, "MCF_LWAL-DUM_H2"),
    TaxonomyEntry::new("5109", 3, "MCF_LWAL-DUM_H3"),
    TaxonomyEntry::new("5109", 1, "MR_LWAL-DNO_H1"),
    TaxonomyEntry::new("5105", 2, "MR_LWAL-DNO_H2"),
    TaxonomyEntry::new("5105", 3, "MR_LWAL-DNO_H3"),
    TaxonomyEntry::new("5105", 1, "MR_LWAL-DUH_H1"),
    TaxonomyEntry::new("5105", 2, "MR_LWAL-DUH_H2"),
    TaxonomyEntry::new("5105", 3, "MR_LWAL-DUH_H3"),
    TaxonomyEntry::new("5105", 1, "MR_LWAL-DUM_H1"),
    TaxonomyEntry::new("5105", 2, "MR_LWAL-DUM_H2"),
    TaxonomyEntry::new("5105", 3, "MR_LWAL-DUM_H3"),
    TaxonomyEntry::new("5101", 2, "MUR-ADO_LWAL-DNO_H2"),
    TaxonomyEntry::new("5103", 2, "MUR-ST_LWAL-DNO_H2"),
    TaxonomyEntry::new("5103", 1, "MUR_LWAL-DNO_H1"),
    TaxonomyEntry::new("5103", 2, "MUR_LWAL-DNO_H2"),
    TaxonomyEntry::new("5000", 1, "UNK_H1"),
    TaxonomyEntry::new("5050", 1, "W-WBB_LPB-DNO_H1"),
    TaxonomyEntry::new("5050", 1, "W-WLI_LWAL-DNO_H1"),
    TaxonomyEntry::new("5050", 2, "W-WLI_LWAL-DNO_H2"),
    TaxonomyEntry::new("5050", 1, "W-WS_LPB-DNO_H1"),
    TaxonomyEntry::new("5050", -1, "W-"),
];

/// Returns every mapping row in table order.
#[must_use]
pub fn entries() -> &'static [TaxonomyEntry] {
    ENTRIES
}

/// Maps a construction code and storey count to a GEM taxonomy.
///
/// Returns `None` when the pair is not in the table.
#[must_use]
pub fn taxonomy_for(construction_code: &str, number_of_storeys: i64) -> Option<&'static str> {
    let code = construction_code.trim();
    ENTRIES
        .iter()
        .find(|e| e.construction_code == code && e.number_of_storeys == number_of_storeys)
        .map(|e| e.taxonomy)
}
