#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Keys lookup result types.
//!
//! Every location resolves to exactly one [`ResolvedKey`]. Partial results
//! from the area peril and vulnerability sub-lookups are carried as
//! [`LookupResult`] and [`VulnerabilityResult`] until they are reconciled.

use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Outcome of a lookup, using the Oasis keys status ids.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KeyStatus {
    /// A match was found.
    Success,
    /// The lookup could not be performed (bad collaborator data).
    Fail,
    /// The lookup ran but nothing matched.
    NoMatch,
}

impl KeyStatus {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Success, Self::Fail, Self::NoMatch]
    }
}

/// Peril covered by a key. This lookup only produces earthquake keys.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum PerilKind {
    /// Earthquake shake.
    #[default]
    #[serde(rename = "QEQ")]
    #[strum(serialize = "QEQ")]
    Earthquake,
}

impl PerilKind {
    /// Oasis peril id.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Earthquake => "QEQ",
        }
    }
}

/// Coverage a key applies to. This lookup only produces building keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum CoverageKind {
    /// Buildings coverage.
    #[default]
    #[strum(serialize = "buildings")]
    Buildings,
}

impl CoverageKind {
    /// Oasis coverage type id.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Buildings => 1,
        }
    }
}

impl Serialize for CoverageKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.id())
    }
}

/// Result of the area peril sub-lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    /// Lookup outcome.
    pub status: KeyStatus,
    /// Matched area peril, if any.
    pub area_peril_id: Option<i64>,
    /// Diagnostic message (empty when there is nothing to report).
    pub message: String,
}

impl LookupResult {
    /// A successful match.
    #[must_use]
    pub const fn success(area_peril_id: i64) -> Self {
        Self {
            status: KeyStatus::Success,
            area_peril_id: Some(area_peril_id),
            message: String::new(),
        }
    }

    /// No match.
    #[must_use]
    pub const fn no_match() -> Self {
        Self {
            status: KeyStatus::NoMatch,
            area_peril_id: None,
            message: String::new(),
        }
    }

    /// A failed lookup with a reason.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: KeyStatus::Fail,
            area_peril_id: None,
            message: message.into(),
        }
    }
}

/// Result of the vulnerability sub-lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityResult {
    /// Lookup outcome.
    pub status: KeyStatus,
    /// Matched vulnerability function, if any.
    pub vulnerability_id: Option<i64>,
    /// Diagnostic message.
    pub message: String,
}

impl VulnerabilityResult {
    /// A successful match.
    #[must_use]
    pub const fn success(vulnerability_id: i64) -> Self {
        Self {
            status: KeyStatus::Success,
            vulnerability_id: Some(vulnerability_id),
            message: String::new(),
        }
    }

    /// No match, with a reason.
    #[must_use]
    pub fn no_match(message: impl Into<String>) -> Self {
        Self {
            status: KeyStatus::NoMatch,
            vulnerability_id: None,
            message: message.into(),
        }
    }

    /// A failed lookup with a reason.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: KeyStatus::Fail,
            vulnerability_id: None,
            message: message.into(),
        }
    }
}

/// Final key for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedKey {
    /// Location id.
    pub locnumber: i64,
    /// Peril (always earthquake).
    pub peril_id: PerilKind,
    /// Coverage (always buildings).
    pub coverage_type: CoverageKind,
    /// Matched area peril, if any.
    pub area_peril_id: Option<i64>,
    /// Matched vulnerability function, if any.
    pub vulnerability_id: Option<i64>,
    /// Reconciled status.
    pub status: KeyStatus,
    /// Reconciled message.
    pub message: String,
}
