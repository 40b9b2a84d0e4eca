//! Key normalization for administrative fallback lookups.
//!
//! County and state names are compared after passing through a
//! [`KeyNormalizer`], applied symmetrically at table build time and at
//! query time. The default [`Exact`] policy compares names byte for byte.

use std::borrow::Cow;

use serde::Deserialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Maps an administrative name to the form used as a table key.
pub trait KeyNormalizer: Send + Sync {
    /// Returns the normalized key for `raw`.
    fn normalize<'a>(&self, raw: &'a str) -> Cow<'a, str>;
}

/// Identity normalization: exact, case-sensitive matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

impl KeyNormalizer for Exact {
    fn normalize<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(raw)
    }
}

/// Trims surrounding whitespace and lowercases.
#[derive(Debug, Clone, Copy, Default)]
pub struct FoldCase;

impl KeyNormalizer for FoldCase {
    fn normalize<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        let trimmed = raw.trim();
        if trimmed.chars().all(|c| c.to_lowercase().eq(std::iter::once(c))) {
            Cow::Borrowed(trimmed)
        } else {
            Cow::Owned(trimmed.to_lowercase())
        }
    }
}

/// Configurable choice of [`KeyNormalizer`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeyPolicy {
    /// See [`Exact`].
    #[default]
    Exact,
    /// See [`FoldCase`].
    FoldCase,
}

impl KeyPolicy {
    /// Returns the normalizer implementing this policy.
    #[must_use]
    pub fn normalizer(self) -> Box<dyn KeyNormalizer> {
        match self {
            Self::Exact => Box::new(Exact),
            Self::FoldCase => Box::new(FoldCase),
        }
    }
}
