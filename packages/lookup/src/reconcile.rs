//! Status reconciliation.
//!
//! Combines the area peril and vulnerability outcomes for a location into
//! one [`ResolvedKey`].

use quake_keys_area_peril::AreaPerilResolver;
use quake_keys_keys_models::{
    CoverageKind, KeyStatus, LookupResult, PerilKind, ResolvedKey, VulnerabilityResult,
};
use quake_keys_location_models::LocationRecord;
use quake_keys_vulnerability::VulnerabilityResolver;

/// Message attached to keys where neither lookup failed but at least one
/// found nothing.
pub const NO_MATCH_MESSAGE: &str = "No area peril or vulnerability match";

/// Merges two sub-lookup outcomes into a final status and message.
///
/// Both successful gives `Success`. Any failure gives `Fail` with both
/// messages joined by `", "`. Everything else is `NoMatch`.
#[must_use]
pub fn merge(area: &LookupResult, vulnerability: &VulnerabilityResult) -> (KeyStatus, String) {
    match (area.status, vulnerability.status) {
        (KeyStatus::Success, KeyStatus::Success) => (KeyStatus::Success, String::new()),
        (KeyStatus::Fail, _) | (_, KeyStatus::Fail) => (
            KeyStatus::Fail,
            format!("{}, {}", area.message, vulnerability.message),
        ),
        _ => (KeyStatus::NoMatch, NO_MATCH_MESSAGE.to_string()),
    }
}

/// Produces one [`ResolvedKey`] per location from a pair of resolvers.
#[derive(Clone, Copy)]
pub struct KeyResolutionReconciler<'a> {
    area_peril: &'a AreaPerilResolver,
    vulnerability: &'a dyn VulnerabilityResolver,
}

impl<'a> KeyResolutionReconciler<'a> {
    /// Creates a reconciler over borrowed resolvers.
    #[must_use]
    pub const fn new(
        area_peril: &'a AreaPerilResolver,
        vulnerability: &'a dyn VulnerabilityResolver,
    ) -> Self {
        Self {
            area_peril,
            vulnerability,
        }
    }

    /// Resolves a single location.
    #[must_use]
    pub fn resolve(&self, location: &LocationRecord) -> ResolvedKey {
        let area = self.area_peril.resolve(location);
        let vulnerability = self.vulnerability.resolve(location);
        let (status, message) = merge(&area, &vulnerability);

        ResolvedKey {
            locnumber: location.id,
            peril_id: PerilKind::Earthquake,
            coverage_type: CoverageKind::Buildings,
            area_peril_id: area.area_peril_id,
            vulnerability_id: vulnerability.vulnerability_id,
            status,
            message,
        }
    }

    /// Lazily resolves a sequence of locations, preserving input order.
    pub fn resolve_all<I>(self, locations: I) -> ResolvedKeys<'a, I::IntoIter>
    where
        I: IntoIterator<Item = LocationRecord>,
    {
        ResolvedKeys {
            reconciler: self,
            locations: locations.into_iter(),
        }
    }
}

/// Lazy, order-preserving stream of resolved keys.
///
/// Finite and single-pass: to resolve again, call
/// [`KeyResolutionReconciler::resolve_all`] over the full input.
pub struct ResolvedKeys<'a, I> {
    reconciler: KeyResolutionReconciler<'a>,
    locations: I,
}

impl<I: Iterator<Item = LocationRecord>> Iterator for ResolvedKeys<'_, I> {
    type Item = ResolvedKey;

    fn next(&mut self) -> Option<Self::Item> {
        let location = self.locations.next()?;
        Some(self.reconciler.resolve(&location))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.locations.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use quake_keys_area_peril::KeyPolicy;
    use quake_keys_catalog::Catalog;
    use quake_keys_catalog_models::{AreaPerilCell, BoundingBox};

    use super::*;

    struct Fixed(VulnerabilityResult);

    impl VulnerabilityResolver for Fixed {
        fn resolve(&self, _location: &LocationRecord) -> VulnerabilityResult {
            self.0.clone()
        }
    }

    fn resolver() -> AreaPerilResolver {
        let catalog = Catalog::from_rows([(
            AreaPerilCell {
                id: 1,
                bounds: BoundingBox::new(10.0, 10.0, 20.0, 20.0),
                imt: "PGA".to_string(),
            },
            Some("StateA".to_string()),
            Some("CountyA".to_string()),
        )])
        .unwrap();
        AreaPerilResolver::from_catalog(&catalog, KeyPolicy::Exact).unwrap()
    }

    #[test]
    fn both_success_is_success() {
        let (status, message) = merge(
            &LookupResult::success(1),
            &VulnerabilityResult::success(2),
        );
        assert_eq!(status, KeyStatus::Success);
        assert_eq!(message, "");
    }

    #[test]
    fn any_fail_forces_fail_with_both_messages() {
        let (status, message) = merge(
            &LookupResult::fail("bad area"),
            &VulnerabilityResult::success(2),
        );
        assert_eq!(status, KeyStatus::Fail);
        assert_eq!(message, "bad area, ");

        let (status, message) = merge(
            &LookupResult::no_match(),
            &VulnerabilityResult::fail("bad vuln"),
        );
        assert_eq!(status, KeyStatus::Fail);
        assert_eq!(message, ", bad vuln");
    }

    #[test]
    fn fail_outranks_no_match() {
        let (status, message) = merge(
            &LookupResult::fail("x"),
            &VulnerabilityResult::no_match("y"),
        );
        assert_eq!(status, KeyStatus::Fail);
        assert_eq!(message, "x, y");
    }

    #[test]
    fn both_fail_joins_both_messages() {
        let (status, message) = merge(
            &LookupResult::fail("a"),
            &VulnerabilityResult::fail("b"),
        );
        assert_eq!(status, KeyStatus::Fail);
        assert_eq!(message, "a, b");
    }

    #[test]
    fn partial_match_is_no_match() {
        for (area, vuln) in [
            (LookupResult::success(1), VulnerabilityResult::no_match("n")),
            (LookupResult::no_match(), VulnerabilityResult::success(3)),
            (LookupResult::no_match(), VulnerabilityResult::no_match("n")),
        ] {
            assert_eq!(
                merge(&area, &vuln),
                (KeyStatus::NoMatch, NO_MATCH_MESSAGE.to_string())
            );
        }
    }

    #[test]
    fn resolved_key_carries_both_ids() {
        let area = resolver();
        let vuln = Fixed(VulnerabilityResult::success(9));
        let reconciler = KeyResolutionReconciler::new(&area, &vuln);

        let loc = LocationRecord::new(5)
            .with_coordinates(15.0, 15.0)
            .with_imt("PGA")
            .with_county("CountyB")
            .with_state("StateB");
        let key = reconciler.resolve(&loc);
        assert_eq!(key.locnumber, 5);
        assert_eq!(key.area_peril_id, Some(1));
        assert_eq!(key.vulnerability_id, Some(9));
        assert_eq!(key.status, KeyStatus::Success);
        assert_eq!(key.peril_id, PerilKind::Earthquake);
        assert_eq!(key.coverage_type, CoverageKind::Buildings);
    }

    #[test]
    fn no_match_keeps_partial_ids() {
        let area = resolver();
        let vuln = Fixed(VulnerabilityResult::success(9));
        let reconciler = KeyResolutionReconciler::new(&area, &vuln);

        let key = reconciler.resolve(&LocationRecord::new(6).with_imt("PGA"));
        assert_eq!(key.status, KeyStatus::NoMatch);
        assert_eq!(key.area_peril_id, None);
        assert_eq!(key.vulnerability_id, Some(9));
        assert_eq!(key.message, NO_MATCH_MESSAGE);
    }

    #[test]
    fn resolve_all_preserves_order_and_count() {
        let area = resolver();
        let vuln = Fixed(VulnerabilityResult::success(9));
        let reconciler = KeyResolutionReconciler::new(&area, &vuln);

        let locations = vec![
            LocationRecord::new(3).with_imt("PGA").with_county("CountyA"),
            LocationRecord::new(1),
            LocationRecord::new(2).with_imt("PGA").with_state("StateA"),
        ];
        let keys: Vec<_> = reconciler.resolve_all(locations).collect();
        let ids: Vec<_> = keys.iter().map(|k| k.locnumber).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(keys[0].status, KeyStatus::Success);
        assert_eq!(keys[1].status, KeyStatus::NoMatch);
        assert_eq!(keys[2].status, KeyStatus::Success);
    }

    #[test]
    fn resolution_is_repeatable() {
        let area = resolver();
        let vuln = Fixed(VulnerabilityResult::no_match("n"));
        let reconciler = KeyResolutionReconciler::new(&area, &vuln);
        let loc = LocationRecord::new(1).with_coordinates(999.0, 999.0).with_imt("PGA");
        assert_eq!(reconciler.resolve(&loc), reconciler.resolve(&loc));
    }
}
