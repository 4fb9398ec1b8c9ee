//! Canonicalization of shared immutable domains during deserialization.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::feature::FeatureDomain;
use crate::domain::output::LabelDomain;

/// Interns structurally equal domain values seen during one
/// deserialization call tree.
///
/// Serialized composites (e.g. an ensemble's members) each carry their
/// own copy of the feature and output domains; deserializing them
/// naively materializes one allocation per copy. Passing every copy
/// through the cache collapses structurally equal values to the first
/// instance seen, restoring the sharing that existed before
/// serialization. Purely a memoization table: values are never
/// mutated, and skipping it changes memory usage, not results.
///
/// Created fresh per top-level deserialize call and threaded
/// explicitly through recursive factories; never shared across calls.
#[derive(Debug, Default)]
pub struct DeserializationCache {
    feature_domains: HashMap<Arc<FeatureDomain>, Arc<FeatureDomain>>,
    output_domains: HashMap<Arc<LabelDomain>, Arc<LabelDomain>>,
}

impl DeserializationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical instance for this feature domain: the
    /// argument itself on first sight, the previously seen
    /// structurally-equal instance otherwise.
    pub fn canonicalise_features(&mut self, value: Arc<FeatureDomain>) -> Arc<FeatureDomain> {
        match self.feature_domains.get(&value) {
            Some(canonical) => canonical.clone(),
            None => {
                self.feature_domains.insert(value.clone(), value.clone());
                value
            }
        }
    }

    /// Returns the canonical instance for this output domain.
    pub fn canonicalise_outputs(&mut self, value: Arc<LabelDomain>) -> Arc<LabelDomain> {
        match self.output_domains.get(&value) {
            Some(canonical) => canonical.clone(),
            None => {
                self.output_domains.insert(value.clone(), value.clone());
                value
            }
        }
    }

    /// Number of distinct feature domains seen.
    pub fn feature_map_cache_size(&self) -> usize {
        self.feature_domains.len()
    }

    /// Number of distinct output domains seen.
    pub fn output_info_cache_size(&self) -> usize {
        self.output_domains.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feature::FeatureInfo;
    use std::collections::BTreeMap;

    fn feature_domain(entries: &[(&str, u64)]) -> Arc<FeatureDomain> {
        Arc::new(
            FeatureDomain::new(entries.iter().map(|(name, count)| FeatureInfo {
                name: (*name).to_string(),
                count: *count,
            }))
            .unwrap(),
        )
    }

    fn label_domain(entries: &[(&str, u64)]) -> Arc<LabelDomain> {
        Arc::new(LabelDomain::from_counts(
            entries
                .iter()
                .map(|(label, count)| ((*label).to_string(), *count))
                .collect::<BTreeMap<_, _>>(),
        ))
    }

    #[test]
    fn feature_domain_canonicalise() {
        let a = feature_domain(&[("a", 4), ("b", 2)]);
        let a_dup = feature_domain(&[("a", 4), ("b", 2)]);
        let b = feature_domain(&[("a", 2), ("b", 4)]);
        let c = feature_domain(&[("a", 2), ("b", 2), ("c", 1)]);
        assert!(!Arc::ptr_eq(&a, &a_dup));
        assert_eq!(a, a_dup);

        let mut cache = DeserializationCache::new();
        let a_can = cache.canonicalise_features(a);
        let a_dup_can = cache.canonicalise_features(a_dup);
        let b_can = cache.canonicalise_features(b);
        let c_can = cache.canonicalise_features(c);

        assert!(Arc::ptr_eq(&a_can, &a_dup_can));
        assert!(!Arc::ptr_eq(&a_can, &b_can));
        assert_ne!(a_can, b_can);
        assert!(!Arc::ptr_eq(&a_can, &c_can));
        assert!(!Arc::ptr_eq(&b_can, &c_can));

        assert_eq!(3, cache.feature_map_cache_size());
        assert_eq!(0, cache.output_info_cache_size());
    }

    #[test]
    fn output_domain_canonicalise() {
        let a = label_domain(&[("x", 4), ("y", 2)]);
        let a_dup = label_domain(&[("x", 4), ("y", 2)]);
        let b = label_domain(&[("x", 2), ("y", 4)]);
        assert!(!Arc::ptr_eq(&a, &a_dup));

        let mut cache = DeserializationCache::new();
        let a_can = cache.canonicalise_outputs(a.clone());
        let a_dup_can = cache.canonicalise_outputs(a_dup);
        let b_can = cache.canonicalise_outputs(b);

        // First sight returns the argument unchanged.
        assert!(Arc::ptr_eq(&a, &a_can));
        assert!(Arc::ptr_eq(&a_can, &a_dup_can));
        assert!(!Arc::ptr_eq(&a_can, &b_can));

        assert_eq!(0, cache.feature_map_cache_size());
        assert_eq!(2, cache.output_info_cache_size());
    }
}
