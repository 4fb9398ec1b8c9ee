//! Class-name resolution for deserialization.
//!
//! The registry is the explicit replacement for resolving classes by
//! name at runtime: a process-wide map from each wire discriminator to
//! that type's versioned factory, built once and read-only afterwards
//! so concurrent deserialization calls can resolve types without
//! synchronization.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use prost_types::Any;
use tribuo_proto::core::EnvelopeProto;

use crate::domain::feature::FeatureDomain;
use crate::domain::model::{LinearModel, VotingCombiner, WeightedEnsembleModel};
use crate::domain::output::LabelDomain;
use crate::domain::transform::SimpleTransform;
use crate::errors::{ProtoConvError, Result};
use crate::protos::ProtoSerializable;
use crate::protos::cache::DeserializationCache;

/// A deserialized value, boxed as its concrete type.
pub type BoxedValue = Box<dyn std::any::Any + Send + Sync>;

type DeserializeFn =
    fn(i32, &str, Option<&Any>, &mut DeserializationCache) -> Result<BoxedValue>;

static REGISTRY: Lazy<HashMap<&'static str, DeserializeFn>> = Lazy::new(build_registry);

/// Internal redirects applied as classes are renamed, keyed by
/// (version, wire class name).
///
/// Must only contain entries for namespaces owned by this crate; a
/// redirect never masks a genuinely unknown class.
static REDIRECTS: Lazy<HashMap<(i32, String), &'static str>> = Lazy::new(|| {
    let mut redirects = HashMap::new();
    // Pre-0.1 name of the weighted ensemble.
    redirects.insert(
        (0, "tribuo.domain.EnsembleModel".to_string()),
        WeightedEnsembleModel::CLASS_NAME,
    );
    redirects
});

fn build_registry() -> HashMap<&'static str, DeserializeFn> {
    let mut registry = HashMap::new();
    register::<FeatureDomain>(&mut registry);
    register::<LabelDomain>(&mut registry);
    register::<LinearModel>(&mut registry);
    register::<WeightedEnsembleModel>(&mut registry);
    register::<VotingCombiner>(&mut registry);
    register::<SimpleTransform>(&mut registry);
    registry
}

fn register<T>(registry: &mut HashMap<&'static str, DeserializeFn>)
where
    T: ProtoSerializable + Send + Sync + 'static,
{
    let previous = registry.insert(T::CLASS_NAME, deserialize_boxed::<T>);
    assert!(
        previous.is_none(),
        "class name registered twice: {}",
        T::CLASS_NAME
    );
}

fn deserialize_boxed<T>(
    version: i32,
    class_name: &str,
    data: Option<&Any>,
    cache: &mut DeserializationCache,
) -> Result<BoxedValue>
where
    T: ProtoSerializable + Send + Sync + 'static,
{
    Ok(Box::new(T::deserialize_from_proto(
        version, class_name, data, cache,
    )?))
}

/// Apply any redirect for this (version, class name) pair.
pub(crate) fn resolve_class(version: i32, class_name: &str) -> String {
    match REDIRECTS.get(&(version, class_name.to_string())) {
        Some(redirected) => {
            tracing::debug!(from = class_name, to = redirected, "applying class redirect");
            (*redirected).to_string()
        }
        None => class_name.to_string(),
    }
}

/// Resolve the envelope's class and invoke its factory.
///
/// The error for an unresolvable class carries the literal class name
/// seen on the wire, since a rename or removal is the most common
/// backward-compatibility hazard.
pub(crate) fn resolve_and_deserialize(
    envelope: &EnvelopeProto,
    cache: &mut DeserializationCache,
) -> Result<BoxedValue> {
    let resolved = resolve_class(envelope.version, &envelope.class_name);
    let deserialize = REGISTRY
        .get(resolved.as_str())
        .ok_or_else(|| ProtoConvError::UnknownClass(envelope.class_name.clone()))?;
    deserialize(
        envelope.version,
        resolved.as_str(),
        envelope.serialized_data.as_ref(),
        cache,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protos;

    #[test]
    fn unknown_class_reports_wire_name() {
        let envelope = EnvelopeProto {
            version: 0,
            class_name: "org.acme.MissingType".to_string(),
            serialized_data: None,
        };
        let err = protos::deserialize::<SimpleTransform>(&envelope).unwrap_err();
        match err {
            ProtoConvError::UnknownClass(name) => assert_eq!("org.acme.MissingType", name),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn downcast_mismatch_is_reported() {
        let domain = LabelDomain::from_counts([("a".to_string(), 1)].into());
        let envelope = domain.serialize().unwrap();
        let err = protos::deserialize::<SimpleTransform>(&envelope).unwrap_err();
        assert!(matches!(err, ProtoConvError::TypeMismatch { .. }));
    }

    #[test]
    fn redirects_only_fire_for_known_entries() {
        assert_eq!(
            WeightedEnsembleModel::CLASS_NAME,
            resolve_class(0, "tribuo.domain.EnsembleModel")
        );
        // Redirects are version-specific.
        assert_eq!(
            "tribuo.domain.EnsembleModel",
            resolve_class(1, "tribuo.domain.EnsembleModel")
        );
        assert_eq!("org.acme.Other", resolve_class(0, "org.acme.Other"));
    }
}
