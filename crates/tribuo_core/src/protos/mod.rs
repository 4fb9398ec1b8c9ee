//! The serialization framework.
//!
//! Serialization wraps a type-specific payload message in a versioned
//! [`EnvelopeProto`]. Deserialization resolves the envelope's class
//! name through the process-wide [`registry`], invokes that type's
//! versioned factory, and threads a per-call
//! [`cache::DeserializationCache`] through every recursive step so
//! shared immutable domains collapse back to one instance.

pub mod cache;
pub mod fields;
pub mod io;
pub mod registry;

use prost::Name;
use prost_types::Any;
use tribuo_proto::core::EnvelopeProto;

use crate::errors::{ProtoConvError, Result};
use crate::protos::cache::DeserializationCache;

/// The contract implemented by every serializable type.
///
/// `CLASS_NAME` is the stable wire discriminator and `CURRENT_VERSION`
/// is both the version written by new instances and the ceiling
/// accepted on read. Implementations control their own wire layout
/// through `serialize` and the versioned `deserialize_from_proto`
/// factory, which lets a type handle multiple legacy wire versions
/// explicitly.
pub trait ProtoSerializable: Sized {
    const CLASS_NAME: &'static str;
    const CURRENT_VERSION: i32;

    /// Serialize into a versioned envelope.
    fn serialize(&self) -> Result<EnvelopeProto>;

    /// Versioned factory. Arguments come straight off the envelope;
    /// implementations must check the version ceiling and enforce
    /// their constructor invariants before returning.
    fn deserialize_from_proto(
        version: i32,
        class_name: &str,
        data: Option<&Any>,
        cache: &mut DeserializationCache,
    ) -> Result<Self>;
}

/// Wrap a payload message in an envelope.
pub fn pack<M: Name>(version: i32, class_name: &str, payload: &M) -> EnvelopeProto {
    EnvelopeProto {
        version,
        class_name: class_name.to_string(),
        serialized_data: Some(Any {
            type_url: M::type_url(),
            value: payload.encode_to_vec(),
        }),
    }
}

/// Envelope for a stateless marker type; carries no payload.
pub fn pack_marker(version: i32, class_name: &str) -> EnvelopeProto {
    EnvelopeProto {
        version,
        class_name: class_name.to_string(),
        serialized_data: None,
    }
}

/// Unpack an envelope payload as a concrete message, checking the
/// `Any` type url before decoding.
pub fn unpack<M: Name + Default>(class_name: &str, data: &Any) -> Result<M> {
    let expected = M::type_url();
    if data.type_url != expected {
        return Err(ProtoConvError::UnexpectedPayload {
            class_name: class_name.to_string(),
            expected,
            found: data.type_url.clone(),
        });
    }
    M::decode(data.value.as_slice()).map_err(ProtoConvError::from)
}

/// Reject envelope versions outside `[0, ceiling]`.
pub fn check_version(version: i32, class_name: &str, ceiling: i32) -> Result<()> {
    if version < 0 || version > ceiling {
        return Err(ProtoConvError::UnsupportedVersion {
            class_name: class_name.to_string(),
            version,
            ceiling,
        });
    }
    Ok(())
}

/// Deserialize a top-level envelope as `T`, using a fresh cache for
/// the whole call tree.
pub fn deserialize<T>(envelope: &EnvelopeProto) -> Result<T>
where
    T: ProtoSerializable + Send + Sync + 'static,
{
    let mut cache = DeserializationCache::new();
    deserialize_with_cache(envelope, &mut cache)
}

/// Deserialize a (possibly nested) envelope as `T` within an existing
/// call tree, reusing the caller's cache.
pub fn deserialize_with_cache<T>(
    envelope: &EnvelopeProto,
    cache: &mut DeserializationCache,
) -> Result<T>
where
    T: ProtoSerializable + Send + Sync + 'static,
{
    let value = registry::resolve_and_deserialize(envelope, cache)?;
    match value.downcast::<T>() {
        Ok(boxed) => Ok(*boxed),
        Err(_) => Err(ProtoConvError::TypeMismatch {
            class_name: envelope.class_name.clone(),
            expected: std::any::type_name::<T>(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribuo_proto::core::{FeatureDomainProto, LabelDomainProto};

    #[test]
    fn unpack_rejects_wrong_payload_type() {
        let envelope = pack(0, "tribuo.domain.LabelDomain", &LabelDomainProto::default());
        let data = envelope.serialized_data.unwrap();

        let err = unpack::<FeatureDomainProto>("tribuo.domain.LabelDomain", &data).unwrap_err();
        match err {
            ProtoConvError::UnexpectedPayload {
                expected, found, ..
            } => {
                assert_eq!("/tribuo.core.FeatureDomainProto", expected);
                assert_eq!("/tribuo.core.LabelDomainProto", found);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn marker_envelopes_have_no_payload() {
        let envelope = pack_marker(0, "tribuo.domain.VotingCombiner");
        assert!(envelope.serialized_data.is_none());
        assert_eq!(0, envelope.version);
    }

    #[test]
    fn version_bounds() {
        assert!(check_version(0, "t", 1).is_ok());
        assert!(check_version(1, "t", 1).is_ok());
        assert!(matches!(
            check_version(2, "t", 1),
            Err(ProtoConvError::UnsupportedVersion {
                version: 2,
                ceiling: 1,
                ..
            })
        ));
        assert!(matches!(
            check_version(-1, "t", 1),
            Err(ProtoConvError::UnsupportedVersion { .. })
        ));
    }
}
