//! Feature domains: the immutable, name-ordered set of features a
//! model was trained over.

use prost_types::Any;
use proptest_derive::Arbitrary;
use tribuo_proto::core::{EnvelopeProto, FeatureDomainProto, FeatureInfoProto};

use crate::errors::{FromOptionalField, ProtoConvError, Result};
use crate::protos::cache::DeserializationCache;
use crate::protos::{self, ProtoSerializable};

/// One named feature and its observation count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Arbitrary)]
pub struct FeatureInfo {
    pub name: String,
    pub count: u64,
}

impl From<FeatureInfoProto> for FeatureInfo {
    fn from(proto: FeatureInfoProto) -> Self {
        FeatureInfo {
            name: proto.name,
            count: proto.count,
        }
    }
}

impl From<&FeatureInfo> for FeatureInfoProto {
    fn from(info: &FeatureInfo) -> Self {
        FeatureInfoProto {
            name: info.name.clone(),
            count: info.count,
        }
    }
}

/// An immutable feature domain. Features are held sorted by name, and
/// a feature's position is its id.
///
/// On the wire only the feature infos are stored; the name-to-id
/// mapping is rebuilt from them, since each info carries its own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureDomain {
    features: Vec<FeatureInfo>,
}

impl FeatureDomain {
    /// Build a domain from an unordered set of infos. Duplicate
    /// feature names are rejected.
    pub fn new(features: impl IntoIterator<Item = FeatureInfo>) -> Result<Self> {
        let mut features: Vec<_> = features.into_iter().collect();
        features.sort_by(|a, b| a.name.cmp(&b.name));
        for pair in features.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(ProtoConvError::InvalidValue {
                    field: "features".to_string(),
                    msg: format!("duplicate feature name '{}'", pair[0].name),
                });
            }
        }
        Ok(FeatureDomain { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The info at feature id `id`.
    pub fn get(&self, id: usize) -> Option<&FeatureInfo> {
        self.features.get(id)
    }

    /// The id of the named feature, if present.
    pub fn id(&self, name: &str) -> Option<usize> {
        self.features
            .binary_search_by(|info| info.name.as_str().cmp(name))
            .ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureInfo> {
        self.features.iter()
    }
}

impl ProtoSerializable for FeatureDomain {
    const CLASS_NAME: &'static str = "tribuo.domain.FeatureDomain";
    const CURRENT_VERSION: i32 = 0;

    fn serialize(&self) -> Result<EnvelopeProto> {
        let proto = FeatureDomainProto {
            features: self.features.iter().map(Into::into).collect(),
        };
        Ok(protos::pack(Self::CURRENT_VERSION, Self::CLASS_NAME, &proto))
    }

    fn deserialize_from_proto(
        version: i32,
        class_name: &str,
        data: Option<&Any>,
        _cache: &mut DeserializationCache,
    ) -> Result<Self> {
        protos::check_version(version, class_name, Self::CURRENT_VERSION)?;
        let data = data.required("serialized_data")?;
        let proto: FeatureDomainProto = protos::unpack(class_name, data)?;
        FeatureDomain::new(proto.features.into_iter().map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn domain_strategy() -> impl Strategy<Value = FeatureDomain> {
        proptest::collection::btree_map("[a-z]{1,8}", 0u64..10_000, 0..8).prop_map(|map| {
            FeatureDomain::new(
                map.into_iter()
                    .map(|(name, count)| FeatureInfo { name, count }),
            )
            .unwrap()
        })
    }

    #[test]
    fn ids_follow_name_order() {
        let domain = FeatureDomain::new([
            FeatureInfo {
                name: "speed".to_string(),
                count: 1,
            },
            FeatureInfo {
                name: "angle".to_string(),
                count: 4,
            },
        ])
        .unwrap();
        assert_eq!(Some(0), domain.id("angle"));
        assert_eq!(Some(1), domain.id("speed"));
        assert_eq!(None, domain.id("mass"));
        assert_eq!("angle", domain.get(0).unwrap().name);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = FeatureDomain::new([
            FeatureInfo {
                name: "x".to_string(),
                count: 1,
            },
            FeatureInfo {
                name: "x".to_string(),
                count: 2,
            },
        ])
        .unwrap_err();
        assert!(matches!(err, ProtoConvError::InvalidValue { .. }));
    }

    #[test]
    fn names_recovered_from_wire_values() {
        let expected = FeatureDomain::new([
            FeatureInfo {
                name: "mass".to_string(),
                count: 7,
            },
            FeatureInfo {
                name: "angle".to_string(),
                count: 2,
            },
        ])
        .unwrap();
        let envelope = expected.serialize().unwrap();
        let got: FeatureDomain = crate::protos::deserialize(&envelope).unwrap();
        assert_eq!(expected, got);
    }

    proptest! {
        #[test]
        fn roundtrip_feature_domain(expected in domain_strategy()) {
            let envelope = expected.serialize().unwrap();
            let got: FeatureDomain = crate::protos::deserialize(&envelope).unwrap();
            prop_assert_eq!(expected, got);
        }
    }
}
