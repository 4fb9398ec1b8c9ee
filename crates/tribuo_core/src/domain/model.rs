//! Models: the closed set of trained predictors this crate can
//! serialize, plus the ensemble combiner marker.

use std::sync::Arc;

use prost_types::Any;
use tribuo_proto::core::{EnvelopeProto, LinearModelProto, WeightedEnsembleModelProto};

use crate::domain::feature::FeatureDomain;
use crate::domain::output::LabelDomain;
use crate::errors::{FromOptionalField, ProtoConvError, Result};
use crate::protos::cache::DeserializationCache;
use crate::protos::{self, ProtoSerializable, registry};

/// Every model kind the crate knows how to (de)serialize. The wire
/// envelope's class name selects the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Model {
    Linear(LinearModel),
    Ensemble(WeightedEnsembleModel),
}

impl Model {
    pub fn name(&self) -> &str {
        match self {
            Model::Linear(m) => &m.name,
            Model::Ensemble(m) => &m.name,
        }
    }

    pub fn feature_domain(&self) -> &Arc<FeatureDomain> {
        match self {
            Model::Linear(m) => &m.feature_domain,
            Model::Ensemble(m) => &m.feature_domain,
        }
    }

    pub fn output_domain(&self) -> &Arc<LabelDomain> {
        match self {
            Model::Linear(m) => &m.output_domain,
            Model::Ensemble(m) => &m.output_domain,
        }
    }

    pub fn serialize(&self) -> Result<EnvelopeProto> {
        match self {
            Model::Linear(m) => m.serialize(),
            Model::Ensemble(m) => m.serialize(),
        }
    }

    pub fn deserialize(envelope: &EnvelopeProto) -> Result<Model> {
        let mut cache = DeserializationCache::new();
        Self::deserialize_with_cache(envelope, &mut cache)
    }

    /// Deserialize any model kind, dispatching on the (redirected)
    /// wire class name.
    pub fn deserialize_with_cache(
        envelope: &EnvelopeProto,
        cache: &mut DeserializationCache,
    ) -> Result<Model> {
        let resolved = registry::resolve_class(envelope.version, &envelope.class_name);
        let data = envelope.serialized_data.as_ref();
        match resolved.as_str() {
            n if n == LinearModel::CLASS_NAME => Ok(Model::Linear(
                LinearModel::deserialize_from_proto(envelope.version, n, data, cache)?,
            )),
            n if n == WeightedEnsembleModel::CLASS_NAME => Ok(Model::Ensemble(
                WeightedEnsembleModel::deserialize_from_proto(envelope.version, n, data, cache)?,
            )),
            _ => Err(ProtoConvError::UnknownClass(envelope.class_name.clone())),
        }
    }
}

/// A linear model over a fixed feature domain, one weight per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    name: String,
    feature_domain: Arc<FeatureDomain>,
    output_domain: Arc<LabelDomain>,
    weights: Vec<f64>,
}

impl LinearModel {
    pub fn new(
        name: impl Into<String>,
        feature_domain: Arc<FeatureDomain>,
        output_domain: Arc<LabelDomain>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        if weights.len() != feature_domain.len() {
            return Err(ProtoConvError::InvalidValue {
                field: "weights".to_string(),
                msg: format!(
                    "expected {} weights for the feature domain, found {}",
                    feature_domain.len(),
                    weights.len()
                ),
            });
        }
        Ok(LinearModel {
            name: name.into(),
            feature_domain,
            output_domain,
            weights,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn feature_domain(&self) -> &Arc<FeatureDomain> {
        &self.feature_domain
    }

    pub fn output_domain(&self) -> &Arc<LabelDomain> {
        &self.output_domain
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The weighted sum of the given dense feature vector.
    pub fn score(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.weights.len() {
            return Err(ProtoConvError::InvalidValue {
                field: "features".to_string(),
                msg: format!(
                    "expected {} features, found {}",
                    self.weights.len(),
                    features.len()
                ),
            });
        }
        Ok(self
            .weights
            .iter()
            .zip(features)
            .map(|(w, f)| w * f)
            .sum())
    }
}

impl ProtoSerializable for LinearModel {
    const CLASS_NAME: &'static str = "tribuo.domain.LinearModel";
    const CURRENT_VERSION: i32 = 0;

    fn serialize(&self) -> Result<EnvelopeProto> {
        let proto = LinearModelProto {
            name: self.name.clone(),
            feature_domain: Some(self.feature_domain.serialize()?),
            output_domain: Some(self.output_domain.serialize()?),
            weights: self.weights.clone(),
        };
        Ok(protos::pack(Self::CURRENT_VERSION, Self::CLASS_NAME, &proto))
    }

    fn deserialize_from_proto(
        version: i32,
        class_name: &str,
        data: Option<&Any>,
        cache: &mut DeserializationCache,
    ) -> Result<Self> {
        protos::check_version(version, class_name, Self::CURRENT_VERSION)?;
        let data = data.required("serialized_data")?;
        let proto: LinearModelProto = protos::unpack(class_name, data)?;

        let feature_envelope = proto.feature_domain.required("feature_domain")?;
        let feature_domain: FeatureDomain =
            protos::deserialize_with_cache(&feature_envelope, cache)?;
        let feature_domain = cache.canonicalise_features(Arc::new(feature_domain));

        let output_envelope = proto.output_domain.required("output_domain")?;
        let output_domain: LabelDomain = protos::deserialize_with_cache(&output_envelope, cache)?;
        let output_domain = cache.canonicalise_outputs(Arc::new(output_domain));

        LinearModel::new(proto.name, feature_domain, output_domain, proto.weights)
    }
}

/// An ensemble of models over shared domains, combined by weighted
/// vote.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEnsembleModel {
    name: String,
    feature_domain: Arc<FeatureDomain>,
    output_domain: Arc<LabelDomain>,
    members: Vec<Arc<Model>>,
    weights: Vec<f64>,
    combiner: VotingCombiner,
}

impl WeightedEnsembleModel {
    /// Build an ensemble from existing members. The domains are taken
    /// from the first member; every member must share them.
    pub fn from_existing_models(
        name: impl Into<String>,
        members: Vec<Arc<Model>>,
        weights: Vec<f64>,
        combiner: VotingCombiner,
    ) -> Result<Self> {
        let first = members.first().ok_or_else(|| ProtoConvError::InvalidValue {
            field: "members".to_string(),
            msg: "an ensemble requires at least one member".to_string(),
        })?;
        if members.len() != weights.len() {
            return Err(ProtoConvError::KeysValuesLength {
                field: "members".to_string(),
                keys: members.len(),
                values: weights.len(),
            });
        }
        let feature_domain = Arc::clone(first.feature_domain());
        let output_domain = Arc::clone(first.output_domain());
        for member in &members {
            if member.feature_domain() != &feature_domain
                || member.output_domain() != &output_domain
            {
                return Err(ProtoConvError::InvalidValue {
                    field: "members".to_string(),
                    msg: format!(
                        "member '{}' does not share the ensemble domains",
                        member.name()
                    ),
                });
            }
        }
        Ok(WeightedEnsembleModel {
            name: name.into(),
            feature_domain,
            output_domain,
            members,
            weights,
            combiner,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn feature_domain(&self) -> &Arc<FeatureDomain> {
        &self.feature_domain
    }

    pub fn output_domain(&self) -> &Arc<LabelDomain> {
        &self.output_domain
    }

    pub fn members(&self) -> &[Arc<Model>] {
        &self.members
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl ProtoSerializable for WeightedEnsembleModel {
    const CLASS_NAME: &'static str = "tribuo.domain.WeightedEnsembleModel";
    const CURRENT_VERSION: i32 = 0;

    fn serialize(&self) -> Result<EnvelopeProto> {
        let proto = WeightedEnsembleModelProto {
            name: self.name.clone(),
            feature_domain: Some(self.feature_domain.serialize()?),
            output_domain: Some(self.output_domain.serialize()?),
            members: self
                .members
                .iter()
                .map(|m| m.serialize())
                .collect::<Result<_>>()?,
            weights: self.weights.clone(),
            combiner: Some(self.combiner.serialize()?),
        };
        Ok(protos::pack(Self::CURRENT_VERSION, Self::CLASS_NAME, &proto))
    }

    fn deserialize_from_proto(
        version: i32,
        class_name: &str,
        data: Option<&Any>,
        cache: &mut DeserializationCache,
    ) -> Result<Self> {
        protos::check_version(version, class_name, Self::CURRENT_VERSION)?;
        let data = data.required("serialized_data")?;
        let proto: WeightedEnsembleModelProto = protos::unpack(class_name, data)?;

        if proto.members.is_empty() {
            return Err(ProtoConvError::InvalidValue {
                field: "members".to_string(),
                msg: "an ensemble requires at least one member".to_string(),
            });
        }
        if proto.members.len() != proto.weights.len() {
            return Err(ProtoConvError::KeysValuesLength {
                field: "members".to_string(),
                keys: proto.members.len(),
                values: proto.weights.len(),
            });
        }

        let feature_envelope = proto.feature_domain.required("feature_domain")?;
        let feature_domain: FeatureDomain =
            protos::deserialize_with_cache(&feature_envelope, cache)?;
        let feature_domain = cache.canonicalise_features(Arc::new(feature_domain));

        let output_envelope = proto.output_domain.required("output_domain")?;
        let output_domain: LabelDomain = protos::deserialize_with_cache(&output_envelope, cache)?;
        let output_domain = cache.canonicalise_outputs(Arc::new(output_domain));

        let members = proto
            .members
            .iter()
            .map(|envelope| Ok(Arc::new(Model::deserialize_with_cache(envelope, cache)?)))
            .collect::<Result<Vec<_>>>()?;
        for member in &members {
            if member.feature_domain() != &feature_domain
                || member.output_domain() != &output_domain
            {
                return Err(ProtoConvError::InvalidValue {
                    field: "members".to_string(),
                    msg: format!(
                        "member '{}' does not share the ensemble domains",
                        member.name()
                    ),
                });
            }
        }

        let combiner_envelope = proto.combiner.required("combiner")?;
        let combiner: VotingCombiner =
            protos::deserialize_with_cache(&combiner_envelope, cache)?;

        Ok(WeightedEnsembleModel {
            name: proto.name,
            feature_domain,
            output_domain,
            members,
            weights: proto.weights,
            combiner,
        })
    }
}

/// Majority-vote combination strategy. Stateless; serialized as a
/// payload-free marker envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VotingCombiner;

impl ProtoSerializable for VotingCombiner {
    const CLASS_NAME: &'static str = "tribuo.domain.VotingCombiner";
    const CURRENT_VERSION: i32 = 0;

    fn serialize(&self) -> Result<EnvelopeProto> {
        Ok(protos::pack_marker(Self::CURRENT_VERSION, Self::CLASS_NAME))
    }

    fn deserialize_from_proto(
        version: i32,
        class_name: &str,
        data: Option<&Any>,
        _cache: &mut DeserializationCache,
    ) -> Result<Self> {
        protos::check_version(version, class_name, Self::CURRENT_VERSION)?;
        if let Some(data) = data {
            if !data.value.is_empty() {
                return Err(ProtoConvError::InvalidValue {
                    field: "serialized_data".to_string(),
                    msg: format!("{class_name} carries no payload"),
                });
            }
        }
        Ok(VotingCombiner)
    }
}
