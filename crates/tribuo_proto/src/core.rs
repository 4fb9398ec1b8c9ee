//! Messages for the `tribuo.core` package.

/// The versioned wrapper around every serialized object.
///
/// `class_name` is the stable wire discriminator used to resolve the
/// host type on deserialization. `serialized_data` holds the
/// type-specific payload and is unset for stateless marker types.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnvelopeProto {
    #[prost(int32, tag = "1")]
    pub version: i32,
    #[prost(string, tag = "2")]
    pub class_name: String,
    #[prost(message, optional, tag = "3")]
    pub serialized_data: Option<::prost_types::Any>,
}

/// Self-describing payload used by types that serialize through the
/// generic field-descriptor engine rather than a bespoke message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FieldSetProto {
    #[prost(message, repeated, tag = "1")]
    pub fields: Vec<NamedFieldProto>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NamedFieldProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<FieldValueProto>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FieldValueProto {
    #[prost(oneof = "field_value_proto::Value", tags = "1, 2, 3, 4, 5, 6")]
    pub value: Option<field_value_proto::Value>,
}

/// Nested message and enum types in `FieldValueProto`.
pub mod field_value_proto {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(bool, tag = "1")]
        BoolValue(bool),
        #[prost(int64, tag = "2")]
        IntValue(i64),
        #[prost(double, tag = "3")]
        RealValue(f64),
        #[prost(string, tag = "4")]
        TextValue(String),
        #[prost(message, tag = "5")]
        Nested(super::EnvelopeProto),
        #[prost(message, tag = "6")]
        List(super::FieldListProto),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FieldListProto {
    #[prost(message, repeated, tag = "1")]
    pub items: Vec<FieldValueProto>,
}

/// A single feature's observation statistics. The name doubles as the
/// feature domain's key, which is how `FeatureDomainProto` can carry
/// values only.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FeatureInfoProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint64, tag = "2")]
    pub count: u64,
}

/// Values-only encoding of the feature domain; ids are reassigned
/// from the sorted names on load.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FeatureDomainProto {
    #[prost(message, repeated, tag = "1")]
    pub features: Vec<FeatureInfoProto>,
}

/// Parallel keys/values encoding of the output domain. `label[i]`
/// pairs with `count[i]`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LabelDomainProto {
    #[prost(string, repeated, tag = "1")]
    pub label: Vec<String>,
    #[prost(uint64, repeated, tag = "2")]
    pub count: Vec<u64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LinearModelProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub feature_domain: Option<EnvelopeProto>,
    #[prost(message, optional, tag = "3")]
    pub output_domain: Option<EnvelopeProto>,
    #[prost(double, repeated, tag = "4")]
    pub weights: Vec<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WeightedEnsembleModelProto {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub feature_domain: Option<EnvelopeProto>,
    #[prost(message, optional, tag = "3")]
    pub output_domain: Option<EnvelopeProto>,
    #[prost(message, repeated, tag = "4")]
    pub members: Vec<EnvelopeProto>,
    #[prost(double, repeated, tag = "5")]
    pub weights: Vec<f64>,
    #[prost(message, optional, tag = "6")]
    pub combiner: Option<EnvelopeProto>,
}

macro_rules! impl_name {
    ($($message:ty => $name:literal,)+) => {
        $(
            impl ::prost::Name for $message {
                const NAME: &'static str = $name;
                const PACKAGE: &'static str = "tribuo.core";

                fn full_name() -> String {
                    concat!("tribuo.core.", $name).to_string()
                }

                fn type_url() -> String {
                    concat!("/tribuo.core.", $name).to_string()
                }
            }
        )+
    };
}

impl_name! {
    EnvelopeProto => "EnvelopeProto",
    FieldSetProto => "FieldSetProto",
    NamedFieldProto => "NamedFieldProto",
    FieldValueProto => "FieldValueProto",
    FieldListProto => "FieldListProto",
    FeatureInfoProto => "FeatureInfoProto",
    FeatureDomainProto => "FeatureDomainProto",
    LabelDomainProto => "LabelDomainProto",
    LinearModelProto => "LinearModelProto",
    WeightedEnsembleModelProto => "WeightedEnsembleModelProto",
}
