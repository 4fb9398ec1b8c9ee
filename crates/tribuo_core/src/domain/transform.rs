//! Scalar value transforms, serialized through the generic
//! field-descriptor engine.

use std::str::FromStr;

use once_cell::sync::Lazy;
use prost_types::Any;
use proptest_derive::Arbitrary;
use tribuo_proto::core::EnvelopeProto;

use crate::errors::{ProtoConvError, Result};
use crate::protos::cache::DeserializationCache;
use crate::protos::fields::{
    FieldList, FieldListBuilder, FieldMapped, FieldPayload, FieldValue, deserialize_fields,
    serialize_fields,
};
use crate::protos::{self, ProtoSerializable};

/// The arithmetic operation a transform applies. Stored on the wire
/// as its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Arbitrary)]
pub enum TransformOp {
    #[default]
    Add,
    Sub,
    Mul,
    Div,
}

impl TransformOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformOp::Add => "add",
            TransformOp::Sub => "sub",
            TransformOp::Mul => "mul",
            TransformOp::Div => "div",
        }
    }
}

impl FromStr for TransformOp {
    type Err = ProtoConvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(TransformOp::Add),
            "sub" => Ok(TransformOp::Sub),
            "mul" => Ok(TransformOp::Mul),
            "div" => Ok(TransformOp::Div),
            other => Err(ProtoConvError::UnknownEnumVariant(
                "TransformOp",
                other.to_string(),
            )),
        }
    }
}

/// Applies one arithmetic operation with a fixed operand to each
/// input value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimpleTransform {
    pub op: TransformOp,
    pub operand: f64,
}

impl SimpleTransform {
    pub fn new(op: TransformOp, operand: f64) -> Result<Self> {
        let transform = SimpleTransform { op, operand };
        transform.validate()?;
        Ok(transform)
    }

    pub fn apply(&self, input: f64) -> f64 {
        match self.op {
            TransformOp::Add => input + self.operand,
            TransformOp::Sub => input - self.operand,
            TransformOp::Mul => input * self.operand,
            TransformOp::Div => input / self.operand,
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.operand.is_finite() {
            return Err(ProtoConvError::InvalidValue {
                field: "operand".to_string(),
                msg: format!("operand must be finite, found {}", self.operand),
            });
        }
        Ok(())
    }
}

fn get_op(t: &SimpleTransform) -> Result<FieldPayload> {
    Ok(FieldPayload::Single(FieldValue::Text(
        t.op.as_str().to_string(),
    )))
}

fn set_op(
    t: &mut SimpleTransform,
    payload: FieldPayload,
    _cache: &mut DeserializationCache,
) -> Result<()> {
    t.op = payload.into_single("op")?.into_text("op")?.parse()?;
    Ok(())
}

fn get_operand(t: &SimpleTransform) -> Result<FieldPayload> {
    Ok(FieldPayload::Single(FieldValue::Real(t.operand)))
}

fn set_operand(
    t: &mut SimpleTransform,
    payload: FieldPayload,
    _cache: &mut DeserializationCache,
) -> Result<()> {
    t.operand = payload.into_single("operand")?.into_real("operand")?;
    Ok(())
}

static FIELDS: Lazy<FieldList<SimpleTransform>> = Lazy::new(|| {
    FieldListBuilder::new()
        .scalar("op", 0, get_op, set_op)
        .scalar("operand", 0, get_operand, set_operand)
        .build()
        .expect("simple transform field list")
});

impl FieldMapped for SimpleTransform {
    fn field_list() -> &'static FieldList<Self> {
        &FIELDS
    }

    fn post_deserialize(&mut self) -> Result<()> {
        self.validate()
    }
}

impl ProtoSerializable for SimpleTransform {
    const CLASS_NAME: &'static str = "tribuo.domain.SimpleTransform";
    const CURRENT_VERSION: i32 = 0;

    fn serialize(&self) -> Result<EnvelopeProto> {
        let field_set = serialize_fields(self)?;
        Ok(protos::pack(
            Self::CURRENT_VERSION,
            Self::CLASS_NAME,
            &field_set,
        ))
    }

    fn deserialize_from_proto(
        version: i32,
        class_name: &str,
        data: Option<&Any>,
        cache: &mut DeserializationCache,
    ) -> Result<Self> {
        protos::check_version(version, class_name, Self::CURRENT_VERSION)?;
        deserialize_fields(version, class_name, data, cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn applies_its_operation() {
        let transform = SimpleTransform::new(TransformOp::Mul, 2.5).unwrap();
        assert_eq!(5.0, transform.apply(2.0));
        assert_eq!("mul", transform.op.as_str());
    }

    #[test]
    fn non_finite_operands_are_rejected() {
        let err = SimpleTransform::new(TransformOp::Add, f64::NAN).unwrap_err();
        assert!(matches!(err, ProtoConvError::InvalidValue { .. }));

        // The same invariant holds on the wire path.
        let raw = SimpleTransform {
            op: TransformOp::Add,
            operand: f64::INFINITY,
        };
        let envelope = protos::pack(
            0,
            SimpleTransform::CLASS_NAME,
            &serialize_fields(&raw).unwrap(),
        );
        let err = protos::deserialize::<SimpleTransform>(&envelope).unwrap_err();
        assert!(matches!(err, ProtoConvError::InvalidValue { .. }));
    }

    #[test]
    fn unknown_op_names_are_rejected() {
        let err = "pow".parse::<TransformOp>().unwrap_err();
        match err {
            ProtoConvError::UnknownEnumVariant(enum_name, value) => {
                assert_eq!("TransformOp", enum_name);
                assert_eq!("pow", value);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    proptest! {
        #[test]
        fn roundtrip_simple_transform(
            op in any::<TransformOp>(),
            operand in -1.0e6..1.0e6f64,
        ) {
            let expected = SimpleTransform::new(op, operand).unwrap();
            let envelope = expected.serialize().unwrap();
            let got: SimpleTransform = protos::deserialize(&envelope).unwrap();
            prop_assert_eq!(expected, got);
        }
    }
}
