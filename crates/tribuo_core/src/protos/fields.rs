//! The explicit field-descriptor model and the generic engine built
//! on it.
//!
//! Types without a bespoke payload message describe their wire layout
//! as a static, ordered list of [`FieldDescriptor`]s (wire name,
//! mapping kind, since-version, accessor, mutator) and serialize
//! through [`serialize_fields`] / [`deserialize_fields`] into the
//! self-describing [`FieldSetProto`] payload. Field lists are built
//! once per type and published read-only; building one with colliding
//! wire names is a configuration error surfaced at that point, not
//! during (de)serialization.

use std::collections::{HashMap, HashSet};

use prost_types::Any;
use tribuo_proto::core::field_value_proto::Value;
use tribuo_proto::core::{EnvelopeProto, FieldListProto, FieldSetProto, FieldValueProto, NamedFieldProto};

use crate::errors::{FromOptionalField, ProtoConvError, Result};
use crate::protos;
use crate::protos::cache::DeserializationCache;

/// A single wire value in a field-set payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    /// A nested serializable, stored as its own envelope.
    Nested(EnvelopeProto),
    List(Vec<FieldValue>),
}

impl FieldValue {
    fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Real(_) => "real",
            FieldValue::Text(_) => "text",
            FieldValue::Nested(_) => "nested",
            FieldValue::List(_) => "list",
        }
    }

    fn mismatch(self, field: &str, expected: &'static str) -> ProtoConvError {
        ProtoConvError::InvalidValue {
            field: field.to_string(),
            msg: format!("expected {expected}, found {}", self.kind_name()),
        }
    }

    pub fn into_bool(self, field: &str) -> Result<bool> {
        match self {
            FieldValue::Bool(v) => Ok(v),
            other => Err(other.mismatch(field, "bool")),
        }
    }

    pub fn into_int(self, field: &str) -> Result<i64> {
        match self {
            FieldValue::Int(v) => Ok(v),
            other => Err(other.mismatch(field, "int")),
        }
    }

    pub fn into_real(self, field: &str) -> Result<f64> {
        match self {
            FieldValue::Real(v) => Ok(v),
            other => Err(other.mismatch(field, "real")),
        }
    }

    pub fn into_text(self, field: &str) -> Result<String> {
        match self {
            FieldValue::Text(v) => Ok(v),
            other => Err(other.mismatch(field, "text")),
        }
    }

    pub fn into_nested(self, field: &str) -> Result<EnvelopeProto> {
        match self {
            FieldValue::Nested(v) => Ok(v),
            other => Err(other.mismatch(field, "nested")),
        }
    }

    pub fn into_list(self, field: &str) -> Result<Vec<FieldValue>> {
        match self {
            FieldValue::List(v) => Ok(v),
            other => Err(other.mismatch(field, "list")),
        }
    }

    /// An ordered wire list of doubles, element order preserved.
    pub fn real_list(values: impl IntoIterator<Item = f64>) -> FieldValue {
        FieldValue::List(values.into_iter().map(FieldValue::Real).collect())
    }

    pub fn int_list(values: impl IntoIterator<Item = i64>) -> FieldValue {
        FieldValue::List(values.into_iter().map(FieldValue::Int).collect())
    }

    pub fn text_list(values: impl IntoIterator<Item = String>) -> FieldValue {
        FieldValue::List(values.into_iter().map(FieldValue::Text).collect())
    }

    pub fn into_real_vec(self, field: &str) -> Result<Vec<f64>> {
        self.into_list(field)?
            .into_iter()
            .map(|v| v.into_real(field))
            .collect()
    }

    pub fn into_int_vec(self, field: &str) -> Result<Vec<i64>> {
        self.into_list(field)?
            .into_iter()
            .map(|v| v.into_int(field))
            .collect()
    }

    pub fn into_text_vec(self, field: &str) -> Result<Vec<String>> {
        self.into_list(field)?
            .into_iter()
            .map(|v| v.into_text(field))
            .collect()
    }
}

impl From<FieldValue> for FieldValueProto {
    fn from(value: FieldValue) -> Self {
        let value = match value {
            FieldValue::Bool(v) => Value::BoolValue(v),
            FieldValue::Int(v) => Value::IntValue(v),
            FieldValue::Real(v) => Value::RealValue(v),
            FieldValue::Text(v) => Value::TextValue(v),
            FieldValue::Nested(v) => Value::Nested(v),
            FieldValue::List(items) => Value::List(FieldListProto {
                items: items.into_iter().map(Into::into).collect(),
            }),
        };
        FieldValueProto { value: Some(value) }
    }
}

impl TryFrom<FieldValueProto> for FieldValue {
    type Error = ProtoConvError;

    fn try_from(value: FieldValueProto) -> Result<Self> {
        Ok(match value.value.required("value")? {
            Value::BoolValue(v) => FieldValue::Bool(v),
            Value::IntValue(v) => FieldValue::Int(v),
            Value::RealValue(v) => FieldValue::Real(v),
            Value::TextValue(v) => FieldValue::Text(v),
            Value::Nested(v) => FieldValue::Nested(v),
            Value::List(list) => FieldValue::List(
                list.items
                    .into_iter()
                    .map(TryInto::try_into)
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

/// How a field maps onto the wire. Exactly one kind applies per field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// One value, one wire field.
    Scalar { name: &'static str },
    /// An ordered repeated wire field.
    Array { name: &'static str },
    /// A mapping split into two parallel repeated fields; `keys[i]`
    /// pairs with `values[i]`.
    KeysValues {
        keys: &'static str,
        values: &'static str,
    },
    /// A mapping's values only. Lossy unless each value carries its
    /// own key.
    MapValues { values: &'static str },
}

impl FieldKind {
    fn primary_name(&self) -> &'static str {
        match self {
            FieldKind::Scalar { name } | FieldKind::Array { name } => name,
            FieldKind::KeysValues { keys, .. } => keys,
            FieldKind::MapValues { values } => values,
        }
    }

    fn wire_names(&self) -> (&'static str, Option<&'static str>) {
        match self {
            FieldKind::Scalar { name }
            | FieldKind::Array { name }
            | FieldKind::MapValues { values: name } => (name, None),
            FieldKind::KeysValues { keys, values } => (keys, Some(values)),
        }
    }
}

/// What an accessor produces and a mutator consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPayload {
    Single(FieldValue),
    Pair {
        keys: Vec<FieldValue>,
        values: Vec<FieldValue>,
    },
}

impl FieldPayload {
    pub fn into_single(self, field: &str) -> Result<FieldValue> {
        match self {
            FieldPayload::Single(value) => Ok(value),
            FieldPayload::Pair { .. } => Err(ProtoConvError::InvalidValue {
                field: field.to_string(),
                msg: "expected a single wire value, found a keys/values pair".to_string(),
            }),
        }
    }

    pub fn into_pair(self, field: &str) -> Result<(Vec<FieldValue>, Vec<FieldValue>)> {
        match self {
            FieldPayload::Pair { keys, values } => Ok((keys, values)),
            FieldPayload::Single(_) => Err(ProtoConvError::InvalidValue {
                field: field.to_string(),
                msg: "expected a keys/values pair, found a single wire value".to_string(),
            }),
        }
    }
}

pub type GetFn<T> = fn(&T) -> Result<FieldPayload>;
pub type SetFn<T> = fn(&mut T, FieldPayload, &mut DeserializationCache) -> Result<()>;

/// Metadata describing how one field maps to the wire. Pure data,
/// never executed on its own.
#[derive(Debug)]
pub struct FieldDescriptor<T> {
    kind: FieldKind,
    since_version: i32,
    get: GetFn<T>,
    set: SetFn<T>,
}

impl<T> FieldDescriptor<T> {
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn since_version(&self) -> i32 {
        self.since_version
    }
}

/// The ordered, validated field descriptors of one type.
#[derive(Debug)]
pub struct FieldList<T> {
    type_name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T> FieldList<T> {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor<T>> {
        self.fields.iter()
    }
}

/// Builds a [`FieldList`], rejecting colliding wire names when the
/// list is built rather than when it is first used.
#[derive(Debug)]
pub struct FieldListBuilder<T> {
    type_name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T> FieldListBuilder<T> {
    pub fn new() -> Self {
        FieldListBuilder {
            type_name: std::any::type_name::<T>(),
            fields: Vec::new(),
        }
    }

    pub fn scalar(
        self,
        name: &'static str,
        since_version: i32,
        get: GetFn<T>,
        set: SetFn<T>,
    ) -> Self {
        self.push(FieldKind::Scalar { name }, since_version, get, set)
    }

    pub fn array(
        self,
        name: &'static str,
        since_version: i32,
        get: GetFn<T>,
        set: SetFn<T>,
    ) -> Self {
        self.push(FieldKind::Array { name }, since_version, get, set)
    }

    pub fn keys_values(
        self,
        keys: &'static str,
        values: &'static str,
        since_version: i32,
        get: GetFn<T>,
        set: SetFn<T>,
    ) -> Self {
        self.push(FieldKind::KeysValues { keys, values }, since_version, get, set)
    }

    pub fn map_values(
        self,
        values: &'static str,
        since_version: i32,
        get: GetFn<T>,
        set: SetFn<T>,
    ) -> Self {
        self.push(FieldKind::MapValues { values }, since_version, get, set)
    }

    fn push(
        mut self,
        kind: FieldKind,
        since_version: i32,
        get: GetFn<T>,
        set: SetFn<T>,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            kind,
            since_version,
            get,
            set,
        });
        self
    }

    /// Append another builder's descriptors underneath this one, the
    /// way an embedded/base type contributes its fields. A field whose
    /// wire names are all already claimed here is shadowed and skipped
    /// with a warning; a keys/values pair only half-claimed is a
    /// configuration error.
    pub fn merge_shadowed(mut self, other: FieldListBuilder<T>) -> Result<Self> {
        let mut claimed = HashSet::new();
        for field in &self.fields {
            let (first, second) = field.kind.wire_names();
            claimed.insert(first);
            claimed.extend(second);
        }
        for field in other.fields {
            match field.kind.wire_names() {
                (first, Some(second)) => {
                    let first_claimed = claimed.contains(first);
                    let second_claimed = claimed.contains(second);
                    if first_claimed != second_claimed {
                        return Err(ProtoConvError::DuplicateFieldName {
                            type_name: self.type_name,
                            name: if first_claimed { first } else { second },
                        });
                    }
                    if first_claimed {
                        tracing::warn!(
                            type_name = self.type_name,
                            keys = first,
                            values = second,
                            "shadowed keys/values field skipped during merge"
                        );
                        continue;
                    }
                }
                (first, None) => {
                    if claimed.contains(first) {
                        tracing::warn!(
                            type_name = self.type_name,
                            name = first,
                            "shadowed field skipped during merge"
                        );
                        continue;
                    }
                }
            }
            self = self.push(field.kind, field.since_version, field.get, field.set);
        }
        Ok(self)
    }

    pub fn build(self) -> Result<FieldList<T>> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            let (first, second) = field.kind.wire_names();
            for name in std::iter::once(first).chain(second) {
                if !seen.insert(name) {
                    return Err(ProtoConvError::DuplicateFieldName {
                        type_name: self.type_name,
                        name,
                    });
                }
            }
        }
        Ok(FieldList {
            type_name: self.type_name,
            fields: self.fields,
        })
    }
}

impl<T> Default for FieldListBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Implemented by types that serialize through the descriptor engine.
/// The `'static` bound matches the field list's lifetime.
pub trait FieldMapped: Default + 'static {
    fn field_list() -> &'static FieldList<Self>;

    /// Invoked after generic field population, mirroring the
    /// invariants a hand-written constructor would enforce.
    fn post_deserialize(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Walk the type's field list and produce its field-set payload.
pub fn serialize_fields<T: FieldMapped>(value: &T) -> Result<FieldSetProto> {
    let list = T::field_list();
    let mut fields = Vec::with_capacity(list.len());
    for descriptor in list.iter() {
        let payload = (descriptor.get)(value)?;
        match (descriptor.kind, payload) {
            (
                FieldKind::Scalar { name }
                | FieldKind::Array { name }
                | FieldKind::MapValues { values: name },
                FieldPayload::Single(value),
            ) => {
                fields.push(NamedFieldProto {
                    name: name.to_string(),
                    value: Some(value.into()),
                });
            }
            (FieldKind::KeysValues { keys, values }, FieldPayload::Pair { keys: k, values: v }) => {
                if k.len() != v.len() {
                    return Err(ProtoConvError::KeysValuesLength {
                        field: keys.to_string(),
                        keys: k.len(),
                        values: v.len(),
                    });
                }
                fields.push(NamedFieldProto {
                    name: keys.to_string(),
                    value: Some(FieldValue::List(k).into()),
                });
                fields.push(NamedFieldProto {
                    name: values.to_string(),
                    value: Some(FieldValue::List(v).into()),
                });
            }
            (kind, _) => {
                return Err(ProtoConvError::InvalidValue {
                    field: kind.primary_name().to_string(),
                    msg: format!(
                        "accessor on {} produced a payload shape that does not match the field kind",
                        list.type_name
                    ),
                });
            }
        }
    }
    Ok(FieldSetProto { fields })
}

/// Rebuild a `T` from a field-set payload written at `version`.
///
/// Fields introduced after `version` keep their defaults; fields the
/// payload should contain but does not are an error naming the field.
pub fn deserialize_fields<T: FieldMapped>(
    version: i32,
    class_name: &str,
    data: Option<&Any>,
    cache: &mut DeserializationCache,
) -> Result<T> {
    let data = data.required("serialized_data")?;
    let field_set: FieldSetProto = protos::unpack(class_name, data)?;

    let mut wire_values: HashMap<String, FieldValue> = HashMap::with_capacity(field_set.fields.len());
    for field in field_set.fields {
        let value = field.value.required(field.name.as_str())?.try_into()?;
        wire_values.insert(field.name, value);
    }

    let mut out = T::default();
    for descriptor in T::field_list().iter() {
        if descriptor.since_version > version {
            continue;
        }
        let payload = match descriptor.kind {
            FieldKind::Scalar { name }
            | FieldKind::Array { name }
            | FieldKind::MapValues { values: name } => {
                let value = wire_values
                    .remove(name)
                    .ok_or_else(|| ProtoConvError::RequiredField(name.to_string()))?;
                FieldPayload::Single(value)
            }
            FieldKind::KeysValues { keys, values } => {
                let keys_list = wire_values
                    .remove(keys)
                    .ok_or_else(|| ProtoConvError::RequiredField(keys.to_string()))?
                    .into_list(keys)?;
                let values_list = wire_values
                    .remove(values)
                    .ok_or_else(|| ProtoConvError::RequiredField(values.to_string()))?
                    .into_list(values)?;
                if keys_list.len() != values_list.len() {
                    return Err(ProtoConvError::KeysValuesLength {
                        field: keys.to_string(),
                        keys: keys_list.len(),
                        values: values_list.len(),
                    });
                }
                FieldPayload::Pair {
                    keys: keys_list,
                    values: values_list,
                }
            }
        };
        (descriptor.set)(&mut out, payload, cache)?;
    }
    out.post_deserialize()?;
    Ok(out)
}
