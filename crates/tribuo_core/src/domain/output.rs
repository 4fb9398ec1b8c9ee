//! Output domains for classification: the set of observed labels with
//! their counts.

use std::collections::BTreeMap;

use prost_types::Any;
use tribuo_proto::core::{EnvelopeProto, LabelDomainProto};

use crate::errors::{FromOptionalField, ProtoConvError, Result};
use crate::protos::cache::DeserializationCache;
use crate::protos::{self, ProtoSerializable};

/// The labels a classifier can emit, with per-label observation
/// counts. On the wire, labels and counts travel as two parallel
/// repeated fields paired by index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LabelDomain {
    counts: BTreeMap<String, u64>,
}

impl LabelDomain {
    pub fn from_counts(counts: BTreeMap<String, u64>) -> Self {
        LabelDomain { counts }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, label: &str) -> Option<u64> {
        self.counts.get(label).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}

impl ProtoSerializable for LabelDomain {
    const CLASS_NAME: &'static str = "tribuo.domain.LabelDomain";
    const CURRENT_VERSION: i32 = 0;

    fn serialize(&self) -> Result<EnvelopeProto> {
        let proto = LabelDomainProto {
            label: self.counts.keys().cloned().collect(),
            count: self.counts.values().copied().collect(),
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
        let proto: LabelDomainProto = protos::unpack(class_name, data)?;

        if proto.label.len() != proto.count.len() {
            return Err(ProtoConvError::KeysValuesLength {
                field: "label".to_string(),
                keys: proto.label.len(),
                values: proto.count.len(),
            });
        }
        let mut counts = BTreeMap::new();
        for (label, count) in proto.label.into_iter().zip(proto.count) {
            if counts.insert(label.clone(), count).is_some() {
                return Err(ProtoConvError::InvalidValue {
                    field: "label".to_string(),
                    msg: format!("duplicate label '{label}'"),
                });
            }
        }
        Ok(LabelDomain { counts })
    }
}
