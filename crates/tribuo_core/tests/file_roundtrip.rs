//! End-to-end persistence: serialize a model graph, write it to disk,
//! read it back, and check the graph survives intact.

use std::collections::BTreeMap;
use std::sync::Arc;

use tribuo_core::domain::feature::{FeatureDomain, FeatureInfo};
use tribuo_core::domain::model::{LinearModel, Model, VotingCombiner, WeightedEnsembleModel};
use tribuo_core::domain::output::LabelDomain;
use tribuo_core::domain::transform::{SimpleTransform, TransformOp};
use tribuo_core::protos::io::{
    TRIBUO_NATIVE_EXTENSION, read_envelope_from_file, write_envelope_to_file,
};
use tribuo_core::protos::{self, ProtoSerializable};

fn feature_domain() -> Arc<FeatureDomain> {
    Arc::new(
        FeatureDomain::new([
            FeatureInfo {
                name: "depth".to_string(),
                count: 11,
            },
            FeatureInfo {
                name: "width".to_string(),
                count: 4,
            },
        ])
        .unwrap(),
    )
}

fn output_domain() -> Arc<LabelDomain> {
    Arc::new(LabelDomain::from_counts(BTreeMap::from([
        ("SHALLOW".to_string(), 9),
        ("DEEP".to_string(), 6),
    ])))
}

#[test]
fn ensemble_survives_a_disk_roundtrip() {
    logutil::init_test();

    let members: Vec<Arc<Model>> = (0..3)
        .map(|i| {
            let weights = vec![0.1 * f64::from(i), 1.0 - f64::from(i)];
            Arc::new(Model::Linear(
                LinearModel::new(format!("member-{i}"), feature_domain(), output_domain(), weights)
                    .unwrap(),
            ))
        })
        .collect();
    let expected = WeightedEnsembleModel::from_existing_models(
        "depth-vote",
        members,
        vec![0.5, 0.3, 0.2],
        VotingCombiner,
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir
        .path()
        .join(format!("depth-vote.{TRIBUO_NATIVE_EXTENSION}"));
    write_envelope_to_file(&expected.serialize().unwrap(), &path).unwrap();

    let envelope = read_envelope_from_file(&path).unwrap();
    let got = match Model::deserialize(&envelope).unwrap() {
        Model::Ensemble(e) => e,
        other => panic!("expected an ensemble, got {other:?}"),
    };

    assert_eq!(expected, got);
    for member in got.members() {
        assert!(Arc::ptr_eq(member.feature_domain(), got.feature_domain()));
        assert!(Arc::ptr_eq(member.output_domain(), got.output_domain()));
    }
}

#[test]
fn transform_survives_a_disk_roundtrip() {
    logutil::init_test();

    let expected = SimpleTransform::new(TransformOp::Div, 4.0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scale.tribuo");
    write_envelope_to_file(&expected.serialize().unwrap(), &path).unwrap();

    let envelope = read_envelope_from_file(&path).unwrap();
    let got: SimpleTransform = protos::deserialize(&envelope).unwrap();
    assert_eq!(expected, got);
    assert_eq!(2.0, got.apply(8.0));
}
