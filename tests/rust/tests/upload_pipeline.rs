//! End-to-end pipeline tests: temp logdir in, recorded RPCs out.

mod common;

use std::sync::Arc;

use prost::Message;
use tokio_util::sync::CancellationToken;

use common::*;
use metadata::InMemoryTensorboardService;
use storage::LocalObjectStore;
use tb_proto::aiplatform::time_series_data_point::Value;
use tb_proto::tensorboard::{attr_value, AttrValue, GraphDef, NodeDef};
use tempfile::tempdir;
use uploader::TensorboardUploader;
use uploader_core::Error;

async fn run_one_shot(
    config: uploader_core::UploaderConfig,
    service: Arc<InMemoryTensorboardService>,
    blob_root: &std::path::Path,
) -> uploader_core::Result<()> {
    let store = Arc::new(LocalObjectStore::new(blob_root));
    let mut uploader = TensorboardUploader::new(config, service, store);
    uploader.create_experiment().await?;
    uploader.start_uploading(CancellationToken::new()).await
}

#[tokio::test]
async fn test_empty_logdir_uploads_nothing() {
    let logdir = tempdir().unwrap();
    let blob_root = tempdir().unwrap();
    let service = Arc::new(InMemoryTensorboardService::new());

    run_one_shot(one_shot_config(logdir.path()), service.clone(), blob_root.path())
        .await
        .unwrap();

    assert_eq!(service.experiments().len(), 1);
    assert!(service.experiment_writes().is_empty());
    assert!(service.run_writes().is_empty());
    assert_eq!(service.create_run_calls(), 0);
}

#[tokio::test]
async fn test_single_tag_batches_into_one_request() {
    let logdir = tempdir().unwrap();
    let blob_root = tempdir().unwrap();
    write_event_file(
        logdir.path(),
        "events.out.tfevents.100.host",
        &[
            scalar_event(1, "loss", 0.9),
            scalar_event(2, "loss", 0.7),
            scalar_event(3, "loss", 0.5),
        ],
    );
    let service = Arc::new(InMemoryTensorboardService::new());

    run_one_shot(one_shot_config(logdir.path()), service.clone(), blob_root.path())
        .await
        .unwrap();

    let writes = service.experiment_writes();
    assert_eq!(writes.len(), 1, "three points should share one request");
    let series = &writes[0].write_run_data_requests[0].time_series_data;
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].values.len(), 3);
    let steps: Vec<i64> = series[0].values.iter().map(|p| p.step).collect();
    assert_eq!(steps, vec![1, 2, 3]);

    // Resource creation happened exactly once per resource
    assert_eq!(service.create_run_calls(), 1);
    assert_eq!(service.create_time_series_calls(), 1);
}

#[tokio::test]
async fn test_requests_split_at_run_boundary() {
    let logdir = tempdir().unwrap();
    let blob_root = tempdir().unwrap();
    write_event_file(
        &logdir.path().join("train"),
        "events.out.tfevents.100.host",
        &[scalar_event(1, "loss", 0.9)],
    );
    write_event_file(
        &logdir.path().join("eval"),
        "events.out.tfevents.100.host",
        &[scalar_event(1, "loss", 0.8)],
    );
    let service = Arc::new(InMemoryTensorboardService::new());

    run_one_shot(one_shot_config(logdir.path()), service.clone(), blob_root.path())
        .await
        .unwrap();

    let writes = service.experiment_writes();
    assert_eq!(writes.len(), 2, "each run flushes its own request");
    for write in &writes {
        assert_eq!(write.write_run_data_requests.len(), 1);
    }
    let experiment = service.experiments()[0].name.clone();
    let mut run_names: Vec<String> = service
        .runs_of(&experiment)
        .into_iter()
        .map(|r| r.display_name)
        .collect();
    run_names.sort();
    assert_eq!(run_names, vec!["eval".to_string(), "train".to_string()]);
}

#[tokio::test]
async fn test_tensor_records_upload_alongside_scalars() {
    let logdir = tempdir().unwrap();
    let blob_root = tempdir().unwrap();
    write_event_file(
        logdir.path(),
        "events.out.tfevents.100.host",
        &[
            scalar_event(1, "loss", 0.9),
            tensor_event(1, "weights", vec![1.0, 2.0, 3.0]),
        ],
    );
    let service = Arc::new(InMemoryTensorboardService::new());

    run_one_shot(one_shot_config(logdir.path()), service.clone(), blob_root.path())
        .await
        .unwrap();

    // One scalar request and one tensor request
    let writes = service.experiment_writes();
    assert_eq!(writes.len(), 2);
    let mut has_scalar = false;
    let mut has_tensor = false;
    for write in &writes {
        for point in write.write_run_data_requests[0]
            .time_series_data
            .iter()
            .flat_map(|ts| &ts.values)
        {
            match point.value.as_ref().unwrap() {
                Value::Scalar(s) => {
                    has_scalar = true;
                    assert!((s.value - 0.9).abs() < 1e-6);
                }
                Value::Tensor(_) => has_tensor = true,
                Value::Blobs(_) => panic!("no blob points expected"),
            }
        }
    }
    assert!(has_scalar && has_tensor);
}

#[tokio::test]
async fn test_oversized_graph_attribute_stripped() {
    let logdir = tempdir().unwrap();
    let blob_root = tempdir().unwrap();

    let mut big = NodeDef {
        name: "big".to_string(),
        op: "Const".to_string(),
        ..Default::default()
    };
    big.attr.insert(
        "large".to_string(),
        AttrValue {
            value: Some(attr_value::Value::S(vec![0u8; 4096])),
        },
    );
    let mut small = NodeDef {
        name: "small".to_string(),
        op: "Identity".to_string(),
        ..Default::default()
    };
    small.attr.insert(
        "T".to_string(),
        AttrValue {
            value: Some(attr_value::Value::I(1)),
        },
    );
    let graph = GraphDef {
        node: vec![big, small],
        version: 1,
    };

    write_event_file(
        logdir.path(),
        "events.out.tfevents.100.host",
        &[graph_event(graph.encode_to_vec())],
    );
    let service = Arc::new(InMemoryTensorboardService::new());

    run_one_shot(one_shot_config(logdir.path()), service.clone(), blob_root.path())
        .await
        .unwrap();

    let writes = service.experiment_writes();
    assert_eq!(writes.len(), 1);
    let point = &writes[0].write_run_data_requests[0].time_series_data[0].values[0];
    let Some(Value::Blobs(sequence)) = &point.value else {
        panic!("expected a blob-sequence point for the graph");
    };
    assert_eq!(sequence.values.len(), 1);

    // The stored object is the filtered graph
    let object = find_object(blob_root.path(), &sequence.values[0].id).unwrap();
    let stored = GraphDef::decode(std::fs::read(object).unwrap().as_slice()).unwrap();
    let big = stored.node.iter().find(|n| n.name == "big").unwrap();
    assert!(!big.attr.contains_key("large"));
    match big.attr["_too_large_attrs"].value.as_ref().unwrap() {
        attr_value::Value::List(list) => assert_eq!(list.s, vec![b"large".to_vec()]),
        other => panic!("unexpected sentinel: {other:?}"),
    }
    let small = stored.node.iter().find(|n| n.name == "small").unwrap();
    assert!(small.attr.contains_key("T"));
    assert!(!small.attr.contains_key("_too_large_attrs"));
}

#[tokio::test]
async fn test_unparseable_graph_skipped() {
    let logdir = tempdir().unwrap();
    let blob_root = tempdir().unwrap();
    write_event_file(
        logdir.path(),
        "events.out.tfevents.100.host",
        &[graph_event(vec![0xff, 0xff, 0xff, 0xff])],
    );
    let service = Arc::new(InMemoryTensorboardService::new());

    run_one_shot(one_shot_config(logdir.path()), service.clone(), blob_root.path())
        .await
        .unwrap();

    assert!(service.experiment_writes().is_empty());
}

#[tokio::test]
async fn test_not_found_during_write_is_fatal() {
    let logdir = tempdir().unwrap();
    let blob_root = tempdir().unwrap();
    write_event_file(
        logdir.path(),
        "events.out.tfevents.100.host",
        &[scalar_event(1, "loss", 0.9)],
    );
    let service = Arc::new(InMemoryTensorboardService::new());

    // The experiment exists while resources are created, but the write
    // itself comes back NOT_FOUND.
    service.push_write_failure(tonic::Status::not_found("experiment deleted"));
    let err = run_one_shot(one_shot_config(logdir.path()), service.clone(), blob_root.path())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ExperimentNotFound { .. }));
    assert!(service.experiment_writes().is_empty());
}

#[tokio::test]
async fn test_run_name_prefix_reaches_the_service() {
    let logdir = tempdir().unwrap();
    let blob_root = tempdir().unwrap();
    write_event_file(
        &logdir.path().join("train"),
        "events.out.tfevents.100.host",
        &[scalar_event(1, "loss", 0.9)],
    );
    let service = Arc::new(InMemoryTensorboardService::new());
    let config = uploader_core::UploaderConfig {
        run_name_prefix: Some("trial-3/".to_string()),
        ..one_shot_config(logdir.path())
    };

    run_one_shot(config, service.clone(), blob_root.path())
        .await
        .unwrap();

    let experiment = service.experiments()[0].name.clone();
    let runs = service.runs_of(&experiment);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].display_name, "trial-3/train");
}
