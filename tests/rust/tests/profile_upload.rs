//! Profile directory polling: at-most-once uploads per file across polls.

mod common;

use std::sync::Arc;

use tempfile::tempdir;

use common::*;
use metadata::{create_or_adopt_experiment, InMemoryTensorboardService, OnePlatformResourceManager};
use storage::LocalObjectStore;
use tb_proto::aiplatform::time_series_data_point::Value;
use uploader::senders::{FileSender, ProfileSender};
use uploader::UploadTracker;
use uploader_core::{BlobStorageConfig, LimitConfig, RateLimitConfig};

const PROFILE_DIR: &str = "2021_01_01_01_10_10";

struct Harness {
    service: Arc<InMemoryTensorboardService>,
    resources: OnePlatformResourceManager,
    files: FileSender,
    profiles: ProfileSender,
    tracker: UploadTracker,
    blob_root: tempfile::TempDir,
}

async fn harness(logdir: &std::path::Path) -> Harness {
    let service = Arc::new(InMemoryTensorboardService::new());
    let experiment = create_or_adopt_experiment(service.as_ref(), TENSORBOARD, "profiles", "")
        .await
        .unwrap();
    let blob_root = tempdir().unwrap();
    let store = Arc::new(LocalObjectStore::new(blob_root.path()));
    let storage = BlobStorageConfig {
        bucket: "blob-bucket".to_string(),
        folder: None,
        source_bucket: None,
    };
    let files = FileSender::new(
        service.clone(),
        store,
        experiment.name.clone(),
        logdir.to_path_buf(),
        &storage,
        &LimitConfig::default(),
        &RateLimitConfig {
            blob_interval: std::time::Duration::ZERO,
            ..Default::default()
        },
    )
    .unwrap();
    Harness {
        resources: OnePlatformResourceManager::new(service.clone(), experiment.name.clone()),
        service,
        files,
        profiles: ProfileSender::new(),
        tracker: UploadTracker::new(),
        blob_root,
    }
}

fn blob_ids(write: &tb_proto::aiplatform::WriteTensorboardRunDataRequest) -> Vec<String> {
    let mut ids = Vec::new();
    for series in &write.time_series_data {
        for point in &series.values {
            if let Some(Value::Blobs(sequence)) = &point.value {
                ids.extend(sequence.values.iter().map(|b| b.id.clone()));
            }
        }
    }
    ids
}

#[tokio::test]
async fn test_profile_files_upload_once_per_poll() {
    let logdir = tempdir().unwrap();
    let run_dir = logdir.path().join("r");
    let profile_dir = run_dir.join("plugins").join("profile").join(PROFILE_DIR);
    std::fs::create_dir_all(&profile_dir).unwrap();
    std::fs::write(profile_dir.join("a.xplane.pb"), b"trace-a").unwrap();

    let mut h = harness(logdir.path()).await;
    h.profiles
        .poll_run(&mut h.resources, &mut h.files, "r", &run_dir, &mut h.tracker)
        .await
        .unwrap();

    let writes = h.service.run_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(blob_ids(&writes[0]), vec!["a.xplane.pb".to_string()]);
    // The time series id is the profile directory name, and the point is
    // stamped with the time the directory encodes.
    let series = &writes[0].time_series_data[0];
    assert_eq!(series.tensorboard_time_series_id, PROFILE_DIR);
    assert_eq!(series.values[0].wall_time, 1_609_463_410.0);

    // A second poll over the same tree uploads nothing
    h.profiles
        .poll_run(&mut h.resources, &mut h.files, "r", &run_dir, &mut h.tracker)
        .await
        .unwrap();
    assert_eq!(h.service.run_writes().len(), 1);

    // A new file in the same profile directory goes out alone
    std::fs::write(profile_dir.join("b.xplane.pb"), b"trace-b").unwrap();
    h.profiles
        .poll_run(&mut h.resources, &mut h.files, "r", &run_dir, &mut h.tracker)
        .await
        .unwrap();
    let writes = h.service.run_writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(blob_ids(&writes[1]), vec!["b.xplane.pb".to_string()]);
}

#[tokio::test]
async fn test_profile_objects_land_in_the_store() {
    let logdir = tempdir().unwrap();
    let run_dir = logdir.path().join("r");
    let profile_dir = run_dir.join("plugins").join("profile").join(PROFILE_DIR);
    std::fs::create_dir_all(&profile_dir).unwrap();
    std::fs::write(profile_dir.join("a.xplane.pb"), b"trace-a").unwrap();

    let mut h = harness(logdir.path()).await;
    h.profiles
        .poll_run(&mut h.resources, &mut h.files, "r", &run_dir, &mut h.tracker)
        .await
        .unwrap();

    let object = find_object(h.blob_root.path(), "a.xplane.pb").unwrap();
    assert_eq!(std::fs::read(object).unwrap(), b"trace-a");
    assert_eq!(h.tracker.totals().files_uploaded, 1);
}

#[tokio::test]
async fn test_non_profile_directories_ignored() {
    let logdir = tempdir().unwrap();
    let run_dir = logdir.path().join("r");
    let odd_dir = run_dir.join("plugins").join("profile").join("not-a-session");
    std::fs::create_dir_all(&odd_dir).unwrap();
    std::fs::write(odd_dir.join("a.xplane.pb"), b"trace-a").unwrap();

    let mut h = harness(logdir.path()).await;
    h.profiles
        .poll_run(&mut h.resources, &mut h.files, "r", &run_dir, &mut h.tracker)
        .await
        .unwrap();

    assert!(h.service.run_writes().is_empty());
}

#[tokio::test]
async fn test_run_without_profile_directory_is_a_no_op() {
    let logdir = tempdir().unwrap();
    let run_dir = logdir.path().join("r");
    std::fs::create_dir_all(&run_dir).unwrap();

    let mut h = harness(logdir.path()).await;
    h.profiles
        .poll_run(&mut h.resources, &mut h.files, "r", &run_dir, &mut h.tracker)
        .await
        .unwrap();

    assert!(h.service.run_writes().is_empty());
    assert_eq!(h.tracker.totals().files_uploaded, 0);
}
