#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use prost::Message;

use event_log::record::write_frame;
use tb_proto::tensorboard::{
    event::What, summary, summary_metadata::PluginData, DataClass as ProtoDataClass, Event,
    Summary, SummaryMetadata, TensorProto,
};
use uploader_core::{RateLimitConfig, UploaderConfig};

pub const TENSORBOARD: &str = "projects/p/locations/l/tensorboards/t";

pub fn scalar_event(step: i64, tag: &str, value: f32) -> Event {
    Event {
        wall_time: step as f64,
        step,
        what: Some(What::Summary(Summary {
            value: vec![summary::Value {
                tag: tag.to_string(),
                metadata: None,
                value: Some(summary::value::Value::SimpleValue(value)),
            }],
        })),
    }
}

pub fn tensor_event(step: i64, tag: &str, payload: Vec<f64>) -> Event {
    let metadata = SummaryMetadata {
        plugin_data: Some(PluginData {
            plugin_name: "histograms".to_string(),
            content: Vec::new(),
        }),
        display_name: String::new(),
        summary_description: String::new(),
        data_class: ProtoDataClass::Tensor as i32,
    };
    Event {
        wall_time: step as f64,
        step,
        what: Some(What::Summary(Summary {
            value: vec![summary::Value {
                tag: tag.to_string(),
                metadata: Some(metadata),
                value: Some(summary::value::Value::Tensor(TensorProto {
                    double_val: payload,
                    ..Default::default()
                })),
            }],
        })),
    }
}

pub fn graph_event(graph_bytes: Vec<u8>) -> Event {
    Event {
        wall_time: 1.0,
        step: 0,
        what: Some(What::GraphDef(graph_bytes)),
    }
}

pub fn write_event_file(dir: &Path, name: &str, events: &[Event]) {
    let mut buf = Vec::new();
    for event in events {
        write_frame(&mut buf, &event.encode_to_vec());
    }
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), buf).unwrap();
}

/// One-shot configuration with all rate limits disabled
pub fn one_shot_config(logdir: &Path) -> UploaderConfig {
    UploaderConfig {
        logdir: logdir.to_path_buf(),
        tensorboard_resource_name: TENSORBOARD.to_string(),
        experiment_display_name: "integration-test".to_string(),
        one_shot: true,
        intervals: RateLimitConfig {
            scalar_interval: Duration::ZERO,
            tensor_interval: Duration::ZERO,
            blob_interval: Duration::ZERO,
            logdir_poll_interval: Duration::ZERO,
        },
        ..Default::default()
    }
}

/// Find an object by file name anywhere under the local store root
pub fn find_object(root: &Path, name: &str) -> Option<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries {
            let entry = entry.unwrap();
            if entry.file_type().unwrap().is_dir() {
                stack.push(entry.path());
            } else if entry.file_name().to_string_lossy() == name {
                return Some(entry.path());
            }
        }
    }
    None
}
