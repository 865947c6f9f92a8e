//! Event migration
//!
//! Two deterministic upgrade steps applied to every decoded event:
//! old event shapes (`simple_value` scalars, top-level graph defs) are
//! normalized to current summaries, and each value is annotated with the
//! plugin and data class taken from the first `SummaryMetadata` seen for
//! its tag. Later values of the same tag inherit that metadata;
//! first writer wins.

use std::collections::HashMap;

use tb_proto::tensorboard::{
    event::What, summary::value::Value as SummaryValue, DataClass as ProtoDataClass, Event,
    SummaryMetadata, TensorProto,
};
use tracing::{debug, warn};
use uploader_core::types::{DataClass, Plugin};
use uploader_core::{Step, WallTime};

/// Tag assigned to migrated top-level graph events
pub const RUN_GRAPH_TAG: &str = "__run_graph__";

/// Plugin classification for one tag, fixed at first sight
#[derive(Debug, Clone)]
pub struct TagMetadata {
    pub plugin: Plugin,
    pub data_class: DataClass,
    /// Opaque plugin payload forwarded to the service
    pub plugin_data: Vec<u8>,
}

/// A fully-classified record ready for dispatch
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub wall_time: WallTime,
    pub step: Step,
    pub tag: String,
    pub plugin: Plugin,
    pub data_class: DataClass,
    pub plugin_data: Vec<u8>,
    pub value: RecordValue,
}

/// Payload union of a record
#[derive(Debug, Clone)]
pub enum RecordValue {
    Scalar(f64),
    Tensor(TensorProto),
    /// One or more opaque blobs (serialized graphs, encoded images)
    Blobs(Vec<Vec<u8>>),
}

/// Upgrade one event into zero or more classified records, consulting and
/// updating the per-run tag metadata map
pub fn migrate_event(
    event: &Event,
    known_tags: &mut HashMap<String, TagMetadata>,
) -> Vec<EventRecord> {
    match &event.what {
        None | Some(What::FileVersion(_)) => Vec::new(),
        Some(What::GraphDef(graph_bytes)) => {
            known_tags
                .entry(RUN_GRAPH_TAG.to_string())
                .or_insert_with(|| TagMetadata {
                    plugin: Plugin::Graphs,
                    data_class: DataClass::BlobSequence,
                    plugin_data: Vec::new(),
                });
            vec![EventRecord {
                wall_time: event.wall_time,
                step: event.step,
                tag: RUN_GRAPH_TAG.to_string(),
                plugin: Plugin::Graphs,
                data_class: DataClass::BlobSequence,
                plugin_data: Vec::new(),
                value: RecordValue::Blobs(vec![graph_bytes.clone()]),
            }]
        }
        Some(What::Summary(summary)) => {
            let mut records = Vec::new();
            for value in &summary.value {
                let candidate = initial_metadata(value.metadata.as_ref(), value.value.as_ref());

                let metadata = match known_tags.get(&value.tag) {
                    Some(existing) => existing.clone(),
                    None => match candidate {
                        Some(md) => {
                            known_tags.insert(value.tag.clone(), md.clone());
                            md
                        }
                        None => {
                            debug!(tag = %value.tag, "Discarding value with no classifiable plugin");
                            continue;
                        }
                    },
                };

                let Some(payload) = value.value.as_ref() else {
                    continue;
                };
                match resolve_value(payload, metadata.data_class) {
                    Some(resolved) => records.push(EventRecord {
                        wall_time: event.wall_time,
                        step: event.step,
                        tag: value.tag.clone(),
                        plugin: metadata.plugin,
                        data_class: metadata.data_class,
                        plugin_data: metadata.plugin_data.clone(),
                        value: resolved,
                    }),
                    None => {
                        warn!(
                            tag = %value.tag,
                            data_class = ?metadata.data_class,
                            "Summary value does not match its tag's data class; skipping"
                        );
                    }
                }
            }
            records
        }
    }
}

/// Classification carried by the value itself, used the first time a tag
/// is seen
fn initial_metadata(
    metadata: Option<&SummaryMetadata>,
    value: Option<&SummaryValue>,
) -> Option<TagMetadata> {
    if let Some(md) = metadata {
        if let Some(plugin_data) = &md.plugin_data {
            if let Some(plugin) = Plugin::from_name(&plugin_data.plugin_name) {
                let data_class = match ProtoDataClass::try_from(md.data_class) {
                    Ok(ProtoDataClass::Scalar) => DataClass::Scalar,
                    Ok(ProtoDataClass::Tensor) => DataClass::Tensor,
                    Ok(ProtoDataClass::BlobSequence) => DataClass::BlobSequence,
                    _ => plugin.data_class(),
                };
                return Some(TagMetadata {
                    plugin,
                    data_class,
                    plugin_data: plugin_data.content.clone(),
                });
            }
            debug!(plugin = %plugin_data.plugin_name, "Unsupported plugin");
            return None;
        }
    }

    // Pre-metadata event shapes
    match value {
        Some(SummaryValue::SimpleValue(_)) => Some(TagMetadata {
            plugin: Plugin::Scalars,
            data_class: DataClass::Scalar,
            plugin_data: Vec::new(),
        }),
        Some(SummaryValue::Image(_)) => Some(TagMetadata {
            plugin: Plugin::Images,
            data_class: DataClass::BlobSequence,
            plugin_data: Vec::new(),
        }),
        _ => None,
    }
}

fn resolve_value(value: &SummaryValue, data_class: DataClass) -> Option<RecordValue> {
    match (data_class, value) {
        (DataClass::Scalar, SummaryValue::SimpleValue(v)) => {
            Some(RecordValue::Scalar(f64::from(*v)))
        }
        (DataClass::Scalar, SummaryValue::Tensor(t)) => {
            scalar_from_tensor(t).map(RecordValue::Scalar)
        }
        (DataClass::Tensor, SummaryValue::Tensor(t)) => Some(RecordValue::Tensor(t.clone())),
        (DataClass::BlobSequence, SummaryValue::Image(img)) => {
            Some(RecordValue::Blobs(vec![img.encoded_image_string.clone()]))
        }
        (DataClass::BlobSequence, SummaryValue::Tensor(t)) => {
            Some(RecordValue::Blobs(t.string_val.clone()))
        }
        _ => None,
    }
}

fn scalar_from_tensor(tensor: &TensorProto) -> Option<f64> {
    if let Some(v) = tensor.double_val.first() {
        return Some(*v);
    }
    if let Some(v) = tensor.float_val.first() {
        return Some(f64::from(*v));
    }
    None
}
