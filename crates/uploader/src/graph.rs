//! Graph payload filtering
//!
//! Serialized graphs routinely embed large constant tensors in node
//! attributes. Those are useless for visualization and can push a blob
//! past the size limit, so oversized attribute values are stripped before
//! upload and replaced with a sentinel listing the removed names.

use prost::Message;
use tb_proto::tensorboard::{attr_value, AttrValue, GraphDef};
use tracing::debug;

/// Sentinel attribute holding the names of stripped attributes
pub const TOO_LARGE_ATTRS_KEY: &str = "_too_large_attrs";

/// Serialized size above which a single node attribute is stripped
const MAX_ATTR_VALUE_BYTES: usize = 1024;

/// Strip oversized node attributes from a serialized graph
///
/// Returns the re-serialized graph, or `None` when the payload does not
/// decode as a graph at all (such blobs are skipped entirely).
pub fn filter_graph(graph_bytes: &[u8]) -> Option<Vec<u8>> {
    filter_graph_with_limit(graph_bytes, MAX_ATTR_VALUE_BYTES)
}

pub fn filter_graph_with_limit(graph_bytes: &[u8], max_attr_bytes: usize) -> Option<Vec<u8>> {
    let mut graph = match GraphDef::decode(graph_bytes) {
        Ok(graph) => graph,
        Err(e) => {
            debug!(error = %e, "Payload does not decode as a graph; skipping");
            return None;
        }
    };

    for node in &mut graph.node {
        let mut stripped: Vec<Vec<u8>> = node
            .attr
            .iter()
            .filter(|(_, value)| value.encoded_len() > max_attr_bytes)
            .map(|(name, _)| name.clone().into_bytes())
            .collect();
        if stripped.is_empty() {
            continue;
        }
        stripped.sort();

        node.attr
            .retain(|_, value| value.encoded_len() <= max_attr_bytes);
        node.attr.insert(
            TOO_LARGE_ATTRS_KEY.to_string(),
            AttrValue {
                value: Some(attr_value::Value::List(attr_value::ListValue {
                    s: stripped,
                    ..Default::default()
                })),
            },
        );
    }

    Some(graph.encode_to_vec())
}
