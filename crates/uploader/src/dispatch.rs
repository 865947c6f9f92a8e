//! Record routing
//!
//! Routes each classified record to its per-plugin sender. Failures on
//! individual records are logged and skipped; only fatal errors (the
//! experiment disappearing, unusable configuration) propagate.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use event_log::{EventRecord, RecordValue};
use metadata::{OnePlatformResourceManager, TensorboardService};
use storage::ObjectStore;
use uploader_core::{DataClass, Plugin, Result, UploaderConfig};

use crate::graph;
use crate::senders::{BlobSender, ScalarSender, TensorSender};
use crate::tracker::UploadTracker;

pub struct Dispatcher {
    allowed: HashSet<Plugin>,
    scalars: ScalarSender,
    tensors: TensorSender,
    blobs: BlobSender,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn TensorboardService>,
        store: Arc<dyn ObjectStore>,
        experiment_name: &str,
        config: &UploaderConfig,
    ) -> Result<Self> {
        Ok(Self {
            allowed: config.allowed_plugins.iter().copied().collect(),
            scalars: ScalarSender::new(
                client.clone(),
                experiment_name.to_string(),
                &config.limits,
                &config.intervals,
            )?,
            tensors: TensorSender::new(
                client.clone(),
                experiment_name.to_string(),
                &config.limits,
                &config.intervals,
            )?,
            blobs: BlobSender::new(
                client,
                store,
                experiment_name.to_string(),
                &config.storage,
                &config.limits,
                &config.intervals,
            )?,
        })
    }

    pub fn plugin_allowed(&self, plugin: Plugin) -> bool {
        self.allowed.contains(&plugin)
    }

    /// Route one poll's worth of records and flush every sender
    pub async fn dispatch(
        &mut self,
        resources: &mut OnePlatformResourceManager,
        tracker: &mut UploadTracker,
        runs: &BTreeMap<String, Vec<EventRecord>>,
        run_name_prefix: Option<&str>,
    ) -> Result<()> {
        for (run_name, records) in runs {
            let display_name = match run_name_prefix {
                Some(prefix) => format!("{prefix}{run_name}"),
                None => run_name.clone(),
            };
            for record in records {
                if !self.allowed.contains(&record.plugin) {
                    tracker.record_skipped();
                    continue;
                }
                // Profile announcements carry no payload; the profile
                // sender scans the filesystem out-of-band.
                if record.plugin == Plugin::Profile {
                    continue;
                }
                let result = match record.data_class {
                    DataClass::Scalar => {
                        self.scalars
                            .add_record(resources, &display_name, record, tracker)
                            .await
                    }
                    DataClass::Tensor => {
                        self.tensors
                            .add_record(resources, &display_name, record, tracker)
                            .await
                    }
                    DataClass::BlobSequence => {
                        self.send_blob_record(resources, &display_name, record, tracker)
                            .await
                    }
                };
                if let Err(e) = result {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    warn!(
                        run = %display_name,
                        tag = %record.tag,
                        error = %e,
                        "Failed to upload record; continuing"
                    );
                }
            }
        }
        self.flush(tracker).await
    }

    pub async fn flush(&mut self, tracker: &mut UploadTracker) -> Result<()> {
        self.scalars.flush(tracker).await?;
        self.tensors.flush(tracker).await?;
        Ok(())
    }

    async fn send_blob_record(
        &mut self,
        resources: &mut OnePlatformResourceManager,
        display_name: &str,
        record: &EventRecord,
        tracker: &mut UploadTracker,
    ) -> Result<()> {
        if record.plugin != Plugin::Graphs {
            return self
                .blobs
                .send_blobs(resources, display_name, record, tracker)
                .await;
        }

        // Graphs are filtered before upload; unparseable payloads are
        // dropped entirely.
        let RecordValue::Blobs(blobs) = &record.value else {
            return Ok(());
        };
        let filtered: Vec<Vec<u8>> = blobs
            .iter()
            .filter_map(|bytes| graph::filter_graph(bytes))
            .collect();
        if filtered.is_empty() {
            debug!(run = display_name, tag = %record.tag, "Graph did not parse; skipping");
            return Ok(());
        }
        let mut record = record.clone();
        record.value = RecordValue::Blobs(filtered);
        self.blobs
            .send_blobs(resources, display_name, &record, tracker)
            .await
    }
}
