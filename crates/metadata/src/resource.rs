//! Run and time-series resource reconciliation
//!
//! Resource creation is at-least-once against the remote service but
//! cached per process, so steady-state uploads issue zero metadata RPCs.
//! ALREADY_EXISTS responses are recovered by listing and matching on
//! display name, which makes concurrent uploaders and restarts safe.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use tb_proto::aiplatform::{
    CreateTensorboardExperimentRequest, CreateTensorboardRunRequest,
    CreateTensorboardTimeSeriesRequest, ListTensorboardExperimentsRequest,
    ListTensorboardRunsRequest, ListTensorboardTimeSeriesRequest, TensorboardExperiment,
    TensorboardRun, TensorboardTimeSeries, ValueType,
};
use uploader_core::{DataClass, Error, Plugin};

use crate::TensorboardService;

fn value_type_for(data_class: DataClass) -> ValueType {
    match data_class {
        DataClass::Scalar => ValueType::Scalar,
        DataClass::Tensor => ValueType::Tensor,
        DataClass::BlobSequence => ValueType::BlobSequence,
    }
}

/// Create the experiment, or adopt an existing one with the same
/// display name under the same tensorboard.
///
/// Listing runs first so that re-running the uploader against the same
/// logdir appends to the prior experiment instead of forking a new one.
pub async fn create_or_adopt_experiment(
    client: &dyn TensorboardService,
    tensorboard: &str,
    display_name: &str,
    description: &str,
) -> Result<TensorboardExperiment, Error> {
    let existing = client
        .list_tensorboard_experiments(ListTensorboardExperimentsRequest {
            parent: tensorboard.to_string(),
        })
        .await
        .map_err(|status| Error::Rpc {
            operation: "ListTensorboardExperiments".to_string(),
            message: status.message().to_string(),
        })?;
    if let Some(experiment) = existing
        .tensorboard_experiments
        .into_iter()
        .find(|e| e.display_name == display_name)
    {
        info!(experiment = %experiment.name, "adopting existing experiment");
        return Ok(experiment);
    }

    let experiment_id = Uuid::new_v4().to_string();
    let request = CreateTensorboardExperimentRequest {
        parent: tensorboard.to_string(),
        tensorboard_experiment: Some(TensorboardExperiment {
            name: String::new(),
            display_name: display_name.to_string(),
            description: description.to_string(),
        }),
        tensorboard_experiment_id: experiment_id,
    };
    match client.create_tensorboard_experiment(request).await {
        Ok(experiment) => {
            info!(experiment = %experiment.name, "created experiment");
            Ok(experiment)
        }
        Err(status) if status.code() == tonic::Code::AlreadyExists => {
            // Raced with another uploader on the same display name
            let listed = client
                .list_tensorboard_experiments(ListTensorboardExperimentsRequest {
                    parent: tensorboard.to_string(),
                })
                .await
                .map_err(|status| Error::Rpc {
                    operation: "ListTensorboardExperiments".to_string(),
                    message: status.message().to_string(),
                })?;
            listed
                .tensorboard_experiments
                .into_iter()
                .find(|e| e.display_name == display_name)
                .ok_or_else(|| Error::Internal {
                    message: format!(
                        "experiment {display_name:?} reported as existing but not listed"
                    ),
                })
        }
        Err(status) => Err(Error::Rpc {
            operation: "CreateTensorboardExperiment".to_string(),
            message: status.message().to_string(),
        }),
    }
}

/// Ensures runs and time series exist before data is written to them
pub struct OnePlatformResourceManager {
    client: Arc<dyn TensorboardService>,
    experiment_name: String,

    /// Run display name -> run resource name
    run_cache: HashMap<String, String>,

    /// (run resource name, tag) -> time-series resource name
    time_series_cache: HashMap<(String, String), String>,
}

impl OnePlatformResourceManager {
    pub fn new(client: Arc<dyn TensorboardService>, experiment_name: String) -> Self {
        Self {
            client,
            experiment_name,
            run_cache: HashMap::new(),
            time_series_cache: HashMap::new(),
        }
    }

    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Runs created or adopted during this session, as
    /// (display name, resource name) pairs
    pub fn known_runs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.run_cache
            .iter()
            .map(|(display, name)| (display.as_str(), name.as_str()))
    }

    /// Resource name for the run with the given display name, creating
    /// it on first sight.
    pub async fn get_run_resource_name(&mut self, run_display_name: &str) -> Result<String, Error> {
        if let Some(name) = self.run_cache.get(run_display_name) {
            return Ok(name.clone());
        }

        let run_id = Uuid::new_v4().to_string();
        let request = CreateTensorboardRunRequest {
            parent: self.experiment_name.clone(),
            tensorboard_run: Some(TensorboardRun {
                name: String::new(),
                display_name: run_display_name.to_string(),
            }),
            tensorboard_run_id: run_id,
        };
        let name = match self.client.create_tensorboard_run(request).await {
            Ok(run) => {
                debug!(run = %run.name, display_name = run_display_name, "created run");
                run.name
            }
            Err(status) if status.code() == tonic::Code::AlreadyExists => {
                self.find_run_by_display_name(run_display_name).await?
            }
            Err(status) if status.code() == tonic::Code::NotFound => {
                return Err(Error::ExperimentNotFound {
                    experiment: self.experiment_name.clone(),
                });
            }
            Err(status) => {
                return Err(Error::Rpc {
                    operation: "CreateTensorboardRun".to_string(),
                    message: status.message().to_string(),
                });
            }
        };
        self.run_cache
            .insert(run_display_name.to_string(), name.clone());
        Ok(name)
    }

    /// Resource name for the time series `tag` under `run_resource_name`,
    /// creating it on first sight.
    pub async fn get_time_series_resource_name(
        &mut self,
        run_resource_name: &str,
        tag: &str,
        plugin: Plugin,
        plugin_data: &[u8],
    ) -> Result<String, Error> {
        let key = (run_resource_name.to_string(), tag.to_string());
        if let Some(name) = self.time_series_cache.get(&key) {
            return Ok(name.clone());
        }

        let request = CreateTensorboardTimeSeriesRequest {
            parent: run_resource_name.to_string(),
            tensorboard_time_series: Some(TensorboardTimeSeries {
                name: String::new(),
                display_name: tag.to_string(),
                value_type: value_type_for(plugin.data_class()) as i32,
                plugin_name: plugin.as_str().to_string(),
                plugin_data: plugin_data.to_vec(),
            }),
        };
        let name = match self.client.create_tensorboard_time_series(request).await {
            Ok(time_series) => {
                debug!(time_series = %time_series.name, tag, "created time series");
                time_series.name
            }
            // Duplicates surface as INVALID_ARGUMENT with an
            // "already exist" message, not ALREADY_EXISTS
            Err(status)
                if status.code() == tonic::Code::InvalidArgument
                    && status.message().contains("already exist") =>
            {
                self.find_time_series_by_display_name(run_resource_name, tag)
                    .await?
            }
            Err(status) if status.code() == tonic::Code::NotFound => {
                return Err(Error::ExperimentNotFound {
                    experiment: self.experiment_name.clone(),
                });
            }
            Err(status) => {
                return Err(Error::Rpc {
                    operation: "CreateTensorboardTimeSeries".to_string(),
                    message: status.message().to_string(),
                });
            }
        };
        self.time_series_cache.insert(key, name.clone());
        Ok(name)
    }

    async fn find_run_by_display_name(&self, run_display_name: &str) -> Result<String, Error> {
        let listed = self
            .client
            .list_tensorboard_runs(ListTensorboardRunsRequest {
                parent: self.experiment_name.clone(),
            })
            .await
            .map_err(|status| Error::Rpc {
                operation: "ListTensorboardRuns".to_string(),
                message: status.message().to_string(),
            })?;
        listed
            .tensorboard_runs
            .into_iter()
            .find(|run| run.display_name == run_display_name)
            .map(|run| run.name)
            .ok_or_else(|| Error::Internal {
                message: format!("run {run_display_name:?} reported as existing but not listed"),
            })
    }

    async fn find_time_series_by_display_name(
        &self,
        run_resource_name: &str,
        tag: &str,
    ) -> Result<String, Error> {
        let listed = self
            .client
            .list_tensorboard_time_series(ListTensorboardTimeSeriesRequest {
                parent: run_resource_name.to_string(),
            })
            .await
            .map_err(|status| Error::Rpc {
                operation: "ListTensorboardTimeSeries".to_string(),
                message: status.message().to_string(),
            })?;
        listed
            .tensorboard_time_series
            .into_iter()
            .find(|ts| ts.display_name == tag)
            .map(|ts| ts.name)
            .ok_or_else(|| Error::Internal {
                message: format!("time series {tag:?} reported as existing but not listed"),
            })
    }
}
