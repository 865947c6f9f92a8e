//! In-memory metadata service
//!
//! Mirrors the server-side semantics the uploader depends on: resource
//! hierarchies, ALREADY_EXISTS on duplicate display names, the
//! "already exist" INVALID_ARGUMENT quirk for time series, and NOT_FOUND
//! once an experiment is deleted. Records every write request so tests
//! can assert on exactly what was sent; also backs `--dry-run`.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tb_proto::aiplatform::{
    CreateTensorboardExperimentRequest, CreateTensorboardRunRequest,
    CreateTensorboardTimeSeriesRequest, ListTensorboardExperimentsRequest,
    ListTensorboardExperimentsResponse, ListTensorboardRunsRequest, ListTensorboardRunsResponse,
    ListTensorboardTimeSeriesRequest, ListTensorboardTimeSeriesResponse, TensorboardExperiment,
    TensorboardRun, TensorboardTimeSeries, WriteTensorboardExperimentDataRequest,
    WriteTensorboardExperimentDataResponse, WriteTensorboardRunDataRequest,
    WriteTensorboardRunDataResponse,
};
use tonic::Status;
use uuid::Uuid;

use crate::TensorboardService;

#[derive(Default)]
struct State {
    /// Experiment resource name -> experiment
    experiments: HashMap<String, TensorboardExperiment>,

    /// Experiment resource name -> runs
    runs: HashMap<String, Vec<TensorboardRun>>,

    /// Run resource name -> time series
    time_series: HashMap<String, Vec<TensorboardTimeSeries>>,

    /// Experiments that have been deleted out from under the uploader
    deleted: HashSet<String>,

    /// Scripted failures consumed by the next write RPCs
    write_failures: VecDeque<Status>,

    experiment_writes: Vec<WriteTensorboardExperimentDataRequest>,
    run_writes: Vec<WriteTensorboardRunDataRequest>,
    create_run_calls: usize,
    create_time_series_calls: usize,
}

/// In-memory implementation of [`TensorboardService`]
#[derive(Default)]
pub struct InMemoryTensorboardService {
    state: Mutex<State>,
}

impl InMemoryTensorboardService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure to be returned by the next write RPC
    pub fn push_write_failure(&self, status: Status) {
        self.state.lock().write_failures.push_back(status);
    }

    /// Simulate server-side deletion of an experiment: every later write
    /// touching it returns NOT_FOUND
    pub fn delete_experiment(&self, experiment_name: &str) {
        let mut state = self.state.lock();
        state.deleted.insert(experiment_name.to_string());
        state.experiments.remove(experiment_name);
    }

    /// All WriteTensorboardExperimentData requests received so far
    pub fn experiment_writes(&self) -> Vec<WriteTensorboardExperimentDataRequest> {
        self.state.lock().experiment_writes.clone()
    }

    /// All WriteTensorboardRunData requests received so far
    pub fn run_writes(&self) -> Vec<WriteTensorboardRunDataRequest> {
        self.state.lock().run_writes.clone()
    }

    pub fn create_run_calls(&self) -> usize {
        self.state.lock().create_run_calls
    }

    pub fn create_time_series_calls(&self) -> usize {
        self.state.lock().create_time_series_calls
    }

    pub fn experiments(&self) -> Vec<TensorboardExperiment> {
        self.state.lock().experiments.values().cloned().collect()
    }

    pub fn runs_of(&self, experiment_name: &str) -> Vec<TensorboardRun> {
        self.state
            .lock()
            .runs
            .get(experiment_name)
            .cloned()
            .unwrap_or_default()
    }

    fn take_write_failure(state: &mut State) -> Option<Status> {
        state.write_failures.pop_front()
    }

    fn experiment_of_run(run_name: &str) -> &str {
        // `…/experiments/E/runs/R` -> `…/experiments/E`
        match run_name.rfind("/runs/") {
            Some(idx) => &run_name[..idx],
            None => run_name,
        }
    }
}

#[async_trait]
impl TensorboardService for InMemoryTensorboardService {
    async fn create_tensorboard_experiment(
        &self,
        request: CreateTensorboardExperimentRequest,
    ) -> Result<TensorboardExperiment, Status> {
        let mut state = self.state.lock();
        let name = format!(
            "{}/experiments/{}",
            request.parent, request.tensorboard_experiment_id
        );
        if state.experiments.contains_key(&name) {
            return Err(Status::already_exists(format!(
                "experiment {name} already exists"
            )));
        }
        let mut experiment = request.tensorboard_experiment.unwrap_or_default();
        experiment.name = name.clone();
        state.experiments.insert(name, experiment.clone());
        Ok(experiment)
    }

    async fn list_tensorboard_experiments(
        &self,
        request: ListTensorboardExperimentsRequest,
    ) -> Result<ListTensorboardExperimentsResponse, Status> {
        let state = self.state.lock();
        let prefix = format!("{}/experiments/", request.parent);
        Ok(ListTensorboardExperimentsResponse {
            tensorboard_experiments: state
                .experiments
                .iter()
                .filter(|(name, _)| name.starts_with(&prefix))
                .map(|(_, experiment)| experiment.clone())
                .collect(),
        })
    }

    async fn create_tensorboard_run(
        &self,
        request: CreateTensorboardRunRequest,
    ) -> Result<TensorboardRun, Status> {
        let mut state = self.state.lock();
        state.create_run_calls += 1;

        if !state.experiments.contains_key(&request.parent) {
            return Err(Status::not_found(format!(
                "experiment {} not found",
                request.parent
            )));
        }

        let mut run = request.tensorboard_run.unwrap_or_default();
        let runs = state.runs.entry(request.parent.clone()).or_default();
        if runs.iter().any(|r| r.display_name == run.display_name) {
            return Err(Status::already_exists(format!(
                "run with display name {:?} already exists",
                run.display_name
            )));
        }
        run.name = format!("{}/runs/{}", request.parent, request.tensorboard_run_id);
        runs.push(run.clone());
        Ok(run)
    }

    async fn list_tensorboard_runs(
        &self,
        request: ListTensorboardRunsRequest,
    ) -> Result<ListTensorboardRunsResponse, Status> {
        let state = self.state.lock();
        Ok(ListTensorboardRunsResponse {
            tensorboard_runs: state.runs.get(&request.parent).cloned().unwrap_or_default(),
        })
    }

    async fn create_tensorboard_time_series(
        &self,
        request: CreateTensorboardTimeSeriesRequest,
    ) -> Result<TensorboardTimeSeries, Status> {
        let mut state = self.state.lock();
        state.create_time_series_calls += 1;

        let mut time_series = request.tensorboard_time_series.unwrap_or_default();
        let entries = state.time_series.entry(request.parent.clone()).or_default();
        if entries
            .iter()
            .any(|ts| ts.display_name == time_series.display_name)
        {
            // The platform reports duplicates as INVALID_ARGUMENT with an
            // "already exist" message rather than ALREADY_EXISTS
            return Err(Status::invalid_argument(format!(
                "time series with display name {:?} already exist",
                time_series.display_name
            )));
        }
        time_series.name = format!("{}/timeSeries/{}", request.parent, Uuid::new_v4());
        entries.push(time_series.clone());
        Ok(time_series)
    }

    async fn list_tensorboard_time_series(
        &self,
        request: ListTensorboardTimeSeriesRequest,
    ) -> Result<ListTensorboardTimeSeriesResponse, Status> {
        let state = self.state.lock();
        Ok(ListTensorboardTimeSeriesResponse {
            tensorboard_time_series: state
                .time_series
                .get(&request.parent)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn write_tensorboard_experiment_data(
        &self,
        request: WriteTensorboardExperimentDataRequest,
    ) -> Result<WriteTensorboardExperimentDataResponse, Status> {
        let mut state = self.state.lock();
        if let Some(status) = Self::take_write_failure(&mut state) {
            return Err(status);
        }
        if state.deleted.contains(&request.tensorboard_experiment)
            || !state
                .experiments
                .contains_key(&request.tensorboard_experiment)
        {
            return Err(Status::not_found(format!(
                "experiment {} not found",
                request.tensorboard_experiment
            )));
        }
        state.experiment_writes.push(request);
        Ok(WriteTensorboardExperimentDataResponse {})
    }

    async fn write_tensorboard_run_data(
        &self,
        request: WriteTensorboardRunDataRequest,
    ) -> Result<WriteTensorboardRunDataResponse, Status> {
        let mut state = self.state.lock();
        if let Some(status) = Self::take_write_failure(&mut state) {
            return Err(status);
        }
        let experiment = Self::experiment_of_run(&request.tensorboard_run).to_string();
        if state.deleted.contains(&experiment) || !state.experiments.contains_key(&experiment) {
            return Err(Status::not_found(format!("experiment {experiment} not found")));
        }
        state.run_writes.push(request);
        Ok(WriteTensorboardRunDataResponse {})
    }
}
