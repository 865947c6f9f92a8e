//! Top-level upload orchestration
//!
//! One-way state machine: `Fresh -> ExperimentCreated -> Running ->
//! Ended`. The poll loop is a single cooperative task; a cancellation
//! token is checked between polls, so an in-flight cycle always finishes
//! before the loop exits.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use event_log::LogdirLoader;
use metadata::{create_or_adopt_experiment, OnePlatformResourceManager, TensorboardService};
use storage::ObjectStore;
use uploader_core::{Error, Plugin, RateLimiter, Result, UploaderConfig};

use crate::dispatch::Dispatcher;
use crate::senders::{FileSender, ProfileSender};
use crate::tracker::UploadTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    ExperimentCreated,
    Running,
    Ended,
}

pub struct TensorboardUploader {
    config: UploaderConfig,
    client: Arc<dyn TensorboardService>,
    store: Arc<dyn ObjectStore>,
    state: State,
    experiment_name: Option<String>,
}

impl TensorboardUploader {
    pub fn new(
        config: UploaderConfig,
        client: Arc<dyn TensorboardService>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            client,
            store,
            state: State::Fresh,
            experiment_name: None,
        }
    }

    /// Resource name of the experiment once created
    pub fn experiment_name(&self) -> Option<&str> {
        self.experiment_name.as_deref()
    }

    /// Create the session's experiment, or adopt an existing one with
    /// the same display name
    pub async fn create_experiment(&mut self) -> Result<String> {
        if self.state != State::Fresh {
            return Err(Error::Internal {
                message: format!("create_experiment is not legal in the {:?} state", self.state),
            });
        }
        let experiment = create_or_adopt_experiment(
            self.client.as_ref(),
            &self.config.tensorboard_resource_name,
            &self.config.experiment_display_name,
            self.config.description.as_deref().unwrap_or(""),
        )
        .await?;
        self.experiment_name = Some(experiment.name.clone());
        self.state = State::ExperimentCreated;
        Ok(experiment.name)
    }

    /// Run the poll loop until cancelled, fatally errored, or (in
    /// one-shot mode) one full pass has completed
    pub async fn start_uploading(&mut self, cancel: CancellationToken) -> Result<()> {
        if self.state != State::ExperimentCreated {
            return Err(Error::Internal {
                message: format!("start_uploading is not legal in the {:?} state", self.state),
            });
        }
        let Some(experiment_name) = self.experiment_name.clone() else {
            return Err(Error::Internal {
                message: "experiment name missing after creation".to_string(),
            });
        };

        let mut pipeline = Pipeline {
            loader: LogdirLoader::new(&self.config.logdir),
            resources: OnePlatformResourceManager::new(self.client.clone(), experiment_name.clone()),
            dispatcher: Dispatcher::new(
                self.client.clone(),
                self.store.clone(),
                &experiment_name,
                &self.config,
            )?,
            files: FileSender::new(
                self.client.clone(),
                self.store.clone(),
                experiment_name.clone(),
                self.config.logdir.clone(),
                &self.config.storage,
                &self.config.limits,
                &self.config.intervals,
            )?,
            profiles: ProfileSender::new(),
            run_name_prefix: self.config.run_name_prefix.clone(),
        };
        let mut tracker = UploadTracker::new();
        let mut poll_limiter = RateLimiter::new(self.config.intervals.logdir_poll_interval);
        let profile_enabled = self.config.allowed_plugins.contains(&Plugin::Profile);

        // One-shot runs pre-create every discovered run so concurrent
        // readers see the complete run set from the start.
        if self.config.one_shot {
            for run_name in pipeline.loader.discover_runs().await? {
                let display_name = pipeline.display_name(&run_name);
                pipeline.resources.get_run_resource_name(&display_name).await?;
            }
        }

        self.state = State::Running;
        info!(experiment = %experiment_name, logdir = %self.config.logdir.display(), "Uploading");

        let mut outcome = Ok(());
        loop {
            if cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = poll_limiter.tick() => {}
            }

            tracker.begin_poll();
            if let Err(e) = pipeline.upload_once(&mut tracker, profile_enabled).await {
                if e.is_fatal() {
                    outcome = Err(e);
                    break;
                }
                warn!(error = %e, "Upload cycle failed; retrying next poll");
            }
            tracker.end_poll();

            if self.config.one_shot {
                break;
            }
        }

        if self.config.one_shot && outcome.is_ok() {
            Self::end_experiment_runs(&pipeline.resources);
        }
        self.state = State::Ended;
        tracker.log_summary();
        outcome
    }

    /// One-shot epilogue: the RPC surface has no run-completion call, so
    /// finishing a run is reported locally.
    fn end_experiment_runs(resources: &OnePlatformResourceManager) {
        for (display_name, resource_name) in resources.known_runs() {
            info!(run = display_name, resource = resource_name, "Run upload complete");
        }
    }
}

struct Pipeline {
    loader: LogdirLoader,
    resources: OnePlatformResourceManager,
    dispatcher: Dispatcher,
    files: FileSender,
    profiles: ProfileSender,
    run_name_prefix: Option<String>,
}

impl Pipeline {
    fn display_name(&self, run_name: &str) -> String {
        match &self.run_name_prefix {
            Some(prefix) => format!("{prefix}{run_name}"),
            None => run_name.to_string(),
        }
    }

    /// One poll cycle: drain the logdir, dispatch records, then scan
    /// profile directories. Only fatal errors propagate.
    async fn upload_once(
        &mut self,
        tracker: &mut UploadTracker,
        profile_enabled: bool,
    ) -> Result<()> {
        let runs = match self.loader.get_run_events().await {
            Ok(runs) => runs,
            Err(e) => {
                warn!(error = %e, "Logdir listing failed; skipping this poll");
                return Ok(());
            }
        };
        self.dispatcher
            .dispatch(
                &mut self.resources,
                tracker,
                &runs,
                self.run_name_prefix.as_deref(),
            )
            .await?;

        if profile_enabled {
            for run_name in runs.keys() {
                let Some(run_dir) = self.loader.run_directory(run_name) else {
                    continue;
                };
                let run_dir = run_dir.to_path_buf();
                let display_name = self.display_name(run_name);
                if let Err(e) = self
                    .profiles
                    .poll_run(
                        &mut self.resources,
                        &mut self.files,
                        &display_name,
                        &run_dir,
                        tracker,
                    )
                    .await
                {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    warn!(run = %display_name, error = %e, "Profile scan failed; retrying next poll");
                }
            }
        }
        Ok(())
    }
}
