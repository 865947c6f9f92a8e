//! Logdir uploader CLI

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use metadata::{GrpcTensorboardService, InMemoryTensorboardService, TensorboardService};
use storage::{LocalObjectStore, ObjectStore};
use uploader::TensorboardUploader;
use uploader_core::{
    BlobStorageConfig, Error, LimitConfig, Plugin, RateLimitConfig, Result, UploaderConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "tb-uploader",
    version,
    about = "Continuously uploads a training log directory to a tensorboard service"
)]
struct Args {
    /// Log directory to upload
    #[arg(long)]
    logdir: PathBuf,

    /// Tensorboard resource name (projects/P/locations/L/tensorboards/T)
    #[arg(long)]
    tensorboard_resource_name: String,

    /// Display name for the created or adopted experiment
    #[arg(long)]
    experiment_display_name: String,

    /// Experiment description
    #[arg(long)]
    description: Option<String>,

    /// Prefix prepended to every run display name
    #[arg(long)]
    run_name_prefix: Option<String>,

    /// Perform a single full pass over the logdir and exit
    #[arg(long)]
    one_shot: bool,

    /// Comma-separated plugin allow-list (default: all supported)
    #[arg(long, value_delimiter = ',')]
    allowed_plugins: Vec<Plugin>,

    /// Metadata-service endpoint
    #[arg(long, default_value = "https://aiplatform.googleapis.com")]
    endpoint: String,

    /// Bearer token for RPC authentication
    /// (falls back to $TB_UPLOADER_TOKEN)
    #[arg(long)]
    access_token: Option<String>,

    /// Destination bucket for blob payloads
    #[arg(long, default_value = "tensorboard-blobs")]
    blob_bucket: String,

    /// Folder prefix within the destination bucket
    #[arg(long)]
    blob_folder: Option<String>,

    /// Bucket holding the logdir itself; enables server-side copies for
    /// profile files
    #[arg(long)]
    source_bucket: Option<String>,

    /// Base directory of the local object store
    #[arg(long, default_value = ".tb-uploader-blobs")]
    blob_root: PathBuf,

    /// Use the S3 object-store backend
    #[cfg(feature = "s3")]
    #[arg(long)]
    s3: bool,

    /// Validate a logdir against an in-memory service; nothing leaves
    /// the machine
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbosity: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbosity);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Upload failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: Args) -> Result<()> {
    let config = UploaderConfig {
        logdir: args.logdir.clone(),
        tensorboard_resource_name: args.tensorboard_resource_name.clone(),
        experiment_display_name: args.experiment_display_name.clone(),
        description: args.description.clone(),
        run_name_prefix: args.run_name_prefix.clone(),
        one_shot: args.one_shot,
        allowed_plugins: if args.allowed_plugins.is_empty() {
            Plugin::ALL.to_vec()
        } else {
            args.allowed_plugins.clone()
        },
        limits: LimitConfig::default(),
        intervals: RateLimitConfig::default(),
        storage: BlobStorageConfig {
            bucket: args.blob_bucket.clone(),
            folder: args.blob_folder.clone(),
            source_bucket: args.source_bucket.clone(),
        },
    };

    let client: Arc<dyn TensorboardService> = if args.dry_run {
        info!("Dry run: using an in-memory service and the local object store");
        Arc::new(InMemoryTensorboardService::new())
    } else {
        let token = args
            .access_token
            .clone()
            .or_else(|| std::env::var("TB_UPLOADER_TOKEN").ok());
        let service = GrpcTensorboardService::connect(args.endpoint.clone(), token)
            .await
            .map_err(|e| Error::Rpc {
                operation: "connect".to_string(),
                message: e.to_string(),
            })?;
        Arc::new(service)
    };
    let store = build_store(&args).await;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received; finishing the current cycle");
            on_interrupt.cancel();
        }
    });

    let mut uploader = TensorboardUploader::new(config, client, store);
    let experiment = uploader.create_experiment().await?;
    info!(experiment = %experiment, "Experiment ready");
    uploader.start_uploading(cancel).await
}

async fn build_store(args: &Args) -> Arc<dyn ObjectStore> {
    #[cfg(feature = "s3")]
    if args.s3 && !args.dry_run {
        return Arc::new(storage::S3ObjectStore::new().await);
    }
    Arc::new(LocalObjectStore::new(&args.blob_root))
}
