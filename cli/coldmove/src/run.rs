//! Main execution logic for the coldmove CLI.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cm_engine::{EngineConfig, Migrator, RunSummary};
use cm_error::MoveError;
use cm_store::{S3Store, S3StoreConfig};
use cm_types::{Deadline, MigrationConfig};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::args::{Cli, LogLevel};

/// The HTTP-style response for a run: status code plus plain-text body.
#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// Initialize logging.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let level: Level = level.into();

    let subscriber = fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr); // Log to stderr so stdout is clean for the response

    subscriber.init();

    Ok(())
}

/// Execute a migration run from the parsed arguments.
///
/// Returns the response to emit and the run summary when one was produced.
/// Only backend-connection problems surface as `Err`; request problems map
/// to a 400 response.
pub async fn execute(args: Cli) -> Result<(Response, Option<RunSummary>)> {
    let payload = read_request_payload(&args)?;

    let config: MigrationConfig = match serde_json::from_str(&payload) {
        Ok(config) => config,
        Err(e) => {
            return Ok((
                Response {
                    status: 400,
                    body: format!("Error: Could not parse migration request. {}", e),
                },
                None,
            ));
        }
    };

    let store = build_store(&args).await?;
    let engine = EngineConfig::new()
        .with_max_workers(args.max_workers)
        .with_target_storage_class(&args.storage_class);
    let migrator = Migrator::new(store, engine);

    let deadline = Deadline::new(
        Duration::from_secs(args.timeout_secs),
        Duration::from_secs(args.shutdown_buffer_secs),
    );

    match migrator.run(&config, &deadline).await {
        Ok(summary) => Ok((
            Response {
                status: 200,
                body: "OK".to_string(),
            },
            Some(summary),
        )),
        Err(e @ MoveError::Config(_)) => Ok((
            Response {
                status: 400,
                body: format!("Error: {}", e),
            },
            None,
        )),
        Err(e @ MoveError::Listing(_)) => Ok((
            Response {
                status: 500,
                body: format!("Error: {}", e),
            },
            None,
        )),
    }
}

/// Read the request JSON from the configured file or stdin.
fn read_request_payload(args: &Cli) -> Result<String> {
    match &args.request {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {}", path.display())),
        None => {
            let mut payload = String::new();
            std::io::stdin()
                .read_to_string(&mut payload)
                .context("failed to read request from stdin")?;
            Ok(payload)
        }
    }
}

/// Build the S3 store from CLI arguments.
async fn build_store(args: &Cli) -> Result<Arc<S3Store>> {
    let mut config = S3StoreConfig::new().with_region(&args.region);

    if let Some(endpoint) = &args.s3_endpoint {
        config = config.with_endpoint(endpoint);
    }

    if let (Some(access_key), Some(secret_key)) = (&args.access_key, &args.secret_key) {
        config = config.with_credentials(access_key, secret_key, None);
    }

    if let Some(profile) = &args.profile {
        config = config.with_profile(profile);
    }

    let store = S3Store::connect(&config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to object store: {}", e))?;

    Ok(Arc::new(store))
}
