//! CLI argument definitions for coldmove.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Deadline-bounded object migration between buckets.
///
/// Reads a migration request (JSON) and moves the eligible objects from the
/// source bucket to the destination bucket, verifying every copy before any
/// source deletion.
///
/// ## Examples
///
/// Run a request from a file:
///   coldmove --request migrate.json
///
/// Pipe a request on stdin against LocalStack:
///   echo '{"source_bucket":"a","destination_bucket":"b"}' | \
///       coldmove --s3-endpoint http://localhost:4566
#[derive(Parser, Debug)]
#[command(name = "coldmove")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the migration request JSON (reads stdin when omitted)
    #[arg(short, long)]
    pub request: Option<PathBuf>,

    // === Store Configuration ===
    /// Custom S3 endpoint URL (for LocalStack or S3-compatible stores)
    #[arg(long, env = "COLDMOVE_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY")]
    pub secret_key: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    // === Engine Options ===
    /// Storage class objects must be in to qualify
    #[arg(long, default_value = "COLDLINE")]
    pub storage_class: String,

    /// Maximum concurrent transfers (must be >= 1)
    #[arg(long, default_value = "90", value_parser = parse_positive_usize)]
    pub max_workers: usize,

    /// Hard wall-clock budget for the run, in seconds
    #[arg(long, default_value = "3600")]
    pub timeout_secs: u64,

    /// Seconds reserved before the timeout to stop taking on new work
    #[arg(long, default_value = "30")]
    pub shutdown_buffer_secs: u64,

    // === Logging Options ===
    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

/// Log level argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}
