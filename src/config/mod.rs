pub mod cli;
pub mod toml_config;

use crate::core::fetcher::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::core::invoker::{DEFAULT_TRANSFORM_ARGS, DEFAULT_TRANSFORM_PROGRAM};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_header_value, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, Validate,
};
use std::time::Duration;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "issue-image-worker")]
#[command(about = "Download the images referenced in an issue and run them through a transform program")]
pub struct CliConfig {
    /// File containing the issue body text
    #[arg(long)]
    pub issue_body_file: PathBuf,

    /// Issue identifier, copied into the manifest
    #[arg(long)]
    pub issue_number: String,

    /// Root directory for inputs/, results/ and manifest.json
    #[arg(long)]
    pub output_dir: String,

    /// JSON array of image URLs; skips extraction from the issue body
    #[arg(long)]
    pub urls_json: Option<String>,

    /// Optional TOML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Transform program [default: python3]
    #[arg(long)]
    pub transform_program: Option<String>,

    /// Leading argument for the transform program, repeatable [default: main.py]
    #[arg(long = "transform-arg", allow_hyphen_values = true)]
    pub transform_args: Vec<String>,

    /// Kill the transform program after this many seconds
    #[arg(long)]
    pub transform_timeout_secs: Option<u64>,

    /// HTTP timeout per image [default: 60]
    #[arg(long)]
    pub fetch_timeout_secs: Option<u64>,

    /// User-Agent sent with every download [default: issue-image-worker]
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Number of images processed at the same time [default: 1]
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Print the discovered image URLs and exit
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(long, help = "Enable system monitoring (CPU, memory usage)")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 命令列參數 > TOML > 預設值
    pub fn resolve(&self, file: TomlConfig) -> WorkerConfig {
        let transform_args = if !self.transform_args.is_empty() {
            self.transform_args.clone()
        } else {
            file.transform.args.unwrap_or_else(|| {
                DEFAULT_TRANSFORM_ARGS.iter().map(|a| a.to_string()).collect()
            })
        };

        WorkerConfig {
            issue_number: self.issue_number.clone(),
            output_dir: self.output_dir.clone(),
            fetch_timeout_secs: self
                .fetch_timeout_secs
                .or(file.fetch.timeout_seconds)
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            user_agent: self
                .user_agent
                .clone()
                .or(file.fetch.user_agent)
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            transform_program: self
                .transform_program
                .clone()
                .or(file.transform.program)
                .unwrap_or_else(|| DEFAULT_TRANSFORM_PROGRAM.to_string()),
            transform_args,
            transform_timeout_secs: self
                .transform_timeout_secs
                .or(file.transform.timeout_seconds),
            concurrency: self.concurrency.or(file.batch.concurrency).unwrap_or(1),
            monitor: self.monitor || file.monitoring.enabled,
        }
    }

    pub fn load_file_config(&self) -> Result<TomlConfig> {
        match &self.config {
            Some(path) => TomlConfig::from_file(path),
            None => Ok(TomlConfig::default()),
        }
    }
}

/// 合併後的執行設定
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub issue_number: String,
    pub output_dir: String,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub transform_program: String,
    pub transform_args: Vec<String>,
    pub transform_timeout_secs: Option<u64>,
    pub concurrency: usize,
    pub monitor: bool,
}

impl WorkerConfig {
    pub fn new(issue_number: impl Into<String>, output_dir: impl Into<String>) -> Self {
        Self {
            issue_number: issue_number.into(),
            output_dir: output_dir.into(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            transform_program: DEFAULT_TRANSFORM_PROGRAM.to_string(),
            transform_args: DEFAULT_TRANSFORM_ARGS.iter().map(|a| a.to_string()).collect(),
            transform_timeout_secs: None,
            concurrency: 1,
            monitor: false,
        }
    }
}

impl ConfigProvider for WorkerConfig {
    fn issue_number(&self) -> &str {
        &self.issue_number
    }

    fn output_dir(&self) -> &str {
        &self.output_dir
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn transform_program(&self) -> &str {
        &self.transform_program
    }

    fn transform_args(&self) -> &[String] {
        &self.transform_args
    }

    fn transform_timeout(&self) -> Option<Duration> {
        self.transform_timeout_secs.map(Duration::from_secs)
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }
}

impl Validate for WorkerConfig {
    fn validate(&self) -> Result<()> {
        validate_path("output_dir", &self.output_dir)?;
        validate_range("fetch.timeout_seconds", self.fetch_timeout_secs, 1, 3600)?;
        validate_non_empty_string("fetch.user_agent", &self.user_agent)?;
        validate_header_value("fetch.user_agent", &self.user_agent)?;
        validate_non_empty_string("transform.program", &self.transform_program)?;
        if let Some(timeout) = self.transform_timeout_secs {
            validate_range("transform.timeout_seconds", timeout, 1, u64::MAX)?;
        }
        validate_positive_number("batch.concurrency", self.concurrency, 1)?;
        Ok(())
    }
}
