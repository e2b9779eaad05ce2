use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Empty response: {url}")]
    EmptyResponse { url: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to start transform program '{program}': {source}")]
    TransformSpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transform program '{program}' timed out after {seconds}s")]
    TransformTimeout { program: String, seconds: u64 },

    #[error("Reference extraction error: {message}")]
    ExtractionError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, WorkerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    FileSystem,
    Transform,
    Extraction,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl WorkerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkerError::HttpError(_)
            | WorkerError::HttpStatus { .. }
            | WorkerError::EmptyResponse { .. } => ErrorCategory::Network,
            WorkerError::IoError(_) | WorkerError::SerializationError(_) => {
                ErrorCategory::FileSystem
            }
            WorkerError::TransformSpawnError { .. } | WorkerError::TransformTimeout { .. } => {
                ErrorCategory::Transform
            }
            WorkerError::ExtractionError { .. } => ErrorCategory::Extraction,
            WorkerError::ConfigError { .. }
            | WorkerError::ConfigValidationError { .. }
            | WorkerError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路錯誤通常重試即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Transform | ErrorCategory::Extraction => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::FileSystem => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            WorkerError::HttpError(_) | WorkerError::HttpStatus { .. } => {
                "Check that the image URL is reachable and publicly accessible"
            }
            WorkerError::EmptyResponse { .. } => {
                "The server returned no data; verify the image URL points at a file"
            }
            WorkerError::IoError(_) => "Check that the output directory is writable",
            WorkerError::SerializationError(_) => "Check the manifest contents for invalid data",
            WorkerError::TransformSpawnError { .. } => {
                "Make sure the transform program exists and is executable"
            }
            WorkerError::TransformTimeout { .. } => {
                "Increase --transform-timeout-secs or check the transform program for hangs"
            }
            WorkerError::ExtractionError { .. } => {
                "--urls-json must be a JSON array of URL strings"
            }
            WorkerError::ConfigError { .. } => "Check the --config path points at a readable TOML file",
            WorkerError::ConfigValidationError { .. }
            | WorkerError::InvalidConfigValueError { .. } => {
                "Review the command line flags and the TOML configuration file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not download image: {}", self),
            ErrorCategory::FileSystem => format!("File system problem: {}", self),
            ErrorCategory::Transform => format!("Image transform failed: {}", self),
            ErrorCategory::Extraction => format!("Could not determine image URLs: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}
