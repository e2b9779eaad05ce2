pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, WorkerConfig};
pub use self::core::{
    engine::{run_batch, BatchEngine},
    extractor::{extract_image_urls, BatchSource},
    fetcher::{infer_extension, HttpFetcher},
    invoker::ProcessTransformer,
    pipeline::BatchPipeline,
};
pub use domain::model::{ItemStatus, Manifest, ManifestItem, RunReport};
pub use utils::error::{Result, WorkerError};
