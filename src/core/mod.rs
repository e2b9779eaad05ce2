pub mod engine;
pub mod extractor;
pub mod fetcher;
pub mod invoker;
pub mod pipeline;

pub use crate::domain::model::{
    FetchResult, FetchedImage, ImageReference, ItemStatus, Manifest, ManifestItem, RunReport,
    TransformOutcome,
};
pub use crate::domain::ports::{ConfigProvider, ImageFetcher, Pipeline, Storage, Transformer};
pub use crate::utils::error::Result;
