use crate::domain::model::{FetchedImage, ImageReference, Manifest, TransformOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 以輸出根目錄為基準的檔案存取
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn create_dir(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn resolve(&self, path: &str) -> PathBuf;
}

pub trait ConfigProvider: Send + Sync {
    fn issue_number(&self) -> &str;
    fn output_dir(&self) -> &str;
    fn fetch_timeout(&self) -> Duration;
    fn user_agent(&self) -> &str;
    fn transform_program(&self) -> &str;
    fn transform_args(&self) -> &[String];
    fn transform_timeout(&self) -> Option<Duration>;
    fn concurrency(&self) -> usize;
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, input: &Path, output: &Path) -> Result<TransformOutcome>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<ImageReference>>;
    async fn prepare(&self) -> Result<()>;
    async fn process(&self, references: Vec<ImageReference>) -> Manifest;
    async fn load(&self, manifest: &Manifest) -> Result<PathBuf>;
}
