use crate::core::extractor::BatchSource;
use crate::core::fetcher::save_fetched;
use crate::core::{
    ImageFetcher, ImageReference, ItemStatus, Manifest, ManifestItem, Pipeline, Storage,
    Transformer,
};
use crate::utils::error::Result;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;

pub const INPUTS_DIR: &str = "inputs";
pub const RESULTS_DIR: &str = "results";
pub const MANIFEST_FILE: &str = "manifest.json";

pub fn output_file_name(index: usize) -> String {
    format!("{}/output_{}.png", RESULTS_DIR, index)
}

/// issue 圖片批次處理：擷取網址 → 下載 → 外部轉換 → manifest
///
/// 單筆失敗只會反映在該筆的 `status`/`log`，不會中斷整個批次。
pub struct BatchPipeline<S: Storage, F: ImageFetcher, T: Transformer> {
    storage: S,
    fetcher: F,
    transformer: T,
    source: BatchSource,
    issue_number: String,
    concurrency: usize,
}

impl<S: Storage, F: ImageFetcher, T: Transformer> BatchPipeline<S, F, T> {
    pub fn new(
        storage: S,
        fetcher: F,
        transformer: T,
        source: BatchSource,
        issue_number: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            transformer,
            source,
            issue_number: issue_number.into(),
            concurrency: 1,
        }
    }

    /// 同時處理的項目數，最少 1
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn process_item(&self, reference: ImageReference) -> ManifestItem {
        let item = ManifestItem::skipped(&reference);
        tracing::info!("🖼️  [{}] {}", reference.index, reference.url);

        match self.run_item(&reference).await {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!("❌ [{}] failed: {}", reference.index, e);
                ManifestItem {
                    status: ItemStatus::Failed,
                    log: Some(e.to_string()),
                    ..item
                }
            }
        }
    }

    async fn run_item(&self, reference: &ImageReference) -> Result<ManifestItem> {
        let image = self.fetcher.fetch(&reference.url).await?;
        let fetched = save_fetched(&self.storage, reference.index, &reference.url, image).await?;
        tracing::debug!(
            "[{}] downloaded {} bytes to {}",
            reference.index,
            fetched.bytes.len(),
            fetched.local_path.display()
        );

        let output_path = self.storage.resolve(&output_file_name(reference.index));
        let outcome = self
            .transformer
            .transform(&fetched.local_path, &output_path)
            .await?;

        let status = if outcome.succeeded {
            tracing::info!("✅ [{}] {}", reference.index, outcome.output_path.display());
            ItemStatus::Ok
        } else {
            tracing::warn!("❌ [{}] transform failed", reference.index);
            ItemStatus::Failed
        };

        Ok(ManifestItem {
            index: reference.index,
            url: reference.url.clone(),
            status,
            input: Some(fetched.local_path.display().to_string()),
            output: Some(outcome.output_path.display().to_string()),
            log: Some(outcome.log),
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, F: ImageFetcher, T: Transformer> Pipeline for BatchPipeline<S, F, T> {
    async fn extract(&self) -> Result<Vec<ImageReference>> {
        if let BatchSource::Urls(urls) = &self.source {
            tracing::info!("📋 Using {} supplied URLs", urls.len());
        }
        let references = self.source.references();
        tracing::info!("🔎 Found {} image reference(s)", references.len());
        Ok(references)
    }

    async fn prepare(&self) -> Result<()> {
        self.storage.create_dir(INPUTS_DIR).await?;
        self.storage.create_dir(RESULTS_DIR).await?;
        Ok(())
    }

    async fn process(&self, references: Vec<ImageReference>) -> Manifest {
        // buffered 保持輸入順序，與完成順序無關
        let items: Vec<ManifestItem> = stream::iter(references)
            .map(|reference| self.process_item(reference))
            .buffered(self.concurrency)
            .collect()
            .await;

        Manifest::from_items(self.issue_number.clone(), items)
    }

    async fn load(&self, manifest: &Manifest) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(manifest)?;
        self.storage.write_file(MANIFEST_FILE, json.as_bytes()).await?;
        Ok(self.storage.resolve(MANIFEST_FILE))
    }
}
