use crate::config::cli::LocalStorage;
use crate::core::extractor::BatchSource;
use crate::core::fetcher::HttpFetcher;
use crate::core::invoker::ProcessTransformer;
use crate::core::pipeline::BatchPipeline;
use crate::core::{ConfigProvider, Pipeline, RunReport};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct BatchEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> BatchEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        let monitor = SystemMonitor::new(monitor_enabled);
        if monitor.is_enabled() {
            tracing::info!("🔍 System monitoring enabled");
        }
        Self { pipeline, monitor }
    }

    /// 只有建立目錄與寫入 manifest 失敗會回傳錯誤
    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("Starting batch...");

        let references = self.pipeline.extract().await?;
        self.monitor.log_phase("Extract", references.len());

        self.pipeline.prepare().await?;

        let manifest = self.pipeline.process(references).await;
        tracing::info!(
            "Processed {}/{} images",
            manifest.processed_images,
            manifest.total_images
        );
        self.monitor.log_phase("Process", manifest.total_images);

        let manifest_path = self.pipeline.load(&manifest).await?;
        tracing::info!("Manifest written to: {}", manifest_path.display());
        self.monitor.log_summary(manifest.processed_images, manifest.total_images);

        Ok(RunReport {
            manifest_path,
            total_images: manifest.total_images,
            processed_images: manifest.processed_images,
        })
    }
}

/// 以本機檔案系統、HTTP 下載與外部程式組出完整批次並執行
pub async fn run_batch<C: ConfigProvider>(
    config: &C,
    source: BatchSource,
    monitor_enabled: bool,
) -> Result<RunReport> {
    let storage = LocalStorage::new(config.output_dir());
    let fetcher = HttpFetcher::new(config.user_agent(), config.fetch_timeout())?;
    let transformer = ProcessTransformer::new(
        config.transform_program(),
        config.transform_args().to_vec(),
        config.transform_timeout(),
    );

    let pipeline = BatchPipeline::new(storage, fetcher, transformer, source, config.issue_number())
        .with_concurrency(config.concurrency());

    BatchEngine::new_with_monitoring(pipeline, monitor_enabled)
        .run()
        .await
}
