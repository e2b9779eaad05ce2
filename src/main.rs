use clap::Parser;
use issue_image_worker::config::LogFormat;
use issue_image_worker::utils::error::{ErrorSeverity, WorkerError};
use issue_image_worker::utils::{logger, validation::Validate};
use issue_image_worker::{run_batch, BatchSource, CliConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting issue-image-worker for issue {}", cli.issue_number);
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_file_config() {
        Ok(file) => cli.resolve(file),
        Err(e) => exit_with(&e),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    let source = match BatchSource::resolve(cli.urls_json.as_deref(), &cli.issue_body_file).await {
        Ok(source) => source,
        Err(e) => exit_with(&e),
    };

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be downloaded");
        print!("{}", source.dry_run_listing());
        return Ok(());
    }

    // 單筆失敗只會記錄在 manifest，寫出 manifest 即視為成功
    match run_batch(&config, source, config.monitor).await {
        Ok(report) => {
            println!(
                "✅ Processed {}/{} images",
                report.processed_images, report.total_images
            );
            println!("📁 Manifest saved to: {}", report.manifest_path.display());
            Ok(())
        }
        Err(e) => exit_with(&e),
    }
}

fn exit_with(e: &WorkerError) -> ! {
    tracing::error!(
        "❌ Batch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
