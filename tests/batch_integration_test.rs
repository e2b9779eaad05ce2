#![cfg(unix)]

use anyhow::Result;
use httpmock::prelude::*;
use issue_image_worker::{run_batch, BatchSource, ItemStatus, Manifest, WorkerConfig};
use std::path::Path;
use tempfile::TempDir;

/// 以 `sh -c` 模擬外部轉換程式，$1 為輸入、$2 為輸出
fn config_with_script(output_dir: &Path, script: &str) -> WorkerConfig {
    let mut config = WorkerConfig::new("42", output_dir.to_str().unwrap());
    config.transform_program = "sh".to_string();
    config.transform_args = vec!["-c".to_string(), script.to_string(), "transform".to_string()];
    config.fetch_timeout_secs = 5;
    config
}

fn read_manifest(output_dir: &Path) -> Result<Manifest> {
    let raw = std::fs::read_to_string(output_dir.join("manifest.json"))?;
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::test]
async fn test_end_to_end_batch_from_issue_body() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;

    let png_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/images/cat.png");
            then.status(200)
                .header("Content-Type", "image/png")
                .body(b"\x89PNG cat");
        })
        .await;
    let missing_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/images/missing.jpg");
            then.status(404);
        })
        .await;
    let jpeg_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/attachments/dog");
            then.status(200)
                .header("Content-Type", "image/jpeg")
                .body(b"\xFF\xD8 dog");
        })
        .await;

    let issue_body = format!(
        "Please process these:\n\
         ![cat]({cat})\n\
         <img alt=\"dog\" src=\"{dog}\">\n\
         ![missing]({missing})\n\
         and again <img src='{cat}'>\n",
        cat = server.url("/images/cat.png"),
        dog = server.url("/attachments/dog"),
        missing = server.url("/images/missing.jpg"),
    );

    let config = config_with_script(temp_dir.path(), r#"cp "$1" "$2" && echo "converted $1""#);
    let report = run_batch(&config, BatchSource::IssueBody(issue_body), false).await?;

    assert_eq!(report.total_images, 3);
    assert_eq!(report.processed_images, 2);
    assert_eq!(report.manifest_path, temp_dir.path().join("manifest.json"));

    png_mock.assert_async().await;
    missing_mock.assert_async().await;
    jpeg_mock.assert_async().await;

    let manifest = read_manifest(temp_dir.path())?;
    assert_eq!(manifest.issue_number, "42");
    assert_eq!(manifest.total_images, 3);
    assert_eq!(manifest.processed_images, 2);

    // Markdown 的網址排在 HTML 之前
    let urls: Vec<&str> = manifest.items.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            server.url("/images/cat.png"),
            server.url("/images/missing.jpg"),
            server.url("/attachments/dog"),
        ]
    );

    let cat = &manifest.items[0];
    assert_eq!(cat.index, 1);
    assert_eq!(cat.status, ItemStatus::Ok);
    let cat_input = temp_dir.path().join("inputs/input_1.png");
    let cat_output = temp_dir.path().join("results/output_1.png");
    assert_eq!(cat.input.as_deref(), cat_input.to_str());
    assert_eq!(cat.output.as_deref(), cat_output.to_str());
    assert!(cat.log.as_deref().unwrap().starts_with("converted"));
    assert_eq!(std::fs::read(&cat_output)?, b"\x89PNG cat");

    let missing = &manifest.items[1];
    assert_eq!(missing.status, ItemStatus::Failed);
    assert!(missing.input.is_none());
    assert!(missing.log.as_deref().unwrap().contains("404"));
    assert!(!temp_dir.path().join("inputs/input_2.jpg").exists());

    let dog = &manifest.items[2];
    assert_eq!(dog.status, ItemStatus::Ok);
    assert!(temp_dir.path().join("inputs/input_3.jpg").exists());
    assert!(temp_dir.path().join("results/output_3.png").exists());

    Ok(())
}

#[tokio::test]
async fn test_transform_without_output_file_fails_item() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/a.png");
            then.status(200).body(b"a");
        })
        .await;

    let config = config_with_script(temp_dir.path(), "echo skipped work; exit 0");
    let source = BatchSource::Urls(vec![server.url("/a.png")]);
    let report = run_batch(&config, source, false).await?;

    assert_eq!(report.processed_images, 0);
    let manifest = read_manifest(temp_dir.path())?;
    let item = &manifest.items[0];
    assert_eq!(item.status, ItemStatus::Failed);
    assert_eq!(item.log.as_deref(), Some("skipped work"));
    assert!(item.input.is_some());
    assert!(item.output.is_some());

    Ok(())
}

#[tokio::test]
async fn test_fetch_timeout_does_not_stop_other_items() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slow.png");
            then.status(200)
                .delay(std::time::Duration::from_secs(3))
                .body(b"slow");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/fast.png");
            then.status(200).body(b"fast");
        })
        .await;

    let mut config = config_with_script(temp_dir.path(), r#"cp "$1" "$2""#);
    config.fetch_timeout_secs = 1;
    let source = BatchSource::Urls(vec![server.url("/slow.png"), server.url("/fast.png")]);

    let report = run_batch(&config, source, false).await?;

    assert_eq!(report.total_images, 2);
    assert_eq!(report.processed_images, 1);

    let manifest = read_manifest(temp_dir.path())?;
    assert_eq!(manifest.items.len(), 2);
    assert_eq!(manifest.items[0].status, ItemStatus::Failed);
    assert!(!manifest.items[0].log.as_deref().unwrap_or("").is_empty());
    assert_eq!(manifest.items[1].status, ItemStatus::Ok);

    Ok(())
}

#[tokio::test]
async fn test_transform_timeout_fails_item() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/a.png");
            then.status(200).body(b"a");
        })
        .await;

    let mut config = config_with_script(temp_dir.path(), "sleep 10");
    config.transform_timeout_secs = Some(1);
    let source = BatchSource::Urls(vec![server.url("/a.png")]);

    let report = run_batch(&config, source, false).await?;

    assert_eq!(report.processed_images, 0);
    let manifest = read_manifest(temp_dir.path())?;
    assert_eq!(manifest.items[0].status, ItemStatus::Failed);
    assert!(manifest.items[0].log.as_deref().unwrap().contains("timed out"));

    Ok(())
}

#[tokio::test]
async fn test_supplied_urls_bypass_issue_body() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/dup.bmp");
            then.status(200).body(b"BM");
        })
        .await;

    let body_file = temp_dir.path().join("issue.md");
    std::fs::write(&body_file, "![ignored](https://example.invalid/never.png)")?;
    let urls_json = serde_json::to_string(&vec![server.url("/dup.bmp"), server.url("/dup.bmp")])?;

    let source = BatchSource::resolve(Some(urls_json.as_str()), &body_file).await?;
    let out = temp_dir.path().join("out");
    let config = config_with_script(&out, r#"cp "$1" "$2""#);
    let report = run_batch(&config, source, false).await?;

    // 提供的清單原樣使用，不去重
    assert_eq!(report.total_images, 2);
    assert_eq!(report.processed_images, 2);
    assert_eq!(mock.hits_async().await, 2);
    assert!(out.join("inputs/input_1.bmp").exists());
    assert!(out.join("inputs/input_2.bmp").exists());

    Ok(())
}

#[tokio::test]
async fn test_concurrent_batch_keeps_discovery_order() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;
    for i in 1..=6 {
        let path = format!("/img{}.png", i);
        // 前面的圖片回應較慢
        let delay = std::time::Duration::from_millis(50 * (7 - i));
        server
            .mock_async(move |when, then| {
                when.method(GET).path(path);
                then.status(200).delay(delay).body(b"px");
            })
            .await;
    }

    let mut config = config_with_script(temp_dir.path(), r#"cp "$1" "$2""#);
    config.concurrency = 3;
    let urls: Vec<String> = (1..=6).map(|i| server.url(format!("/img{}.png", i))).collect();

    run_batch(&config, BatchSource::Urls(urls.clone()), false).await?;

    let manifest = read_manifest(temp_dir.path())?;
    let got: Vec<&str> = manifest.items.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(got, urls);
    assert_eq!(manifest.processed_images, 6);
    assert!(manifest.items.iter().enumerate().all(|(i, item)| item.index == i + 1));

    Ok(())
}

#[tokio::test]
async fn test_empty_issue_still_writes_manifest() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let out = temp_dir.path().join("nested/output");
    let config = config_with_script(&out, "exit 1");

    let report = run_batch(&config, BatchSource::IssueBody(String::new()), false).await?;

    assert_eq!(report.total_images, 0);
    assert!(out.join("inputs").is_dir());
    assert!(out.join("results").is_dir());

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("manifest.json"))?)?;
    assert_eq!(
        raw,
        serde_json::json!({
            "issue_number": "42",
            "total_images": 0,
            "processed_images": 0,
            "items": []
        })
    );

    Ok(())
}
