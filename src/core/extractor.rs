use crate::domain::model::ImageReference;
use crate::utils::error::{Result, WorkerError};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

static MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)!\[[^\]]*\]\((https?://[^)\s]+)\)").expect("markdown image pattern")
});

static HTML_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["'](https?://[^"']+)["']"#).expect("html image pattern")
});

/// 從 issue 內文擷取圖片網址
///
/// Markdown `![alt](url)` 的結果排在前面，接著是 HTML `<img src="url">`，
/// 重複的網址只保留第一次出現的位置。
pub fn extract_image_urls(issue_body: &str) -> Vec<String> {
    let markdown = MARKDOWN_IMAGE
        .captures_iter(issue_body)
        .filter_map(|caps| caps.get(1));
    let html = HTML_IMAGE
        .captures_iter(issue_body)
        .filter_map(|caps| caps.get(1));

    let mut seen = HashSet::new();
    markdown
        .chain(html)
        .map(|m| m.as_str())
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

/// 圖片網址的來源：明確提供的清單優先於 issue 內文
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSource {
    Urls(Vec<String>),
    IssueBody(String),
}

impl BatchSource {
    /// `--urls-json` 非空時直接使用，否則讀取 issue 內文檔案
    pub async fn resolve(urls_json: Option<&str>, issue_body_file: &Path) -> Result<Self> {
        match urls_json.map(str::trim).filter(|json| !json.is_empty()) {
            Some(json) => Ok(BatchSource::Urls(parse_urls_json(json)?)),
            None => {
                let body = tokio::fs::read_to_string(issue_body_file).await?;
                Ok(BatchSource::IssueBody(body))
            }
        }
    }

    pub fn references(&self) -> Vec<ImageReference> {
        let urls = match self {
            // 明確提供的清單原樣使用，不去重
            BatchSource::Urls(urls) => urls.clone(),
            BatchSource::IssueBody(body) => extract_image_urls(body),
        };

        urls.into_iter()
            .enumerate()
            .map(|(i, url)| ImageReference { index: i + 1, url })
            .collect()
    }

    /// `--dry-run` 的輸出：每行 `<index>\t<url>`，不下載任何東西
    pub fn dry_run_listing(&self) -> String {
        self.references()
            .iter()
            .map(|r| format!("{}\t{}\n", r.index, r.url))
            .collect()
    }
}

pub fn parse_urls_json(json: &str) -> Result<Vec<String>> {
    serde_json::from_str::<Vec<String>>(json).map_err(|e| WorkerError::ExtractionError {
        message: format!("--urls-json is not a JSON array of strings: {}", e),
    })
}
