use crate::core::{FetchResult, FetchedImage, ImageFetcher, Storage};
use crate::utils::error::{Result, WorkerError};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "issue-image-worker";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_EXTENSION: &str = ".png";

const IMAGE_EXTS: [&str; 5] = [".png", ".jpg", ".jpeg", ".webp", ".bmp"];

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        tracing::debug!("Fetching image: {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        tracing::debug!("Image response status: {}", status);
        if !status.is_success() {
            return Err(WorkerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(WorkerError::EmptyResponse {
                url: url.to_string(),
            });
        }

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// 決定輸入檔的副檔名：網址路徑 > Content-Type > `.png`
pub fn infer_extension(url: &str, content_type: Option<&str>) -> &'static str {
    if let Some(ext) = url_suffix(url).and_then(|suffix| known_extension(&suffix)) {
        return ext;
    }

    if let Some(ext) = content_type.and_then(extension_for_mime) {
        return ext;
    }

    DEFAULT_EXTENSION
}

fn url_suffix(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    // 結尾的斜線不影響檔名 (/a.jpg/ 視為 a.jpg)
    let name = parsed.path_segments()?.filter(|seg| !seg.is_empty()).last()?;
    // 與檔名規則一致：開頭的點 (.png) 或結尾的點都不算副檔名
    match name.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < name.len() => Some(name[pos..].to_lowercase()),
        _ => None,
    }
}

fn known_extension(suffix: &str) -> Option<&'static str> {
    IMAGE_EXTS.iter().copied().find(|ext| *ext == suffix)
}

fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_lowercase();
    match mime.as_str() {
        "image/png" => Some(".png"),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(".jpg"),
        "image/webp" => Some(".webp"),
        "image/bmp" | "image/x-ms-bmp" => Some(".bmp"),
        _ => None,
    }
}

pub fn input_file_name(index: usize, ext: &str) -> String {
    format!("inputs/input_{}{}", index, ext)
}

/// 寫入 `inputs/input_{index}{ext}`，寫入失敗只影響這一筆
pub async fn save_fetched<S: Storage>(
    storage: &S,
    index: usize,
    url: &str,
    image: FetchedImage,
) -> Result<FetchResult> {
    let ext = infer_extension(url, image.content_type.as_deref());
    let relative = input_file_name(index, ext);

    storage.write_file(&relative, &image.bytes).await?;
    tracing::debug!("Saved {} bytes to {}", image.bytes.len(), relative);

    Ok(FetchResult {
        local_path: storage.resolve(&relative),
        bytes: image.bytes,
    })
}
