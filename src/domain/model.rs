use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 從 issue 內文找到（或直接提供）的圖片網址，index 從 1 開始
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub index: usize,
    pub url: String,
}

/// HTTP 回應內容，尚未寫入磁碟
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub local_path: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct TransformOutcome {
    /// exit status 成功且輸出檔存在
    pub succeeded: bool,
    pub output_path: PathBuf,
    pub log: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Ok,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestItem {
    pub index: usize,
    pub url: String,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl ManifestItem {
    pub fn skipped(reference: &ImageReference) -> Self {
        Self {
            index: reference.index,
            url: reference.url.clone(),
            status: ItemStatus::Skipped,
            input: None,
            output: None,
            log: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ItemStatus::Ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub issue_number: String,
    pub total_images: usize,
    pub processed_images: usize,
    pub items: Vec<ManifestItem>,
}

impl Manifest {
    /// `processed_images` 由 items 推導，不另外累加
    pub fn from_items(issue_number: impl Into<String>, items: Vec<ManifestItem>) -> Self {
        let processed_images = items.iter().filter(|item| item.is_ok()).count();
        Self {
            issue_number: issue_number.into(),
            total_images: items.len(),
            processed_images,
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub manifest_path: PathBuf,
    pub total_images: usize,
    pub processed_images: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(index: usize, status: ItemStatus) -> ManifestItem {
        ManifestItem {
            status,
            ..ManifestItem::skipped(&ImageReference {
                index,
                url: format!("https://example.com/{}.png", index),
            })
        }
    }

    #[test]
    fn test_manifest_counts_only_ok_items() {
        let manifest = Manifest::from_items(
            "42",
            vec![
                item(1, ItemStatus::Ok),
                item(2, ItemStatus::Failed),
                item(3, ItemStatus::Ok),
            ],
        );

        assert_eq!(manifest.total_images, 3);
        assert_eq!(manifest.processed_images, 2);
    }

    #[test]
    fn test_manifest_item_omits_absent_fields() {
        let json = serde_json::to_value(item(1, ItemStatus::Failed)).unwrap();

        assert_eq!(json["status"], "failed");
        assert!(json.get("input").is_none());
        assert!(json.get("output").is_none());
        assert!(json.get("log").is_none());
    }

    #[test]
    fn test_empty_manifest_shape() {
        let manifest = Manifest::from_items("7", Vec::new());
        let json = serde_json::to_value(&manifest).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "issue_number": "7",
                "total_images": 0,
                "processed_images": 0,
                "items": []
            })
        );
    }
}
