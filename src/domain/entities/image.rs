use serde::{Deserialize, Serialize};

/// One uploaded image as referenced by a gallery.
///
/// `asset_ref` is owned by the asset store. `url` is resolved at read time
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub asset_ref: String,
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Persisted shape of an image entry (JSONB column / in-memory row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImage {
    pub asset_ref: String,
    pub alt_text: String,
}

/// A binary submitted for upload, in caller order.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub alt_text: Option<String>,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, data: Vec<u8>) -> Self {
        UploadFile {
            file_name: file_name.into(),
            content_type: content_type.map(str::to_string),
            alt_text: None,
            data,
        }
    }
}

/// Result of a single successful upload, tagged with its input position.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub index: usize,
    pub asset_ref: String,
    pub alt_text: String,
}

impl From<StoredImage> for ImageAsset {
    fn from(image: StoredImage) -> Self {
        ImageAsset {
            asset_ref: image.asset_ref,
            alt_text: image.alt_text,
            url: None,
        }
    }
}

impl From<UploadedAsset> for StoredImage {
    fn from(asset: UploadedAsset) -> Self {
        StoredImage {
            asset_ref: asset.asset_ref,
            alt_text: asset.alt_text,
        }
    }
}
