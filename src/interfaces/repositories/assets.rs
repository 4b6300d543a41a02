use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::{errors::AssetError, settings::AppConfig};

/// The blob store that owns uploaded image bytes.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Uploads one binary and returns the store-assigned asset reference.
    async fn upload(&self, content: Vec<u8>, file_name: &str, mime_type: &str) -> Result<String, AssetError>;

    /// Resolves a display URL for an asset reference. Never persisted.
    fn url(&self, asset_ref: &str) -> String;
}

#[async_trait]
impl<T> AssetStore for Arc<T>
where
    T: AssetStore + ?Sized,
{
    async fn upload(&self, content: Vec<u8>, file_name: &str, mime_type: &str) -> Result<String, AssetError> {
        (**self).upload(content, file_name, mime_type).await
    }

    fn url(&self, asset_ref: &str) -> String {
        (**self).url(asset_ref)
    }
}

/// Image asset API of the hosted content store.
///
/// Uploads go to `{api}/v{version}/assets/images/{dataset}`; the response
/// carries the new asset document whose `_id` is the asset reference.
#[derive(Clone)]
pub struct ContentApiAssetStore {
    client: Client,
    upload_endpoint: Url,
    cdn_images_base: String,
    token: Zeroizing<String>,
}

#[derive(Debug, Deserialize)]
struct AssetUploadResponse {
    document: AssetDocument,
}

#[derive(Debug, Deserialize)]
struct AssetDocument {
    #[serde(rename = "_id")]
    id: String,
}

impl ContentApiAssetStore {
    pub fn new(config: &AppConfig) -> Result<Self, AssetError> {
        let api_base = config.asset_api_base();
        let endpoint = format!(
            "{}/v{}/assets/images/{}",
            api_base.trim_end_matches('/'),
            config.asset_api_version,
            config.asset_dataset
        );
        let upload_endpoint = Url::parse(&endpoint)
            .map_err(|e| AssetError::Misconfigured(format!("invalid asset API URL '{}': {}", endpoint, e)))?;

        let cdn_images_base = format!(
            "{}/images/{}/{}",
            config.asset_cdn_url.trim_end_matches('/'),
            config.asset_project_id,
            config.asset_dataset
        );

        Ok(ContentApiAssetStore {
            client: Client::new(),
            upload_endpoint,
            cdn_images_base,
            token: Zeroizing::new(config.asset_api_token.clone()),
        })
    }
}

#[async_trait]
impl AssetStore for ContentApiAssetStore {
    async fn upload(&self, content: Vec<u8>, file_name: &str, mime_type: &str) -> Result<String, AssetError> {
        let response = self.client
            .post(self.upload_endpoint.clone())
            .query(&[("filename", file_name)])
            .bearer_auth(self.token.as_str())
            .header(CONTENT_TYPE, mime_type)
            .body(content)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssetError::Rejected(status.as_u16(), body));
        }

        let parsed: AssetUploadResponse = response
            .json()
            .await
            .map_err(|e| AssetError::InvalidResponse(e.to_string()))?;

        Ok(parsed.document.id)
    }

    fn url(&self, asset_ref: &str) -> String {
        resolve_image_url(&self.cdn_images_base, asset_ref)
    }
}

/// Maps `image-{hash}-{w}x{h}-{ext}` to `{base}/{hash}-{w}x{h}.{ext}`.
/// References in any other shape are appended to the base unchanged.
pub fn resolve_image_url(images_base: &str, asset_ref: &str) -> String {
    let base = images_base.trim_end_matches('/');

    match asset_ref
        .strip_prefix("image-")
        .and_then(|rest| rest.rsplit_once('-'))
    {
        Some((name, ext)) if !name.is_empty() && !ext.is_empty() => format!("{}/{}.{}", base, name, ext),
        _ => format!("{}/{}", base, asset_ref),
    }
}
