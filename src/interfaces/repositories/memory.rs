use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    entities::gallery::{GalleryDocument, GalleryInsert},
    errors::{AppError, AssetError},
    repositories::{assets::AssetStore, gallery::GalleryRepository},
};

/// Process-local document store. Keeps documents in insertion order so a
/// stable sort by date yields the same tie-breaking as the Postgres store.
#[derive(Default)]
pub struct InMemoryGalleryRepo {
    documents: RwLock<Vec<GalleryDocument>>,
}

impl InMemoryGalleryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl GalleryRepository for InMemoryGalleryRepo {
    async fn create_gallery(&self, gallery: &GalleryInsert) -> Result<Uuid, AppError> {
        let mut documents = self.documents.write();

        if documents.iter().any(|doc| doc.slug == gallery.slug) {
            return Err(AppError::PersistError(format!(
                "A gallery with slug '{}' already exists",
                gallery.slug
            )));
        }

        let id = Uuid::new_v4();
        documents.push(gallery.clone().into_document(id, Utc::now()));

        Ok(id)
    }

    async fn delete_gallery(&self, id: &Uuid) -> Result<(), AppError> {
        let mut documents = self.documents.write();

        match documents.iter().position(|doc| doc.id == *id) {
            Some(index) => {
                documents.remove(index);
                Ok(())
            }
            None => Err(AppError::NotFound("Gallery not found".into())),
        }
    }

    async fn list_galleries(&self) -> Result<Vec<GalleryDocument>, AppError> {
        let mut documents = self.documents.read().clone();
        documents.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(documents)
    }

    async fn gallery_exists_with_slug(&self, slug: &str) -> Result<bool, AppError> {
        Ok(self.documents.read().iter().any(|doc| doc.slug == slug))
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
}

/// Process-local blob store for local runs and tests. Bytes are dropped
/// after upload and only metadata is kept, so the URLs it hands out are
/// placeholders under `public_base`: nothing in this service serves them.
pub struct InMemoryAssetStore {
    public_base: String,
    assets: RwLock<HashMap<String, StoredBlob>>,
}

impl InMemoryAssetStore {
    pub fn new(public_base: impl Into<String>) -> Self {
        InMemoryAssetStore {
            public_base: public_base.into(),
            assets: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    pub fn get(&self, asset_ref: &str) -> Option<StoredBlob> {
        self.assets.read().get(asset_ref).cloned()
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn upload(&self, content: Vec<u8>, file_name: &str, mime_type: &str) -> Result<String, AssetError> {
        if content.is_empty() {
            return Err(AssetError::Rejected(400, format!("'{}' is empty", file_name)));
        }

        let extension = mime_type.rsplit('/').next().unwrap_or("bin");
        let asset_ref = format!("image-{}-{}", Uuid::new_v4().simple(), extension);

        self.assets.write().insert(
            asset_ref.clone(),
            StoredBlob {
                file_name: file_name.to_string(),
                mime_type: mime_type.to_string(),
                size: content.len(),
            },
        );

        Ok(asset_ref)
    }

    fn url(&self, asset_ref: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), asset_ref)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::entities::{category::GalleryCategory, image::StoredImage};

    fn insert(title: &str, slug: &str, date: NaiveDate) -> GalleryInsert {
        GalleryInsert {
            title: title.into(),
            slug: slug.into(),
            category: GalleryCategory::Cultural,
            date,
            location: None,
            description: None,
            tags: Vec::new(),
            images: vec![StoredImage { asset_ref: "image-a-1x1-png".into(), alt_text: "a.png".into() }],
            featured: false,
        }
    }

    #[tokio::test]
    async fn lists_by_date_desc_keeping_insertion_order_on_ties() {
        let repo = InMemoryGalleryRepo::new();
        let day = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();

        repo.create_gallery(&insert("First", "first", day(1))).await.unwrap();
        repo.create_gallery(&insert("Tie A", "tie-a", day(3))).await.unwrap();
        repo.create_gallery(&insert("Tie B", "tie-b", day(3))).await.unwrap();

        let slugs: Vec<_> = repo.list_galleries().await.unwrap().into_iter().map(|d| d.slug).collect();
        assert_eq!(slugs, vec!["tie-a", "tie-b", "first"]);
    }

    #[tokio::test]
    async fn delete_of_missing_id_is_not_found() {
        let repo = InMemoryGalleryRepo::new();
        let err = repo.delete_gallery(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_persist_error() {
        let repo = InMemoryGalleryRepo::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        repo.create_gallery(&insert("Same", "same", date)).await.unwrap();

        let err = repo.create_gallery(&insert("Same", "same", date)).await.unwrap_err();
        assert!(matches!(err, AppError::PersistError(_)));
    }

    #[tokio::test]
    async fn asset_store_assigns_refs_and_urls() {
        let store = InMemoryAssetStore::new("http://localhost:8080/assets/");
        let asset_ref = store.upload(vec![1, 2, 3], "crown.png", "image/png").await.unwrap();

        assert!(asset_ref.starts_with("image-") && asset_ref.ends_with("-png"));
        assert_eq!(store.url(&asset_ref), format!("http://localhost:8080/assets/{}", asset_ref));
        assert_eq!(store.get(&asset_ref).unwrap().file_name, "crown.png");
    }
}
