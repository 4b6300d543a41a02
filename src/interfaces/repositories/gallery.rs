use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{self, PgPool, types::Json};
use uuid::Uuid;

use crate::{
    entities::gallery::{GalleryDocument, GalleryInsert, GalleryRow},
    errors::AppError,
    repositories::sqlx_repo::SqlxGalleryRepo,
};

const SLUG_UNIQUE_CONSTRAINT: &str = "galleries_slug_key";

/// The document store holding published galleries.
///
/// `create_gallery` and `delete_gallery` are single-document atomic calls.
/// `list_galleries` returns every document ordered by `date` descending,
/// ties kept in insertion order.
#[async_trait]
pub trait GalleryRepository: Send + Sync {
    async fn create_gallery(&self, gallery: &GalleryInsert) -> Result<Uuid, AppError>;
    async fn delete_gallery(&self, id: &Uuid) -> Result<(), AppError>;
    async fn list_galleries(&self) -> Result<Vec<GalleryDocument>, AppError>;
    async fn gallery_exists_with_slug(&self, slug: &str) -> Result<bool, AppError>;
    async fn check_connection(&self) -> Result<(), AppError>;
}

#[async_trait]
impl<T> GalleryRepository for Arc<T>
where
    T: GalleryRepository + ?Sized,
{
    async fn create_gallery(&self, gallery: &GalleryInsert) -> Result<Uuid, AppError> {
        (**self).create_gallery(gallery).await
    }

    async fn delete_gallery(&self, id: &Uuid) -> Result<(), AppError> {
        (**self).delete_gallery(id).await
    }

    async fn list_galleries(&self) -> Result<Vec<GalleryDocument>, AppError> {
        (**self).list_galleries().await
    }

    async fn gallery_exists_with_slug(&self, slug: &str) -> Result<bool, AppError> {
        (**self).gallery_exists_with_slug(slug).await
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        (**self).check_connection().await
    }
}

impl SqlxGalleryRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxGalleryRepo { pool }
    }
}

#[async_trait]
impl GalleryRepository for SqlxGalleryRepo {
    async fn create_gallery(&self, gallery: &GalleryInsert) -> Result<Uuid, AppError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO galleries (
                title, slug, category, date, location, description, tags, images, featured
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#
        )
        .bind(&gallery.title)
        .bind(&gallery.slug)
        .bind(gallery.category.as_str())
        .bind(gallery.date)
        .bind(&gallery.location)
        .bind(&gallery.description)
        .bind(&gallery.tags)
        .bind(Json(gallery.images.clone()))
        .bind(gallery.featured)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(SLUG_UNIQUE_CONSTRAINT) {
                    return AppError::PersistError(format!(
                        "A gallery with slug '{}' already exists",
                        gallery.slug
                    ));
                }
            }
            AppError::persist(e)
        })?;

        Ok(id)
    }

    async fn delete_gallery(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM galleries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::persist)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Gallery not found".into()));
        }

        Ok(())
    }

    async fn list_galleries(&self) -> Result<Vec<GalleryDocument>, AppError> {
        let rows = sqlx::query_as::<_, GalleryRow>(
            r#"
            SELECT id, title, slug, category, date, location, description,
                   tags, images, featured, created_at
            FROM galleries
            ORDER BY date DESC, seq ASC
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::fetch)?;

        rows.into_iter()
            .map(|row| GalleryDocument::try_from(row).map_err(AppError::fetch))
            .collect()
    }

    async fn gallery_exists_with_slug(&self, slug: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM galleries WHERE slug = $1)"
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::fetch)?;

        Ok(exists)
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(AppError::fetch)?;

        Ok(())
    }
}
