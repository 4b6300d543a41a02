use std::{borrow::Cow, sync::Arc};

use futures::{stream, StreamExt};
use tracing::{info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    cache::snapshot::SnapshotCache,
    entities::{
        gallery::{new_validation_error, GalleryCreatedResponse, GalleryDraft, NewGalleryRequest, MAX_FILES_PER_GALLERY},
        image::{StoredImage, UploadFile, UploadedAsset},
    },
    errors::{AppError, UploadFailure},
    repositories::{assets::AssetStore, gallery::GalleryRepository},
    utils::{mime::resolve_image_mime, valid_uuid::valid_uuid},
};

pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

/// A file that passed local checks and is ready to send to the asset store.
#[derive(Debug)]
struct PreparedUpload {
    index: usize,
    file_name: String,
    mime_type: String,
    alt_text: String,
    data: Vec<u8>,
}

/// Write path: turns an upload batch into a persisted gallery, and deletes
/// galleries by id. Holds no state between calls beyond the shared read
/// cache it invalidates.
pub struct GalleryIngestionHandler<R, A>
where
    R: GalleryRepository,
    A: AssetStore,
{
    pub gallery_repo: R,
    pub asset_store: A,
    cache: Arc<SnapshotCache>,
    upload_concurrency: usize,
}

impl<R, A> GalleryIngestionHandler<R, A>
where
    R: GalleryRepository,
    A: AssetStore,
{
    pub fn new(gallery_repo: R, asset_store: A, cache: Arc<SnapshotCache>, upload_concurrency: usize) -> Self {
        GalleryIngestionHandler {
            gallery_repo,
            asset_store,
            cache,
            upload_concurrency: upload_concurrency.max(1),
        }
    }

    /// Validates the submission, uploads every file, then creates the
    /// gallery document in a single call.
    ///
    /// Uploads that succeed before a later failure are not rolled back.
    pub async fn submit_gallery(
        &self,
        request: NewGalleryRequest,
        files: Vec<UploadFile>,
    ) -> Result<GalleryCreatedResponse, AppError> {
        let (draft, uploads) = prepare_submission(request, files)?;

        let slug_taken = self.gallery_repo
            .gallery_exists_with_slug(&draft.slug)
            .await
            .map_err(|e| AppError::fetch(format!("Could not check slug availability: {}", e)))?;

        if slug_taken {
            return Err(AppError::validation("title", "A gallery with this title already exists"));
        }

        let uploaded = self.upload_all(uploads).await?;

        let insert = draft.into_insert(uploaded.into_iter().map(StoredImage::from).collect());
        if let Err(errors) = insert.validate() {
            log_orphaned_assets(&insert.images, "gallery failed final validation");
            return Err(errors.into());
        }

        let id = match self.gallery_repo.create_gallery(&insert).await {
            Ok(id) => id,
            Err(e) => {
                log_orphaned_assets(&insert.images, "gallery create failed");
                return Err(match e {
                    AppError::PersistError(_) => e,
                    other => AppError::persist(other),
                });
            }
        };

        self.cache.invalidate();

        info!(
            gallery_id = %id,
            slug = %insert.slug,
            images = insert.images.len(),
            "Gallery created"
        );

        Ok(GalleryCreatedResponse {
            id,
            preview_url: format!("/gallery/{}", insert.slug),
            image_count: insert.images.len(),
            slug: insert.slug,
        })
    }

    /// Deletes a gallery document by id. Referenced assets stay in the
    /// asset store.
    pub async fn delete_gallery(&self, id: &str) -> Result<(), AppError> {
        let valid_id = valid_uuid(id)?;

        self.gallery_repo
            .delete_gallery(&valid_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound("Gallery not found".to_string()),
                AppError::PersistError(_) => e,
                other => AppError::persist(other),
            })?;

        self.cache.invalidate();
        info!(gallery_id = %valid_id, "Gallery deleted");

        Ok(())
    }

    /// Fans uploads out with bounded concurrency and joins all of them.
    /// Results come back in completion order and are sorted back into
    /// input order.
    async fn upload_all(&self, uploads: Vec<PreparedUpload>) -> Result<Vec<UploadedAsset>, AppError> {
        let results: Vec<Result<UploadedAsset, UploadFailure>> = stream::iter(uploads)
            .map(|upload| async move {
                let PreparedUpload { index, file_name, mime_type, alt_text, data } = upload;

                match self.asset_store.upload(data, &file_name, &mime_type).await {
                    Ok(asset_ref) => Ok(UploadedAsset { index, asset_ref, alt_text }),
                    Err(e) => {
                        warn!(file = %file_name, index, error = %e, "Asset upload failed");
                        Err(UploadFailure { index, file_name, reason: e.to_string() })
                    }
                }
            })
            .buffer_unordered(self.upload_concurrency)
            .collect()
            .await;

        let mut uploaded = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(asset) => uploaded.push(asset),
                Err(failure) => failures.push(failure),
            }
        }

        uploaded.sort_by_key(|asset| asset.index);

        if !failures.is_empty() {
            failures.sort_by_key(|failure| failure.index);
            let orphans: Vec<StoredImage> = uploaded.into_iter().map(StoredImage::from).collect();
            log_orphaned_assets(&orphans, "upload batch failed");
            return Err(AppError::UploadError(failures));
        }

        Ok(uploaded)
    }
}

/// Runs every local precondition before any network call. All field
/// errors are reported together.
fn prepare_submission(
    request: NewGalleryRequest,
    files: Vec<UploadFile>,
) -> Result<(GalleryDraft, Vec<PreparedUpload>), AppError> {
    let mut errors = request.validate().err().unwrap_or_else(ValidationErrors::new);

    let uploads = match prepare_files(files) {
        Ok(uploads) => uploads,
        Err(e) => {
            errors.add("files", e);
            Vec::new()
        }
    };

    if !errors.is_empty() {
        return Err(errors.into());
    }

    let draft = GalleryDraft::try_from(request)?;
    Ok((draft, uploads))
}

fn prepare_files(files: Vec<UploadFile>) -> Result<Vec<PreparedUpload>, ValidationError> {
    if files.is_empty() {
        return Err(new_validation_error("files_required", "Please select at least one image"));
    }
    if files.len() > MAX_FILES_PER_GALLERY {
        return Err(new_validation_error("too_many_files", "A gallery accepts at most 50 images"));
    }

    files
        .into_iter()
        .enumerate()
        .map(|(index, file)| {
            let file_name = match file.file_name.trim() {
                "" => format!("image-{}", index + 1),
                name => name.to_string(),
            };

            if file.data.is_empty() {
                return Err(file_error("file_empty", format!("'{}' is empty", file_name)));
            }

            let mime_type = resolve_image_mime(file.content_type.as_deref(), &file.data)
                .ok_or_else(|| file_error("file_not_image", format!("'{}' is not an image", file_name)))?;

            let alt_text = file
                .alt_text
                .map(|alt| alt.trim().to_string())
                .filter(|alt| !alt.is_empty())
                .unwrap_or_else(|| file_name.clone());

            Ok(PreparedUpload {
                index,
                file_name,
                mime_type,
                alt_text,
                data: file.data,
            })
        })
        .collect()
}

fn file_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

fn log_orphaned_assets(images: &[StoredImage], reason: &str) {
    if images.is_empty() {
        return;
    }
    let refs: Vec<&str> = images.iter().map(|image| image.asset_ref.as_str()).collect();
    warn!(orphaned_assets = ?refs, count = refs.len(), "Uploaded assets left unreferenced: {}", reason);
}
