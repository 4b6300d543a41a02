use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    entities::{
        gallery::{GalleryFilter, GalleryUploadForm},
        image::UploadFile,
    },
    errors::AppError,
    use_cases::extractors::AdminToken,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct FeaturedQuery {
    pub limit: Option<u32>,
}

#[instrument(skip(state))]
pub async fn list_galleries(
    state: web::Data<AppState>,
    query: web::Query<GalleryFilter>,
) -> Result<impl Responder, AppError> {
    let page = state.query_handler.list_galleries(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[instrument(skip(state))]
pub async fn list_featured_galleries(
    state: web::Data<AppState>,
    query: web::Query<FeaturedQuery>,
) -> Result<impl Responder, AppError> {
    let galleries = state.query_handler.list_featured_galleries(query.limit).await?;
    Ok(HttpResponse::Ok().json(galleries))
}

#[instrument(skip(state))]
pub async fn gallery_stats(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let stats = state.query_handler.gallery_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

pub async fn list_categories(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.query_handler.categories())
}

#[instrument(skip(state))]
pub async fn get_gallery_by_slug(
    slug: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let gallery = state.query_handler.get_gallery_by_slug(&slug).await?;
    Ok(HttpResponse::Ok().json(gallery))
}

#[instrument(skip(state, form))]
pub async fn create_gallery(
    _admin: AdminToken,
    state: web::Data<AppState>,
    form: MultipartForm<GalleryUploadForm>,
) -> Result<impl Responder, AppError> {
    let form = form.into_inner();
    let request = form.gallery_data
        .or(form.gallery_data_camel)
        .map(|data| data.into_inner())
        .unwrap_or_default();

    let mut files = Vec::with_capacity(form.files.len());
    for (index, temp_file) in form.files.into_iter().enumerate() {
        files.push(read_upload(index, temp_file).await?);
    }

    let created = state.ingestion_handler.submit_gallery(request, files).await?;
    Ok(HttpResponse::Created().json(created))
}

#[instrument(skip(state))]
pub async fn delete_gallery(
    _admin: AdminToken,
    gallery_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.ingestion_handler.delete_gallery(&gallery_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Reads a spooled part back into memory. Parts without a file name get a
/// positional one so upload failures can still name them.
async fn read_upload(index: usize, temp_file: TempFile) -> Result<UploadFile, AppError> {
    let data = tokio::fs::read(temp_file.file.path()).await?;

    let file_name = temp_file
        .file_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("image-{}", index + 1));

    Ok(UploadFile {
        file_name,
        content_type: temp_file.content_type.map(|mime| mime.essence_str().to_string()),
        alt_text: None,
        data,
    })
}
