use std::{borrow::Cow, collections::HashSet};

use actix_multipart::form::{json::Json as MpJson, tempfile::TempFile, MultipartForm};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::entities::{
    category::GalleryCategory,
    image::{ImageAsset, StoredImage},
};

// ───── Constants ──────────────────────────────────────────────────────
pub const MAX_TITLE_LENGTH: u64 = 100;
pub const MAX_SLUG_LENGTH: u64 = 96;
pub const MAX_LOCATION_LENGTH: u64 = 120;
pub const MAX_DESCRIPTION_LENGTH: u64 = 1000;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LENGTH: usize = 50;
pub const MAX_FILES_PER_GALLERY: usize = 50;

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_FEATURED_LIMIT: u32 = 6;
pub const MAX_FEATURED_LIMIT: u32 = 24;

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct GalleryRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub images: Json<Vec<StoredImage>>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryDocument {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub category: GalleryCategory,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub images: Vec<ImageAsset>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

/// Fully assembled record handed to the document store in one create call.
#[derive(Debug, Clone, Validate)]
pub struct GalleryInsert {
    #[validate(length(min = 1, max = MAX_TITLE_LENGTH))]
    pub title: String,

    #[validate(length(min = 1, max = MAX_SLUG_LENGTH), custom(function = "validate_slug"))]
    pub slug: String,

    pub category: GalleryCategory,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,

    #[validate(length(min = 1, message = "A gallery needs at least one image"))]
    pub images: Vec<StoredImage>,

    pub featured: bool,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct GalleryCreatedResponse {
    pub id: Uuid,
    pub slug: String,
    pub image_count: usize,
    pub preview_url: String,
}

#[derive(Debug, Serialize)]
pub struct GalleryPage {
    pub items: Vec<GalleryDocument>,
    pub total_matched: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryCount {
    pub category: GalleryCategory,
    pub galleries: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct GalleryStats {
    pub total_galleries: usize,
    pub total_images: usize,
    pub categories_in_use: usize,
    pub galleries_this_year: usize,
    pub per_category: Vec<CategoryCount>,
}

// ───── Input & Validation Requests ──────────────────────────────────

/// Gallery metadata as submitted by the admin upload form.
///
/// `title` and `category` default to empty so a missing field is reported
/// as a validation failure rather than a deserialisation error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewGalleryRequest {
    #[serde(default, alias = "galleryTitle")]
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = "validate_category"))]
    pub category: String,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    #[validate(length(max = MAX_LOCATION_LENGTH))]
    pub location: Option<String>,

    #[serde(default)]
    #[validate(length(max = MAX_DESCRIPTION_LENGTH))]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    pub featured: Option<bool>,
}

/// Admin upload form: one `gallery_data` JSON part plus repeated `files`
/// parts in display order. The metadata part may also be named `galleryData`.
#[derive(Debug, MultipartForm)]
pub struct GalleryUploadForm {
    #[multipart(rename = "gallery_data")]
    pub gallery_data: Option<MpJson<NewGalleryRequest>>,

    #[multipart(rename = "galleryData")]
    pub gallery_data_camel: Option<MpJson<NewGalleryRequest>>,

    #[multipart(rename = "files", limit = "10MB")]
    pub files: Vec<TempFile>,
}

/// Validated, normalised metadata waiting for its images.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryDraft {
    pub title: String,
    pub slug: String,
    pub category: GalleryCategory,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub featured: bool,
}

/// Query-string filter for the public gallery listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryFilter {
    #[serde(default, alias = "searchText")]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default, alias = "pageSize")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryConstraint {
    Any,
    Only(GalleryCategory),
    /// A category value outside the enumerated set; matches nothing.
    Unmatched,
}

impl GalleryFilter {
    pub fn category_constraint(&self) -> CategoryConstraint {
        let raw = self.category.as_deref().map(str::trim).unwrap_or_default();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return CategoryConstraint::Any;
        }

        match raw.parse::<GalleryCategory>() {
            Ok(category) => CategoryConstraint::Only(category),
            Err(_) => CategoryConstraint::Unmatched,
        }
    }

    /// 1-based page; anything below 1 is treated as the first page.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        match self.page_size {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(size) => size.min(MAX_PAGE_SIZE),
        }
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(new_validation_error("title_required", "Gallery title is required"));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH as usize {
        return Err(new_validation_error("title_too_long", "Gallery title must be at most 100 characters"));
    }
    if derive_slug(trimmed).is_empty() {
        return Err(new_validation_error("title_no_slug", "Gallery title must contain at least one letter or digit"));
    }
    Ok(())
}

pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if category.trim().is_empty() {
        return Err(new_validation_error("category_required", "Category is required"));
    }
    if category.parse::<GalleryCategory>().is_err() {
        return Err(new_validation_error("category_unknown", "Category is not one of the supported categories"));
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(new_validation_error("too_many_tags", "Too many tags provided"));
    }

    let mut seen = HashSet::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(new_validation_error("tag_empty", "Tags must not be empty"));
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(new_validation_error("tag_too_long", "Tags must be at most 50 characters"));
        }
        if !seen.insert(tag) {
            return Err(new_validation_error("tag_duplicate", "Tags must not contain duplicates"));
        }
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(new_validation_error("slug_invalid_chars", "Slug must contain only lowercase letters, digits, or hyphens"));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(new_validation_error("slug_edge_hyphen", "Slug must not start or end with a hyphen"));
    }
    Ok(())
}

pub fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

/// Lowercase, collapse every run of non-alphanumerics to one `-`, trim the
/// edges, and cap the length.
pub fn derive_slug(title: &str) -> String {
    let mut slug = slug::slugify(title);
    if slug.len() > MAX_SLUG_LENGTH as usize {
        slug.truncate(MAX_SLUG_LENGTH as usize);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ───── Conversions ──────────────────────────────────────────────────

impl TryFrom<NewGalleryRequest> for GalleryDraft {
    type Error = ValidationErrors;

    fn try_from(value: NewGalleryRequest) -> Result<Self, Self::Error> {
        value.validate()?;

        let category = value.category.parse::<GalleryCategory>().map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.add("category", new_validation_error("category_unknown", "Category is not one of the supported categories"));
            errors
        })?;

        let title = value.title.trim().to_string();
        let tags = value
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .collect();

        Ok(GalleryDraft {
            slug: derive_slug(&title),
            title,
            category,
            date: value.date.unwrap_or_else(|| Utc::now().date_naive()),
            location: non_empty(value.location),
            description: non_empty(value.description),
            tags,
            featured: value.featured.unwrap_or(false),
        })
    }
}

impl GalleryDraft {
    pub fn into_insert(self, images: Vec<StoredImage>) -> GalleryInsert {
        GalleryInsert {
            title: self.title,
            slug: self.slug,
            category: self.category,
            date: self.date,
            location: self.location,
            description: self.description,
            tags: self.tags,
            images,
            featured: self.featured,
        }
    }
}

impl GalleryInsert {
    /// What a store hands back after a successful create.
    pub fn into_document(self, id: Uuid, created_at: DateTime<Utc>) -> GalleryDocument {
        GalleryDocument {
            id,
            title: self.title,
            slug: self.slug,
            category: self.category,
            date: self.date,
            location: self.location,
            description: self.description,
            tags: self.tags,
            images: self.images.into_iter().map(ImageAsset::from).collect(),
            featured: self.featured,
            created_at,
        }
    }
}

impl TryFrom<GalleryRow> for GalleryDocument {
    type Error = crate::entities::category::UnknownCategory;

    fn try_from(row: GalleryRow) -> Result<Self, Self::Error> {
        Ok(GalleryDocument {
            id: row.id,
            title: row.title,
            slug: row.slug,
            category: row.category.parse()?,
            date: row.date,
            location: row.location,
            description: row.description,
            tags: row.tags,
            images: row.images.0.into_iter().map(ImageAsset::from).collect(),
            featured: row.featured,
            created_at: row.created_at,
        })
    }
}

impl GalleryDocument {
    /// Case-insensitive substring match over title, description and tags.
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, category: &str) -> NewGalleryRequest {
        NewGalleryRequest {
            title: title.to_string(),
            category: category.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn derive_slug_collapses_and_trims() {
        assert_eq!(derive_slug("GMB Finale"), "gmb-finale");
        assert_eq!(derive_slug("  --Crowning Night!!  2024-- "), "crowning-night-2024");
        assert_eq!(derive_slug("!!!"), "");
    }

    #[test]
    fn derive_slug_caps_length_without_trailing_separator() {
        let title = format!("{} b", "a".repeat(MAX_SLUG_LENGTH as usize - 1));
        let slug = derive_slug(&title);
        assert!(slug.len() <= MAX_SLUG_LENGTH as usize);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn draft_applies_defaults() {
        let draft = GalleryDraft::try_from(request("GMB Finale", "pageant")).unwrap();

        assert_eq!(draft.slug, "gmb-finale");
        assert_eq!(draft.category, GalleryCategory::Pageant);
        assert_eq!(draft.date, Utc::now().date_naive());
        assert!(draft.tags.is_empty());
        assert!(!draft.featured);
        assert_eq!(draft.location, None);
    }

    #[test]
    fn draft_trims_title_and_blank_optionals() {
        let mut req = request("  Durbar Day  ", "cultural");
        req.location = Some("   ".into());
        req.description = Some(" Festival in Accra ".into());
        req.tags = Some(vec![" Kente ".into(), "Ghana".into()]);

        let draft = GalleryDraft::try_from(req).unwrap();

        assert_eq!(draft.title, "Durbar Day");
        assert_eq!(draft.location, None);
        assert_eq!(draft.description.as_deref(), Some("Festival in Accra"));
        assert_eq!(draft.tags, vec!["Kente".to_string(), "Ghana".to_string()]);
    }

    #[test]
    fn empty_title_is_reported_on_title_field() {
        let errors = GalleryDraft::try_from(request("   ", "pageant")).unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn unknown_category_is_rejected_not_coerced() {
        let errors = GalleryDraft::try_from(request("Runway", "fashion")).unwrap_err();
        assert!(errors.field_errors().contains_key("category"));
    }

    #[test]
    fn duplicate_and_empty_tags_are_rejected() {
        assert!(validate_tags(&["GMB".into(), "Ghana".into(), "GMB".into()]).is_err());
        assert!(validate_tags(&["GMB".into(), " ".into()]).is_err());
        assert!(validate_tags(&["GMB".into(), "gmb".into()]).is_ok());
    }

    #[test]
    fn insert_without_images_fails_validation() {
        let draft = GalleryDraft::try_from(request("GMB Finale", "pageant")).unwrap();
        let insert = draft.into_insert(Vec::new());
        let errors = insert.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("images"));
    }

    #[test]
    fn filter_defaults_and_bounds() {
        let filter = GalleryFilter::default();
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(filter.category_constraint(), CategoryConstraint::Any);

        let filter = GalleryFilter {
            page: Some(0),
            page_size: Some(10_000),
            category: Some("all".into()),
            ..Default::default()
        };
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.page_size(), MAX_PAGE_SIZE);
        assert_eq!(filter.category_constraint(), CategoryConstraint::Any);

        let filter = GalleryFilter {
            category: Some("unknown".into()),
            ..Default::default()
        };
        assert_eq!(filter.category_constraint(), CategoryConstraint::Unmatched);
    }

    #[test]
    fn category_filter_ignores_case_for_all_and_named_categories() {
        let filter_for = |raw: &str| GalleryFilter {
            category: Some(raw.into()),
            ..Default::default()
        };

        assert_eq!(filter_for("ALL").category_constraint(), CategoryConstraint::Any);
        assert_eq!(filter_for(" All ").category_constraint(), CategoryConstraint::Any);
        assert_eq!(filter_for("   ").category_constraint(), CategoryConstraint::Any);
        assert_eq!(
            filter_for("PAGEANT").category_constraint(),
            CategoryConstraint::Only(GalleryCategory::Pageant)
        );
    }
}
