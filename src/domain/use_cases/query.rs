use std::{collections::HashSet, sync::Arc};

use chrono::{Datelike, Utc};
use tracing::debug;

use crate::{
    cache::snapshot::{GallerySnapshot, SnapshotCache},
    entities::{
        category::{CategoryResponse, GalleryCategory},
        gallery::{
            CategoryConstraint, CategoryCount, GalleryDocument, GalleryFilter, GalleryPage, GalleryStats,
            DEFAULT_FEATURED_LIMIT, MAX_FEATURED_LIMIT,
        },
    },
    errors::AppError,
    repositories::{assets::AssetStore, gallery::GalleryRepository},
};

/// Read path over the cached gallery snapshot. Filtering and paging run in
/// process; the document store is only asked for the full ordered set.
pub struct GalleryQueryHandler<R, A>
where
    R: GalleryRepository,
    A: AssetStore,
{
    pub gallery_repo: R,
    pub asset_store: A,
    cache: Arc<SnapshotCache>,
}

impl<R, A> GalleryQueryHandler<R, A>
where
    R: GalleryRepository,
    A: AssetStore,
{
    pub fn new(gallery_repo: R, asset_store: A, cache: Arc<SnapshotCache>) -> Self {
        GalleryQueryHandler { gallery_repo, asset_store, cache }
    }

    pub async fn list_galleries(&self, filter: &GalleryFilter) -> Result<GalleryPage, AppError> {
        let snapshot = self.snapshot().await?;
        let mut page = filter_galleries(&snapshot, filter);

        debug!(
            matched = page.total_matched,
            returned = page.items.len(),
            page = page.page,
            "Gallery listing filtered"
        );

        self.resolve_urls(&mut page.items);
        Ok(page)
    }

    pub async fn get_gallery_by_slug(&self, slug: &str) -> Result<GalleryDocument, AppError> {
        let snapshot = self.snapshot().await?;

        let mut gallery = snapshot
            .iter()
            .find(|doc| doc.slug == slug)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Gallery not found".to_string()))?;

        self.resolve_urls(std::slice::from_mut(&mut gallery));
        Ok(gallery)
    }

    /// Featured galleries in listing order. `limit` defaults to 6 and is
    /// capped at 24.
    pub async fn list_featured_galleries(&self, limit: Option<u32>) -> Result<Vec<GalleryDocument>, AppError> {
        let limit = match limit {
            None | Some(0) => DEFAULT_FEATURED_LIMIT,
            Some(n) => n.min(MAX_FEATURED_LIMIT),
        } as usize;

        let snapshot = self.snapshot().await?;
        let mut featured: Vec<GalleryDocument> = snapshot
            .iter()
            .filter(|doc| doc.featured)
            .take(limit)
            .cloned()
            .collect();

        self.resolve_urls(&mut featured);
        Ok(featured)
    }

    pub async fn gallery_stats(&self) -> Result<GalleryStats, AppError> {
        let snapshot = self.snapshot().await?;
        Ok(compute_stats(&snapshot, Utc::now().year()))
    }

    pub fn categories(&self) -> Vec<CategoryResponse> {
        GalleryCategory::ALL.iter().map(|c| c.to_response()).collect()
    }

    async fn snapshot(&self) -> Result<GallerySnapshot, AppError> {
        self.cache
            .get_or_load(|| self.gallery_repo.list_galleries())
            .await
            .map_err(|e| match e {
                AppError::FetchError(_) => e,
                other => AppError::fetch(other),
            })
    }

    fn resolve_urls(&self, galleries: &mut [GalleryDocument]) {
        for image in galleries.iter_mut().flat_map(|g| g.images.iter_mut()) {
            image.url = Some(self.asset_store.url(&image.asset_ref));
        }
    }
}

/// Applies the category constraint, then the search text, then pagination.
/// `documents` must already be in listing order; the result keeps it.
pub fn filter_galleries(documents: &[GalleryDocument], filter: &GalleryFilter) -> GalleryPage {
    let constraint = filter.category_constraint();
    let needle = filter.search_text().map(str::to_lowercase);

    let matched: Vec<&GalleryDocument> = documents
        .iter()
        .filter(|doc| match constraint {
            CategoryConstraint::Any => true,
            CategoryConstraint::Only(category) => doc.category == category,
            CategoryConstraint::Unmatched => false,
        })
        .filter(|doc| needle.as_deref().is_none_or(|n| doc.matches_search(n)))
        .collect();

    let page = filter.page();
    let page_size = filter.page_size();
    let total_matched = matched.len();
    let start = (page as usize - 1).saturating_mul(page_size as usize);

    let items = matched
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .cloned()
        .collect();

    GalleryPage {
        items,
        total_matched,
        page,
        page_size,
        total_pages: total_matched.div_ceil(page_size as usize) as u32,
    }
}

fn compute_stats(documents: &[GalleryDocument], current_year: i32) -> GalleryStats {
    let per_category: Vec<CategoryCount> = GalleryCategory::ALL
        .iter()
        .map(|&category| CategoryCount {
            category,
            galleries: documents.iter().filter(|doc| doc.category == category).count(),
        })
        .collect();

    let categories_in_use = documents
        .iter()
        .map(|doc| doc.category)
        .collect::<HashSet<_>>()
        .len();

    GalleryStats {
        total_galleries: documents.len(),
        total_images: documents.iter().map(|doc| doc.images.len()).sum(),
        categories_in_use,
        galleries_this_year: documents.iter().filter(|doc| doc.date.year() == current_year).count(),
        per_category,
    }
}
