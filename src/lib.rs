use std::sync::Arc;

use anyhow::Context;
use zeroize::Zeroizing;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{cache, db, utils};

use cache::snapshot::SnapshotCache;
use db::postgres::create_pool;
use repositories::{
    assets::{AssetStore, ContentApiAssetStore},
    gallery::GalleryRepository,
    memory::{InMemoryAssetStore, InMemoryGalleryRepo},
    sqlx_repo::SqlxGalleryRepo,
};
use settings::{AppConfig, StorageBackend};
use use_cases::{ingestion::GalleryIngestionHandler, query::GalleryQueryHandler};

pub type SharedGalleryRepo = Arc<dyn GalleryRepository>;
pub type SharedAssetStore = Arc<dyn AssetStore>;

pub type AppIngestionHandler = GalleryIngestionHandler<SharedGalleryRepo, SharedAssetStore>;
pub type AppQueryHandler = GalleryQueryHandler<SharedGalleryRepo, SharedAssetStore>;

pub struct AppState {
    pub ingestion_handler: AppIngestionHandler,
    pub query_handler: AppQueryHandler,
    pub storage_backend: StorageBackend,
    admin_token: Zeroizing<String>,
}

impl AppState {
    /// Both handlers share one snapshot cache so every write invalidates
    /// what the read path serves.
    pub fn new(config: &AppConfig, gallery_repo: SharedGalleryRepo, asset_store: SharedAssetStore) -> Self {
        let cache = Arc::new(SnapshotCache::new(config.cache_ttl()));

        let ingestion_handler = GalleryIngestionHandler::new(
            Arc::clone(&gallery_repo),
            Arc::clone(&asset_store),
            Arc::clone(&cache),
            config.upload_concurrency,
        );
        let query_handler = GalleryQueryHandler::new(gallery_repo, asset_store, cache);

        AppState {
            ingestion_handler,
            query_handler,
            storage_backend: config.storage_backend,
            admin_token: Zeroizing::new(config.admin_api_token.clone()),
        }
    }

    /// Constant-time comparison against the configured admin token.
    pub fn admin_token_matches(&self, candidate: &str) -> bool {
        let expected = self.admin_token.as_bytes();
        let candidate = candidate.as_bytes();

        if expected.is_empty() || expected.len() != candidate.len() {
            return false;
        }

        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }
}

/// Builds the document and asset stores selected by `storage_backend`.
pub async fn build_stores(config: &AppConfig) -> anyhow::Result<(SharedGalleryRepo, SharedAssetStore)> {
    match config.storage_backend {
        StorageBackend::Hosted => {
            let pool = create_pool(&config.database_url)
                .await
                .context("Failed to create database connection pool")?;

            if config.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("Failed to run database migrations")?;
            }

            let asset_store = ContentApiAssetStore::new(config).context("Invalid asset store configuration")?;

            Ok((
                Arc::new(SqlxGalleryRepo::new(pool)) as SharedGalleryRepo,
                Arc::new(asset_store) as SharedAssetStore,
            ))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; galleries are lost on restart");

            Ok((
                Arc::new(InMemoryGalleryRepo::new()) as SharedGalleryRepo,
                Arc::new(InMemoryAssetStore::new(config.public_asset_url.clone())) as SharedAssetStore,
            ))
        }
    }
}
