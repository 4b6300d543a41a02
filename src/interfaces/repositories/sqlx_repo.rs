use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxGalleryRepo {
    pub pool: PgPool,
}
