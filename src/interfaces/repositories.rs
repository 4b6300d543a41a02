pub mod assets;
pub mod gallery;
pub mod memory;
pub mod sqlx_repo;
