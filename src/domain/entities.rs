pub mod category;
pub mod gallery;
pub mod image;
