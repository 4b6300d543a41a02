pub mod mime;
pub mod valid_uuid;
