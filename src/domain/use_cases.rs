pub mod extractors;
pub mod ingestion;
pub mod query;
