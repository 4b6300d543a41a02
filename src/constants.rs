use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub const API_PREFIX: &str = "/api/v1";

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);
