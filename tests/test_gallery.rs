use chrono::NaiveDate;
use gallery_backend::entities::{gallery::NewGalleryRequest, image::UploadFile};
use serde_json::{json, Value};

/// Smallest byte sequence `infer` recognises as a PNG.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

pub fn png(name: &str) -> UploadFile {
    UploadFile::new(name, Some("image/png"), PNG_BYTES.to_vec())
}

pub fn gmb_finale() -> Value {
    json!({
        "title": "GMB Finale",
        "category": "pageant"
    })
}

pub fn seed_request(title: &str, category: &str, date: NaiveDate, tags: &[&str], featured: bool) -> NewGalleryRequest {
    NewGalleryRequest {
        title: title.into(),
        category: category.into(),
        date: Some(date),
        tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        featured: Some(featured),
        ..Default::default()
    }
}

pub fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}
