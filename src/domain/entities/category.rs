use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Fixed set of gallery categories.
///
/// The wire form is kebab-case. The short codes from the original content
/// schema (`gmb`, `brand`, `bts`) are accepted on input and normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GalleryCategory {
    #[serde(alias = "gmb")]
    Pageant,
    Cultural,
    #[serde(alias = "brand")]
    BrandPartnership,
    Community,
    Press,
    #[serde(alias = "bts")]
    BehindTheScenes,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: GalleryCategory,
    pub label: &'static str,
}

impl GalleryCategory {
    pub const ALL: [GalleryCategory; 6] = [
        GalleryCategory::Pageant,
        GalleryCategory::Cultural,
        GalleryCategory::BrandPartnership,
        GalleryCategory::Community,
        GalleryCategory::Press,
        GalleryCategory::BehindTheScenes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GalleryCategory::Pageant => "pageant",
            GalleryCategory::Cultural => "cultural",
            GalleryCategory::BrandPartnership => "brand-partnership",
            GalleryCategory::Community => "community",
            GalleryCategory::Press => "press",
            GalleryCategory::BehindTheScenes => "behind-the-scenes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GalleryCategory::Pageant => "GMB Pageant",
            GalleryCategory::Cultural => "Cultural Events",
            GalleryCategory::BrandPartnership => "Brand Partnerships",
            GalleryCategory::Community => "Community Outreach",
            GalleryCategory::Press => "Press & Media",
            GalleryCategory::BehindTheScenes => "Behind the Scenes",
        }
    }

    pub fn to_response(&self) -> CategoryResponse {
        CategoryResponse {
            id: *self,
            label: self.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown gallery category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for GalleryCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pageant" | "gmb" => Ok(GalleryCategory::Pageant),
            "cultural" => Ok(GalleryCategory::Cultural),
            "brand-partnership" | "brand" => Ok(GalleryCategory::BrandPartnership),
            "community" => Ok(GalleryCategory::Community),
            "press" => Ok(GalleryCategory::Press),
            "behind-the-scenes" | "bts" => Ok(GalleryCategory::BehindTheScenes),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

impl fmt::Display for GalleryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
