use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub url: Option<String>,
}

/// A photo found on a listing page. `title` is only known for images taken
/// from captioned `<img>` tags.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ListingImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListingImagesResponse {
    pub images: Vec<ListingImage>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub images: Vec<ListingImage>,
    pub design_style: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RoomEstimate {
    pub room_label: String,
    pub low: u64,
    pub high: u64,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub design_style: String,
    pub rooms: Vec<RoomEstimate>,
    pub total_low: u64,
    pub total_high: u64,
    pub executive_summary: String,
}
