use serde::{Serialize, Deserialize, Deserializer};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::upload::{Caption, MediaFile};

pub const DEFAULT_ANIMATION_STYLE: &str = "ghibli";
pub const ANIMATION_STYLES: [&str; 5] = ["ghibli", "pixar", "anime", "watercolor", "3d"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptionResponse {
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoCaptionResponse {
    pub caption: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated_video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedVideoResponse {
    pub video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Outcome of any of the four generation calls.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Caption(CaptionResponse),
    VideoCaption(VideoCaptionResponse),
    Image(ImageResponse),
    Video(AnimatedVideoResponse),
}

impl GenerationResult {
    pub fn id(&self) -> Option<&str> {
        match self {
            GenerationResult::Caption(r) => r.id.as_deref(),
            GenerationResult::VideoCaption(r) => r.id.as_deref(),
            GenerationResult::Image(r) => r.id.as_deref(),
            GenerationResult::Video(r) => r.id.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum MediaRequest {
    Image(MediaFile),
    Video(MediaFile),
    ImageFromCaption(Caption),
    VideoFromCaption { caption: Caption, style: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerateVideoRequest {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

/// A previously generated artifact as persisted by the backend.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoredImage {
    #[serde(alias = "_id")]
    pub id: String,
    pub image_url: String,
    pub caption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Accepts RFC 3339, RFC 2822 (HTTP dates) and zone-less ISO timestamps,
/// the latter read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|naive| naive.and_utc())
        })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp: {}", raw)))
}
