use std::path::Path;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

const MB: u64 = 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Please select {} file", .0.with_article())]
    WrongType(MediaKind),
    #[error("File size should be less than {limit}")]
    TooLarge { kind: MediaKind, size: u64, limit: String },
    #[error("Caption must not be empty")]
    EmptyCaption,
    #[error("Expected {} file, got {} file", .expected.with_article(), .actual.with_article())]
    WrongKind { expected: MediaKind, actual: MediaKind },
    #[error("Cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn max_bytes(self) -> u64 {
        match self {
            MediaKind::Image => 5 * MB,
            MediaKind::Video => 50 * MB,
        }
    }

    pub fn mime_prefix(self) -> &'static str {
        match self {
            MediaKind::Image => "image/",
            MediaKind::Video => "video/",
        }
    }

    pub fn with_article(self) -> &'static str {
        match self {
            MediaKind::Image => "an image",
            MediaKind::Video => "a video",
        }
    }

    /// Multipart field name the backend expects for this kind.
    pub fn form_field(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.form_field())
    }
}

pub fn validate(kind: MediaKind, mime: &str, size: u64) -> Result<(), ValidationError> {
    if !mime.starts_with(kind.mime_prefix()) {
        return Err(ValidationError::WrongType(kind));
    }
    if size > kind.max_bytes() {
        return Err(ValidationError::TooLarge { kind, size, limit: format!("{}MB", kind.max_bytes() / MB) });
    }
    Ok(())
}

/// A file that already passed type and size validation.
#[derive(Debug, Clone)]
pub struct MediaFile {
    kind: MediaKind,
    filename: String,
    mime: String,
    bytes: Bytes,
}

impl MediaFile {
    pub fn new(kind: MediaKind, filename: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self, ValidationError> {
        let mime = mime.into();
        let bytes = bytes.into();
        validate(kind, &mime, bytes.len() as u64)?;
        Ok(Self { kind, filename: filename.into(), mime, bytes })
    }

    /// Loads a file from disk. Type and size are checked from the extension and
    /// metadata before any bytes are read.
    pub async fn load(path: impl AsRef<Path>, kind: MediaKind) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let unreadable = |e: std::io::Error| ValidationError::Unreadable { path: path.display().to_string(), reason: e.to_string() };

        let mime = mime_guess::from_path(path).first_or_octet_stream().essence_str().to_string();
        let size = tokio::fs::metadata(path).await.map_err(unreadable)?.len();
        if let Err(e) = validate(kind, &mime, size) {
            warn!("🚫 Rejected {} ({}, {}): {}", path.display(), mime, format_file_size(size), e);
            return Err(e);
        }

        let bytes = tokio::fs::read(path).await.map_err(unreadable)?;
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "upload".to_string());
        info!("📎 Selected {} {} ({})", kind, filename, format_file_size(size));
        Self::new(kind, filename, mime, bytes)
    }

    pub fn kind(&self) -> MediaKind { self.kind }
    pub fn filename(&self) -> &str { &self.filename }
    pub fn mime(&self) -> &str { &self.mime }
    pub fn bytes(&self) -> &Bytes { &self.bytes }
    pub fn size(&self) -> u64 { self.bytes.len() as u64 }
}

/// Caption text, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption(String);

impl Caption {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCaption);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
