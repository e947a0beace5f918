use serde::Serialize;

/// A persisted media asset. The binary lives under the asset root; this
/// row is only created once the file and its thumbnail are on disk.
#[derive(Debug, Clone, Serialize)]
pub struct MediaAsset {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub url: String,
    pub size: i64,
    pub mimetype: String,
    pub collection_id: i64,
    pub description: String,
    pub location: Option<serde_json::Value>,
    pub exif: Option<serde_json::Value>,
    pub compressed_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for a new asset row. Built by the media store after the files
/// are written.
#[derive(Debug, Clone)]
pub struct NewMediaAsset {
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub url: String,
    pub size: i64,
    pub mimetype: String,
    pub collection_id: i64,
    pub location: Option<serde_json::Value>,
    pub exif: Option<serde_json::Value>,
}

impl MediaAsset {
    /// Thumbnail URL, derived from the stored filename and the configured
    /// public media prefix. Never persisted.
    pub fn thumbnail_url(&self, media_url: &str) -> String {
        format!("{}/thumbnails/{}", media_url.trim_end_matches('/'), self.filename)
    }

    /// Human-readable size, derived at read time.
    pub fn size_formatted(&self) -> String {
        format_size(self.size)
    }
}

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

fn format_size(size: i64) -> String {
    if size <= 0 {
        return "0 Byte".to_string();
    }
    let exp = (((size as f64).ln() / 1024f64.ln()) as usize).min(UNITS.len() - 1);
    let value = (size as f64 / 1024f64.powi(exp as i32) * 100.0).round() / 100.0;
    format!("{} {}", value, UNITS[exp])
}
