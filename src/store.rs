//! Media asset ingestion and removal.
//!
//! The store owns the asset root. Ordering is file-then-row: the original
//! and its thumbnail are durably on disk before the metadata row is
//! created, so a committed row never references a missing file. A crash
//! in between can only leave an orphaned, unreferenced file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::db::{Database, MediaAsset, NewMediaAsset};
use crate::error::{Error, Result};

/// Subdirectory of the asset root holding derived thumbnails, stored
/// under the same filename as the original.
pub const THUMBNAIL_DIR: &str = "thumbnails";

pub struct MediaStore {
    media_root: PathBuf,
    media_url: String,
    thumbnail_max_dim: u32,
}

impl MediaStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            media_root: config.media_root.clone(),
            media_url: config.media_url.trim_end_matches('/').to_string(),
            thumbnail_max_dim: config.thumbnail_max_dim,
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Validate and persist one uploaded image, returning its new record.
    ///
    /// Rejections (non-image MIME, empty payload, unknown collection)
    /// happen before anything touches the asset root. Any failure after a
    /// partial write removes whatever was written; no row is created.
    pub fn ingest(
        &self,
        db: &Database,
        bytes: &[u8],
        original_name: &str,
        declared_mime: &str,
        declared_size: u64,
        collection_id: Option<i64>,
    ) -> Result<MediaAsset> {
        if bytes.is_empty() {
            return Err(Error::validation("upload", "no file content"));
        }
        if !declared_mime.starts_with("image/") {
            return Err(Error::validation(
                "mimetype",
                format!("`{declared_mime}` is not an image type"),
            ));
        }

        let collection = match collection_id {
            Some(id) => db.get_collection(id)?.ok_or_else(|| Error::not_found("collection", id))?,
            None => db.default_collection()?,
        };

        fs::create_dir_all(&self.media_root)?;
        let filename = self.unique_filename(original_name);
        let final_path = self.media_root.join(&filename);
        let thumb_path = self.media_root.join(THUMBNAIL_DIR).join(&filename);

        if let Err(e) = self.write_files(bytes, &final_path, &thumb_path) {
            self.remove_files(&final_path, &thumb_path);
            return Err(e);
        }

        let (exif, location) = extract_exif(bytes);
        let new = NewMediaAsset {
            path: format!("/{filename}"),
            url: format!("{}/{}", self.media_url, filename),
            filename,
            original_name: original_name.to_string(),
            size: declared_size as i64,
            mimetype: declared_mime.to_string(),
            collection_id: collection.id,
            location,
            exif,
        };

        match db.insert_asset(&new) {
            Ok(asset) => {
                debug!(filename = %asset.filename, size = asset.size, "ingested media asset");
                Ok(asset)
            }
            Err(e) => {
                // Row creation failed: take the files back out so a failed
                // ingest leaves no artifacts at all.
                self.remove_files(&final_path, &thumb_path);
                Err(e)
            }
        }
    }

    /// Delete one asset: row first, then its files. Leftover files after a
    /// failed removal are orphans, never dangling references.
    pub fn remove(&self, db: &Database, asset_id: i64) -> Result<MediaAsset> {
        let asset = db.delete_asset(asset_id)?;
        let final_path = self.media_root.join(&asset.filename);
        let thumb_path = self.media_root.join(THUMBNAIL_DIR).join(&asset.filename);
        self.remove_files(&final_path, &thumb_path);
        Ok(asset)
    }

    /// Write the original via write-then-rename so a crash mid-write never
    /// exposes a half-written file under its final name, then derive the
    /// thumbnail next to it.
    fn write_files(&self, bytes: &[u8], final_path: &Path, thumb_path: &Path) -> Result<()> {
        let part_path = final_path.with_extension(part_extension(final_path));
        {
            let mut file = fs::File::create(&part_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&part_path, final_path) {
            let _ = fs::remove_file(&part_path);
            return Err(e.into());
        }

        if let Some(parent) = thumb_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let img = image::load_from_memory(bytes)?;
        let thumb = img.thumbnail(self.thumbnail_max_dim, self.thumbnail_max_dim);
        thumb.save(thumb_path)?;
        Ok(())
    }

    fn remove_files(&self, final_path: &Path, thumb_path: &Path) {
        for path in [final_path, thumb_path] {
            if path.exists() {
                if let Err(e) = fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "failed to remove partial file");
                }
            }
        }
    }

    /// Random token plus the original extension; re-rolled while a file of
    /// that name already exists so a stored name is never reused.
    fn unique_filename(&self, original_name: &str) -> String {
        let extension = Path::new(original_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        loop {
            let name = format!("{}{}", Uuid::new_v4().simple(), extension);
            if !self.media_root.join(&name).exists() {
                return name;
            }
        }
    }
}

fn part_extension(final_path: &Path) -> String {
    match final_path.extension() {
        Some(ext) => format!("{}.part", ext.to_string_lossy()),
        None => "part".to_string(),
    }
}

/// Best-effort EXIF and GPS extraction from the uploaded bytes. EXIF is
/// advisory metadata; unreadable or absent data yields `None`, never an
/// error.
fn extract_exif(bytes: &[u8]) -> (Option<serde_json::Value>, Option<serde_json::Value>) {
    let mut cursor = std::io::Cursor::new(bytes);
    let exif = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(_) => return (None, None),
    };

    let text_field = |tag: exif::Tag| -> Option<String> {
        exif.get_field(tag, exif::In::PRIMARY)
            .map(|f| f.display_value().to_string().trim_matches('"').to_string())
    };
    let rational_field = |tag: exif::Tag| -> Option<f64> {
        exif.get_field(tag, exif::In::PRIMARY).and_then(|f| match f.value {
            exif::Value::Rational(ref v) => {
                v.first().map(|r| r.num as f64 / r.denom as f64)
            }
            _ => None,
        })
    };

    let mut camera = serde_json::Map::new();
    if let Some(make) = text_field(exif::Tag::Make) {
        camera.insert("camera".into(), make.into());
    }
    if let Some(model) = text_field(exif::Tag::Model) {
        camera.insert("model".into(), model.into());
    }
    if let Some(lens) = text_field(exif::Tag::LensModel) {
        camera.insert("lens".into(), lens.into());
    }
    if let Some(focal) = rational_field(exif::Tag::FocalLength) {
        camera.insert("focal_length".into(), focal.into());
    }
    if let Some(aperture) = rational_field(exif::Tag::FNumber) {
        camera.insert("aperture".into(), aperture.into());
    }
    if let Some(shutter) = text_field(exif::Tag::ExposureTime) {
        camera.insert("shutter_speed".into(), shutter.into());
    }
    if let Some(taken_at) = text_field(exif::Tag::DateTimeOriginal) {
        camera.insert("taken_at".into(), taken_at.into());
    }

    let location = gps_coordinates(&exif).map(|(lat, lon)| {
        serde_json::json!({ "latitude": lat, "longitude": lon })
    });

    let exif_payload =
        if camera.is_empty() { None } else { Some(serde_json::Value::Object(camera)) };
    (exif_payload, location)
}

fn gps_coordinates(exif: &exif::Exif) -> Option<(f64, f64)> {
    let lat_field = exif.get_field(exif::Tag::GPSLatitude, exif::In::PRIMARY)?;
    let lat_ref = exif.get_field(exif::Tag::GPSLatitudeRef, exif::In::PRIMARY)?;
    let lon_field = exif.get_field(exif::Tag::GPSLongitude, exif::In::PRIMARY)?;
    let lon_ref = exif.get_field(exif::Tag::GPSLongitudeRef, exif::In::PRIMARY)?;

    let dms = |field: &exif::Field| -> Option<f64> {
        match field.value {
            exif::Value::Rational(ref v) if v.len() >= 3 => Some(
                v[0].num as f64 / v[0].denom as f64
                    + v[1].num as f64 / v[1].denom as f64 / 60.0
                    + v[2].num as f64 / v[2].denom as f64 / 3600.0,
            ),
            _ => None,
        }
    };

    let lat = dms(lat_field)?;
    let lon = dms(lon_field)?;
    let lat = if lat_ref.display_value().to_string().contains('S') { -lat } else { lat };
    let lon = if lon_ref.display_value().to_string().contains('W') { -lon } else { lon };
    Some((lat, lon))
}
