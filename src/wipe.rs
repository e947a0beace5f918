//! Full data wipe: every domain row, then the asset root.
//!
//! The database transaction commits before the filesystem purge starts,
//! so a crash anywhere in between leaves at worst orphaned files with no
//! dangling references. The reverse order could leave rows pointing at
//! purged files, which is why it is never taken.

use std::fs;
use std::path::Path;

use tracing::{error, info};

use crate::db::Database;
use crate::error::{Error, Result};

pub struct DataWipe<'a> {
    db: &'a mut Database,
    media_root: &'a Path,
}

impl<'a> DataWipe<'a> {
    /// Holding the database mutably for the whole wipe keeps any ingest on
    /// this handle from interleaving with the purge.
    pub fn new(db: &'a mut Database, media_root: &'a Path) -> Self {
        Self { db, media_root }
    }

    /// Irreversibly delete everything. Success or failure only: a failure
    /// inside the transaction rolls every deletion back; a purge failure
    /// after the commit is logged and surfaced as [`Error::PurgeFailed`],
    /// leaving a cleanup-only state for [`purge_media_root`] to finish.
    pub fn execute(self) -> Result<()> {
        let deleted = self.db.wipe_all()?;
        info!(
            comments = deleted.comments,
            entry_assets = deleted.entry_assets,
            tags = deleted.tags,
            entries = deleted.entries,
            assets = deleted.assets,
            collections = deleted.collections,
            countdowns = deleted.countdowns,
            "domain tables wiped"
        );
        purge_media_root(self.media_root)
    }
}

/// Remove the entire asset root and recreate it empty. Safe to run on its
/// own after a wipe whose purge step did not complete.
pub fn purge_media_root(media_root: &Path) -> Result<()> {
    let purge = || -> std::io::Result<()> {
        if media_root.exists() {
            fs::remove_dir_all(media_root)?;
        }
        fs::create_dir_all(media_root)
    };
    match purge() {
        Ok(()) => {
            info!(path = %media_root.display(), "asset root purged");
            Ok(())
        }
        Err(source) => {
            error!(path = %media_root.display(), error = %source, "asset root purge failed");
            Err(Error::PurgeFailed { path: media_root.to_path_buf(), source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::store::MediaStore;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::new(8, 8);
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn populated(root: &Path) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let store = MediaStore::new(&StorageConfig {
            media_root: root.to_path_buf(),
            media_url: "/media".into(),
            thumbnail_max_dim: 4,
        });
        let bytes = png_bytes();
        let asset =
            store.ingest(&db, &bytes, "a.png", "image/png", bytes.len() as u64, None).unwrap();
        let entry = db
            .insert_entry("day", "words", "happy", "life", chrono::NaiveDate::MIN)
            .unwrap();
        db.attach_asset_to_entry(entry, asset.id).unwrap();
        db.add_entry_comment(entry, "z", "hi").unwrap();
        db
    }

    fn file_count(root: &Path) -> usize {
        walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count()
    }

    #[test]
    fn wipe_clears_rows_and_recreates_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("media");
        let mut db = populated(&root);
        assert!(file_count(&root) > 0);

        DataWipe::new(&mut db, &root).execute().unwrap();

        assert_eq!(db.domain_counts().unwrap().total(), 0);
        assert!(root.exists());
        assert_eq!(file_count(&root), 0);
    }

    #[test]
    fn crash_between_commit_and_purge_is_cleanup_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("media");
        let mut db = populated(&root);

        // Simulated crash: the transaction committed, the purge never ran.
        db.wipe_all().unwrap();
        assert_eq!(db.domain_counts().unwrap().total(), 0);
        assert!(file_count(&root) > 0, "orphaned files should remain");

        // A purge-only rerun restores the empty-root invariant without
        // touching the (already empty) database.
        purge_media_root(&root).unwrap();
        assert_eq!(file_count(&root), 0);
        assert_eq!(db.domain_counts().unwrap().total(), 0);
    }

    #[test]
    fn purge_tolerates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("never-created");
        purge_media_root(&root).unwrap();
        assert!(root.exists());
        assert_eq!(file_count(&root), 0);
    }
}
