//! Media backup export.
//!
//! Streams the asset-root tree into a DEFLATE ZIP. The archive is built
//! on a spooled temporary file so memory use stays bounded no matter how
//! large the tree is: small archives stay in memory, large ones spill to
//! disk. Entries are stored relative to the asset root, which keeps the
//! archive restorable on any deployment.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tempfile::SpooledTempFile;
use tracing::info;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::BackupConfig;
use crate::error::Result;

pub struct BackupExporter {
    media_root: PathBuf,
    service: String,
    spool_max_bytes: usize,
}

/// A finished archive, positioned at the start and ready to stream.
pub struct BackupArchive {
    pub filename: String,
    pub entries: usize,
    file: SpooledTempFile,
}

impl BackupArchive {
    /// Stream the archive into `writer`, returning the bytes written.
    pub fn write_into<W: Write>(&mut self, writer: &mut W) -> Result<u64> {
        let n = io::copy(&mut self.file, writer)?;
        Ok(n)
    }

    /// Write the archive under its own filename inside `dir`.
    pub fn persist_to(&mut self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        let mut out = File::create(&path)?;
        self.write_into(&mut out)?;
        out.sync_all()?;
        Ok(path)
    }
}

impl Read for BackupArchive {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl BackupExporter {
    pub fn new(media_root: &Path, config: &BackupConfig) -> Self {
        Self {
            media_root: media_root.to_path_buf(),
            service: config.service_name.clone(),
            spool_max_bytes: config.spool_max_bytes,
        }
    }

    /// Export the asset root dated today.
    pub fn export(&self) -> Result<BackupArchive> {
        self.export_dated(Utc::now().date_naive())
    }

    /// Export the asset root into an archive named for `date`. A missing
    /// or empty root yields a valid empty archive rather than an error.
    pub fn export_dated(&self, date: NaiveDate) -> Result<BackupArchive> {
        let mut spool = SpooledTempFile::new(self.spool_max_bytes);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut entries = 0usize;

        {
            let mut zip = ZipWriter::new(&mut spool);
            if self.media_root.exists() {
                for entry in WalkDir::new(&self.media_root).into_iter().filter_map(|e| e.ok()) {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let rel = match entry.path().strip_prefix(&self.media_root) {
                        Ok(rel) => rel,
                        Err(_) => continue,
                    };
                    zip.start_file(rel.to_string_lossy().replace('\\', "/"), options)?;
                    let mut file = File::open(entry.path())?;
                    io::copy(&mut file, &mut zip)?;
                    entries += 1;
                }
            }
            zip.finish()?;
        }

        spool.seek(SeekFrom::Start(0))?;
        let filename = archive_filename(&self.service, date);
        info!(%filename, entries, "media backup archive built");
        Ok(BackupArchive { filename, entries, file: spool })
    }
}

/// `<service>-media-backup-<ISO date>.zip`
pub fn archive_filename(service: &str, date: NaiveDate) -> String {
    format!("{service}-media-backup-{date}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exporter(root: &Path) -> BackupExporter {
        BackupExporter::new(
            root,
            &BackupConfig {
                service_name: "keepsake".into(),
                spool_max_bytes: 1024,
                output_dir: root.join("backups"),
            },
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn archive_filename_embeds_iso_date() {
        assert_eq!(
            archive_filename("keepsake", date(2026, 2, 7)),
            "keepsake-media-backup-2026-02-07.zip"
        );
    }

    #[test]
    fn archive_entries_are_relative_with_forward_slashes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("media");
        std::fs::create_dir_all(root.join("thumbnails")).unwrap();
        std::fs::write(root.join("a.jpg"), b"original bytes").unwrap();
        std::fs::write(root.join("thumbnails").join("a.jpg"), b"thumb bytes").unwrap();

        let archive = exporter(&root).export_dated(date(2026, 2, 7)).unwrap();
        assert_eq!(archive.entries, 2);

        let mut zip = zip::ZipArchive::new(archive.file).unwrap();
        let mut names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.jpg", "thumbnails/a.jpg"]);

        let mut contents = String::new();
        zip.by_name("a.jpg").unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "original bytes");
    }

    #[test]
    fn missing_root_produces_valid_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = exporter(&dir.path().join("nowhere")).export_dated(date(2026, 2, 7)).unwrap();
        assert_eq!(archive.entries, 0);

        let zip = zip::ZipArchive::new(archive.file).unwrap();
        assert_eq!(zip.len(), 0);
    }

    #[test]
    fn persist_writes_archive_under_its_filename() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("media");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("only.png"), b"x").unwrap();

        let mut archive = exporter(&root).export_dated(date(2026, 2, 7)).unwrap();
        let out = archive.persist_to(&dir.path().join("backups")).unwrap();
        assert_eq!(
            out.file_name().unwrap().to_string_lossy(),
            "keepsake-media-backup-2026-02-07.zip"
        );

        let file = File::open(out).unwrap();
        let zip = zip::ZipArchive::new(file).unwrap();
        assert_eq!(zip.len(), 1);
    }
}
