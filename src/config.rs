use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub backup: BackupConfig,
}

/// Where assets live on disk and how they are addressed publicly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    /// Public URL prefix assets are served under.
    #[serde(default = "default_media_url")]
    pub media_url: String,

    /// Longest thumbnail side in pixels.
    #[serde(default = "default_thumbnail_max_dim")]
    pub thumbnail_max_dim: u32,
}

fn default_media_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keepsake")
        .join("media")
}

fn default_media_url() -> String {
    "/media".to_string()
}

fn default_thumbnail_max_dim() -> u32 {
    400
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: default_media_root(),
            media_url: default_media_url(),
            thumbnail_max_dim: default_thumbnail_max_dim(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Service name embedded in archive filenames.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Bytes an in-progress archive may hold in memory before spilling to
    /// a temporary file.
    #[serde(default = "default_spool_max_bytes")]
    pub spool_max_bytes: usize,

    #[serde(default = "default_backup_output_dir")]
    pub output_dir: PathBuf,
}

fn default_service_name() -> String {
    "keepsake".to_string()
}

fn default_spool_max_bytes() -> usize {
    10 * 1024 * 1024 // 10MB
}

fn default_backup_output_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keepsake")
        .join("backups")
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            spool_max_bytes: default_spool_max_bytes(),
            output_dir: default_backup_output_dir(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keepsake")
        .join("keepsake.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            storage: StorageConfig::default(),
            backup: BackupConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keepsake")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.storage.media_url, "/media");
        assert_eq!(config.storage.thumbnail_max_dim, 400);
        assert_eq!(config.backup.service_name, "keepsake");
        assert_eq!(config.backup.spool_max_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn partial_storage_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            media_root = "/srv/keepsake/media"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.media_root, PathBuf::from("/srv/keepsake/media"));
        assert_eq!(config.storage.thumbnail_max_dim, 400);
    }
}
