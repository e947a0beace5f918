//! Keepsake backend core.
//!
//! The engines behind a personal diary/photo/countdown service: media
//! asset ingestion and removal, legacy URL normalization, media backup
//! export, full data wipe, and pure countdown date computation. HTTP
//! routing, authentication and serialization live in the API layer that
//! calls into this crate.

pub mod backup;
pub mod config;
pub mod countdown;
pub mod db;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod store;
pub mod wipe;

pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
