//! SQLite persistence for collections, media assets, diary records and
//! countdown events.

mod schema;
pub mod assets;
pub mod collections;
pub mod entries;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;

pub use assets::{MediaAsset, NewMediaAsset};
pub use collections::Collection;
pub use entries::DiaryEntry;
pub use schema::SCHEMA;

use crate::countdown::{
    self, CountdownEvent, CountdownKind, Direction, NewCountdownEvent, RecurringType,
};
use crate::error::{Error, Result};

/// Name given to the implicitly created default collection.
const DEFAULT_COLLECTION_NAME: &str = "Default Collection";

/// Row counts per domain table, in wipe deletion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainCounts {
    pub comments: i64,
    pub entry_assets: i64,
    pub tags: i64,
    pub entries: i64,
    pub assets: i64,
    pub collections: i64,
    pub countdowns: i64,
}

impl DomainCounts {
    pub fn total(&self) -> i64 {
        self.comments
            + self.entry_assets
            + self.tags
            + self.entries
            + self.assets
            + self.collections
            + self.countdowns
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ========================================================================
    // Collection operations
    // ========================================================================

    /// Create a collection. When `is_default` is set, the previous default
    /// is demoted inside the same transaction, so exactly one default
    /// exists afterwards (last write wins, never an error).
    pub fn create_collection(
        &self,
        name: &str,
        description: &str,
        is_default: bool,
    ) -> Result<Collection> {
        let tx = self.conn.unchecked_transaction()?;
        if is_default {
            tx.execute(
                "UPDATE collections SET is_default = 0, updated_at = CURRENT_TIMESTAMP WHERE is_default = 1",
                [],
            )?;
        }
        tx.execute(
            "INSERT INTO collections (name, description, is_default) VALUES (?, ?, ?)",
            rusqlite::params![name, description, is_default],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        self.get_collection(id)?.ok_or_else(|| Error::not_found("collection", id))
    }

    /// Make an existing collection the default, demoting the previous one
    /// as part of the same write.
    pub fn set_default_collection(&self, id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let exists: bool = tx
            .query_row("SELECT 1 FROM collections WHERE id = ?", [id], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if !exists {
            return Err(Error::not_found("collection", id));
        }
        tx.execute(
            "UPDATE collections SET is_default = 0, updated_at = CURRENT_TIMESTAMP WHERE is_default = 1 AND id <> ?",
            [id],
        )?;
        tx.execute(
            "UPDATE collections SET is_default = 1, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            [id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_collection(&self, id: i64) -> Result<Option<Collection>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, description, cover_url, is_default, created_at, updated_at
                 FROM collections WHERE id = ?",
                [id],
                Self::map_collection,
            )
            .optional()?;
        Ok(row)
    }

    /// The default collection, created on first use. The lookup and the
    /// insert share a transaction so concurrent first uploads cannot mint
    /// two defaults.
    pub fn default_collection(&self) -> Result<Collection> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = tx
            .query_row(
                "SELECT id, name, description, cover_url, is_default, created_at, updated_at
                 FROM collections WHERE is_default = 1 LIMIT 1",
                [],
                Self::map_collection,
            )
            .optional()?;
        if let Some(collection) = existing {
            return Ok(collection);
        }
        tx.execute(
            "INSERT INTO collections (name, is_default) VALUES (?, 1)",
            [DEFAULT_COLLECTION_NAME],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        self.get_collection(id)?.ok_or_else(|| Error::not_found("collection", id))
    }

    pub fn count_default_collections(&self) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM collections WHERE is_default = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn map_collection(row: &rusqlite::Row<'_>) -> rusqlite::Result<Collection> {
        Ok(Collection {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            cover_url: row.get(3)?,
            is_default: row.get::<_, i64>(4)? != 0,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    // ========================================================================
    // Media asset operations
    // ========================================================================

    pub fn insert_asset(&self, new: &NewMediaAsset) -> Result<MediaAsset> {
        let location = new.location.as_ref().map(|v| v.to_string());
        let exif = new.exif.as_ref().map(|v| v.to_string());
        self.conn.execute(
            "INSERT INTO media_assets
                 (filename, original_name, path, url, size, mimetype, collection_id, location, exif)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                new.filename,
                new.original_name,
                new.path,
                new.url,
                new.size,
                new.mimetype,
                new.collection_id,
                location,
                exif,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_asset(id)?.ok_or_else(|| Error::not_found("media asset", id))
    }

    pub fn get_asset(&self, id: i64) -> Result<Option<MediaAsset>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, filename, original_name, path, url, size, mimetype, collection_id,
                        description, location, exif, compressed_url, created_at, updated_at
                 FROM media_assets WHERE id = ?",
                [id],
                Self::map_asset,
            )
            .optional()?;
        Ok(row)
    }

    /// Delete one asset row, returning it so the caller can remove the
    /// files it references.
    pub fn delete_asset(&self, id: i64) -> Result<MediaAsset> {
        let asset = self.get_asset(id)?.ok_or_else(|| Error::not_found("media asset", id))?;
        self.conn.execute("DELETE FROM entry_assets WHERE asset_id = ?", [id])?;
        self.conn.execute("DELETE FROM media_assets WHERE id = ?", [id])?;
        Ok(asset)
    }

    pub fn update_asset_description(&self, id: i64, description: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE media_assets SET description = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            rusqlite::params![description, id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("media asset", id));
        }
        Ok(())
    }

    /// One page of (id, url) pairs ordered by id, for streaming rewrites
    /// without loading the full set.
    pub fn asset_url_page(&self, after_id: i64, limit: usize) -> Result<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url FROM media_assets WHERE id > ? ORDER BY id LIMIT ?",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![after_id, limit as i64], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn update_asset_url(&self, id: i64, url: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE media_assets SET url = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            rusqlite::params![url, id],
        )?;
        Ok(())
    }

    pub fn count_assets(&self) -> Result<i64> {
        let count =
            self.conn.query_row("SELECT COUNT(*) FROM media_assets", [], |row| row.get(0))?;
        Ok(count)
    }

    fn map_asset(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediaAsset> {
        let location: Option<String> = row.get(9)?;
        let exif: Option<String> = row.get(10)?;
        Ok(MediaAsset {
            id: row.get(0)?,
            filename: row.get(1)?,
            original_name: row.get(2)?,
            path: row.get(3)?,
            url: row.get(4)?,
            size: row.get(5)?,
            mimetype: row.get(6)?,
            collection_id: row.get(7)?,
            description: row.get(8)?,
            location: location.and_then(|s| serde_json::from_str(&s).ok()),
            exif: exif.and_then(|s| serde_json::from_str(&s).ok()),
            compressed_url: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    // ========================================================================
    // Countdown operations
    // ========================================================================

    /// Insert a countdown event. Recurrence fields are validated here, not
    /// at computation time; a missing direction is inferred from where the
    /// target date sits relative to `today`.
    pub fn insert_countdown(
        &self,
        new: &NewCountdownEvent,
        today: NaiveDate,
    ) -> Result<CountdownEvent> {
        countdown::validate_recurrence(
            new.is_recurring,
            new.recurring_type,
            new.recurring_month,
            new.recurring_day,
        )?;
        let direction = new
            .direction
            .unwrap_or_else(|| countdown::infer_direction(new.target_date, today));
        self.conn.execute(
            "INSERT INTO countdown_events
                 (title, description, target_date, kind, direction,
                  is_recurring, recurring_type, recurring_month, recurring_day)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                new.title,
                new.description,
                new.target_date,
                new.kind.as_str(),
                direction.as_str(),
                new.is_recurring,
                new.recurring_type.map(|t| t.as_str()),
                new.recurring_month,
                new.recurring_day,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_countdown(id)?.ok_or_else(|| Error::not_found("countdown event", id))
    }

    /// Update an event in place. A missing direction keeps the stored one;
    /// inference only happens at creation.
    pub fn update_countdown(&self, id: i64, new: &NewCountdownEvent) -> Result<CountdownEvent> {
        countdown::validate_recurrence(
            new.is_recurring,
            new.recurring_type,
            new.recurring_month,
            new.recurring_day,
        )?;
        let existing =
            self.get_countdown(id)?.ok_or_else(|| Error::not_found("countdown event", id))?;
        let direction = new.direction.unwrap_or(existing.direction);
        self.conn.execute(
            "UPDATE countdown_events
             SET title = ?, description = ?, target_date = ?, kind = ?, direction = ?,
                 is_recurring = ?, recurring_type = ?, recurring_month = ?, recurring_day = ?,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
            rusqlite::params![
                new.title,
                new.description,
                new.target_date,
                new.kind.as_str(),
                direction.as_str(),
                new.is_recurring,
                new.recurring_type.map(|t| t.as_str()),
                new.recurring_month,
                new.recurring_day,
                id,
            ],
        )?;
        self.get_countdown(id)?.ok_or_else(|| Error::not_found("countdown event", id))
    }

    pub fn get_countdown(&self, id: i64) -> Result<Option<CountdownEvent>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, description, target_date, kind, direction,
                        is_recurring, recurring_type, recurring_month, recurring_day,
                        created_at, updated_at
                 FROM countdown_events WHERE id = ?",
                [id],
                Self::map_countdown,
            )
            .optional()?;
        Ok(row)
    }

    pub fn list_countdowns(&self) -> Result<Vec<CountdownEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, target_date, kind, direction,
                    is_recurring, recurring_type, recurring_month, recurring_day,
                    created_at, updated_at
             FROM countdown_events ORDER BY target_date",
        )?;
        let rows = stmt
            .query_map([], Self::map_countdown)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn delete_countdown(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM countdown_events WHERE id = ?", [id])?;
        if changed == 0 {
            return Err(Error::not_found("countdown event", id));
        }
        Ok(())
    }

    fn map_countdown(row: &rusqlite::Row<'_>) -> rusqlite::Result<CountdownEvent> {
        let kind: String = row.get(4)?;
        let direction: String = row.get(5)?;
        let recurring_type: Option<String> = row.get(7)?;
        Ok(CountdownEvent {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            target_date: row.get(3)?,
            kind: CountdownKind::parse(&kind).unwrap_or(CountdownKind::Other),
            direction: Direction::parse(&direction).unwrap_or(Direction::Countdown),
            is_recurring: row.get::<_, i64>(6)? != 0,
            recurring_type: recurring_type.as_deref().and_then(RecurringType::parse),
            recurring_month: row.get(8)?,
            recurring_day: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    // ========================================================================
    // Diary operations (minimal; CRUD plumbing lives in the API layer)
    // ========================================================================

    pub fn insert_entry(
        &self,
        title: &str,
        content: &str,
        mood: &str,
        category: &str,
        entry_date: NaiveDate,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO diary_entries (title, content, mood, category, entry_date)
             VALUES (?, ?, ?, ?, ?)",
            rusqlite::params![title, content, mood, category, entry_date],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn attach_asset_to_entry(&self, entry_id: i64, asset_id: i64) -> Result<()> {
        if self.get_asset(asset_id)?.is_none() {
            return Err(Error::not_found("media asset", asset_id));
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO entry_assets (entry_id, asset_id) VALUES (?, ?)",
            rusqlite::params![entry_id, asset_id],
        )?;
        Ok(())
    }

    pub fn add_entry_tag(&self, entry_id: i64, tag: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO diary_tags (entry_id, tag) VALUES (?, ?)",
            rusqlite::params![entry_id, tag],
        )?;
        Ok(())
    }

    pub fn add_entry_comment(&self, entry_id: i64, author: &str, body: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO diary_comments (entry_id, author, body) VALUES (?, ?, ?)",
            rusqlite::params![entry_id, author, body],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ========================================================================
    // Bulk data lifecycle
    // ========================================================================

    pub fn domain_counts(&self) -> Result<DomainCounts> {
        let count = |table: &str| -> Result<i64> {
            let n = self.conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
            Ok(n)
        };
        Ok(DomainCounts {
            comments: count("diary_comments")?,
            entry_assets: count("entry_assets")?,
            tags: count("diary_tags")?,
            entries: count("diary_entries")?,
            assets: count("media_assets")?,
            collections: count("collections")?,
            countdowns: count("countdown_events")?,
        })
    }

    /// Delete every domain row in dependency order inside one immediate
    /// (write-locking) transaction. Any failure rolls back all of it; the
    /// filesystem is not touched here.
    pub fn wipe_all(&mut self) -> Result<DomainCounts> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let deleted = DomainCounts {
            comments: tx.execute("DELETE FROM diary_comments", [])? as i64,
            entry_assets: tx.execute("DELETE FROM entry_assets", [])? as i64,
            tags: tx.execute("DELETE FROM diary_tags", [])? as i64,
            entries: tx.execute("DELETE FROM diary_entries", [])? as i64,
            assets: tx.execute("DELETE FROM media_assets", [])? as i64,
            collections: tx.execute("DELETE FROM collections", [])? as i64,
            countdowns: tx.execute("DELETE FROM countdown_events", [])? as i64,
        };
        tx.commit()?;
        Ok(deleted)
    }
}
