pub const SCHEMA: &str = r#"
-- Collections: named groups of media assets. At most one row may have
-- is_default = 1; writes enforce this, not a trigger.
CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    cover_url TEXT NOT NULL DEFAULT '',
    is_default INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_collections_default ON collections(is_default);

-- Media assets: one row per ingested binary. Rows are only created after
-- the file and its thumbnail are durably on disk.
CREATE TABLE IF NOT EXISTS media_assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL UNIQUE,       -- server-generated stored name
    original_name TEXT NOT NULL,
    path TEXT NOT NULL,
    url TEXT NOT NULL,
    size INTEGER NOT NULL,               -- bytes
    mimetype TEXT NOT NULL,
    collection_id INTEGER NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    location TEXT,                       -- JSON: latitude/longitude/address
    exif TEXT,                           -- JSON: camera, lens, exposure, ...
    compressed_url TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (collection_id) REFERENCES collections(id)
);

CREATE INDEX IF NOT EXISTS idx_assets_collection ON media_assets(collection_id, created_at);
CREATE INDEX IF NOT EXISTS idx_assets_url ON media_assets(url);

-- Diary entries
CREATE TABLE IF NOT EXISTS diary_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    mood TEXT NOT NULL DEFAULT 'happy',
    category TEXT NOT NULL DEFAULT '',
    entry_date TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_entries_date ON diary_entries(entry_date);
CREATE INDEX IF NOT EXISTS idx_entries_category ON diary_entries(category);

-- Entry to asset attachments
CREATE TABLE IF NOT EXISTS entry_assets (
    entry_id INTEGER NOT NULL,
    asset_id INTEGER NOT NULL,
    attached_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (entry_id, asset_id),
    FOREIGN KEY (entry_id) REFERENCES diary_entries(id),
    FOREIGN KEY (asset_id) REFERENCES media_assets(id)
);

CREATE INDEX IF NOT EXISTS idx_entry_assets_asset ON entry_assets(asset_id);

-- Entry tags
CREATE TABLE IF NOT EXISTS diary_tags (
    entry_id INTEGER NOT NULL,
    tag TEXT NOT NULL,
    PRIMARY KEY (entry_id, tag),
    FOREIGN KEY (entry_id) REFERENCES diary_entries(id)
);

CREATE INDEX IF NOT EXISTS idx_diary_tags_tag ON diary_tags(tag);

-- Entry comments
CREATE TABLE IF NOT EXISTS diary_comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id INTEGER NOT NULL,
    author TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (entry_id) REFERENCES diary_entries(id)
);

CREATE INDEX IF NOT EXISTS idx_comments_entry ON diary_comments(entry_id);

-- Countdown events. Derived day offsets and status are computed at read
-- time and never stored here.
CREATE TABLE IF NOT EXISTS countdown_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    target_date TEXT NOT NULL,           -- ISO date
    kind TEXT NOT NULL DEFAULT 'other',  -- anniversary/birthday/event/other
    direction TEXT NOT NULL,             -- countup/countdown
    is_recurring INTEGER NOT NULL DEFAULT 0,
    recurring_type TEXT,                 -- yearly/monthly/daily
    recurring_month INTEGER,             -- 1-12, yearly only
    recurring_day INTEGER,               -- 1-31, yearly only
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_countdowns_target ON countdown_events(target_date);
CREATE INDEX IF NOT EXISTS idx_countdowns_kind ON countdown_events(kind);
"#;
