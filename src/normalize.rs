//! Legacy asset URL normalization.
//!
//! Rewrites `/uploads/...` forms to the canonical `/media/...` form and
//! back. Both directions are idempotent per record, so a crashed run can
//! simply be re-applied without a checkpoint; records stream through in
//! id-ordered pages so memory stays bounded.

use tracing::info;

use crate::db::Database;
use crate::error::Result;

const PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteDirection {
    /// Legacy `/uploads` forms to canonical `/media`.
    Forward,
    /// Canonical `/media` back to `/uploads`.
    Backward,
}

/// Canonicalize one URL. Returns `None` when the value is already in the
/// target form (or is not a legacy form at all), which makes re-runs
/// no-ops.
pub fn forward(url: &str) -> Option<String> {
    let current = clean(url);
    if current.is_empty() {
        return None;
    }
    let rewritten = if let Some(rest) = current.strip_prefix("/uploads/") {
        format!("/media/{rest}")
    } else if let Some(rest) = current.strip_prefix("uploads/") {
        format!("/media/{rest}")
    } else if current == "/uploads" || current == "uploads" {
        "/media".to_string()
    } else {
        return None;
    };
    if rewritten == url {
        None
    } else {
        Some(rewritten)
    }
}

/// Reverse of [`forward`].
pub fn backward(url: &str) -> Option<String> {
    let current = clean(url);
    if current.is_empty() {
        return None;
    }
    let rewritten = if let Some(rest) = current.strip_prefix("/media/") {
        format!("/uploads/{rest}")
    } else if current == "/media" {
        "/uploads".to_string()
    } else {
        return None;
    };
    if rewritten == url {
        None
    } else {
        Some(rewritten)
    }
}

fn clean(url: &str) -> String {
    url.replace('\\', "/").trim().to_string()
}

/// Apply a rewrite across every stored asset URL, one page at a time,
/// updating each changed record individually. Returns the number of rows
/// rewritten.
pub fn apply(db: &Database, direction: RewriteDirection) -> Result<usize> {
    let rewrite = match direction {
        RewriteDirection::Forward => forward,
        RewriteDirection::Backward => backward,
    };

    let mut rewritten = 0usize;
    let mut after_id = 0i64;
    loop {
        let page = db.asset_url_page(after_id, PAGE_SIZE)?;
        if page.is_empty() {
            break;
        }
        after_id = page.last().map(|(id, _)| *id).unwrap_or(after_id);
        for (id, url) in page {
            if let Some(new_url) = rewrite(&url) {
                db.update_asset_url(id, &new_url)?;
                rewritten += 1;
            }
        }
    }

    info!(?direction, rewritten, "asset URL rewrite complete");
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewMediaAsset;

    #[test]
    fn forward_rewrites_legacy_forms() {
        assert_eq!(forward("/uploads/x.jpg").as_deref(), Some("/media/x.jpg"));
        assert_eq!(forward("uploads/x.jpg").as_deref(), Some("/media/x.jpg"));
        assert_eq!(forward("/uploads").as_deref(), Some("/media"));
        assert_eq!(forward("uploads").as_deref(), Some("/media"));
        assert_eq!(forward("uploads\\sub\\x.jpg").as_deref(), Some("/media/sub/x.jpg"));
        assert_eq!(forward(" /uploads/x.jpg ").as_deref(), Some("/media/x.jpg"));
    }

    #[test]
    fn forward_ignores_canonical_and_foreign_urls() {
        assert_eq!(forward("/media/x.jpg"), None);
        assert_eq!(forward("/static/x.jpg"), None);
        assert_eq!(forward("/uploadsextra/x.jpg"), None);
        assert_eq!(forward(""), None);
        assert_eq!(forward("   "), None);
    }

    #[test]
    fn backward_rewrites_canonical_forms() {
        assert_eq!(backward("/media/x.jpg").as_deref(), Some("/uploads/x.jpg"));
        assert_eq!(backward("/media").as_deref(), Some("/uploads"));
        assert_eq!(backward("/uploads/x.jpg"), None);
        assert_eq!(backward("media/x.jpg"), None);
    }

    #[test]
    fn forward_then_backward_round_trips() {
        let original = "/uploads/x.jpg";
        let canonical = forward(original).unwrap();
        assert_eq!(backward(&canonical).as_deref(), Some(original));
    }

    #[test]
    fn forward_is_idempotent() {
        let canonical = forward("/uploads/x.jpg").unwrap();
        assert_eq!(forward(&canonical), None);
    }

    fn seed_asset(db: &Database, collection_id: i64, n: usize, url: &str) {
        db.insert_asset(&NewMediaAsset {
            filename: format!("f{n}.jpg"),
            original_name: format!("f{n}.jpg"),
            path: format!("/f{n}.jpg"),
            url: url.to_string(),
            size: 1,
            mimetype: "image/jpeg".into(),
            collection_id,
            location: None,
            exif: None,
        })
        .unwrap();
    }

    #[test]
    fn apply_rewrites_only_legacy_records_and_resumes_safely() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let collection = db.default_collection().unwrap();

        seed_asset(&db, collection.id, 0, "/uploads/a.jpg");
        seed_asset(&db, collection.id, 1, "uploads/b.jpg");
        seed_asset(&db, collection.id, 2, "/media/c.jpg");
        seed_asset(&db, collection.id, 3, "/static/d.css");

        assert_eq!(apply(&db, RewriteDirection::Forward).unwrap(), 2);

        let urls: Vec<String> =
            db.asset_url_page(0, 10).unwrap().into_iter().map(|(_, u)| u).collect();
        assert_eq!(urls, vec!["/media/a.jpg", "/media/b.jpg", "/media/c.jpg", "/static/d.css"]);

        // A second run (crash-and-resume) changes nothing.
        assert_eq!(apply(&db, RewriteDirection::Forward).unwrap(), 0);

        // Rollback restores every canonical record, including c.jpg which
        // was canonical to begin with.
        assert_eq!(apply(&db, RewriteDirection::Backward).unwrap(), 3);
    }
}
