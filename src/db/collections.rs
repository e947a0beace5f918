use serde::Serialize;

/// A named group of media assets. At most one collection is the default
/// destination for uploads; the database layer enforces that on write.
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub cover_url: String,
    pub is_default: bool,
    pub created_at: String,
    pub updated_at: String,
}
