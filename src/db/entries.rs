use serde::Serialize;

/// A diary entry. Only the operations the data lifecycle needs live in
/// this crate; entry CRUD plumbing belongs to the API layer.
#[derive(Debug, Clone, Serialize)]
pub struct DiaryEntry {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub mood: String,
    pub category: String,
    pub entry_date: String,
    pub created_at: String,
    pub updated_at: String,
}
