/// Database row types; these map directly to SQLite rows.
/// Ids are snowflakes stored as signed integers.

pub struct MessageRow {
    pub id: i64,
    pub channel_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: String,
}
