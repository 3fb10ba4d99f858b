use crate::Database;
use crate::models::MessageRow;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use sweep_types::{ChannelId, HistoryOrder, MessageId, UserId};

impl Database {
    // -- Messages --

    pub fn insert_message(
        &self,
        id: MessageId,
        channel_id: ChannelId,
        author_id: UserId,
        content: &str,
    ) -> Result<()> {
        let created_at = id.timestamp().to_rfc3339();
        let (id, channel_id, author_id) = (sql_id(id.get())?, sql_id(channel_id.get())?, sql_id(author_id.get())?);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, channel_id, author_id, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, channel_id, author_id, content, created_at],
            )?;
            Ok(())
        })
    }

    /// One page of channel history, optionally strictly after `after`.
    pub fn fetch_history(
        &self,
        channel_id: ChannelId,
        order: HistoryOrder,
        after: Option<MessageId>,
        limit: usize,
    ) -> Result<Vec<MessageRow>> {
        let channel_id = sql_id(channel_id.get())?;
        // Ids at or beyond i64::MAX cannot be stored, so nothing lies after them.
        let after = match after {
            Some(id) => match i64::try_from(id.get()) {
                Ok(id) => id,
                Err(_) => return Ok(vec![]),
            },
            None => -1,
        };
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(|conn| query_history(conn, channel_id, order, after, limit))
    }

    /// Most recent messages first, for listing.
    pub fn get_messages(&self, channel_id: ChannelId, limit: u32) -> Result<Vec<MessageRow>> {
        self.fetch_history(channel_id, HistoryOrder::NewestFirst, None, limit as usize)
    }

    pub fn latest_message_id(&self, channel_id: ChannelId) -> Result<Option<MessageId>> {
        let channel_id = sql_id(channel_id.get())?;
        self.with_conn(|conn| {
            let id: Option<i64> = conn
                .query_row(
                    "SELECT MAX(id) FROM messages WHERE channel_id = ?1",
                    [channel_id],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();
            Ok(id.map(|id| MessageId(id as u64)))
        })
    }

    pub fn message_in_channel(&self, channel_id: ChannelId, id: MessageId) -> Result<bool> {
        let channel_id = sql_id(channel_id.get())?;
        let Ok(id) = i64::try_from(id.get()) else {
            return Ok(false);
        };
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM messages WHERE id = ?1 AND channel_id = ?2",
                    rusqlite::params![id, channel_id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Returns false if no such message exists in the channel.
    pub fn delete_message(&self, channel_id: ChannelId, id: MessageId) -> Result<bool> {
        let channel_id = sql_id(channel_id.get())?;
        let Ok(id) = i64::try_from(id.get()) else {
            return Ok(false);
        };
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM messages WHERE id = ?1 AND channel_id = ?2",
                rusqlite::params![id, channel_id],
            )?;
            Ok(n > 0)
        })
    }
}

fn sql_id(raw: u64) -> Result<i64> {
    i64::try_from(raw).with_context(|| format!("id {} out of range for storage", raw))
}

fn query_history(
    conn: &Connection,
    channel_id: i64,
    order: HistoryOrder,
    after: i64,
    limit: i64,
) -> Result<Vec<MessageRow>> {
    let sql = match order {
        HistoryOrder::NewestFirst => {
            "SELECT id, channel_id, author_id, content, created_at
             FROM messages
             WHERE channel_id = ?1 AND id > ?2
             ORDER BY id DESC
             LIMIT ?3"
        }
        HistoryOrder::OldestFirst => {
            "SELECT id, channel_id, author_id, content, created_at
             FROM messages
             WHERE channel_id = ?1 AND id > ?2
             ORDER BY id ASC
             LIMIT ?3"
        }
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(rusqlite::params![channel_id, after, limit], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                channel_id: row.get(1)?,
                author_id: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
