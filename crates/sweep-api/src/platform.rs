//! The SQLite message store seen through the engine's `HistorySource` seam.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream};
use tracing::warn;

use sweep_db::Database;
use sweep_db::models::MessageRow;
use sweep_engine::{HistoryQuery, HistorySource, SourceError};
use sweep_types::{ChannelId, MessageDescriptor, MessageId, UserId};

#[derive(Clone)]
pub struct LocalPlatform {
    db: Arc<Database>,
}

impl LocalPlatform {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn load_page(&self, query: HistoryQuery) -> Result<Vec<MessageDescriptor>, SourceError> {
        let db = self.db.clone();
        let after = query.bound.map(|b| b.as_message_id());

        // Run blocking DB query off the async runtime
        let rows = tokio::task::spawn_blocking(move || {
            db.fetch_history(query.channel_id, query.order, after, query.limit)
        })
        .await
        .map_err(|e| SourceError::Transport(format!("history task failed: {}", e)))?
        .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(rows.iter().map(descriptor).collect())
    }
}

impl HistorySource for LocalPlatform {
    fn fetch_history(
        &self,
        query: HistoryQuery,
    ) -> BoxStream<'_, Result<MessageDescriptor, SourceError>> {
        stream::once(async move {
            match self.load_page(query).await {
                Ok(page) => page.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }

    fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> BoxFuture<'_, Result<(), SourceError>> {
        let db = self.db.clone();
        Box::pin(async move {
            let deleted = tokio::task::spawn_blocking(move || db.delete_message(channel_id, message_id))
                .await
                .map_err(|e| SourceError::Transport(format!("delete task failed: {}", e)))?
                .map_err(|e| SourceError::Transport(e.to_string()))?;

            if deleted { Ok(()) } else { Err(SourceError::NotFound) }
        })
    }
}

fn descriptor(row: &MessageRow) -> MessageDescriptor {
    let id = MessageId(row.id as u64);
    let created_at = row
        .created_at
        .parse::<chrono::DateTime<chrono::Utc>>()
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on message '{}': {}", row.created_at, row.id, e);
            id.timestamp()
        });

    MessageDescriptor {
        id,
        channel_id: ChannelId(row.channel_id as u64),
        author_id: UserId(row.author_id as u64),
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sweep_engine::{PurgeConfig, PurgeEngine};
    use sweep_types::SnowflakeGenerator;

    #[tokio::test]
    async fn engine_purges_sqlite_history() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let ids = SnowflakeGenerator::new();
        let now = Utc::now();

        let stale = ids.next_id(now - Duration::days(20));
        db.insert_message(stale, ChannelId(1), UserId(5), "old").unwrap();
        let mut fresh = Vec::new();
        for i in 0..3 {
            let id = ids.next_id(now - Duration::minutes(30 - i));
            db.insert_message(id, ChannelId(1), UserId(5), "new").unwrap();
            fresh.push(id);
        }

        let engine = PurgeEngine::with_defaults(Arc::new(LocalPlatform::new(db.clone())), PurgeConfig::default());
        let result = engine
            .run_ad_hoc_purge(ChannelId(1), Some(UserId(5)), None, None)
            .await
            .unwrap();

        assert_eq!(result.deleted, 3);
        assert_eq!(result.scanned, 4);
        let left = db.get_messages(ChannelId(1), 10).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id as u64, stale.get());
    }

    #[tokio::test]
    async fn deleting_a_missing_message_reports_not_found() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let platform = LocalPlatform::new(db);

        let err = platform.delete_message(ChannelId(1), MessageId(99)).await.unwrap_err();
        assert_eq!(err, SourceError::NotFound);
    }
}
