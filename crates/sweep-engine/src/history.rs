//! Channel history access: the platform seam and the single-page cursor the
//! executor walks.

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

use sweep_types::{ChannelId, HistoryBound, HistoryOrder, MessageDescriptor, MessageId};

use crate::error::SourceError;

/// Largest page the platform returns for one history query.
pub const HISTORY_LIMIT: usize = 2000;

/// Parameters for one history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub channel_id: ChannelId,
    pub order: HistoryOrder,
    pub bound: Option<HistoryBound>,
    pub limit: usize,
}

/// The chat platform as seen by the purge engine.
///
/// `fetch_history` must not do any network work until the returned stream is
/// polled. Implementations should honour `limit`; the cursor enforces it
/// regardless.
pub trait HistorySource: Send + Sync {
    fn fetch_history(
        &self,
        query: HistoryQuery,
    ) -> BoxStream<'_, Result<MessageDescriptor, SourceError>>;

    fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> BoxFuture<'_, Result<(), SourceError>>;
}

/// One pass over a single page of history. Consumed once; there is no rewind
/// and no request for a second page.
pub struct HistoryCursor<'a> {
    stream: BoxStream<'a, Result<MessageDescriptor, SourceError>>,
    limit: usize,
    yielded: usize,
}

impl<'a> HistoryCursor<'a> {
    pub fn open<H: HistorySource + ?Sized>(source: &'a H, query: HistoryQuery) -> Self {
        Self {
            stream: source.fetch_history(query),
            limit: query.limit,
            yielded: 0,
        }
    }

    /// Next descriptor, or `None` once the page (or the cap) is exhausted.
    pub async fn next(&mut self) -> Option<Result<MessageDescriptor, SourceError>> {
        if self.yielded >= self.limit {
            return None;
        }
        let item = self.stream.next().await?;
        self.yielded += 1;
        Some(item)
    }

    pub fn yielded(&self) -> usize {
        self.yielded
    }
}
