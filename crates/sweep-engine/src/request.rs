use sweep_types::{ChannelId, HistoryOrder, MessageId, UserId};

use crate::error::SourceError;

/// Where a purge starts looking in history. A request carries either an age
/// window or a marker, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowerBound {
    /// Nothing beyond the retention ceiling.
    Open,
    /// Only messages younger than this many whole days.
    AgeWindow { days: u32 },
    /// Only messages after this one (exclusive).
    Marker(MessageId),
}

/// What to purge from one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeRequest {
    pub channel_id: ChannelId,
    /// Already-resolved author filter; `None` means every author.
    pub author: Option<UserId>,
    /// Stop after this many successful deletions.
    pub limit: Option<usize>,
    pub lower_bound: LowerBound,
}

impl PurgeRequest {
    /// Count/age driven purge of the most recent messages.
    pub fn ad_hoc(
        channel_id: ChannelId,
        author: Option<UserId>,
        limit: Option<usize>,
        age_window_days: Option<u32>,
    ) -> Self {
        Self {
            channel_id,
            author,
            limit,
            lower_bound: match age_window_days {
                Some(days) => LowerBound::AgeWindow { days },
                None => LowerBound::Open,
            },
        }
    }

    /// Everything after `marker`, optionally restricted to one author.
    pub fn since_marker(channel_id: ChannelId, marker: MessageId, author: Option<UserId>) -> Self {
        Self {
            channel_id,
            author,
            limit: None,
            lower_bound: LowerBound::Marker(marker),
        }
    }

    /// Newest-first for ad-hoc purges ("the last N messages"); oldest-first
    /// when walking forward from a marker.
    pub fn order(&self) -> HistoryOrder {
        match self.lower_bound {
            LowerBound::Marker(_) => HistoryOrder::OldestFirst,
            LowerBound::Open | LowerBound::AgeWindow { .. } => HistoryOrder::NewestFirst,
        }
    }

    pub fn age_window_days(&self) -> Option<u32> {
        match self.lower_bound {
            LowerBound::AgeWindow { days } => Some(days),
            _ => None,
        }
    }

    pub fn marker(&self) -> Option<MessageId> {
        match self.lower_bound {
            LowerBound::Marker(id) => Some(id),
            _ => None,
        }
    }
}

/// A deletion the platform refused. Recorded, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeFailure {
    pub message_id: MessageId,
    pub reason: SourceError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeResult {
    pub deleted: usize,
    /// Descriptors read from the cursor and evaluated.
    pub scanned: usize,
    /// In the order the deletions were attempted.
    pub failures: Vec<PurgeFailure>,
}

impl PurgeResult {
    pub fn rate_limited(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.reason.is_rate_limited())
            .count()
    }
}
