use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, MessageId, UserId};

/// A message as seen in channel history. Read-only to the purge engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Direction a history query walks the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    NewestFirst,
    OldestFirst,
}

/// Exclusive lower bound for a history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryBound {
    /// Only messages with an id strictly greater than this one.
    AfterMessage(MessageId),
    /// Only messages created strictly after this instant.
    AfterTime(DateTime<Utc>),
}

impl HistoryBound {
    /// The bound expressed as an exclusive message id.
    pub fn as_message_id(&self) -> MessageId {
        match *self {
            HistoryBound::AfterMessage(id) => id,
            HistoryBound::AfterTime(ts) => MessageId::from_timestamp(ts),
        }
    }
}
