use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, MessageId, UserId};

// -- JWT Claims --

/// JWT claims checked by the API middleware. `sub` is the platform user id
/// of the caller, matched against the operator allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub username: String,
    pub exp: usize,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// -- Purges --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PurgeRequestBody {
    #[serde(default)]
    pub author: Option<UserId>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub age_window_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureSummary {
    pub message_id: MessageId,
    pub reason: String,
    pub rate_limited: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeSummary {
    pub deleted: usize,
    pub scanned: usize,
    pub failures: Vec<FailureSummary>,
}

// -- Flags --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateFlagRequest {
    /// Message to anchor the flag at. Defaults to the newest message in the
    /// channel when omitted.
    #[serde(default)]
    pub marker: Option<MessageId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlagResponse {
    pub channel_id: ChannelId,
    pub marker: MessageId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlagStatusResponse {
    pub exists: bool,
}

// -- Commands --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Id the command message was stored under.
    pub message_id: MessageId,
    pub reply: String,
    #[serde(default)]
    pub result: Option<PurgeSummary>,
}
