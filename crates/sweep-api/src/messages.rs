use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{error, warn};

use sweep_types::api::{Claims, MessageResponse, SendMessageRequest};
use sweep_types::{ChannelId, MessageId, UserId};

use crate::auth::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

/// Store a message from the caller and return its id. Shared with the command
/// route, which stores the command text before dispatching it.
pub(crate) async fn store_message(
    state: &AppState,
    channel_id: ChannelId,
    author_id: UserId,
    content: String,
) -> Result<MessageResponse, StatusCode> {
    let now = chrono::Utc::now();
    let message_id = state.ids.next_id(now);

    // Run blocking DB insert off the async runtime
    let db = state.db.clone();
    let stored = content.clone();
    tokio::task::spawn_blocking(move || db.insert_message(message_id, channel_id, author_id, &stored))
        .await
        .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
        .map_err(|e| { error!("Failed to store message in #{}: {}", channel_id, e); StatusCode::INTERNAL_SERVER_ERROR })?;

    Ok(MessageResponse {
        id: message_id,
        channel_id,
        author_id,
        content,
        created_at: message_id.timestamp(),
    })
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.content.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let message = store_message(&state, channel_id, claims.sub, req.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
    Query(query): Query<MessageQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let limit = query.limit.min(200);

    let rows = tokio::task::spawn_blocking(move || db.get_messages(channel_id, limit))
        .await
        .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let messages: Vec<MessageResponse> = rows
        .into_iter()
        .map(|row| {
            let id = MessageId(row.id as u64);
            MessageResponse {
                id,
                channel_id: ChannelId(row.channel_id as u64),
                author_id: UserId(row.author_id as u64),
                created_at: row
                    .created_at
                    .parse::<chrono::DateTime<chrono::Utc>>()
                    .unwrap_or_else(|e| {
                        warn!("Corrupt created_at '{}' on message '{}': {}", row.created_at, row.id, e);
                        id.timestamp()
                    }),
                content: row.content,
            }
        })
        .collect();

    Ok(Json(messages))
}
