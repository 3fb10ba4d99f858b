use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info, warn};

use sweep_types::api::{Claims, CreateFlagRequest, FlagResponse, FlagStatusResponse};
use sweep_types::{ChannelId, MessageId, UserId};

use crate::auth::AppState;
use crate::purge::{purge_status, summarize};

/// Marker for a flag created over HTTP: the requested message, which must be
/// in this channel, or else the newest message in the channel at call time.
async fn resolve_marker(
    state: &AppState,
    channel_id: ChannelId,
    requested: Option<MessageId>,
) -> Result<MessageId, StatusCode> {
    let db = state.db.clone();

    if let Some(marker) = requested {
        let found = tokio::task::spawn_blocking(move || db.message_in_channel(channel_id, marker))
            .await
            .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        if !found {
            warn!("Marker {} is not a message in #{}", marker, channel_id);
            return Err(StatusCode::BAD_REQUEST);
        }
        return Ok(marker);
    }

    let latest = tokio::task::spawn_blocking(move || db.latest_message_id(channel_id))
        .await
        .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Empty channel: anchor at the current instant.
    Ok(latest.unwrap_or_else(|| MessageId::from_timestamp(chrono::Utc::now())))
}

pub async fn create_flag(
    State(state): State<AppState>,
    Path((channel_id, name)): Path<(ChannelId, String)>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateFlagRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let marker = resolve_marker(&state, channel_id, req.marker).await?;
    state.engine.create_flag(channel_id, &name, marker).await;
    info!("{} created flag '{}' in #{} at {}", claims.username, name, channel_id, marker);

    Ok((StatusCode::CREATED, Json(FlagResponse { channel_id, marker })))
}

pub async fn flag_status(
    State(state): State<AppState>,
    Path((channel_id, name)): Path<(ChannelId, String)>,
) -> impl IntoResponse {
    Json(FlagStatusResponse {
        exists: state.engine.flag_exists(channel_id, &name),
    })
}

pub async fn execute_flag(
    State(state): State<AppState>,
    Path((channel_id, name)): Path<(ChannelId, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    info!("{} executing flag '{}' in #{}", claims.username, name, channel_id);
    let result = state
        .engine
        .execute_flag(channel_id, &name)
        .await
        .map_err(|e| purge_status(&e))?;

    Ok(Json(summarize(result)))
}

pub async fn create_user_flag(
    State(state): State<AppState>,
    Path((channel_id, user_id)): Path<(ChannelId, UserId)>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateFlagRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let marker = resolve_marker(&state, channel_id, req.marker).await?;
    state.engine.create_user_flag(channel_id, user_id, marker).await;
    info!("{} created user flag for {} in #{} at {}", claims.username, user_id, channel_id, marker);

    Ok((StatusCode::CREATED, Json(FlagResponse { channel_id, marker })))
}

pub async fn user_flag_status(
    State(state): State<AppState>,
    Path((channel_id, user_id)): Path<(ChannelId, UserId)>,
) -> impl IntoResponse {
    Json(FlagStatusResponse {
        exists: state.engine.user_flag_exists(channel_id, user_id),
    })
}

pub async fn execute_user_flag(
    State(state): State<AppState>,
    Path((channel_id, user_id)): Path<(ChannelId, UserId)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    info!("{} executing user flag for {} in #{}", claims.username, user_id, channel_id);
    let result = state
        .engine
        .execute_user_flag(channel_id, user_id)
        .await
        .map_err(|e| purge_status(&e))?;

    Ok(Json(summarize(result)))
}
