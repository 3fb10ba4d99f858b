use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use sweep_engine::{Invocation, dispatch, parse_command};
use sweep_types::ChannelId;
use sweep_types::api::{Claims, CommandRequest, CommandResponse};

use crate::auth::AppState;
use crate::messages::store_message;
use crate::purge::{purge_status, summarize};

/// POST /channels/{channel_id}/commands. The text is parsed first, then stored
/// as a message so its id can anchor any flag it creates, then dispatched.
pub async fn run_command(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CommandRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let command = match parse_command(&state.command_prefix, &req.content) {
        Ok(Some(command)) => command,
        Ok(None) => return Err(StatusCode::UNPROCESSABLE_ENTITY),
        Err(e) => {
            warn!("Rejected command from {} in #{}: {}", claims.username, channel_id, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let message = store_message(&state, channel_id, claims.sub, req.content).await?;
    info!("{} issued {:?} in #{} (message {})", claims.username, command, channel_id, message.id);

    let invocation = Invocation {
        channel_id,
        message_id: message.id,
        prefix: &state.command_prefix,
    };
    let outcome = dispatch(&state.engine, invocation, command)
        .await
        .map_err(|e| purge_status(&e))?;

    Ok(Json(CommandResponse {
        message_id: message.id,
        reply: outcome.reply,
        result: outcome.result.map(summarize),
    }))
}
