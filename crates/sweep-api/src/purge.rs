use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info};

use sweep_engine::{PurgeError, PurgeResult};
use sweep_types::ChannelId;
use sweep_types::api::{Claims, FailureSummary, PurgeRequestBody, PurgeSummary};

use crate::auth::AppState;

pub async fn run_purge(
    State(state): State<AppState>,
    Path(channel_id): Path<ChannelId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PurgeRequestBody>,
) -> Result<impl IntoResponse, StatusCode> {
    info!(
        "{} requested purge in #{} (author {:?}, count {:?}, window {:?})",
        claims.username, channel_id, req.author, req.count, req.age_window_days
    );

    let result = state
        .engine
        .run_ad_hoc_purge(channel_id, req.author, req.count, req.age_window_days)
        .await
        .map_err(|e| purge_status(&e))?;

    Ok(Json(summarize(result)))
}

pub(crate) fn summarize(result: PurgeResult) -> PurgeSummary {
    PurgeSummary {
        deleted: result.deleted,
        scanned: result.scanned,
        failures: result
            .failures
            .into_iter()
            .map(|f| FailureSummary {
                message_id: f.message_id,
                rate_limited: f.reason.is_rate_limited(),
                reason: f.reason.to_string(),
            })
            .collect(),
    }
}

pub(crate) fn purge_status(e: &PurgeError) -> StatusCode {
    match e {
        PurgeError::FlagNotFound { .. } => StatusCode::NOT_FOUND,
        PurgeError::History { .. } => {
            error!("{}", e);
            StatusCode::BAD_GATEWAY
        }
    }
}
