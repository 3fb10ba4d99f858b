//! HTTP surface for the purge engine: message posting for the local platform,
//! ad-hoc purges, flag management, and the prefix-command endpoint.

pub mod auth;
pub mod commands;
pub mod flags;
pub mod messages;
pub mod middleware;
pub mod platform;
pub mod purge;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use crate::auth::AppState;
use crate::middleware::{require_auth, require_operator};

/// All routes. Every route needs a valid token; everything except posting and
/// listing messages also needs an operator.
pub fn router(state: AppState) -> Router {
    let member_routes = Router::new().route(
        "/channels/{channel_id}/messages",
        get(messages::get_messages).post(messages::send_message),
    );

    let operator_routes = Router::new()
        .route("/channels/{channel_id}/purge", post(purge::run_purge))
        .route(
            "/channels/{channel_id}/flags/{name}",
            put(flags::create_flag).get(flags::flag_status),
        )
        .route("/channels/{channel_id}/flags/{name}/execute", post(flags::execute_flag))
        .route(
            "/channels/{channel_id}/user-flags/{user_id}",
            put(flags::create_user_flag).get(flags::user_flag_status),
        )
        .route(
            "/channels/{channel_id}/user-flags/{user_id}/execute",
            post(flags::execute_user_flag),
        )
        .route("/channels/{channel_id}/commands", post(commands::run_command))
        .layer(from_fn_with_state(state.clone(), require_operator));

    Router::new()
        .merge(member_routes)
        .merge(operator_routes)
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}
