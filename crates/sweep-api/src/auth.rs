use std::collections::HashSet;
use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header, encode};

use sweep_db::Database;
use sweep_engine::PurgeEngine;
use sweep_types::api::Claims;
use sweep_types::{SnowflakeGenerator, UserId};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub engine: PurgeEngine,
    pub ids: SnowflakeGenerator,
    pub jwt_secret: String,
    /// Users allowed to run purges and flag commands.
    pub operators: HashSet<UserId>,
    pub command_prefix: String,
}

impl AppStateInner {
    pub fn is_operator(&self, user_id: UserId) -> bool {
        self.operators.contains(&user_id)
    }
}

/// Mint a 30-day token for `user_id`. Tokens are normally issued by whatever
/// fronts the platform; this is used by tooling and tests.
pub fn create_token(secret: &str, user_id: UserId, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
