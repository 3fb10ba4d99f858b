use std::sync::Arc;

use tracing::info;

use sweep_types::{ChannelId, MessageId, UserId};

use crate::checkpoint::{CheckpointStore, FlagKey, InMemoryCheckpointStore};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::executor::{PurgeConfig, PurgeExecutor};
use crate::flags::FlagManager;
use crate::history::HistorySource;
use crate::request::{PurgeRequest, PurgeResult};

/// Entry point for the command layer: ad-hoc purges plus the global and
/// per-user flag operations.
pub struct PurgeEngine {
    executor: PurgeExecutor,
    flags: FlagManager,
}

impl PurgeEngine {
    pub fn new(
        source: Arc<dyn HistorySource>,
        store: Arc<dyn CheckpointStore>,
        clock: Arc<dyn Clock>,
        config: PurgeConfig,
    ) -> Self {
        Self {
            executor: PurgeExecutor::new(source, clock.clone(), config),
            flags: FlagManager::new(store, clock),
        }
    }

    /// In-memory flags, wall clock.
    pub fn with_defaults(source: Arc<dyn HistorySource>, config: PurgeConfig) -> Self {
        Self::new(
            source,
            Arc::new(InMemoryCheckpointStore::new()),
            Arc::new(SystemClock),
            config,
        )
    }

    pub async fn run_ad_hoc_purge(
        &self,
        channel_id: ChannelId,
        author: Option<UserId>,
        count: Option<usize>,
        age_window_days: Option<u32>,
    ) -> Result<PurgeResult> {
        let request = PurgeRequest::ad_hoc(channel_id, author, count, age_window_days);
        self.executor.execute(&request).await
    }

    pub async fn create_flag(&self, channel_id: ChannelId, name: &str, marker: MessageId) {
        self.flags.create(FlagKey::named(channel_id, name), marker).await;
    }

    pub async fn execute_flag(&self, channel_id: ChannelId, name: &str) -> Result<PurgeResult> {
        let key = FlagKey::named(channel_id, name);
        let (marker, _guard) = self.flags.resolve_and_consume(&key).await?;
        info!("Executing flag {} from message {}", key, marker);
        let request = PurgeRequest::since_marker(channel_id, marker, None);
        self.executor.execute(&request).await
    }

    pub async fn create_user_flag(&self, channel_id: ChannelId, user_id: UserId, marker: MessageId) {
        self.flags.create(FlagKey::user(channel_id, user_id), marker).await;
    }

    pub async fn execute_user_flag(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<PurgeResult> {
        let key = FlagKey::user(channel_id, user_id);
        let (marker, _guard) = self.flags.resolve_and_consume(&key).await?;
        info!("Executing user flag {} from message {}", key, marker);
        let request = PurgeRequest::since_marker(channel_id, marker, Some(user_id));
        self.executor.execute(&request).await
    }

    pub fn flag_exists(&self, channel_id: ChannelId, name: &str) -> bool {
        self.flags.exists(&FlagKey::named(channel_id, name))
    }

    pub fn user_flag_exists(&self, channel_id: ChannelId, user_id: UserId) -> bool {
        self.flags.exists(&FlagKey::user(channel_id, user_id))
    }
}
