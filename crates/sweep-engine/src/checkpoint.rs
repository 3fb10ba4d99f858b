//! Checkpoint store: the two flag tables, keyed by channel plus either a flag
//! name or a user id.
//!
//! State lives for the life of the process and starts empty. Operations on a
//! single key are atomic; nothing orders operations across different keys.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use sweep_types::{ChannelId, MessageId, UserId};

/// Identifies one flag in either table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlagKey {
    /// Global flag, any author.
    Named { channel_id: ChannelId, name: String },
    /// Per-user flag.
    User { channel_id: ChannelId, user_id: UserId },
}

impl FlagKey {
    pub fn named(channel_id: ChannelId, name: impl Into<String>) -> Self {
        FlagKey::Named {
            channel_id,
            name: name.into(),
        }
    }

    pub fn user(channel_id: ChannelId, user_id: UserId) -> Self {
        FlagKey::User {
            channel_id,
            user_id,
        }
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagKey::Named { channel_id, name } => write!(f, "#{}/{}", channel_id, name),
            FlagKey::User {
                channel_id,
                user_id,
            } => write!(f, "#{}/@{}", channel_id, user_id),
        }
    }
}

/// A recorded position in a channel's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// Exclusive lower bound for the purge that consumes this checkpoint.
    pub marker: MessageId,
    pub created_at: DateTime<Utc>,
}

/// Storage backend for flags.
pub trait CheckpointStore: Send + Sync {
    /// Insert or overwrite.
    fn set(&self, key: FlagKey, checkpoint: Checkpoint);

    /// Remove and return the checkpoint, if present.
    fn get_and_clear(&self, key: &FlagKey) -> Option<Checkpoint>;

    fn exists(&self, key: &FlagKey) -> bool;
}

/// Process-local store. Global and per-user flags are kept in separate tables.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    named: Mutex<HashMap<(ChannelId, String), Checkpoint>>,
    users: Mutex<HashMap<(ChannelId, UserId), Checkpoint>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn set(&self, key: FlagKey, checkpoint: Checkpoint) {
        match key {
            FlagKey::Named { channel_id, name } => {
                lock(&self.named).insert((channel_id, name), checkpoint);
            }
            FlagKey::User {
                channel_id,
                user_id,
            } => {
                lock(&self.users).insert((channel_id, user_id), checkpoint);
            }
        }
    }

    fn get_and_clear(&self, key: &FlagKey) -> Option<Checkpoint> {
        match key {
            FlagKey::Named { channel_id, name } => {
                lock(&self.named).remove(&(*channel_id, name.clone()))
            }
            FlagKey::User {
                channel_id,
                user_id,
            } => lock(&self.users).remove(&(*channel_id, *user_id)),
        }
    }

    fn exists(&self, key: &FlagKey) -> bool {
        match key {
            FlagKey::Named { channel_id, name } => {
                lock(&self.named).contains_key(&(*channel_id, name.clone()))
            }
            FlagKey::User {
                channel_id,
                user_id,
            } => lock(&self.users).contains_key(&(*channel_id, *user_id)),
        }
    }
}

// Each map update is a single call, so a poisoned lock still guards consistent data.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
