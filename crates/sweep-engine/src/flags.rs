//! Flag lifecycle: create, consume, check. The only code that mutates the
//! checkpoint store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

use sweep_types::MessageId;

use crate::checkpoint::{Checkpoint, CheckpointStore, FlagKey};
use crate::clock::Clock;
use crate::error::{PurgeError, Result};

/// Held while an operation on one flag key is in flight. Operations on the
/// same key queue behind it; other keys are unaffected.
pub struct FlagGuard {
    _guard: OwnedMutexGuard<()>,
}

#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<FlagKey, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    async fn acquire(&self, key: &FlagKey) -> FlagGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Only the map holds idle entries.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        FlagGuard {
            _guard: lock.lock_owned().await,
        }
    }
}

pub struct FlagManager {
    store: Arc<dyn CheckpointStore>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks,
}

impl FlagManager {
    pub fn new(store: Arc<dyn CheckpointStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            locks: KeyedLocks::default(),
        }
    }

    /// Record `marker` (normally the id of the command message that asked for
    /// the flag) under `key`, replacing any previous checkpoint.
    pub async fn create(&self, key: FlagKey, marker: MessageId) {
        let _guard = self.locks.acquire(&key).await;
        if self.store.exists(&key) {
            debug!("Overwriting flag {}", key);
        }
        debug!("Flag {} set at message {}", key, marker);
        self.store.set(
            key,
            Checkpoint {
                marker,
                created_at: self.clock.now(),
            },
        );
    }

    /// Remove the flag and hand back its marker. The flag is gone from this
    /// point on, whatever happens to the purge that uses it; the guard keeps
    /// other operations on the same key waiting until the caller drops it.
    pub async fn resolve_and_consume(&self, key: &FlagKey) -> Result<(MessageId, FlagGuard)> {
        let guard = self.locks.acquire(key).await;
        match self.store.get_and_clear(key) {
            Some(checkpoint) => {
                debug!(
                    "Consumed flag {} (marker {}, set {})",
                    key, checkpoint.marker, checkpoint.created_at
                );
                Ok((checkpoint.marker, guard))
            }
            None => {
                warn!("Flag {} not found", key);
                Err(PurgeError::FlagNotFound { key: key.clone() })
            }
        }
    }

    pub fn exists(&self, key: &FlagKey) -> bool {
        self.store.exists(key)
    }
}
