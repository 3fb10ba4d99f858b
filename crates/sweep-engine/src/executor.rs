//! The scan-filter-delete loop.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use sweep_types::HistoryBound;

use crate::clock::Clock;
use crate::eligibility::{Verdict, evaluate};
use crate::error::{PurgeError, Result};
use crate::history::{HISTORY_LIMIT, HistoryCursor, HistoryQuery, HistorySource};
use crate::request::{LowerBound, PurgeFailure, PurgeRequest, PurgeResult};

#[derive(Debug, Clone)]
pub struct PurgeConfig {
    /// Page cap passed to every history query.
    pub history_limit: usize,
    /// Pause between consecutive delete calls. Zero disables pacing.
    pub delete_delay: Duration,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            history_limit: HISTORY_LIMIT,
            delete_delay: Duration::ZERO,
        }
    }
}

/// Runs purge passes against a history source.
///
/// Every network call is awaited before the next one starts: one history
/// fetch, then one delete per eligible message. A failed delete is recorded
/// and the scan carries on.
#[derive(Clone)]
pub struct PurgeExecutor {
    source: Arc<dyn HistorySource>,
    clock: Arc<dyn Clock>,
    config: PurgeConfig,
}

impl PurgeExecutor {
    /// `config.history_limit` is capped at `HISTORY_LIMIT`.
    pub fn new(source: Arc<dyn HistorySource>, clock: Arc<dyn Clock>, mut config: PurgeConfig) -> Self {
        config.history_limit = config.history_limit.min(HISTORY_LIMIT);
        Self {
            source,
            clock,
            config,
        }
    }

    pub async fn execute(&self, request: &PurgeRequest) -> Result<PurgeResult> {
        let query = HistoryQuery {
            channel_id: request.channel_id,
            order: request.order(),
            bound: self.structural_bound(request),
            limit: self.config.history_limit,
        };
        let mut cursor = HistoryCursor::open(self.source.as_ref(), query);
        let mut result = PurgeResult::default();
        let mut attempted = 0usize;

        loop {
            if request.limit.is_some_and(|limit| result.deleted >= limit) {
                debug!(
                    "Purge in #{} reached its limit of {} deletions",
                    request.channel_id, result.deleted
                );
                break;
            }

            let msg = match cursor.next().await {
                None => break,
                Some(Ok(msg)) => msg,
                Some(Err(source)) => {
                    warn!(
                        "History fetch for #{} failed after {} deletions: {}",
                        request.channel_id, result.deleted, source
                    );
                    return Err(PurgeError::History {
                        deleted: result.deleted,
                        source,
                    });
                }
            };
            result.scanned += 1;

            // Read the clock per message: a long pass can cross the retention
            // ceiling part way through.
            let verdict = evaluate(&msg, request, self.clock.now());
            if verdict != Verdict::Eligible {
                trace!("Skipping message {}: {:?}", msg.id, verdict);
                continue;
            }

            if attempted > 0 && !self.config.delete_delay.is_zero() {
                tokio::time::sleep(self.config.delete_delay).await;
            }
            attempted += 1;

            match self.source.delete_message(request.channel_id, msg.id).await {
                Ok(()) => {
                    result.deleted += 1;
                    debug!("Deleted message {} in #{}", msg.id, request.channel_id);
                }
                Err(reason) => {
                    warn!(
                        "Failed to delete message {} in #{}: {}",
                        msg.id, request.channel_id, reason
                    );
                    result.failures.push(PurgeFailure {
                        message_id: msg.id,
                        reason,
                    });
                }
            }
        }

        info!(
            "Purge in #{}: deleted {}, scanned {}, failed {}",
            request.channel_id,
            result.deleted,
            result.scanned,
            result.failures.len()
        );
        Ok(result)
    }

    /// Bound handed to the platform. Age windows become an absolute instant
    /// here and are re-checked per message by the eligibility filter.
    fn structural_bound(&self, request: &PurgeRequest) -> Option<HistoryBound> {
        match request.lower_bound {
            LowerBound::Open => None,
            LowerBound::Marker(marker) => Some(HistoryBound::AfterMessage(marker)),
            LowerBound::AgeWindow { days } => self
                .clock
                .now()
                .checked_sub_signed(chrono::Duration::days(i64::from(days)))
                .map(HistoryBound::AfterTime),
        }
    }
}
