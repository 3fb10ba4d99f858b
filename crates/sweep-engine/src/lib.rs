//! Sweep purge engine.
//!
//! Selects and deletes ranges of channel history under the platform's limits:
//! - 14-day bulk-deletion ceiling, checked per message against a fresh clock
//! - single history page per pass (no continuation)
//! - one delete call at a time; failures are collected, never raised
//!
//! Flags record a position in a channel so a later purge can remove
//! everything posted after it, for all authors or one user. Flags live in
//! memory and are spent the moment they are executed.

pub mod checkpoint;
pub mod clock;
pub mod command;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod executor;
pub mod flags;
pub mod history;
pub mod request;

#[cfg(test)]
mod testing;

pub use checkpoint::{Checkpoint, CheckpointStore, FlagKey, InMemoryCheckpointStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, CommandOutcome, Invocation, dispatch, parse_command};
pub use engine::PurgeEngine;
pub use error::{CommandError, PurgeError, SourceError};
pub use executor::{PurgeConfig, PurgeExecutor};
pub use history::{HISTORY_LIMIT, HistoryCursor, HistoryQuery, HistorySource};
pub use request::{LowerBound, PurgeFailure, PurgeRequest, PurgeResult};
