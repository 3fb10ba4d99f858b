//! Per-message inclusion rules.

use chrono::{DateTime, Utc};

use sweep_types::MessageDescriptor;

use crate::request::PurgeRequest;

/// Messages this many whole days old or older cannot be bulk-deleted by the
/// platform. Applies on top of any window the caller asks for.
pub const RETENTION_CEILING_DAYS: i64 = 14;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Eligible,
    WrongAuthor,
    PastRetentionCeiling,
    OutsideWindow,
}

/// Whole days between creation and `now`, rounded down.
pub fn age_days(msg: &MessageDescriptor, now: DateTime<Utc>) -> i64 {
    (now - msg.created_at).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Checks run in order: author, retention ceiling, requested window. The
/// ceiling is checked before the window so a 30-day request still stops at
/// 13 days.
pub fn evaluate(msg: &MessageDescriptor, request: &PurgeRequest, now: DateTime<Utc>) -> Verdict {
    if request.author.is_some_and(|author| author != msg.author_id) {
        return Verdict::WrongAuthor;
    }

    let age = age_days(msg, now);
    if age >= RETENTION_CEILING_DAYS {
        return Verdict::PastRetentionCeiling;
    }

    if let Some(window) = request.age_window_days() {
        if age >= i64::from(window) {
            return Verdict::OutsideWindow;
        }
    }

    Verdict::Eligible
}

pub fn is_eligible(msg: &MessageDescriptor, request: &PurgeRequest, now: DateTime<Utc>) -> bool {
    evaluate(msg, request, now) == Verdict::Eligible
}
