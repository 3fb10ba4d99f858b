use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Platform epoch for snowflake ids: 2015-01-01T00:00:00Z in milliseconds.
pub const PLATFORM_EPOCH_MS: i64 = 1_420_070_400_000;

/// Low bits of a snowflake reserved for the per-millisecond sequence.
const SEQUENCE_BITS: u32 = 22;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid id '{0}': expected an unsigned integer")]
pub struct ParseIdError(pub String);

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map($name)
                    .map_err(|_| ParseIdError(s.to_string()))
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                $name(raw)
            }
        }
    };
}

snowflake_id!(
    /// Channel identifier.
    ChannelId
);

snowflake_id!(
    /// User (author) identifier.
    UserId
);

snowflake_id!(
    /// Message identifier. Ids increase monotonically with creation time,
    /// so ordering by id is ordering by time within a channel.
    MessageId
);

impl MessageId {
    /// Creation time encoded in the upper bits of the id.
    pub fn timestamp(self) -> DateTime<Utc> {
        let ms = (self.0 >> SEQUENCE_BITS) as i64 + PLATFORM_EPOCH_MS;
        DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Smallest id that could have been assigned at `ts`.
    /// Instants before the platform epoch clamp to zero.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        let ms = (ts.timestamp_millis() - PLATFORM_EPOCH_MS).max(0) as u64;
        MessageId(ms << SEQUENCE_BITS)
    }
}

/// Hands out strictly increasing message ids.
///
/// Ids issued within the same millisecond get consecutive sequence numbers;
/// if the wall clock steps backwards the last seen millisecond is reused so
/// ordering still holds.
#[derive(Debug, Default)]
pub struct SnowflakeGenerator {
    state: Mutex<(u64, u64)>,
}

impl SnowflakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self, now: DateTime<Utc>) -> MessageId {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (last_ms, last_seq) = *state;

        let mut ms = (now.timestamp_millis() - PLATFORM_EPOCH_MS).max(0) as u64;
        let mut seq = 0;
        if ms <= last_ms {
            ms = last_ms;
            seq = last_seq + 1;
            if seq > SEQUENCE_MASK {
                ms += 1;
                seq = 0;
            }
        }

        *state = (ms, seq);
        MessageId((ms << SEQUENCE_BITS) | seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn timestamp_survives_id_encoding() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let id = MessageId::from_timestamp(ts);
        assert_eq!(id.timestamp(), ts);
    }

    #[test]
    fn ids_order_like_time() {
        let earlier = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let later = earlier + Duration::milliseconds(1);
        assert!(MessageId::from_timestamp(earlier) < MessageId::from_timestamp(later));
    }

    #[test]
    fn pre_epoch_clamps_to_zero() {
        let ts = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(MessageId::from_timestamp(ts), MessageId(0));
    }

    #[test]
    fn generator_is_strictly_increasing() {
        let generator = SnowflakeGenerator::new();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let a = generator.next_id(now);
        let b = generator.next_id(now);
        let c = generator.next_id(now - Duration::seconds(5)); // clock stepped back
        let d = generator.next_id(now + Duration::seconds(1));

        assert!(a < b);
        assert!(b < c);
        assert!(c < d);
        assert_eq!(a.timestamp(), now);
    }

    #[test]
    fn parse_rejects_non_numeric() {
        assert_eq!("42".parse::<UserId>(), Ok(UserId(42)));
        assert!("all".parse::<UserId>().is_err());
        assert!("-3".parse::<UserId>().is_err());
    }
}
