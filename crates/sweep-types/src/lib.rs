//! Shared types for the sweep workspace: snowflake ids, message descriptors,
//! history query shapes, and the HTTP request/response bodies.

pub mod api;
pub mod ids;
pub mod models;

pub use ids::{ChannelId, MessageId, ParseIdError, SnowflakeGenerator, UserId};
pub use models::{HistoryBound, HistoryOrder, MessageDescriptor};
