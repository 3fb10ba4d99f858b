//! In-memory platform and clocks used by the engine's unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream};

use sweep_types::{ChannelId, HistoryOrder, MessageDescriptor, MessageId, UserId};

use crate::clock::Clock;
use crate::error::SourceError;
use crate::history::{HistoryQuery, HistorySource};

pub struct MemoryPlatform {
    messages: Mutex<Vec<MessageDescriptor>>,
    failing: Mutex<HashMap<MessageId, SourceError>>,
    history_error: Mutex<Option<SourceError>>,
    deleted: Mutex<Vec<MessageId>>,
    authors: Mutex<HashMap<MessageId, UserId>>,
    fetches: AtomicU64,
    seq: AtomicU64,
    respect_limit: bool,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            failing: Mutex::new(HashMap::new()),
            history_error: Mutex::new(None),
            deleted: Mutex::new(Vec::new()),
            authors: Mutex::new(HashMap::new()),
            fetches: AtomicU64::new(0),
            seq: AtomicU64::new(1),
            respect_limit: true,
        }
    }

    /// Return the whole channel regardless of the requested limit.
    pub fn ignore_limit(mut self) -> Self {
        self.respect_limit = false;
        self
    }

    /// Add a message created at `at`. Ids follow creation time, whatever
    /// order messages are posted in.
    pub fn post(&self, channel_id: ChannelId, author_id: UserId, at: DateTime<Utc>) -> MessageId {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let id = MessageId(MessageId::from_timestamp(at).0 + seq);
        self.authors.lock().unwrap().insert(id, author_id);
        self.messages.lock().unwrap().push(MessageDescriptor {
            id,
            channel_id,
            author_id,
            created_at: at,
        });
        id
    }

    pub fn fail_deletion(&self, id: MessageId, reason: SourceError) {
        self.failing.lock().unwrap().insert(id, reason);
    }

    pub fn fail_history(&self, reason: SourceError) {
        *self.history_error.lock().unwrap() = Some(reason);
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.deleted.lock().unwrap().clone()
    }

    /// Author of a posted message, deleted or not.
    pub fn author_of(&self, id: MessageId) -> Option<UserId> {
        self.authors.lock().unwrap().get(&id).copied()
    }

    pub fn remaining(&self, channel_id: ChannelId) -> Vec<MessageId> {
        let mut ids: Vec<MessageId> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    fn page(&self, query: HistoryQuery) -> Vec<Result<MessageDescriptor, SourceError>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.history_error.lock().unwrap().clone() {
            return vec![Err(err)];
        }

        let after = query.bound.map(|b| b.as_message_id());
        let mut page: Vec<MessageDescriptor> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.channel_id == query.channel_id)
            .filter(|m| after.is_none_or(|a| m.id > a))
            .cloned()
            .collect();

        match query.order {
            HistoryOrder::NewestFirst => page.sort_by(|a, b| b.id.cmp(&a.id)),
            HistoryOrder::OldestFirst => page.sort_by(|a, b| a.id.cmp(&b.id)),
        }
        if self.respect_limit {
            page.truncate(query.limit);
        }
        page.into_iter().map(Ok).collect()
    }
}

impl HistorySource for MemoryPlatform {
    fn fetch_history(
        &self,
        query: HistoryQuery,
    ) -> BoxStream<'_, Result<MessageDescriptor, SourceError>> {
        stream::once(async move { self.page(query) })
            .flat_map(stream::iter)
            .boxed()
    }

    fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> BoxFuture<'_, Result<(), SourceError>> {
        Box::pin(async move {
            if let Some(err) = self.failing.lock().unwrap().get(&message_id) {
                return Err(err.clone());
            }
            let mut messages = self.messages.lock().unwrap();
            let before = messages.len();
            messages.retain(|m| !(m.id == message_id && m.channel_id == channel_id));
            if messages.len() == before {
                return Err(SourceError::NotFound);
            }
            self.deleted.lock().unwrap().push(message_id);
            Ok(())
        })
    }
}

/// Clock that moves forward by `step` every time it is read.
pub struct SteppingClock {
    start: DateTime<Utc>,
    step: Duration,
    reads: AtomicU64,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            start,
            step,
            reads: AtomicU64::new(0),
        }
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        self.start + self.step * n as i32
    }
}
