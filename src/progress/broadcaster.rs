// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::trace;

use crate::model::JobId;
use crate::progress::ProgressEvent;

/// Default number of events a slow subscriber may fall behind before it
/// starts missing them.
pub const DEFAULT_TOPIC_CAPACITY: usize = 64;

/// Per-job publish/subscribe fan-out.
///
/// Delivery is at-most-once with no replay: a subscriber only sees events
/// published after it attached, and a lagging subscriber skips what it
/// missed. Subscribers reconcile through the Job Store. A topic is dropped
/// after its terminal event, which closes every receiver.
#[derive(Debug)]
pub struct ProgressBroadcaster {
    topics: Mutex<HashMap<JobId, broadcast::Sender<ProgressEvent>>>,
    capacity: usize,
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_CAPACITY)
    }
}

impl ProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn topics(&self) -> MutexGuard<'_, HashMap<JobId, broadcast::Sender<ProgressEvent>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach to a job's topic, creating it if nobody has yet.
    pub fn subscribe(&self, job_id: JobId) -> broadcast::Receiver<ProgressEvent> {
        let capacity = self.capacity;
        self.topics()
            .entry(job_id)
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe()
    }

    /// Fire-and-forget publish. Returns how many subscribers received it.
    pub fn publish(&self, job_id: JobId, event: ProgressEvent) -> usize {
        let mut topics = self.topics();
        let delivered = match topics.get(&job_id) {
            Some(sender) => sender.send(event.clone()).unwrap_or(0),
            None => 0,
        };
        if event.is_terminal() {
            topics.remove(&job_id);
        }
        trace!(job_id = %job_id, delivered, "Published progress event");
        delivered
    }

    /// Drop a job's topic without a terminal event.
    pub fn close(&self, job_id: JobId) {
        self.topics().remove(&job_id);
    }

    pub fn subscriber_count(&self, job_id: JobId) -> usize {
        self.topics()
            .get(&job_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}
