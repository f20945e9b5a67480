// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Uniform submit-then-poll adapter for asynchronous providers.
//!
//! Providers that hand back a task id instead of a result implement
//! [`AsyncTaskProvider`]; capability implementations run them through
//! [`PollingAdapter::run`] so callers see one awaited result either way.
//! Dropping the returned future (timeout or cancellation) abandons the task.
//!
//! Once a task is accepted the adapter never ends with a retryable error:
//! running out of polls is `PollLimitReached`, so a surrounding retry policy
//! does not submit the task again. Configuration validation keeps the poll
//! ceiling inside the per-call timeout.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::PollingConfig;
use crate::errors::{BackendError, BackendResult};

/// State of a submitted provider task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus<T> {
    Pending,
    Succeeded(T),
    Failed(String),
}

#[async_trait]
pub trait AsyncTaskProvider: Send + Sync {
    type Request: Send + Sync;
    type Output: Send;

    /// Start a task, returning the provider's task id.
    async fn submit(&self, request: &Self::Request) -> BackendResult<String>;

    async fn poll(&self, task_id: &str) -> BackendResult<TaskStatus<Self::Output>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollingAdapter {
    pub interval: Duration,
    pub max_polls: u32,
}

impl PollingAdapter {
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_polls: config.max_polls.max(1),
        }
    }

    /// Submit and poll until the task reaches a terminal state or the poll
    /// ceiling is hit. Transient poll failures count as a pending poll.
    pub async fn run<P: AsyncTaskProvider + ?Sized>(
        &self,
        provider: &P,
        request: &P::Request,
    ) -> BackendResult<P::Output> {
        let task_id = provider.submit(request).await?;
        debug!(task_id = %task_id, "Submitted asynchronous backend task");

        for poll in 1..=self.max_polls {
            tokio::time::sleep(self.interval).await;
            match provider.poll(&task_id).await {
                Ok(TaskStatus::Succeeded(output)) => {
                    debug!(task_id = %task_id, polls = poll, "Backend task succeeded");
                    return Ok(output);
                }
                Ok(TaskStatus::Failed(reason)) => return Err(BackendError::TaskFailed(reason)),
                Ok(TaskStatus::Pending) => {}
                Err(error) if error.is_transient() => {
                    warn!(task_id = %task_id, poll, error = %error, "Poll failed, will poll again");
                }
                Err(error) => return Err(error),
            }
        }

        Err(BackendError::PollLimitReached {
            polls: self.max_polls,
        })
    }
}
