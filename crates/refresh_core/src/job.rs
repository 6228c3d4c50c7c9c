use std::fmt;

use chrono::{DateTime, Utc};

/// Backend-assigned identifier of one refresh run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Queued,
    Running,
    Done,
    Error,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Error)
    }

    pub fn is_active(self) -> bool {
        matches!(self, JobState::Queued | JobState::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: u32,
    pub total: u32,
}

/// One status read as decoded from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub state: JobState,
    pub progress: Option<Progress>,
    pub error: Option<String>,
    /// Backend timestamp of the last job change, in seconds since the epoch.
    pub reported_at: Option<f64>,
}

impl JobSnapshot {
    pub fn with_state(state: JobState) -> Self {
        Self {
            state,
            progress: None,
            error: None,
            reported_at: None,
        }
    }
}

pub const BACKEND_FAILED_MESSAGE: &str = "Refresh failed";

/// Client-side view of a refresh run.
///
/// Mutated only by the poller; frozen once `state` is terminal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Job {
    id: Option<JobId>,
    state: JobState,
    progress: Option<Progress>,
    error: Option<String>,
    notice: Option<String>,
    last_observed_at: Option<DateTime<Utc>>,
    reported_at: Option<f64>,
}

impl Job {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<&JobId> {
        self.id.as_ref()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn progress(&self) -> Option<Progress> {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Non-fatal message, such as a poll timeout. Does not change `state`.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn last_observed_at(&self) -> Option<DateTime<Utc>> {
        self.last_observed_at
    }

    pub fn reported_at(&self) -> Option<f64> {
        self.reported_at
    }

    pub(crate) fn mark_queued(&mut self, id: JobId) {
        if self.id.is_some() || self.state != JobState::Idle {
            return;
        }
        self.id = Some(id);
        self.state = JobState::Queued;
    }

    pub(crate) fn fail(&mut self, message: String) {
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Error;
        self.progress = None;
        self.error = Some(message);
    }

    pub(crate) fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    /// Applies a successful status read. Returns false if the job was already terminal.
    pub(crate) fn observe(&mut self, snapshot: JobSnapshot, observed_at: DateTime<Utc>) -> bool {
        if self.state.is_terminal() {
            return false;
        }

        self.state = snapshot.state;
        self.last_observed_at = Some(observed_at);
        if snapshot.reported_at.is_some() {
            self.reported_at = snapshot.reported_at;
        }

        self.progress = match (snapshot.state, snapshot.progress) {
            (JobState::Running, Some(next)) => Some(match self.progress {
                Some(prev) => Progress {
                    done: next.done.max(prev.done),
                    total: next.total,
                },
                None => next,
            }),
            (JobState::Running, None) => self.progress,
            _ => None,
        };

        if snapshot.state == JobState::Error {
            let message = snapshot
                .error
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| BACKEND_FAILED_MESSAGE.to_string());
            self.error = Some(message);
        }
        true
    }
}
