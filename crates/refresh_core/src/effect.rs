use std::time::Duration;

use crate::{Generation, JobId, ListQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Submit a new job; the previous job's timers are void from here on.
    SubmitJob { generation: Generation },
    FetchStatus {
        generation: Generation,
        job_id: JobId,
    },
    SchedulePoll {
        generation: Generation,
        after: Duration,
    },
    /// Invoke the completion callback once `after` has elapsed.
    SignalCompleted {
        generation: Generation,
        after: Duration,
    },
    FetchPage { query: ListQuery, cursor: String },
    /// Cancel every pending timer and stop accepting messages.
    Shutdown,
}
