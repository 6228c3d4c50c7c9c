use chrono::{DateTime, Utc};

use crate::{Caught, Generation, JobId, JobSnapshot, Page, ParentItem};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User asked for a refresh. Always starts a new job.
    StartRequested,
    /// Submission finished for the job started under `generation`.
    JobSubmitted {
        generation: Generation,
        result: Result<JobId, Caught>,
    },
    /// A status read resolved.
    StatusReceived {
        generation: Generation,
        result: Result<JobSnapshot, Caught>,
        observed_at: DateTime<Utc>,
    },
    /// The interval timer between two reads elapsed.
    PollTimerFired { generation: Generation },
    /// User asked for the next page.
    LoadMoreRequested,
    /// A page fetch resolved.
    PageLoaded {
        result: Result<Page<ParentItem>, Caught>,
    },
    /// The consuming view is gone.
    TornDown,
}
