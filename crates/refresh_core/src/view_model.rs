use chrono::{DateTime, Utc};

use crate::{Job, JobState, ListPage, ParentItem, Progress};

/// Snapshot handed to whatever paints the refresh control and the list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub job: JobView,
    pub list: ListView,
    /// Advisory: false while a job is queued or running.
    pub start_enabled: bool,
    pub torn_down: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobView {
    pub id: Option<String>,
    pub state: JobState,
    pub progress: Option<Progress>,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub last_observed_at: Option<DateTime<Utc>>,
    /// Backend clock of the last status read, seconds since the epoch.
    pub reported_at: Option<f64>,
    pub status_text: Option<String>,
}

impl JobView {
    pub(crate) fn from_job(job: &Job) -> Self {
        Self {
            id: job.id().map(|id| id.to_string()),
            state: job.state(),
            progress: job.progress(),
            error: job.error().map(ToOwned::to_owned),
            notice: job.notice().map(ToOwned::to_owned),
            last_observed_at: job.last_observed_at(),
            reported_at: job.reported_at(),
            status_text: status_text(job),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListView {
    pub items: Vec<ParentItem>,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl ListView {
    pub(crate) fn from_page(page: &ListPage<ParentItem>) -> Self {
        Self {
            items: page.items().to_vec(),
            has_more: page.has_more(),
            loading: page.is_loading(),
            error: page.error().map(ToOwned::to_owned),
        }
    }
}

fn status_text(job: &Job) -> Option<String> {
    match (job.state(), job.progress()) {
        (JobState::Running, Some(progress)) => Some(format!(
            "Updating… ({}/{})",
            progress.done, progress.total
        )),
        (JobState::Done, _) => Some("Refresh complete".to_string()),
        (JobState::Queued, _) => Some(format!(
            "Refresh started (job: {})",
            job.id().map(|id| id.as_str()).unwrap_or("unknown")
        )),
        _ => None,
    }
}
