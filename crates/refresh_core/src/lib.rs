//! Refresh core: pure job polling and list pagination state machines.
mod classify;
mod effect;
mod job;
mod list;
mod msg;
mod poller;
mod state;
mod update;
mod view_model;

pub use classify::{
    classify, Caught, ErrorContext, AUTH_FAILED_MESSAGE, SERVER_ERROR_MESSAGE,
};
pub use effect::Effect;
pub use job::{Job, JobId, JobSnapshot, JobState, Progress, BACKEND_FAILED_MESSAGE};
pub use list::{ListPage, ListQuery, Page, ParentItem, DEFAULT_PAGE_SIZE};
pub use msg::Msg;
pub use poller::{PollSettings, PollStep, Poller, POLL_TIMEOUT_MESSAGE};
pub use state::{AppState, Generation};
pub use update::update;
pub use view_model::{AppViewModel, JobView, ListView};
