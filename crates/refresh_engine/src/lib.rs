//! Refresh engine: HTTP access to the refresh backend and effect execution.
mod api;
mod engine;
mod types;
mod wire;

pub use api::{page_url, JobClient, PageFetcher, RefreshApi, ReqwestApi};
pub use engine::{CompletionHook, Orchestrator};
pub use types::{ApiError, ClientSettings};
pub use wire::{decode_page, decode_status, decode_submit};
