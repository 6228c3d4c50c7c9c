use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use refresh_core::{
    update, AppState, AppViewModel, Caught, Effect, Generation, JobState, ListQuery, Msg, Page,
    ParentItem, PollSettings,
};
use refresh_logging::{refresh_debug, refresh_info, refresh_warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::{ApiError, RefreshApi};

/// Called once per job, a grace period after the job reports `Done`.
pub type CompletionHook = Arc<dyn Fn() + Send + Sync>;

/// The object a view binds to: start a refresh, page the list, observe snapshots.
///
/// All state lives in one task that applies messages in arrival order. Network
/// calls and timers run as separate tasks and report back as messages, so state is
/// only ever touched by the owning task. Dropping the handle tears the view down.
pub struct Orchestrator {
    msg_tx: mpsc::UnboundedSender<Msg>,
    view_rx: watch::Receiver<AppViewModel>,
    shutdown: CancellationToken,
}

impl Orchestrator {
    /// Spawns the owning task on the current tokio runtime.
    pub fn spawn(
        settings: PollSettings,
        api: Arc<dyn RefreshApi>,
        query: ListQuery,
        initial: Page<ParentItem>,
        on_completed: CompletionHook,
    ) -> Self {
        let state = AppState::new(settings, query, initial);
        let (view_tx, view_rx) = watch::channel(state.view());
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let runner = Runner {
            api,
            msg_tx: msg_tx.clone(),
            view_tx,
            job_token: shutdown.child_token(),
            shutdown: shutdown.clone(),
            on_completed,
        };
        tokio::spawn(runner.run(state, msg_rx));

        Self {
            msg_tx,
            view_rx,
            shutdown,
        }
    }

    /// Starts a new job, replacing any current one.
    pub fn start(&self) {
        self.send(Msg::StartRequested);
    }

    /// Requests the next page. A no-op while a page is loading or the list is exhausted.
    pub fn load_more(&self) {
        self.send(Msg::LoadMoreRequested);
    }

    pub fn snapshot(&self) -> AppViewModel {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppViewModel> {
        self.view_rx.clone()
    }

    /// Stops polling and discards every result that arrives afterwards.
    pub fn teardown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.send(Msg::TornDown);
        self.shutdown.cancel();
    }

    fn send(&self, msg: Msg) {
        if self.msg_tx.send(msg).is_err() {
            refresh_debug!("orchestrator already stopped; message dropped");
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.teardown();
    }
}

struct Runner {
    api: Arc<dyn RefreshApi>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    view_tx: watch::Sender<AppViewModel>,
    shutdown: CancellationToken,
    /// Cancelled when the current job is replaced or the view is torn down.
    job_token: CancellationToken,
    on_completed: CompletionHook,
}

impl Runner {
    async fn run(mut self, mut state: AppState, mut msg_rx: mpsc::UnboundedReceiver<Msg>) {
        while let Some(msg) = msg_rx.recv().await {
            let before = (
                state.poller().job().state(),
                state.poller().job().notice().is_some(),
            );
            let (next, effects) = update(state, msg);
            state = next;

            if state.consume_dirty() {
                let view = state.view();
                log_transition(before, &view);
                self.view_tx.send_replace(view);
            }

            let mut stopping = false;
            for effect in effects {
                stopping |= matches!(effect, Effect::Shutdown);
                self.execute(effect);
            }
            if stopping {
                break;
            }
        }
        refresh_info!("orchestrator stopped");
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::SubmitJob { generation } => {
                self.job_token.cancel();
                self.job_token = self.shutdown.child_token();
                refresh_info!("submitting refresh job generation={}", generation);

                let api = self.api.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = guarded(async move { api.submit_job().await }).await;
                    let _ = tx.send(Msg::JobSubmitted { generation, result });
                });
            }
            Effect::FetchStatus { generation, job_id } => {
                refresh_debug!("reading status job_id={}", job_id);
                let api = self.api.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = guarded(async move { api.fetch_status(&job_id).await }).await;
                    let _ = tx.send(Msg::StatusReceived {
                        generation,
                        result,
                        observed_at: Utc::now(),
                    });
                });
            }
            Effect::SchedulePoll { generation, after } => {
                let token = self.job_token.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {}
                        _ = tokio::time::sleep(after) => {
                            let _ = tx.send(Msg::PollTimerFired { generation });
                        }
                    }
                });
            }
            Effect::SignalCompleted { generation, after } => {
                let token = self.job_token.clone();
                let hook = self.on_completed.clone();
                tokio::spawn(signal_after(token, after, generation, hook));
            }
            Effect::FetchPage { query, cursor } => {
                refresh_debug!("loading more name={} cursor={}", query.name, cursor);
                let api = self.api.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result =
                        guarded(async move { api.fetch_page(&query, Some(&cursor)).await }).await;
                    let _ = tx.send(Msg::PageLoaded { result });
                });
            }
            Effect::Shutdown => {
                refresh_info!("tearing down orchestrator");
                self.job_token.cancel();
                self.shutdown.cancel();
            }
        }
    }
}

/// Calls `hook` once `after` has elapsed, unless `token` is cancelled first.
/// Cancellation wins when both are ready.
async fn signal_after(
    token: CancellationToken,
    after: Duration,
    generation: Generation,
    hook: CompletionHook,
) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            refresh_debug!("completion signal dropped generation={}", generation);
            false
        }
        _ = tokio::time::sleep(after) => {
            refresh_info!("signalling completion generation={}", generation);
            hook();
            true
        }
    }
}

/// Runs a network call in its own task so that a panic inside an API
/// implementation surfaces as a thrown value instead of killing the runner.
async fn guarded<T, F>(call: F) -> Result<T, Caught>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    match tokio::spawn(call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            refresh_warn!("request failed: {}", err);
            Err(err.into())
        }
        Err(err) => Err(caught_from_join(err)),
    }
}

fn caught_from_join(err: JoinError) -> Caught {
    if !err.is_panic() {
        return Caught::Thrown(None);
    }
    let payload = err.into_panic();
    refresh_warn!("request task panicked");
    Caught::Thrown(panic_text(payload.as_ref()))
}

fn panic_text(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|text| text.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

fn log_transition((state_before, had_notice): (JobState, bool), view: &AppViewModel) {
    if view.torn_down {
        return;
    }
    if let (false, Some(notice)) = (had_notice, &view.job.notice) {
        refresh_warn!("job {:?}: {}", view.job.id, notice);
    }
    if state_before == view.job.state {
        return;
    }
    match view.job.state {
        JobState::Done => refresh_info!("job {:?} done", view.job.id),
        JobState::Error => refresh_warn!(
            "job {:?} failed: {}",
            view.job.id,
            view.job.error.as_deref().unwrap_or_default()
        ),
        state => refresh_debug!("job {:?} now {:?}", view.job.id, state),
    }
}
