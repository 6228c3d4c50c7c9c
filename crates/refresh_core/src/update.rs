use crate::poller::PollStep;
use crate::{AppState, Effect, Generation, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// Results addressed to a replaced job, and anything arriving after teardown,
/// are dropped without touching state.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested => {
            if state.is_torn_down() {
                return (state, Vec::new());
            }
            let generation = state.replace_job();
            state.mark_dirty();
            vec![Effect::SubmitJob { generation }]
        }
        Msg::JobSubmitted { generation, result } => {
            if !state.is_current(generation) {
                return (state, Vec::new());
            }
            let step = match result {
                Ok(id) => state.poller_mut().submitted(id),
                Err(caught) => state.poller_mut().submit_failed(&caught),
            };
            state.mark_dirty();
            step_effects(generation, step)
        }
        Msg::StatusReceived {
            generation,
            result,
            observed_at,
        } => {
            if !state.is_current(generation) {
                return (state, Vec::new());
            }
            let step = match result {
                Ok(snapshot) => state.poller_mut().status_received(snapshot, observed_at),
                Err(caught) => state.poller_mut().status_failed(&caught),
            };
            state.mark_dirty();
            step_effects(generation, step)
        }
        Msg::PollTimerFired { generation } => {
            if !state.is_current(generation) {
                return (state, Vec::new());
            }
            let notice_before = state.poller().job().notice().is_some();
            let step = state.poller_mut().timer_fired();
            if state.poller().job().notice().is_some() != notice_before {
                state.mark_dirty();
            }
            step_effects(generation, step)
        }
        Msg::LoadMoreRequested => {
            if state.is_torn_down() {
                return (state, Vec::new());
            }
            match state.list_mut().begin_load() {
                Some(cursor) => {
                    state.mark_dirty();
                    vec![Effect::FetchPage {
                        query: state.query().clone(),
                        cursor,
                    }]
                }
                None => Vec::new(),
            }
        }
        Msg::PageLoaded { result } => {
            if state.is_torn_down() || !state.list().is_loading() {
                return (state, Vec::new());
            }
            match result {
                Ok(page) => state.list_mut().apply_page(page),
                Err(caught) => state.list_mut().apply_failure(&caught),
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::TornDown => {
            if state.tear_down() {
                state.mark_dirty();
                vec![Effect::Shutdown]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}

fn step_effects(generation: Generation, step: PollStep) -> Vec<Effect> {
    match step {
        PollStep::Fetch(job_id) => vec![Effect::FetchStatus { generation, job_id }],
        PollStep::Wait(after) => vec![Effect::SchedulePoll { generation, after }],
        PollStep::Completed { after } => vec![Effect::SignalCompleted { generation, after }],
        PollStep::Halt => Vec::new(),
    }
}
