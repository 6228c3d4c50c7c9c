use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use refresh_core::{
    update, AppState, Caught, Effect, Generation, JobId, JobSnapshot, JobState, ListQuery, Msg,
    Page, PollSettings, Progress, AUTH_FAILED_MESSAGE, POLL_TIMEOUT_MESSAGE,
};

fn init_logging() {
    refresh_logging::initialize_for_tests();
}

fn settings() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(1000),
        max_polls: 10,
        completion_delay: Duration::from_millis(100),
    }
}

fn new_state() -> AppState {
    AppState::new(settings(), ListQuery::new("ai"), Page::last(Vec::new()))
}

fn start(state: AppState) -> (AppState, Generation) {
    let (state, effects) = update(state, Msg::StartRequested);
    let generation = match effects.as_slice() {
        [Effect::SubmitJob { generation }] => *generation,
        other => panic!("unexpected effects {other:?}"),
    };
    (state, generation)
}

fn submitted(state: AppState, generation: Generation, id: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::JobSubmitted {
            generation,
            result: Ok(JobId::new(id)),
        },
    )
}

fn status(
    state: AppState,
    generation: Generation,
    snapshot: JobSnapshot,
) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusReceived {
            generation,
            result: Ok(snapshot),
            observed_at: Utc::now(),
        },
    )
}

fn count_status_reads(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::FetchStatus { .. }))
        .count()
}

#[test]
fn start_submits_a_job_without_leaving_idle() {
    init_logging();
    let (mut state, generation) = start(new_state());
    assert_eq!(generation, 1);
    assert!(state.consume_dirty());
    assert_eq!(state.view().job.state, JobState::Idle);
}

#[test]
fn start_is_disabled_until_the_submission_answers() {
    init_logging();
    let (state, generation) = start(new_state());
    assert!(!state.view().start_enabled);

    let (state, _) = update(
        state,
        Msg::JobSubmitted {
            generation,
            result: Err(Caught::error("POST /refresh/async 503")),
        },
    );
    let view = state.view();
    assert_eq!(view.job.state, JobState::Error);
    assert!(view.start_enabled);
}

#[test]
fn published_view_does_not_depend_on_the_change_flag() {
    init_logging();
    let (mut state, _) = start(new_state());
    let before = state.view();
    assert!(state.consume_dirty());
    assert_eq!(state.view(), before);
}

#[test]
fn backend_timestamp_reaches_the_view() {
    init_logging();
    let (state, generation) = start(new_state());
    let (state, _) = submitted(state, generation, "j1");
    let snapshot = JobSnapshot {
        reported_at: Some(1700000000.5),
        ..JobSnapshot::with_state(JobState::Running)
    };
    let (state, _) = status(state, generation, snapshot);
    assert_eq!(state.view().job.reported_at, Some(1700000000.5));
}

#[test]
fn submission_queues_the_job_and_reads_status_immediately() {
    init_logging();
    let (state, generation) = start(new_state());
    let (state, effects) = submitted(state, generation, "j1");

    assert_eq!(
        effects,
        vec![Effect::FetchStatus {
            generation,
            job_id: JobId::new("j1"),
        }]
    );
    let view = state.view();
    assert_eq!(view.job.state, JobState::Queued);
    assert_eq!(view.job.id.as_deref(), Some("j1"));
    assert_eq!(
        view.job.status_text.as_deref(),
        Some("Refresh started (job: j1)")
    );
    assert!(!view.start_enabled);
}

#[test]
fn queued_then_done_reads_twice_and_signals_once() {
    init_logging();
    let (state, generation) = start(new_state());
    let (state, mut all_effects) = submitted(state, generation, "j1");

    let (state, effects) = status(state, generation, JobSnapshot::with_state(JobState::Queued));
    assert_eq!(
        effects,
        vec![Effect::SchedulePoll {
            generation,
            after: Duration::from_millis(1000),
        }]
    );
    all_effects.extend(effects);

    let (state, effects) = update(state, Msg::PollTimerFired { generation });
    all_effects.extend(effects);

    let (state, effects) = status(state, generation, JobSnapshot::with_state(JobState::Done));
    assert_eq!(
        effects,
        vec![Effect::SignalCompleted {
            generation,
            after: Duration::from_millis(100),
        }]
    );
    all_effects.extend(effects);

    assert_eq!(count_status_reads(&all_effects), 2);
    let view = state.view();
    assert_eq!(view.job.state, JobState::Done);
    assert_eq!(view.job.status_text.as_deref(), Some("Refresh complete"));
    assert!(view.job.last_observed_at.is_some());
    assert!(view.start_enabled);

    // A stray timer after the terminal read schedules nothing.
    let (_, effects) = update(state, Msg::PollTimerFired { generation });
    assert!(effects.is_empty());
}

#[test]
fn running_progress_is_shown_in_status_text() {
    init_logging();
    let (state, generation) = start(new_state());
    let (state, _) = submitted(state, generation, "j1");
    let snapshot = JobSnapshot {
        progress: Some(Progress { done: 2, total: 5 }),
        ..JobSnapshot::with_state(JobState::Running)
    };
    let (state, _) = status(state, generation, snapshot);

    let view = state.view();
    assert_eq!(view.job.progress, Some(Progress { done: 2, total: 5 }));
    assert_eq!(view.job.status_text.as_deref(), Some("Updating… (2/5)"));
}

#[test]
fn unauthorized_submission_is_classified() {
    init_logging();
    let (state, generation) = start(new_state());
    let (state, effects) = update(
        state,
        Msg::JobSubmitted {
            generation,
            result: Err(Caught::error("401 Unauthorized")),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.job.state, JobState::Error);
    assert_eq!(view.job.error.as_deref(), Some(AUTH_FAILED_MESSAGE));
}

#[test]
fn non_error_status_failure_uses_generic_text_and_stops() {
    init_logging();
    let (state, generation) = start(new_state());
    let (state, _) = submitted(state, generation, "j1");
    let (state, effects) = update(
        state,
        Msg::StatusReceived {
            generation,
            result: Err(Caught::thrown("String error")),
            observed_at: Utc::now(),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.job.state, JobState::Error);
    assert_eq!(view.job.error.as_deref(), Some("Refresh status failed"));
}

#[test]
fn backend_error_state_is_terminal() {
    init_logging();
    let (state, generation) = start(new_state());
    let (state, _) = submitted(state, generation, "j1");
    let snapshot = JobSnapshot {
        error: Some("seed file missing".to_string()),
        ..JobSnapshot::with_state(JobState::Error)
    };
    let (state, effects) = status(state, generation, snapshot);

    assert!(effects.is_empty());
    assert_eq!(state.view().job.error.as_deref(), Some("seed file missing"));

    let (state, effects) = status(state, generation, JobSnapshot::with_state(JobState::Done));
    assert!(effects.is_empty());
    assert_eq!(state.view().job.state, JobState::Error);
}

#[test]
fn teardown_discards_in_flight_status() {
    init_logging();
    let (state, generation) = start(new_state());
    let (state, _) = submitted(state, generation, "j1");

    let (mut state, effects) = update(state, Msg::TornDown);
    assert_eq!(effects, vec![Effect::Shutdown]);
    assert!(state.consume_dirty());
    let frozen = state.clone();

    let (state, effects) = status(state, generation, JobSnapshot::with_state(JobState::Done));
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::PollTimerFired { generation });
    assert!(effects.is_empty());
    assert_eq!(state, frozen);

    let view = state.view();
    assert!(view.torn_down);
    assert_eq!(view.job.state, JobState::Idle);
    assert!(!view.start_enabled);
}

#[test]
fn start_after_teardown_is_ignored() {
    init_logging();
    let (state, _) = update(new_state(), Msg::TornDown);
    let (state, effects) = update(state, Msg::StartRequested);
    assert!(effects.is_empty());
    assert_eq!(state.generation(), 0);

    let (_, effects) = update(state, Msg::TornDown);
    assert!(effects.is_empty());
}

#[test]
fn results_for_a_replaced_job_are_dropped() {
    init_logging();
    let (state, first) = start(new_state());
    let (state, _) = submitted(state, first, "old");
    let (state, second) = start(state);
    assert_ne!(first, second);

    let (state, effects) = status(state, first, JobSnapshot::with_state(JobState::Done));
    assert!(effects.is_empty());
    assert_eq!(state.view().job.state, JobState::Idle);
    assert_eq!(state.view().job.id, None);

    let (state, effects) = submitted(state, second, "new");
    assert_eq!(count_status_reads(&effects), 1);
    assert_eq!(state.view().job.id.as_deref(), Some("new"));
}

#[test]
fn poll_bound_surfaces_timeout_without_error() {
    init_logging();
    let settings = PollSettings {
        max_polls: 3,
        ..settings()
    };
    let state = AppState::new(settings, ListQuery::new("ai"), Page::last(Vec::new()));
    let (state, generation) = start(state);
    let (mut state, mut effects) = submitted(state, generation, "j1");

    let mut reads = 0;
    while count_status_reads(&effects) == 1 {
        reads += 1;
        let (next, _) = status(state, generation, JobSnapshot::with_state(JobState::Running));
        let (next, next_effects) = update(next, Msg::PollTimerFired { generation });
        state = next;
        effects = next_effects;
    }

    assert_eq!(reads, 3);
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.job.state, JobState::Running);
    assert_eq!(view.job.notice.as_deref(), Some(POLL_TIMEOUT_MESSAGE));
    assert_eq!(view.job.error, None);
}
