//! Status polling state machine for a single job.
//!
//! The poller never performs IO. Each method consumes one event (a submission,
//! a timer firing, a status read, a failed read) and answers with the single
//! [`PollStep`] the driver must take next. Because every step is produced by the
//! previous one, a driver that follows the steps never has more than one read or
//! timer outstanding for the job.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::classify::{classify, Caught, ErrorContext};
use crate::job::{Job, JobId, JobSnapshot, JobState};

pub const POLL_TIMEOUT_MESSAGE: &str = "Refresh timeout - please check status manually";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Upper bound on non-terminal reads before polling gives up.
    pub max_polls: u32,
    /// Grace period between observing `Done` and signalling completion.
    pub completion_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_polls: 10,
            completion_delay: Duration::from_millis(100),
        }
    }
}

/// What the driver does next for this job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Issue a status read now.
    Fetch(JobId),
    /// Arm one timer; report back through [`Poller::timer_fired`].
    Wait(Duration),
    /// Job finished; signal the caller once `after` has elapsed.
    Completed { after: Duration },
    /// Nothing further to do.
    Halt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Poller {
    job: Job,
    settings: PollSettings,
    polls: u32,
    stopped: bool,
    /// Submission sent, no answer yet.
    submitting: bool,
    in_flight: bool,
}

impl Poller {
    pub fn new(settings: PollSettings) -> Self {
        Self {
            job: Job::new(),
            settings,
            polls: 0,
            stopped: false,
            submitting: false,
            in_flight: false,
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub(crate) fn begin_submit(&mut self) {
        self.submitting = true;
    }

    /// Sets the stop flag. Every later event is discarded.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Submission succeeded: `Idle -> Queued`, then read status immediately.
    pub fn submitted(&mut self, id: JobId) -> PollStep {
        self.submitting = false;
        if self.stopped || self.job.state() != JobState::Idle {
            return PollStep::Halt;
        }
        self.job.mark_queued(id);
        self.next_read()
    }

    /// Submission failed before an id was assigned.
    pub fn submit_failed(&mut self, caught: &Caught) -> PollStep {
        self.submitting = false;
        if self.stopped || self.job.state() != JobState::Idle {
            return PollStep::Halt;
        }
        self.job.fail(classify(caught, ErrorContext::StartingRefresh));
        PollStep::Halt
    }

    pub fn timer_fired(&mut self) -> PollStep {
        if self.stopped || self.job.state().is_terminal() {
            return PollStep::Halt;
        }
        self.next_read()
    }

    pub fn status_received(
        &mut self,
        snapshot: JobSnapshot,
        observed_at: DateTime<Utc>,
    ) -> PollStep {
        if !self.take_in_flight() {
            return PollStep::Halt;
        }
        if !self.job.observe(snapshot, observed_at) {
            return PollStep::Halt;
        }

        match self.job.state() {
            JobState::Done => PollStep::Completed {
                after: self.settings.completion_delay,
            },
            JobState::Error => PollStep::Halt,
            JobState::Idle | JobState::Queued | JobState::Running => {
                self.polls += 1;
                PollStep::Wait(self.settings.interval)
            }
        }
    }

    /// A failed read is terminal for the job; no follow-up is scheduled.
    pub fn status_failed(&mut self, caught: &Caught) -> PollStep {
        if !self.take_in_flight() {
            return PollStep::Halt;
        }
        self.job.fail(classify(caught, ErrorContext::RefreshStatus));
        PollStep::Halt
    }

    fn take_in_flight(&mut self) -> bool {
        let was_in_flight = std::mem::replace(&mut self.in_flight, false);
        was_in_flight && !self.stopped
    }

    fn next_read(&mut self) -> PollStep {
        if self.in_flight {
            return PollStep::Halt;
        }
        if self.polls >= self.settings.max_polls {
            self.job.set_notice(POLL_TIMEOUT_MESSAGE);
            return PollStep::Halt;
        }
        match self.job.id() {
            Some(id) => {
                self.in_flight = true;
                PollStep::Fetch(id.clone())
            }
            None => PollStep::Halt,
        }
    }
}
