use crate::poller::{PollSettings, Poller};
use crate::view_model::{AppViewModel, JobView, ListView};
use crate::{ListPage, ListQuery, Page, ParentItem};

/// Counter distinguishing successive jobs owned by one facade.
pub type Generation = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    settings: PollSettings,
    generation: Generation,
    poller: Poller,
    query: ListQuery,
    list: ListPage<ParentItem>,
    torn_down: bool,
    dirty: bool,
}

impl AppState {
    pub fn new(settings: PollSettings, query: ListQuery, initial: Page<ParentItem>) -> Self {
        Self {
            settings,
            generation: 0,
            poller: Poller::new(settings),
            query,
            list: ListPage::seeded(initial),
            torn_down: false,
            dirty: false,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn list(&self) -> &ListPage<ParentItem> {
        &self.list
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn view(&self) -> AppViewModel {
        let job = if self.torn_down {
            JobView::default()
        } else {
            JobView::from_job(self.poller.job())
        };
        AppViewModel {
            start_enabled: !self.torn_down
                && !self.poller.is_submitting()
                && !job.state.is_active(),
            job,
            list: ListView::from_page(&self.list),
            torn_down: self.torn_down,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Replaces the current job with a fresh one and returns its generation.
    pub(crate) fn replace_job(&mut self) -> Generation {
        self.poller.stop();
        self.generation += 1;
        self.poller = Poller::new(self.settings);
        self.poller.begin_submit();
        self.generation
    }

    pub(crate) fn is_current(&self, generation: Generation) -> bool {
        !self.torn_down && generation == self.generation && !self.poller.is_stopped()
    }

    pub(crate) fn poller_mut(&mut self) -> &mut Poller {
        &mut self.poller
    }

    pub(crate) fn list_mut(&mut self) -> &mut ListPage<ParentItem> {
        &mut self.list
    }

    pub(crate) fn tear_down(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        self.poller.stop();
        true
    }
}
