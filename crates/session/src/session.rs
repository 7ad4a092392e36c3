//! Session state owned by the controller

use crate::phase::LoadingPhase;
use serde::Serialize;
use storybook_core::{PageOutline, StoryPage};

/// Whether a story is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Active,
}

/// Read-only view of the session for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub idea: String,
    pub pages: Vec<StoryPage>,
    pub current_index: usize,
    pub loading: Option<LoadingPhase>,
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn loading_message(&self) -> Option<&'static str> {
        self.loading.map(|phase| phase.message())
    }

    pub fn current_page(&self) -> Option<&StoryPage> {
        self.pages.get(self.current_index)
    }

    pub fn has_next(&self) -> bool {
        self.current_index + 1 < self.pages.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current_index > 0 && !self.pages.is_empty()
    }
}

/// Identifies one page load so late results can be recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoadTicket {
    pub epoch: u64,
    pub seq: u64,
    pub index: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Session {
    idea: String,
    pages: Vec<StoryPage>,
    current_index: usize,
    loading: Option<LoadingPhase>,
    error: Option<String>,
    /// Bumped by every story creation and restart
    epoch: u64,
    /// Bumped by every page load within an epoch
    load_seq: u64,
}

impl Session {
    pub fn state(&self) -> SessionState {
        if self.pages.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Active
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_page(&self) -> Option<&StoryPage> {
        self.pages.get(self.current_index)
    }

    /// Resets everything for a new idea and returns the new epoch
    pub fn begin_story(&mut self, idea: &str) -> u64 {
        self.reset();
        self.idea = idea.to_string();
        self.loading = Some(LoadingPhase::Story);
        self.epoch
    }

    /// Installs generated pages, unless the session moved on
    pub fn install_story(&mut self, epoch: u64, outlines: Vec<PageOutline>) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.pages = outlines.into_iter().map(StoryPage::from).collect();
        self.current_index = 0;
        true
    }

    pub fn fail_story(&mut self, epoch: u64, message: &str) {
        if epoch == self.epoch {
            self.loading = None;
            self.error = Some(message.to_string());
        }
    }

    /// Clears pages, index, idea, error and loading
    pub fn reset(&mut self) {
        self.idea.clear();
        self.pages.clear();
        self.current_index = 0;
        self.loading = None;
        self.error = None;
        self.epoch += 1;
        self.load_seq = 0;
    }

    /// Moves one page forward or back if that page exists
    pub fn step(&mut self, forward: bool) -> Option<usize> {
        if self.state() != SessionState::Active {
            return None;
        }
        let target = if forward {
            self.current_index + 1
        } else {
            self.current_index.checked_sub(1)?
        };
        if target >= self.pages.len() {
            return None;
        }
        self.current_index = target;
        Some(target)
    }

    /// Starts a page load and returns its ticket with a copy of the page
    pub fn begin_load(&mut self, index: usize) -> Option<(LoadTicket, StoryPage)> {
        let page = self.pages.get(index)?.clone();
        self.load_seq += 1;
        Some((
            LoadTicket {
                epoch: self.epoch,
                seq: self.load_seq,
                index,
            },
            page,
        ))
    }

    /// True while `ticket` is the latest load of the live session
    pub fn is_latest(&self, ticket: &LoadTicket) -> bool {
        ticket.epoch == self.epoch && ticket.seq == self.load_seq
    }

    pub fn set_loading(&mut self, ticket: &LoadTicket, phase: LoadingPhase) {
        if self.is_latest(ticket) {
            self.loading = Some(phase);
        }
    }

    /// Stores a loaded page; results from an abandoned session are dropped
    pub fn install_page(&mut self, ticket: &LoadTicket, page: StoryPage) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        match self.pages.get_mut(ticket.index) {
            Some(slot) => {
                *slot = page;
                self.is_latest(ticket) && self.current_index == ticket.index
            }
            None => false,
        }
    }

    pub fn finish_load(&mut self, ticket: &LoadTicket, error: Option<&str>) {
        if !self.is_latest(ticket) {
            return;
        }
        self.loading = None;
        if let Some(message) = error {
            self.error = Some(message.to_string());
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            idea: self.idea.clone(),
            pages: self.pages.clone(),
            current_index: self.current_index,
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}
