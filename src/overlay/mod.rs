//! Search overlay state.
//!
//! Pure state, no terminal I/O: the shared open flag, the query-keyed
//! search resource with stale-commit suppression, and the derived
//! presentation phase. The event loop in [`crate::ui::tui`] feeds events
//! in; [`crate::ui::view`] reads phases out.

pub mod pipeline;

use crate::index::ResultItem;
use pipeline::QueryToken;

/// Everything that can move the shared open flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogEvent {
    /// Pointer activation of the trigger button.
    Activate,
    /// The global shortcut; flips, so it can close as well as open.
    Shortcut,
    /// Pointer press outside the panel's content box.
    OutsideClick,
    /// The platform dismiss signal (Esc) or an explicit close affordance.
    NativeClose,
}

/// Shared dialog visibility flag.
///
/// Two writers exist and each owns one transition direction: the trigger
/// opens (or toggles via the shortcut), the overlay closes. Keeping the
/// transitions behind methods preserves that discipline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpenState {
    open: bool,
}

impl OpenState {
    pub fn is_open(self) -> bool {
        self.open
    }

    pub fn apply(&mut self, event: DialogEvent) {
        self.open = match event {
            DialogEvent::Activate => true,
            DialogEvent::Shortcut => !self.open,
            DialogEvent::OutsideClick | DialogEvent::NativeClose => false,
        };
    }
}

/// Derived result state for the current query.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResource {
    /// Query is empty; no search performed.
    Idle,
    /// Query changed; latest resolution not committed yet.
    Pending,
    /// Latest query resolved, in index rank order.
    Ready(Vec<ResultItem>),
}

/// What the overlay should render right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Closed,
    Idle,
    Searching,
    Empty,
    Results,
}

/// Query + resource owned by the overlay.
///
/// By default both survive close/reopen (reopening re-displays the last
/// search); `reset_on_close` opts out.
#[derive(Debug)]
pub struct Overlay {
    query: String,
    resource: SearchResource,
    live_token: Option<QueryToken>,
    reset_on_close: bool,
}

impl Overlay {
    pub fn new(reset_on_close: bool) -> Self {
        Self {
            query: String::new(),
            resource: SearchResource::Idle,
            live_token: None,
            reset_on_close,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Record a query mutation and the token of the pipeline run it issued.
    /// Empty queries resolve immediately to idle without index work.
    pub fn set_query(&mut self, query: String, token: QueryToken) {
        self.query = query;
        self.live_token = Some(token);
        self.resource = if self.query.is_empty() {
            SearchResource::Idle
        } else {
            SearchResource::Pending
        };
    }

    /// Apply a pipeline resolution. A resolution whose originating token no
    /// longer matches the live token was superseded and is discarded.
    /// Returns whether the visible resource changed.
    pub fn commit(&mut self, token: QueryToken, items: Vec<ResultItem>) -> bool {
        if self.live_token != Some(token) {
            tracing::debug!(?token, "stale search resolution dropped");
            return false;
        }
        if self.query.is_empty() {
            return false;
        }
        self.resource = SearchResource::Ready(items);
        true
    }

    /// Close-path bookkeeping. The dialog stays populated unless configured
    /// to reset.
    pub fn on_close(&mut self) {
        if self.reset_on_close {
            self.query.clear();
            self.resource = SearchResource::Idle;
            self.live_token = None;
        }
    }

    pub fn items(&self) -> &[ResultItem] {
        match &self.resource {
            SearchResource::Ready(items) => items,
            _ => &[],
        }
    }

    pub fn phase(&self, open: OpenState) -> Phase {
        if !open.is_open() {
            return Phase::Closed;
        }
        if self.query.is_empty() {
            return Phase::Idle;
        }
        match &self.resource {
            SearchResource::Idle | SearchResource::Pending => Phase::Searching,
            SearchResource::Ready(items) if items.is_empty() => Phase::Empty,
            SearchResource::Ready(_) => Phase::Results,
        }
    }
}
