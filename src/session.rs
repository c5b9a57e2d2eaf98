use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::SearchConfig;
use crate::navigation::{EventChannel, NavCommand, NavState, NavigationController, NavigationEvent};
use crate::profile::{Frame, SpanNode};
use crate::scan::{
    Clock, IncrementalScanner, MatchEntry, MatchRef, ResultSet, ScanHandle, ScanProgress,
    TickScheduler,
};
use crate::search::{CompiledQuery, MatchError, SearchMode};

/// What the search currently shows
#[derive(Debug, Clone)]
pub struct SearchState {
    pub query: String,
    pub results: Rc<ResultSet>,
    /// Index into the navigation order of `results`
    pub selected_index: Option<usize>,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            results: Rc::new(ResultSet::empty()),
            selected_index: None,
        }
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Position shown by a match counter, e.g. `3/42`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCounter {
    /// 1-based position of the selection
    pub position: Option<usize>,
    pub total: usize,
}

impl fmt::Display for MatchCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{}/{}", position, self.total),
            None => write!(f, "-/{}", self.total),
        }
    }
}

/// Parts the scan completion callback needs to reach
struct SessionCore {
    state: SearchState,
    navigation: NavigationController,
    auto_select_first: bool,
}

/// Search over one view's frames and spans.
///
/// Owns the current [`SearchState`], restarts the scan whenever the query or
/// the data changes, and turns navigation into events on the view's channel.
/// Dropping the session cancels any scan in flight.
pub struct SearchSession {
    core: Rc<RefCell<SessionCore>>,
    scanner: IncrementalScanner,
    frames: Rc<[Frame]>,
    spans: Rc<[SpanNode]>,
    scan: Option<ScanHandle>,
    mode: SearchMode,
    query_error: Option<MatchError>,
}

impl SearchSession {
    pub fn new(
        config: SearchConfig,
        scheduler: Rc<dyn TickScheduler>,
        clock: Rc<dyn Clock>,
        channel: EventChannel,
    ) -> Self {
        let core = SessionCore {
            state: SearchState::new(),
            navigation: NavigationController::new(channel),
            auto_select_first: config.auto_select_first,
        };

        Self {
            core: Rc::new(RefCell::new(core)),
            scanner: IncrementalScanner::new(scheduler, clock, config.tick_budget),
            frames: Rc::from(Vec::new()),
            spans: Rc::from(Vec::new()),
            scan: None,
            mode: SearchMode::default(),
            query_error: None,
        }
    }

    /// Install new snapshots of the chart. An active query is searched again.
    pub fn set_data(&mut self, frames: impl Into<Rc<[Frame]>>, spans: impl Into<Rc<[SpanNode]>>) {
        self.frames = frames.into();
        self.spans = spans.into();
        log::debug!(
            "Search data replaced: {} frames, {} spans",
            self.frames.len(),
            self.spans.len()
        );

        let query = self.query();
        if !query.is_empty() {
            self.reset(&query);
            self.start_scan(&query);
        }
    }

    /// Change the query. The previous scan is cancelled and results are
    /// cleared right away; a non-empty query starts a new scan.
    pub fn set_query(&mut self, query: &str) {
        if query == self.core.borrow().state.query {
            return;
        }

        self.reset(query);
        if query.is_empty() {
            log::debug!("Search cleared");
            self.mode = SearchMode::default();
            self.query_error = None;
            return;
        }
        self.start_scan(query);
    }

    pub fn clear(&mut self) {
        self.set_query("");
    }

    fn reset(&mut self, query: &str) {
        if let Some(scan) = self.scan.take() {
            scan.cancel();
        }

        let mut core = self.core.borrow_mut();
        core.state = SearchState {
            query: query.to_string(),
            results: Rc::new(ResultSet::empty()),
            selected_index: None,
        };
    }

    fn start_scan(&mut self, query: &str) {
        let compiled = Rc::new(CompiledQuery::compile(query));
        self.mode = compiled.mode();
        self.query_error = compiled.error().cloned();

        let core = Rc::downgrade(&self.core);
        let handle = self.scanner.start(
            compiled,
            self.spans.clone(),
            self.frames.clone(),
            move |results| complete_scan(&core, results),
        );
        self.scan = Some(handle);
    }

    pub fn next(&mut self) -> Option<usize> {
        self.navigate(|nav, state| nav.next(state))
    }

    pub fn previous(&mut self) -> Option<usize> {
        self.navigate(|nav, state| nav.previous(state))
    }

    pub fn select(&mut self, index: usize) -> Option<usize> {
        self.navigate(|nav, state| nav.select(state, index))
    }

    pub fn apply(&mut self, command: NavCommand) -> Option<usize> {
        self.navigate(|nav, state| nav.apply(state, command))
    }

    fn navigate<F>(&mut self, f: F) -> Option<usize>
    where
        F: FnOnce(&mut NavigationController, &mut SearchState) -> Vec<NavigationEvent>,
    {
        let (events, channel, selected) = {
            let mut core = self.core.borrow_mut();
            let core = &mut *core;
            let events = f(&mut core.navigation, &mut core.state);
            (
                events,
                core.navigation.channel().clone(),
                core.state.selected_index,
            )
        };
        // Published after the borrow ends so listeners may read the session
        channel.publish_all(&events);
        selected
    }

    pub fn query(&self) -> String {
        self.core.borrow().state.query.clone()
    }

    pub fn state(&self) -> SearchState {
        self.core.borrow().state.clone()
    }

    pub fn results(&self) -> Rc<ResultSet> {
        self.core.borrow().state.results.clone()
    }

    /// Matches in navigation order
    pub fn ordered(&self) -> Rc<[MatchRef]> {
        let mut core = self.core.borrow_mut();
        let core = &mut *core;
        core.navigation.ordered(&core.state.results)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.core.borrow().state.selected_index
    }

    pub fn selected(&self) -> Option<MatchEntry> {
        let index = self.selected_index()?;
        let key = *self.ordered().get(index)?;
        self.results().get(key).cloned()
    }

    pub fn nav_state(&self) -> NavState {
        let core = self.core.borrow();
        core.navigation.state(&core.state)
    }

    pub fn counter(&self) -> MatchCounter {
        let core = self.core.borrow();
        MatchCounter {
            position: core.state.selected_index.map(|i| i + 1),
            total: core.state.results.len(),
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.scan.as_ref().is_some_and(ScanHandle::is_running)
    }

    pub fn scan_progress(&self) -> Option<ScanProgress> {
        self.scan.as_ref().map(ScanHandle::progress)
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Why the current regex query matches nothing, if it is malformed
    pub fn query_error(&self) -> Option<&MatchError> {
        self.query_error.as_ref()
    }

    pub fn frames(&self) -> &Rc<[Frame]> {
        &self.frames
    }

    pub fn spans(&self) -> &Rc<[SpanNode]> {
        &self.spans
    }

    /// How many times the navigation order has been computed
    pub fn orderings_computed(&self) -> usize {
        self.core.borrow().navigation.orderer().recomputations()
    }
}

fn complete_scan(core: &Weak<RefCell<SessionCore>>, results: ResultSet) {
    let Some(core) = core.upgrade() else {
        return;
    };

    let (events, channel) = {
        let mut core = core.borrow_mut();
        let core = &mut *core;
        core.state.results = Rc::new(results);
        core.state.selected_index = None;

        let events = if core.auto_select_first && !core.state.results.is_empty() {
            core.navigation.select(&mut core.state, 0)
        } else {
            Vec::new()
        };
        (events, core.navigation.channel().clone())
    };
    channel.publish_all(&events);
}
