//! Match selection and "jump to next/previous match".
//!
//! Selecting a match never draws anything: it publishes a zoom event and a
//! highlight event for the match's frame or span on the view's
//! [`EventChannel`], and the renderer acts on them as it sees fit. Targets
//! that no longer exist by the time the renderer looks are its problem to
//! ignore.

mod channel;

pub use channel::{EventChannel, Listener, ListenerId};

use serde::Serialize;
use std::rc::Rc;

use crate::order::ResultOrderer;
use crate::profile::Subject;
use crate::scan::{MatchRef, ResultSet};
use crate::session::SearchState;

pub const ZOOM_EVENT: &str = "zoom";
pub const HIGHLIGHT_EVENT: &str = "highlight";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomMode {
    /// Zoom just enough to fit the target
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightRole {
    Selected,
}

/// What the renderer is asked to do. Serializes as
/// `{"kind": "frame"|"span", "target": {..}, "mode"|"role": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NavigationEvent {
    Zoom {
        #[serde(flatten)]
        target: Subject,
        mode: ZoomMode,
    },
    Highlight {
        #[serde(flatten)]
        target: Subject,
        role: HighlightRole,
    },
}

impl NavigationEvent {
    /// Channel name the event is published under
    pub fn name(&self) -> &'static str {
        match self {
            NavigationEvent::Zoom { .. } => ZOOM_EVENT,
            NavigationEvent::Highlight { .. } => HIGHLIGHT_EVENT,
        }
    }

    pub fn target(&self) -> &Subject {
        match self {
            NavigationEvent::Zoom { target, .. } | NavigationEvent::Highlight { target, .. } => {
                target
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// No query, or a query with no results yet
    Idle,
    HasResultsNoSelection,
    HasResultsSelected(usize),
}

/// Decides which match is selected and which events that selection produces.
///
/// Methods return the events instead of publishing them so callers can
/// release their own borrows first; [`NavigationController::dispatch`] sends
/// them on the channel.
#[derive(Debug)]
pub struct NavigationController {
    channel: EventChannel,
    orderer: ResultOrderer,
}

impl NavigationController {
    pub fn new(channel: EventChannel) -> Self {
        Self {
            channel,
            orderer: ResultOrderer::new(),
        }
    }

    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    /// Navigation order of the current results
    pub fn ordered(&mut self, results: &ResultSet) -> Rc<[MatchRef]> {
        self.orderer.ordered(results)
    }

    pub fn orderer(&self) -> &ResultOrderer {
        &self.orderer
    }

    pub fn state(&self, state: &SearchState) -> NavState {
        if state.results.is_empty() {
            return NavState::Idle;
        }
        match state.selected_index {
            Some(i) => NavState::HasResultsSelected(i),
            None => NavState::HasResultsNoSelection,
        }
    }

    /// Select the `index`-th match in navigation order. Out-of-range indices
    /// leave the state untouched and produce no events.
    pub fn select(&mut self, state: &mut SearchState, index: usize) -> Vec<NavigationEvent> {
        let ordered = self.ordered(&state.results);
        let Some(entry) = ordered.get(index).and_then(|key| state.results.get(*key)) else {
            log::debug!("Ignoring selection of match {} of {}", index, ordered.len());
            return Vec::new();
        };

        let target = entry.subject.clone();
        state.selected_index = Some(index);
        log::debug!(
            "Selected match {}/{}: {} '{}'",
            index + 1,
            ordered.len(),
            target.kind(),
            target.text()
        );

        vec![
            NavigationEvent::Zoom {
                target: target.clone(),
                mode: ZoomMode::Min,
            },
            NavigationEvent::Highlight {
                target,
                role: HighlightRole::Selected,
            },
        ]
    }

    pub fn next(&mut self, state: &mut SearchState) -> Vec<NavigationEvent> {
        let len = state.results.len();
        if len == 0 {
            return Vec::new();
        }
        let index = match state.selected_index {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.select(state, index)
    }

    pub fn previous(&mut self, state: &mut SearchState) -> Vec<NavigationEvent> {
        let len = state.results.len();
        if len == 0 {
            return Vec::new();
        }
        let index = match state.selected_index {
            Some(i) if i > 0 && i < len => i - 1,
            _ => len - 1,
        };
        self.select(state, index)
    }

    pub fn apply(&mut self, state: &mut SearchState, command: NavCommand) -> Vec<NavigationEvent> {
        match command {
            NavCommand::Next => self.next(state),
            NavCommand::Previous => self.previous(state),
        }
    }

    pub fn dispatch(&self, events: &[NavigationEvent]) {
        self.channel.publish_all(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Frame, FrameId, SpanId, SpanNode};
    use crate::scan::{FrameScheduler, IncrementalScanner, ManualClock};
    use crate::search::CompiledQuery;
    use std::cell::RefCell;
    use std::time::Duration;

    fn state_for(query: &str, spans: Vec<SpanNode>, frames: Vec<Frame>) -> SearchState {
        let scheduler = Rc::new(FrameScheduler::new());
        let scanner = IncrementalScanner::new(
            scheduler.clone(),
            Rc::new(ManualClock::new()),
            Duration::from_millis(12),
        );
        let out = Rc::new(RefCell::new(None));
        let sink = out.clone();
        let _handle = scanner.start(
            Rc::new(CompiledQuery::compile(query)),
            spans.into(),
            frames.into(),
            move |results| *sink.borrow_mut() = Some(results),
        );
        scheduler.run_until_idle(100);

        let mut state = SearchState::new();
        state.query = query.to_string();
        state.results = Rc::new(out.borrow_mut().take().unwrap());
        state
    }

    fn three_frames() -> SearchState {
        state_for(
            "run",
            vec![],
            vec![
                Frame::new("run_a", 0.0, 1.0, 0, FrameId(1)),
                Frame::new("run_b", 1.0, 2.0, 0, FrameId(2)),
                Frame::new("run_c", 2.0, 3.0, 0, FrameId(3)),
            ],
        )
    }

    #[test]
    fn test_next_on_empty_is_no_op() {
        let mut nav = NavigationController::new(EventChannel::new());
        let mut state = SearchState::new();

        assert!(nav.next(&mut state).is_empty());
        assert!(nav.previous(&mut state).is_empty());
        assert_eq!(state.selected_index, None);
        assert_eq!(nav.state(&state), NavState::Idle);
    }

    #[test]
    fn test_next_wraps() {
        let mut nav = NavigationController::new(EventChannel::new());
        let mut state = three_frames();
        assert_eq!(nav.state(&state), NavState::HasResultsNoSelection);

        nav.next(&mut state);
        assert_eq!(state.selected_index, Some(0));
        nav.next(&mut state);
        nav.next(&mut state);
        assert_eq!(state.selected_index, Some(2));
        nav.next(&mut state);
        assert_eq!(state.selected_index, Some(0));
        assert_eq!(nav.state(&state), NavState::HasResultsSelected(0));
    }

    #[test]
    fn test_previous_wraps() {
        let mut nav = NavigationController::new(EventChannel::new());
        let mut state = three_frames();

        nav.previous(&mut state);
        assert_eq!(state.selected_index, Some(2));
        nav.previous(&mut state);
        assert_eq!(state.selected_index, Some(1));
        nav.previous(&mut state);
        nav.previous(&mut state);
        assert_eq!(state.selected_index, Some(2));
    }

    #[test]
    fn test_select_frame_events() {
        let mut nav = NavigationController::new(EventChannel::new());
        let mut state = three_frames();

        let events = nav.select(&mut state, 1);
        assert_eq!(events.len(), 2);
        match &events[0] {
            NavigationEvent::Zoom { target, mode } => {
                assert_eq!(target.text(), "run_b");
                assert_eq!(*mode, ZoomMode::Min);
            }
            other => panic!("expected zoom, got {other:?}"),
        }
        assert_eq!(events[1].name(), HIGHLIGHT_EVENT);
        assert_eq!(events[1].target().text(), "run_b");
    }

    #[test]
    fn test_select_span_events() {
        let mut nav = NavigationController::new(EventChannel::new());
        let mut state = state_for(
            "query",
            vec![SpanNode::new("db.query", 0.0, 5.0, 0, SpanId(9))],
            vec![],
        );

        let events = nav.select(&mut state, 0);
        let json = serde_json::to_value(&events).unwrap();
        assert_eq!(json[0]["kind"], "span");
        assert_eq!(json[0]["mode"], "min");
        assert_eq!(json[0]["target"]["span_id"], 9);
        assert_eq!(json[1]["kind"], "span");
        assert_eq!(json[1]["role"], "selected");
    }

    #[test]
    fn test_out_of_range_select_is_ignored() {
        let mut nav = NavigationController::new(EventChannel::new());
        let mut state = three_frames();

        assert!(nav.select(&mut state, 3).is_empty());
        assert_eq!(state.selected_index, None);
    }

    #[test]
    fn test_dispatch_publishes_on_channel() {
        let channel = EventChannel::new();
        let zooms = Rc::new(RefCell::new(Vec::new()));
        let sink = zooms.clone();
        channel.subscribe(
            ZOOM_EVENT,
            Rc::new(move |event: &NavigationEvent| {
                sink.borrow_mut().push(event.target().text().to_string())
            }),
        );

        let mut nav = NavigationController::new(channel);
        let mut state = three_frames();
        let events = nav.next(&mut state);
        nav.dispatch(&events);

        assert_eq!(*zooms.borrow(), vec!["run_a".to_string()]);
    }
}
