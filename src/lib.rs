//! Incremental search and match navigation for flame graphs and span charts.
//!
//! A [`SearchSession`] matches a query against every [`SpanNode`] and
//! [`Frame`] of a view in small, time-budgeted ticks driven by a host
//! [`TickScheduler`], publishes a new [`ResultSet`] when a scan completes, and
//! turns "next/previous match" into zoom and highlight events on an
//! [`EventChannel`].

pub mod config;
pub mod navigation;
pub mod order;
pub mod profile;
pub mod scan;
pub mod search;
pub mod session;
pub mod tui;

pub use config::SearchConfig;
pub use navigation::{
    EventChannel, HIGHLIGHT_EVENT, HighlightRole, NavCommand, NavState, NavigationController,
    NavigationEvent, ZOOM_EVENT, ZoomMode,
};
pub use order::{ResultOrderer, order_matches};
pub use profile::{
    Frame, FrameId, ProfileError, ProfileResult, ProfileSnapshot, SpanId, SpanNode, Subject,
    SubjectKind, load_profile, parse_profile,
};
pub use scan::{
    Clock, FrameScheduler, IncrementalScanner, ManualClock, MatchEntry, MatchRef, ResultSet,
    ScanHandle, ScanProgress, ScanStatus, SystemClock, TickScheduler,
};
pub use search::{CompiledQuery, MatchError, SearchMode, TextMatch};
pub use session::{MatchCounter, SearchSession, SearchState};
