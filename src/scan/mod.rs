//! Budgeted, cancellable scanning of every span and frame.
//!
//! A scan runs as a chain of ticks on a [`TickScheduler`]. Each tick matches
//! entries until the collections are exhausted or its time budget is spent,
//! then either hands the finished [`ResultSet`] to the completion callback or
//! schedules the next tick. Spans are always scanned before frames.

mod clock;
mod results;
mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use results::{MatchEntry, MatchRef, ResultSet};
pub use scheduler::{FrameScheduler, TickFn, TickId, TickScheduler};

use results::ResultSetBuilder;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::profile::{Frame, SpanNode};
use crate::search::CompiledQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Running,
    Completed,
    Cancelled,
}

/// How far a scan has got
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanProgress {
    pub processed_spans: usize,
    pub total_spans: usize,
    pub processed_frames: usize,
    pub total_frames: usize,
    pub ticks: usize,
    pub matches: usize,
}

impl ScanProgress {
    pub fn is_done(&self) -> bool {
        self.processed_spans == self.total_spans && self.processed_frames == self.total_frames
    }
}

/// State shared between a scan's ticks and its handle
struct ScanShared {
    status: Cell<ScanStatus>,
    pending: Cell<Option<TickId>>,
    progress: Cell<ScanProgress>,
}

/// Owner's view of a running scan. Dropping the handle cancels the scan.
pub struct ScanHandle {
    shared: Rc<ScanShared>,
    scheduler: Rc<dyn TickScheduler>,
}

impl ScanHandle {
    /// Stop the scan. Its completion callback will not run after this.
    pub fn cancel(&self) {
        if self.shared.status.get() != ScanStatus::Running {
            return;
        }
        self.shared.status.set(ScanStatus::Cancelled);
        if let Some(id) = self.shared.pending.take() {
            self.scheduler.cancel_tick(id);
        }
        log::debug!("Scan cancelled at {:?}", self.shared.progress.get());
    }

    pub fn status(&self) -> ScanStatus {
        self.shared.status.get()
    }

    pub fn is_running(&self) -> bool {
        self.status() == ScanStatus::Running
    }

    pub fn progress(&self) -> ScanProgress {
        self.shared.progress.get()
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts scans against a scheduler and clock
#[derive(Clone)]
pub struct IncrementalScanner {
    scheduler: Rc<dyn TickScheduler>,
    clock: Rc<dyn Clock>,
    budget: Duration,
}

impl IncrementalScanner {
    pub fn new(scheduler: Rc<dyn TickScheduler>, clock: Rc<dyn Clock>, budget: Duration) -> Self {
        Self {
            scheduler,
            clock,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Schedule a scan of `spans` then `frames`. `on_complete` runs exactly
    /// once, with the finished results, unless the scan is cancelled first.
    pub fn start<F>(
        &self,
        query: Rc<CompiledQuery>,
        spans: Rc<[SpanNode]>,
        frames: Rc<[Frame]>,
        on_complete: F,
    ) -> ScanHandle
    where
        F: FnOnce(ResultSet) + 'static,
    {
        if let Some(e) = query.error() {
            log::warn!("Search query matches nothing: {}", e);
        }

        let progress = ScanProgress {
            total_spans: spans.len(),
            total_frames: frames.len(),
            ..ScanProgress::default()
        };
        log::debug!(
            "Starting {} scan over {} spans and {} frames",
            query.mode(),
            progress.total_spans,
            progress.total_frames
        );

        let shared = Rc::new(ScanShared {
            status: Cell::new(ScanStatus::Running),
            pending: Cell::new(None),
            progress: Cell::new(progress),
        });

        let task = ScanTask {
            query,
            spans,
            frames,
            progress,
            builder: ResultSetBuilder::new(),
            on_complete: Box::new(on_complete),
            shared: shared.clone(),
            scheduler: self.scheduler.clone(),
            clock: self.clock.clone(),
            budget: self.budget,
        };
        task.schedule();

        ScanHandle {
            shared,
            scheduler: self.scheduler.clone(),
        }
    }
}

/// The scan itself, moved from one tick closure into the next
struct ScanTask {
    query: Rc<CompiledQuery>,
    spans: Rc<[SpanNode]>,
    frames: Rc<[Frame]>,
    progress: ScanProgress,
    builder: ResultSetBuilder,
    on_complete: Box<dyn FnOnce(ResultSet)>,
    shared: Rc<ScanShared>,
    scheduler: Rc<dyn TickScheduler>,
    clock: Rc<dyn Clock>,
    budget: Duration,
}

impl ScanTask {
    fn schedule(self) {
        let scheduler = self.scheduler.clone();
        let shared = self.shared.clone();
        let id = scheduler.schedule_tick(Box::new(move || self.run_tick()));
        shared.pending.set(Some(id));
    }

    fn run_tick(mut self) {
        // A cancelled scan's tick may still fire if the scheduler ignored
        // the cancellation; it must not touch anything.
        if self.shared.status.get() != ScanStatus::Running {
            log::trace!("Ignoring tick of a stopped scan");
            return;
        }
        self.shared.pending.set(None);
        self.progress.ticks += 1;

        let started = self.clock.now();
        while self.step() {
            if self.clock.now().saturating_sub(started) > self.budget {
                break;
            }
        }

        self.progress.matches = self.builder.len();
        self.shared.progress.set(self.progress);
        log::trace!(
            "Scan tick {}: {}/{} spans, {}/{} frames",
            self.progress.ticks,
            self.progress.processed_spans,
            self.progress.total_spans,
            self.progress.processed_frames,
            self.progress.total_frames
        );

        if self.progress.is_done() {
            self.shared.status.set(ScanStatus::Completed);
            let results = self.builder.build();
            log::debug!(
                "Scan finished in {} ticks with {} matches (generation {})",
                self.progress.ticks,
                results.len(),
                results.generation()
            );
            (self.on_complete)(results);
        } else {
            self.schedule();
        }
    }

    /// Match the next entry. Returns false once everything has been scanned.
    fn step(&mut self) -> bool {
        if let Some(span) = self.spans.get(self.progress.processed_spans) {
            if let Some(m) = self.query.match_text(&span.text) {
                self.builder.add_span(span, m);
            }
            self.progress.processed_spans += 1;
            return true;
        }

        if let Some(frame) = self.frames.get(self.progress.processed_frames) {
            if let Some(m) = self.query.match_text(&frame.name) {
                self.builder.add_frame(frame, m);
            }
            self.progress.processed_frames += 1;
            return true;
        }

        false
    }
}
