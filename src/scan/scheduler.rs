use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

/// Opaque identifier of a scheduled tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickId(u64);

pub type TickFn = Box<dyn FnOnce()>;

/// Host hook for running a unit of work later, once per rendered frame or on
/// whatever cadence the host chooses.
pub trait TickScheduler {
    fn schedule_tick(&self, tick: TickFn) -> TickId;

    /// Drop a tick that has not run yet. Unknown or already-run ids are ignored.
    fn cancel_tick(&self, id: TickId);
}

struct QueuedTick {
    id: TickId,
    frame: u64,
    tick: TickFn,
}

/// Animation-frame style scheduler: the host calls [`FrameScheduler::run_frame`]
/// once per frame, and ticks scheduled while a frame runs wait for the next one.
pub struct FrameScheduler {
    queue: RefCell<VecDeque<QueuedTick>>,
    next_id: Cell<u64>,
    frame: Cell<u64>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            next_id: Cell::new(0),
            frame: Cell::new(0),
        }
    }

    /// Run every tick that was queued before this call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let frame = self.frame.get();
        self.frame.set(frame + 1);

        let mut ran = 0;
        loop {
            // Pop one at a time so a tick may schedule or cancel others
            let next = {
                let mut queue = self.queue.borrow_mut();
                match queue.front() {
                    Some(queued) if queued.frame <= frame => queue.pop_front(),
                    _ => None,
                }
            };
            let Some(queued) = next else {
                break;
            };
            log::trace!("Running tick {:?} in frame {}", queued.id, frame);
            (queued.tick)();
            ran += 1;
        }
        ran
    }

    /// Run frames until nothing is queued or `max_frames` have run.
    /// Returns the number of frames run.
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while !self.is_idle() && frames < max_frames {
            self.run_frame();
            frames += 1;
        }
        frames
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frame.get()
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.pending())
            .field("frame", &self.frame.get())
            .finish()
    }
}

impl TickScheduler for FrameScheduler {
    fn schedule_tick(&self, tick: TickFn) -> TickId {
        let id = TickId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.queue.borrow_mut().push_back(QueuedTick {
            id,
            frame: self.frame.get(),
            tick,
        });
        id
    }

    fn cancel_tick(&self, id: TickId) {
        self.queue.borrow_mut().retain(|queued| queued.id != id);
    }
}
