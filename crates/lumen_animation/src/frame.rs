//! Frame scheduling
//!
//! The driver never talks to a display directly. It asks a [`FrameScheduler`]
//! to run a callback on the next frame and reads the scheduler's clock to
//! measure how much time actually passed. Hosts plug in whatever drives
//! their refresh (a vsync callback, an event loop redraw, a test harness).

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Instant;

new_key_type! {
    /// Cancellation token for a requested frame
    pub struct FrameToken;
}

/// Callback run once on the next frame
pub type FrameCallback = Box<dyn FnOnce()>;

/// A source of display frames
///
/// Implementations are single-threaded: callbacks run on the thread that
/// pumps frames, one after another.
pub trait FrameScheduler {
    /// Run `callback` once on the next frame
    fn request_frame(&self, callback: FrameCallback) -> FrameToken;

    /// Drop a pending callback. Unknown or already-run tokens are ignored.
    fn cancel_frame(&self, token: FrameToken);

    /// Current frame clock in milliseconds
    fn now(&self) -> f64;
}

/// A frame scheduler pumped explicitly by its owner
///
/// Used by hosts that already own a render loop (call [`tick`](Self::tick)
/// once per redraw) and by tests, which stamp each frame with an exact
/// timestamp through [`run_frame`](Self::run_frame).
///
/// ```
/// use lumen_animation::{FrameScheduler, ManualFrameScheduler};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let scheduler = ManualFrameScheduler::new();
/// let hits = Rc::new(Cell::new(0));
/// let hits_clone = hits.clone();
/// scheduler.request_frame(Box::new(move || hits_clone.set(hits_clone.get() + 1)));
///
/// assert_eq!(scheduler.run_frame(16.0), 1);
/// assert_eq!(hits.get(), 1);
/// assert_eq!(scheduler.now(), 16.0);
/// ```
pub struct ManualFrameScheduler {
    callbacks: RefCell<SlotMap<FrameToken, FrameCallback>>,
    /// Tokens requested for the next frame, in request order
    queued: RefCell<Vec<FrameToken>>,
    /// Tokens of the frame currently running. Anything left here after a
    /// panic runs first on the next frame.
    running: RefCell<VecDeque<FrameToken>>,
    now_ms: Cell<f64>,
    origin: Instant,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self {
            callbacks: RefCell::new(SlotMap::with_key()),
            queued: RefCell::new(Vec::new()),
            running: RefCell::new(VecDeque::new()),
            now_ms: Cell::new(0.0),
            origin: Instant::now(),
        }
    }

    /// Move the clock without running a frame
    ///
    /// The clock never moves backwards; earlier timestamps are ignored.
    pub fn set_time(&self, now_ms: f64) {
        if now_ms > self.now_ms.get() {
            self.now_ms.set(now_ms);
        }
    }

    /// Run one frame stamped `now_ms`
    ///
    /// Every callback requested before this call runs in request order.
    /// Callbacks requested while the frame runs wait for the next frame.
    /// Returns the number of callbacks that ran.
    pub fn run_frame(&self, now_ms: f64) -> usize {
        self.set_time(now_ms);

        {
            let mut queued = self.queued.borrow_mut();
            self.running.borrow_mut().extend(queued.drain(..));
        }

        let mut ran = 0;
        loop {
            let Some(token) = self.running.borrow_mut().pop_front() else {
                break;
            };
            // Cancelled tokens are already gone from the map
            let Some(callback) = self.callbacks.borrow_mut().remove(token) else {
                continue;
            };
            callback();
            ran += 1;
        }

        tracing::trace!("frame at {:.3}ms ran {} callbacks", self.now_ms.get(), ran);
        ran
    }

    /// Run a frame `delta_ms` after the current clock
    pub fn advance_by(&self, delta_ms: f64) -> usize {
        self.run_frame(self.now_ms.get() + delta_ms.max(0.0))
    }

    /// Run a frame stamped with wall-clock time since this scheduler was created
    pub fn tick(&self) -> usize {
        self.run_frame(self.origin.elapsed().as_secs_f64() * 1000.0)
    }

    /// Number of callbacks waiting for the next frame
    pub fn pending_frames(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Whether any callback is waiting
    pub fn has_pending_frames(&self) -> bool {
        !self.callbacks.borrow().is_empty()
    }

    /// Drop every pending callback
    pub fn clear(&self) {
        // drain() keeps slot versions, so old tokens stay stale
        let dropped: SmallVec<[FrameCallback; 8]> = self
            .callbacks
            .borrow_mut()
            .drain()
            .map(|(_, callback)| callback)
            .collect();
        self.queued.borrow_mut().clear();
        self.running.borrow_mut().clear();
        // Callbacks may own handles whose Drop cancels frames; release them
        // after the borrows above end.
        drop(dropped);
    }
}

impl Default for ManualFrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameToken {
        let token = self.callbacks.borrow_mut().insert(callback);
        self.queued.borrow_mut().push(token);
        token
    }

    fn cancel_frame(&self, token: FrameToken) {
        let removed = self.callbacks.borrow_mut().remove(token);
        // Dropping the callback can re-enter this scheduler
        drop(removed);
    }

    fn now(&self) -> f64 {
        self.now_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<u32>>>, impl Fn(u32) -> FrameCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();
        let make = move |id: u32| -> FrameCallback {
            let log = log_clone.clone();
            Box::new(move || log.borrow_mut().push(id))
        };
        (log, make)
    }

    #[test]
    fn test_callbacks_run_in_request_order() {
        let scheduler = ManualFrameScheduler::new();
        let (log, make) = recorder();

        scheduler.request_frame(make(1));
        scheduler.request_frame(make(2));
        scheduler.request_frame(make(3));

        assert_eq!(scheduler.pending_frames(), 3);
        assert_eq!(scheduler.run_frame(16.0), 3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        assert!(!scheduler.has_pending_frames());
    }

    #[test]
    fn test_cancelled_callback_never_runs() {
        let scheduler = ManualFrameScheduler::new();
        let (log, make) = recorder();

        let first = scheduler.request_frame(make(1));
        scheduler.request_frame(make(2));
        scheduler.cancel_frame(first);

        assert_eq!(scheduler.run_frame(16.0), 1);
        assert_eq!(*log.borrow(), vec![2]);

        // Stale token is ignored
        scheduler.cancel_frame(first);
    }

    #[test]
    fn test_requests_during_frame_wait_for_next_frame() {
        let scheduler = Rc::new(ManualFrameScheduler::new());
        let count = Rc::new(Cell::new(0));

        let inner_scheduler = scheduler.clone();
        let inner_count = count.clone();
        scheduler.request_frame(Box::new(move || {
            inner_count.set(inner_count.get() + 1);
            let again = inner_count.clone();
            inner_scheduler.request_frame(Box::new(move || again.set(again.get() + 1)));
        }));

        assert_eq!(scheduler.run_frame(16.0), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.pending_frames(), 1);

        assert_eq!(scheduler.run_frame(32.0), 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let scheduler = ManualFrameScheduler::new();
        assert_eq!(scheduler.now(), 0.0);

        scheduler.run_frame(100.0);
        assert_eq!(scheduler.now(), 100.0);

        scheduler.run_frame(50.0);
        assert_eq!(scheduler.now(), 100.0);

        scheduler.advance_by(25.0);
        assert_eq!(scheduler.now(), 125.0);

        scheduler.set_time(400.0);
        assert_eq!(scheduler.now(), 400.0);
    }

    #[test]
    fn test_tick_stamps_wall_clock() {
        let scheduler = ManualFrameScheduler::new();
        let (log, make) = recorder();
        scheduler.request_frame(make(1));

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(scheduler.tick(), 1);
        assert_eq!(*log.borrow(), vec![1]);
        let first = scheduler.now();
        assert!(first >= 5.0);

        assert_eq!(scheduler.tick(), 0);
        assert!(scheduler.now() >= first);
    }

    #[test]
    fn test_callback_can_cancel_later_callback_in_same_frame() {
        let scheduler = Rc::new(ManualFrameScheduler::new());
        let (log, make) = recorder();

        let victim = Rc::new(Cell::new(None));
        let victim_clone = victim.clone();
        let inner_scheduler = scheduler.clone();
        scheduler.request_frame(Box::new(move || {
            if let Some(token) = victim_clone.get() {
                inner_scheduler.cancel_frame(token);
            }
        }));
        victim.set(Some(scheduler.request_frame(make(7))));

        assert_eq!(scheduler.run_frame(16.0), 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_panicking_callback_keeps_rest_of_frame() {
        let scheduler = ManualFrameScheduler::new();
        let (log, make) = recorder();

        scheduler.request_frame(Box::new(|| panic!("boom")));
        scheduler.request_frame(make(2));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            scheduler.run_frame(16.0);
        }));
        assert!(result.is_err());
        assert!(log.borrow().is_empty());

        assert_eq!(scheduler.run_frame(32.0), 1);
        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn test_clear_drops_pending() {
        let scheduler = ManualFrameScheduler::new();
        let (log, make) = recorder();

        scheduler.request_frame(make(1));
        scheduler.request_frame(make(2));
        scheduler.clear();

        assert_eq!(scheduler.pending_frames(), 0);
        assert_eq!(scheduler.run_frame(16.0), 0);
        assert!(log.borrow().is_empty());
    }
}
