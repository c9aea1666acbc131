//! Frame-driven value animations
//!
//! An [`Animator`] owns a [`FrameScheduler`] and creates [`AnimationHandle`]s.
//! A playing handle subscribes to one frame at a time. Each frame measures
//! `elapsed` against the scheduler clock at the last `play`, samples the
//! easing curve and reports the interpolated value through `on_update`.
//!
//! ```
//! use lumen_animation::{Animator, AnimationState, ManualFrameScheduler};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let frames = Rc::new(ManualFrameScheduler::new());
//! let animator = Animator::new(frames.clone());
//!
//! let values = Rc::new(RefCell::new(Vec::new()));
//! let sink = values.clone();
//! let handle = animator
//!     .tween(0.0, 100.0, 1000.0)
//!     .easing_named("linear")
//!     .on_update(move |v| sink.borrow_mut().push(v))
//!     .play()
//!     .unwrap();
//!
//! for t in [0.0, 250.0, 500.0, 750.0, 1000.0] {
//!     frames.run_frame(t);
//! }
//! assert_eq!(*values.borrow(), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
//! assert_eq!(handle.state(), AnimationState::Completed);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::frame::{FrameScheduler, FrameToken};

/// Callback receiving each interpolated value
pub type UpdateCallback = Box<dyn FnMut(f64, &AnimationControl)>;

/// Callback run when an animation reaches its end
pub type CompleteCallback = Box<dyn FnMut()>;

/// Lifecycle state of an animation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimationState {
    /// Created or reset, not scheduled
    #[default]
    Idle,
    /// Subscribed to frames
    Running,
    /// Stopped with `elapsed` retained
    Paused,
    /// Reached the end of its duration
    Completed,
    /// Stopped explicitly; `on_complete` will not run
    Cancelled,
}

impl AnimationState {
    /// Completed or cancelled
    pub fn is_terminal(self) -> bool {
        matches!(self, AnimationState::Completed | AnimationState::Cancelled)
    }
}

/// Playback direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// start -> end
    #[default]
    Forward,
    /// Samples the curve at `1 - progress`
    Reverse,
}

impl Direction {
    /// The opposite direction
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// Configuration for a single value animation
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationOptions {
    /// Value at progress 0
    pub start: f64,
    /// Value at progress 1
    pub end: f64,
    /// Duration in milliseconds
    pub duration_ms: f64,
    /// Curve applied to progress
    #[cfg_attr(feature = "serde", serde(default))]
    pub easing: Easing,
    /// Initial playback direction
    #[cfg_attr(feature = "serde", serde(default))]
    pub direction: Direction,
}

impl AnimationOptions {
    /// Linear, forward animation from `start` to `end`
    pub fn new(start: f64, end: f64, duration_ms: f64) -> Self {
        Self {
            start,
            end,
            duration_ms,
            easing: Easing::Linear,
            direction: Direction::Forward,
        }
    }

    /// Builder: set the easing curve
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Builder: set the easing curve by catalog name
    pub fn easing_named(self, name: &str) -> Result<Self> {
        Ok(self.easing(Easing::from_name(name)?))
    }

    /// Builder: set the initial direction
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Check that the options describe a playable animation
    pub fn validate(&self) -> Result<()> {
        if !self.duration_ms.is_finite() || self.duration_ms <= 0.0 {
            return Err(AnimationError::InvalidParameter(format!(
                "duration must be a positive number of milliseconds, got {}",
                self.duration_ms
            )));
        }
        if !self.start.is_finite() {
            return Err(AnimationError::InvalidParameter(format!(
                "start value must be finite, got {}",
                self.start
            )));
        }
        if !self.end.is_finite() {
            return Err(AnimationError::InvalidParameter(format!(
                "end value must be finite, got {}",
                self.end
            )));
        }
        if let Easing::CubicBezier(x1, y1, x2, y2) = self.easing {
            Easing::cubic_bezier(x1, y1, x2, y2)?;
        }
        Ok(())
    }

    /// Normalized progress after `elapsed_ms`, clamped to `[0, 1]`
    pub fn progress_at(&self, elapsed_ms: f64) -> f64 {
        (elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Interpolated value after `elapsed_ms` when playing in `direction`
    pub fn sample(&self, elapsed_ms: f64, direction: Direction) -> f64 {
        let progress = match direction {
            Direction::Forward => self.progress_at(elapsed_ms),
            Direction::Reverse => 1.0 - self.progress_at(elapsed_ms),
        };
        let eased = self.easing.apply(progress);
        self.start + (self.end - self.start) * eased
    }
}

// ============================================================================
// Shared animation state
// ============================================================================

#[derive(Clone, Copy, Debug)]
struct PendingFrame {
    token: FrameToken,
    serial: u64,
}

struct AnimationInner {
    options: AnimationOptions,
    direction: Direction,
    state: AnimationState,
    elapsed_ms: f64,
    /// Scheduler clock when the animation last started playing
    anchor_ms: f64,
    /// `elapsed_ms` at `anchor_ms`
    base_elapsed_ms: f64,
    /// The single live frame subscription, only ever set while running
    pending: Option<PendingFrame>,
    next_serial: u64,
    on_update: Option<UpdateCallback>,
    /// Set when `on_update` unwound and was dropped with the panic
    update_lost: bool,
    on_complete: Option<CompleteCallback>,
    scheduler: Rc<dyn FrameScheduler>,
}

impl AnimationInner {
    fn value(&self) -> f64 {
        self.options.sample(self.elapsed_ms, self.direction)
    }
}

type Shared = Rc<RefCell<AnimationInner>>;

/// Subscribe to the next frame. Any previous subscription is dropped first.
fn schedule(cell: &Shared) {
    unsubscribe(cell);

    let (scheduler, serial) = {
        let mut inner = cell.borrow_mut();
        inner.next_serial += 1;
        (inner.scheduler.clone(), inner.next_serial)
    };

    let weak = Rc::downgrade(cell);
    let token = scheduler.request_frame(Box::new(move || {
        if let Some(cell) = weak.upgrade() {
            on_frame(&cell, serial);
        }
    }));

    cell.borrow_mut().pending = Some(PendingFrame { token, serial });
}

fn unsubscribe(cell: &Shared) {
    let (scheduler, pending) = {
        let mut inner = cell.borrow_mut();
        (inner.scheduler.clone(), inner.pending.take())
    };
    if let Some(pending) = pending {
        scheduler.cancel_frame(pending.token);
    }
}

/// Cancels the handle if a callback unwinds out of a tick
struct TickGuard<'a> {
    cell: &'a Shared,
    armed: bool,
    in_update: bool,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let aborted = match self.cell.try_borrow_mut() {
            Ok(mut inner) => {
                // A panicking on_complete leaves the animation completed
                if inner.state == AnimationState::Running {
                    inner.state = AnimationState::Cancelled;
                }
                if self.in_update && inner.on_update.is_none() {
                    inner.update_lost = true;
                }
                inner
                    .pending
                    .take()
                    .map(|pending| (inner.scheduler.clone(), pending.token))
            }
            Err(_) => None,
        };
        if let Some((scheduler, token)) = aborted {
            scheduler.cancel_frame(token);
        }
        tracing::warn!("Animation callback panicked; frame subscription dropped");
    }
}

enum AfterTick {
    Nothing,
    Reschedule,
    Complete(Option<PendingFrame>),
}

fn on_frame(cell: &Shared, serial: u64) {
    let (value, on_update) = {
        let mut inner = cell.borrow_mut();
        // Stale frame from a subscription that was already replaced
        if inner.pending.map(|pending| pending.serial) != Some(serial) {
            return;
        }
        inner.pending = None;
        if inner.state != AnimationState::Running {
            return;
        }

        // Measured from the play anchor so rounding never accumulates across ticks
        let now = inner.scheduler.now();
        let since_anchor = (now - inner.anchor_ms).max(0.0);
        inner.elapsed_ms = (inner.base_elapsed_ms + since_anchor)
            .max(inner.elapsed_ms)
            .min(inner.options.duration_ms);

        let value = inner.value();
        tracing::trace!(
            "Animation tick: elapsed={:.3}ms value={}",
            inner.elapsed_ms,
            value
        );
        (value, inner.on_update.take())
    };

    let mut guard = TickGuard {
        cell,
        armed: true,
        in_update: false,
    };

    if let Some(mut callback) = on_update {
        let control = AnimationControl {
            inner: Rc::downgrade(cell),
        };
        guard.in_update = true;
        callback(value, &control);
        guard.in_update = false;
        let mut inner = cell.borrow_mut();
        if inner.on_update.is_none() {
            inner.on_update = Some(callback);
        }
    }

    // The callback may have paused, reset, cancelled or restarted us
    let after = {
        let mut inner = cell.borrow_mut();
        if inner.state != AnimationState::Running {
            AfterTick::Nothing
        } else if inner.elapsed_ms >= inner.options.duration_ms {
            inner.state = AnimationState::Completed;
            AfterTick::Complete(inner.pending.take())
        } else if inner.pending.is_none() {
            AfterTick::Reschedule
        } else {
            AfterTick::Nothing
        }
    };

    match after {
        AfterTick::Nothing => {}
        AfterTick::Reschedule => schedule(cell),
        AfterTick::Complete(pending) => {
            let (scheduler, on_complete) = {
                let mut inner = cell.borrow_mut();
                (inner.scheduler.clone(), inner.on_complete.take())
            };
            if let Some(pending) = pending {
                scheduler.cancel_frame(pending.token);
            }
            tracing::debug!("Animation completed");
            if let Some(mut callback) = on_complete {
                callback();
                let mut inner = cell.borrow_mut();
                if inner.on_complete.is_none() {
                    inner.on_complete = Some(callback);
                }
            }
        }
    }

    guard.armed = false;
}

fn play(cell: &Shared) {
    {
        let mut inner = cell.borrow_mut();
        let from = inner.state;
        match from {
            AnimationState::Running => return,
            AnimationState::Completed => inner.elapsed_ms = 0.0,
            AnimationState::Idle | AnimationState::Paused | AnimationState::Cancelled => {}
        }
        tracing::debug!(
            "Animation play from {:?} at elapsed={:.3}ms",
            from,
            inner.elapsed_ms
        );
        if inner.update_lost && inner.on_update.is_none() {
            tracing::warn!("Animation playing without its update callback, which panicked");
        }
        inner.state = AnimationState::Running;
        inner.anchor_ms = inner.scheduler.now();
        inner.base_elapsed_ms = inner.elapsed_ms;
    }
    schedule(cell);
}

fn pause(cell: &Shared) {
    {
        let mut inner = cell.borrow_mut();
        if inner.state != AnimationState::Running {
            return;
        }
        inner.state = AnimationState::Paused;
        tracing::debug!("Animation paused at elapsed={:.3}ms", inner.elapsed_ms);
    }
    unsubscribe(cell);
}

fn reset(cell: &Shared) {
    {
        let mut inner = cell.borrow_mut();
        inner.elapsed_ms = 0.0;
        inner.state = AnimationState::Idle;
        tracing::debug!("Animation reset");
    }
    unsubscribe(cell);
}

fn reverse(cell: &Shared) {
    let mut inner = cell.borrow_mut();
    if inner.state.is_terminal() {
        return;
    }
    inner.direction = inner.direction.flipped();
    tracing::debug!("Animation direction now {:?}", inner.direction);
}

fn cancel(cell: &Shared) {
    {
        let mut inner = cell.borrow_mut();
        if inner.state.is_terminal() {
            return;
        }
        inner.state = AnimationState::Cancelled;
        tracing::debug!("Animation cancelled at elapsed={:.3}ms", inner.elapsed_ms);
    }
    unsubscribe(cell);
}

// ============================================================================
// Animation Handle
// ============================================================================

/// One animation instance, owned by whoever created it
///
/// Dropping the handle cancels any pending frame, so callbacks never run
/// for a discarded animation.
pub struct AnimationHandle {
    inner: Shared,
}

impl AnimationHandle {
    fn new(
        scheduler: Rc<dyn FrameScheduler>,
        options: AnimationOptions,
        on_update: Option<UpdateCallback>,
        on_complete: Option<CompleteCallback>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(AnimationInner {
                direction: options.direction,
                options,
                state: AnimationState::Idle,
                elapsed_ms: 0.0,
                anchor_ms: 0.0,
                base_elapsed_ms: 0.0,
                pending: None,
                next_serial: 0,
                on_update,
                update_lost: false,
                on_complete,
                scheduler,
            })),
        }
    }

    /// Start or resume. No-op while running.
    ///
    /// Paused and cancelled animations resume from their current `elapsed`;
    /// completed animations restart from zero. An update callback that
    /// panicked is gone, so playing again logs a warning until
    /// [`set_on_update`](Self::set_on_update) installs a new one.
    pub fn play(&self) {
        play(&self.inner);
    }

    /// Stop scheduling and keep `elapsed`. Only acts while running.
    pub fn pause(&self) {
        pause(&self.inner);
    }

    /// Back to idle with `elapsed = 0`. No callbacks run.
    pub fn reset(&self) {
        reset(&self.inner);
    }

    /// Flip direction from the next tick on. Ignored once completed or cancelled.
    pub fn reverse(&self) {
        reverse(&self.inner);
    }

    /// Stop for good. `on_complete` will not run.
    pub fn cancel(&self) {
        cancel(&self.inner);
    }

    pub fn state(&self) -> AnimationState {
        self.inner.borrow().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == AnimationState::Running
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.inner.borrow().elapsed_ms
    }

    /// Normalized progress in `[0, 1]`, ignoring direction
    pub fn progress(&self) -> f64 {
        let inner = self.inner.borrow();
        inner.options.progress_at(inner.elapsed_ms)
    }

    pub fn direction(&self) -> Direction {
        self.inner.borrow().direction
    }

    /// Value at the current `elapsed` and direction
    pub fn value(&self) -> f64 {
        self.inner.borrow().value()
    }

    pub fn options(&self) -> AnimationOptions {
        self.inner.borrow().options
    }

    /// Whether a frame is currently requested for this animation
    pub fn is_scheduled(&self) -> bool {
        self.inner.borrow().pending.is_some()
    }

    /// Weak control for use inside callbacks or other components
    pub fn control(&self) -> AnimationControl {
        AnimationControl {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Replace the update callback
    pub fn set_on_update<F>(&self, mut callback: F)
    where
        F: FnMut(f64) + 'static,
    {
        let previous = {
            let mut inner = self.inner.borrow_mut();
            inner.update_lost = false;
            inner
                .on_update
                .replace(Box::new(move |value: f64, _: &AnimationControl| {
                    callback(value)
                }))
        };
        drop(previous);
    }

    /// Replace the completion callback
    pub fn set_on_complete<F>(&self, callback: F)
    where
        F: FnMut() + 'static,
    {
        let previous = self
            .inner
            .borrow_mut()
            .on_complete
            .replace(Box::new(callback));
        drop(previous);
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        let released = match self.inner.try_borrow_mut() {
            Ok(mut inner) => {
                if !inner.state.is_terminal() {
                    inner.state = AnimationState::Cancelled;
                }
                let pending = inner
                    .pending
                    .take()
                    .map(|pending| (inner.scheduler.clone(), pending.token));
                (pending, inner.on_update.take(), inner.on_complete.take())
            }
            Err(_) => (None, None, None),
        };
        let (pending, on_update, on_complete) = released;
        if let Some((scheduler, token)) = pending {
            scheduler.cancel_frame(token);
        }
        drop(on_update);
        drop(on_complete);
    }
}

impl fmt::Debug for AnimationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("AnimationHandle")
                .field("state", &inner.state)
                .field("elapsed_ms", &inner.elapsed_ms)
                .field("direction", &inner.direction)
                .field("options", &inner.options)
                .finish(),
            Err(_) => f.write_str("AnimationHandle { <ticking> }"),
        }
    }
}

// ============================================================================
// Animation Control
// ============================================================================

/// Weak reference to an animation
///
/// Handed to `on_update_with` callbacks so they can pause, cancel or reverse
/// their own animation mid-tick. Every call is a no-op once the owning
/// [`AnimationHandle`] is dropped.
#[derive(Clone)]
pub struct AnimationControl {
    inner: Weak<RefCell<AnimationInner>>,
}

impl AnimationControl {
    pub fn play(&self) {
        if let Some(cell) = self.inner.upgrade() {
            play(&cell);
        }
    }

    pub fn pause(&self) {
        if let Some(cell) = self.inner.upgrade() {
            pause(&cell);
        }
    }

    pub fn reset(&self) {
        if let Some(cell) = self.inner.upgrade() {
            reset(&cell);
        }
    }

    pub fn reverse(&self) {
        if let Some(cell) = self.inner.upgrade() {
            reverse(&cell);
        }
    }

    pub fn cancel(&self) {
        if let Some(cell) = self.inner.upgrade() {
            cancel(&cell);
        }
    }

    /// State of the animation, or `None` if its handle was dropped
    pub fn state(&self) -> Option<AnimationState> {
        let cell = self.inner.upgrade()?;
        let state = cell.borrow().state;
        Some(state)
    }

    pub fn elapsed_ms(&self) -> Option<f64> {
        let cell = self.inner.upgrade()?;
        let elapsed = cell.borrow().elapsed_ms;
        Some(elapsed)
    }

    /// Whether the owning handle is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for AnimationControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationControl")
            .field("alive", &self.is_alive())
            .finish()
    }
}

// ============================================================================
// Animator
// ============================================================================

/// Creates animations bound to one frame scheduler
#[derive(Clone)]
pub struct Animator {
    scheduler: Rc<dyn FrameScheduler>,
}

impl Animator {
    pub fn new(scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Rc<dyn FrameScheduler> {
        &self.scheduler
    }

    /// Start building an animation from `start` to `end`
    pub fn tween(&self, start: f64, end: f64, duration_ms: f64) -> AnimationBuilder {
        AnimationBuilder {
            scheduler: self.scheduler.clone(),
            options: AnimationOptions::new(start, end, duration_ms),
            easing_name: None,
            on_update: None,
            on_complete: None,
        }
    }

    /// Create an idle animation
    ///
    /// Fails with [`AnimationError::InvalidParameter`] for a non-positive
    /// duration or non-finite values, and with
    /// [`AnimationError::UnknownEasing`] if `easing` is not in the catalog.
    pub fn create<F>(
        &self,
        start: f64,
        end: f64,
        duration_ms: f64,
        easing: &str,
        on_update: F,
        on_complete: Option<CompleteCallback>,
    ) -> Result<AnimationHandle>
    where
        F: FnMut(f64) + 'static,
    {
        let mut builder = self
            .tween(start, end, duration_ms)
            .easing_named(easing)
            .on_update(on_update);
        builder.on_complete = on_complete;
        builder.build()
    }

    /// Create an animation from preset options and play it immediately
    pub fn start<F>(&self, options: AnimationOptions, on_update: F) -> Result<AnimationHandle>
    where
        F: FnMut(f64) + 'static,
    {
        let mut builder = self.tween(options.start, options.end, options.duration_ms);
        builder.options = options;
        builder.on_update(on_update).play()
    }

    /// Animate a number and play immediately
    pub fn animate_value<F>(
        &self,
        start: f64,
        end: f64,
        duration_ms: f64,
        easing: &str,
        on_update: F,
    ) -> Result<AnimationHandle>
    where
        F: FnMut(f64) + 'static,
    {
        self.tween(start, end, duration_ms)
            .easing_named(easing)
            .on_update(on_update)
            .play()
    }
}

impl fmt::Debug for Animator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animator").finish_non_exhaustive()
    }
}

/// Builder returned by [`Animator::tween`]
pub struct AnimationBuilder {
    scheduler: Rc<dyn FrameScheduler>,
    options: AnimationOptions,
    easing_name: Option<String>,
    on_update: Option<UpdateCallback>,
    on_complete: Option<CompleteCallback>,
}

impl AnimationBuilder {
    pub fn easing(mut self, easing: Easing) -> Self {
        self.options.easing = easing;
        self.easing_name = None;
        self
    }

    /// Set the easing by catalog name. Resolution happens in [`build`](Self::build).
    pub fn easing_named(mut self, name: impl Into<String>) -> Self {
        self.easing_name = Some(name.into());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.options.direction = direction;
        self
    }

    pub fn on_update<F>(mut self, mut callback: F) -> Self
    where
        F: FnMut(f64) + 'static,
    {
        self.on_update = Some(Box::new(move |value: f64, _: &AnimationControl| callback(value)));
        self
    }

    /// Update callback that can also steer its own animation
    pub fn on_update_with<F>(mut self, callback: F) -> Self
    where
        F: FnMut(f64, &AnimationControl) + 'static,
    {
        self.on_update = Some(Box::new(callback));
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Validate and create an idle animation
    pub fn build(mut self) -> Result<AnimationHandle> {
        if let Some(name) = self.easing_name.take() {
            self.options.easing = Easing::from_name(&name)?;
        }
        self.options.validate()?;
        Ok(AnimationHandle::new(
            self.scheduler,
            self.options,
            self.on_update,
            self.on_complete,
        ))
    }

    /// Validate, create and start playing
    pub fn play(self) -> Result<AnimationHandle> {
        let handle = self.build()?;
        handle.play();
        Ok(handle)
    }
}
