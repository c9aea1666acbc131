//! Animation presets for common entry/exit animations
//!
//! Each preset only fixes the value range and curve. Pair it with
//! [`Animator::start`](crate::Animator::start) and a callback that writes the
//! animated property (opacity, height, scroll offset) on the target.
//!
//! ```
//! use lumen_animation::{AnimationPreset, Animator, ManualFrameScheduler};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let frames = Rc::new(ManualFrameScheduler::new());
//! let animator = Animator::new(frames.clone());
//!
//! let opacity = Rc::new(Cell::new(0.0));
//! let target = opacity.clone();
//! let _fade = animator
//!     .start(AnimationPreset::fade_in(300.0), move |v| target.set(v))
//!     .unwrap();
//!
//! frames.run_frame(0.0);
//! frames.run_frame(300.0);
//! assert_eq!(opacity.get(), 1.0);
//! ```

use crate::animation::AnimationOptions;
use crate::easing::Easing;

/// Pre-built option sets for common patterns
pub struct AnimationPreset;

impl AnimationPreset {
    // ========================================================================
    // Fade animations
    // ========================================================================

    /// Fade in from transparent to opaque
    pub fn fade_in(duration_ms: f64) -> AnimationOptions {
        AnimationOptions::new(0.0, 1.0, duration_ms).easing(Easing::EaseOut)
    }

    /// Fade out from opaque to transparent
    pub fn fade_out(duration_ms: f64) -> AnimationOptions {
        AnimationOptions::new(1.0, 0.0, duration_ms).easing(Easing::EaseIn)
    }

    // ========================================================================
    // Slide animations
    // ========================================================================

    /// Expand from zero height to `height`
    pub fn slide_down(duration_ms: f64, height: f64) -> AnimationOptions {
        AnimationOptions::new(0.0, height, duration_ms).easing(Easing::EaseOutCubic)
    }

    /// Collapse from `height` to zero
    pub fn slide_up(duration_ms: f64, height: f64) -> AnimationOptions {
        AnimationOptions::new(height, 0.0, duration_ms).easing(Easing::EaseInCubic)
    }

    // ========================================================================
    // Scroll animations
    // ========================================================================

    /// Scroll from one offset to another
    pub fn scroll_to(duration_ms: f64, from: f64, to: f64) -> AnimationOptions {
        AnimationOptions::new(from, to, duration_ms).easing(Easing::EaseInOutCubic)
    }

    /// Scroll so an element's top edge lands `offset` below the viewport top
    pub fn scroll_to_element(
        duration_ms: f64,
        current_scroll: f64,
        element_top: f64,
        offset: f64,
    ) -> AnimationOptions {
        Self::scroll_to(duration_ms, current_scroll, element_top - offset)
    }
}
