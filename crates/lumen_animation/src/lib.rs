//! Lumen Animation System
//!
//! Easing curves and frame-driven value animations.
//!
//! # Features
//!
//! - **Easing Catalog**: Quad, cubic, quart, elastic, back and CSS cubic-bezier curves, resolvable by name
//! - **Delta-Time Driver**: Animations advance by real elapsed time, so throttled frames never stretch them
//! - **Explicit Handles**: Play, pause, reset, reverse and cancel with an observable state
//! - **Pluggable Frames**: Any `FrameScheduler` drives ticks; `ManualFrameScheduler` makes tests deterministic
//! - **Groups**: Owned collections for bulk cancel and pause
//! - **Presets**: Fade, slide and scroll option sets

pub mod animation;
pub mod easing;
pub mod error;
pub mod frame;
pub mod group;
pub mod presets;

pub use animation::{
    AnimationBuilder, AnimationControl, AnimationHandle, AnimationOptions, AnimationState,
    Animator, CompleteCallback, Direction, UpdateCallback,
};
pub use easing::Easing;
pub use error::{AnimationError, Result};
pub use frame::{FrameCallback, FrameScheduler, FrameToken, ManualFrameScheduler};
pub use group::{AnimationGroup, AnimationKey};
pub use presets::AnimationPreset;
