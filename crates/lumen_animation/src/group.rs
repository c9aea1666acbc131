//! Owned collections of animations
//!
//! A page or widget that starts several animations keeps them in an
//! [`AnimationGroup`] so it can stop them together when it goes away.
//! Dropping the group drops every handle, which cancels their frames.

use slotmap::{new_key_type, SlotMap};

use crate::animation::{AnimationHandle, AnimationState};

new_key_type! {
    /// Handle to an animation stored in a group
    pub struct AnimationKey;
}

/// A set of animations owned by one component
#[derive(Debug, Default)]
pub struct AnimationGroup {
    animations: SlotMap<AnimationKey, AnimationHandle>,
}

impl AnimationGroup {
    pub fn new() -> Self {
        Self {
            animations: SlotMap::with_key(),
        }
    }

    /// Take ownership of an animation
    pub fn insert(&mut self, handle: AnimationHandle) -> AnimationKey {
        self.animations.insert(handle)
    }

    pub fn get(&self, key: AnimationKey) -> Option<&AnimationHandle> {
        self.animations.get(key)
    }

    /// Give the animation back to the caller
    pub fn remove(&mut self, key: AnimationKey) -> Option<AnimationHandle> {
        self.animations.remove(key)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnimationKey, &AnimationHandle)> {
        self.animations.iter()
    }

    /// Cancel every animation; they stay in the group
    pub fn cancel_all(&self) {
        tracing::debug!("AnimationGroup: cancel_all({})", self.animations.len());
        for (_, handle) in self.animations.iter() {
            handle.cancel();
        }
    }

    /// Pause every running animation
    pub fn pause_all(&self) {
        for (_, handle) in self.animations.iter() {
            handle.pause();
        }
    }

    /// Resume every paused animation. Idle and finished ones are left alone.
    pub fn resume_all(&self) {
        for (_, handle) in self.animations.iter() {
            if handle.state() == AnimationState::Paused {
                handle.play();
            }
        }
    }

    /// Whether any animation is running
    pub fn has_active(&self) -> bool {
        self.animations.iter().any(|(_, handle)| handle.is_running())
    }

    /// Drop completed and cancelled animations, returning how many were removed
    pub fn prune_finished(&mut self) -> usize {
        let before = self.animations.len();
        self.animations.retain(|_, handle| !handle.state().is_terminal());
        before - self.animations.len()
    }

    /// Drop every animation
    pub fn clear(&mut self) {
        self.animations.clear();
    }
}
