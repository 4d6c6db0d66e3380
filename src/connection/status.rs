// Render context status, shared between the control loop, the render
// callback and the device error callback

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of the rendering context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Clock frozen, output silent
    Suspended = 0,
    /// Clock advancing, sources rendering
    Running = 1,
    /// Device lost or engine shut down; cannot be resumed
    Closed = 2,
}

impl From<u8> for ContextState {
    fn from(value: u8) -> Self {
        match value {
            0 => ContextState::Suspended,
            1 => ContextState::Running,
            _ => ContextState::Closed,
        }
    }
}

/// Atomic wrapper to share the context state between threads
#[derive(Debug, Clone)]
pub struct AtomicContextState {
    inner: Arc<AtomicU8>,
}

impl AtomicContextState {
    pub fn new(state: ContextState) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(state as u8)),
        }
    }

    pub fn get(&self) -> ContextState {
        ContextState::from(self.inner.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ContextState) {
        self.inner.store(state as u8, Ordering::Release);
    }

    /// Move to `state` unless the context is already closed
    ///
    /// Returns false if the context was closed.
    pub fn transition(&self, state: ContextState) -> bool {
        self.inner
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if ContextState::from(current) == ContextState::Closed {
                    None
                } else {
                    Some(state as u8)
                }
            })
            .is_ok()
    }
}

impl Default for AtomicContextState {
    fn default() -> Self {
        Self::new(ContextState::Suspended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_between_clones() {
        let state = AtomicContextState::default();
        let clone = state.clone();

        assert_eq!(state.get(), ContextState::Suspended);
        clone.set(ContextState::Running);
        assert_eq!(state.get(), ContextState::Running);
    }

    #[test]
    fn test_closed_is_final() {
        let state = AtomicContextState::new(ContextState::Running);
        assert!(state.transition(ContextState::Suspended));

        state.set(ContextState::Closed);
        assert!(!state.transition(ContextState::Running));
        assert_eq!(state.get(), ContextState::Closed);
    }

    #[test]
    fn test_from_u8() {
        assert_eq!(ContextState::from(1), ContextState::Running);
        assert_eq!(ContextState::from(42), ContextState::Closed);
    }
}
