//! Readiness gate: whether the drawn surface matches the latest applied options.
//!
//! `NotReady -> Ready` happens on the first completion, after mount, of the
//! frame the gate is waiting for. `Ready -> NotReady` happens on every new
//! apply, and also when the renderer is unmounted or torn down. Completions
//! for older frames, or arriving before mount, are ignored.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::render::FrameId;

/// Whether exports are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    NotReady,
    Ready,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::NotReady => write!(f, "not ready"),
            Readiness::Ready => write!(f, "ready"),
        }
    }
}

#[derive(Debug, Default)]
struct GateState {
    mounted: bool,
    awaiting: FrameId,
    ready: bool,
}

/// Tracks draw completion for the latest applied frame.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl ReadinessGate {
    /// A gate awaiting [`FrameId::INITIAL`], not yet mounted.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for `frame` instead. Always leaves the gate `NotReady`.
    pub fn arm(&self, frame: FrameId) {
        let mut state = self.lock();
        state.awaiting = frame;
        state.ready = false;
    }

    /// Record whether the renderer is attached to a display target.
    /// Unmounting drops the gate back to `NotReady`.
    pub fn set_mounted(&self, mounted: bool) {
        let mut state = self.lock();
        state.mounted = mounted;
        if !mounted {
            state.ready = false;
        }
    }

    /// Report that `frame` finished drawing. Returns whether this made the gate ready.
    pub fn complete(&self, frame: FrameId) -> bool {
        let mut state = self.lock();
        if !state.mounted || state.ready || frame != state.awaiting {
            log::debug!(
                "ignoring completion of frame {} (awaiting {}, mounted: {})",
                frame,
                state.awaiting,
                state.mounted
            );
            return false;
        }
        state.ready = true;
        drop(state);
        self.changed.notify_all();
        true
    }

    pub fn readiness(&self) -> Readiness {
        if self.lock().ready {
            Readiness::Ready
        } else {
            Readiness::NotReady
        }
    }

    pub fn is_ready(&self) -> bool {
        self.readiness() == Readiness::Ready
    }

    /// The frame the gate is ready for, if it is ready.
    pub fn ready_frame(&self) -> Option<FrameId> {
        let state = self.lock();
        state.ready.then_some(state.awaiting)
    }

    /// Block until ready or until `timeout` elapses. Returns whether the gate is ready.
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .changed
            .wait_timeout_while(state, timeout, |s| !s.ready)
            .unwrap_or_else(PoisonError::into_inner);
        state.ready
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn mounted_gate() -> ReadinessGate {
        let gate = ReadinessGate::new();
        gate.set_mounted(true);
        gate
    }

    #[test]
    fn test_starts_not_ready() {
        let gate = ReadinessGate::new();
        assert_eq!(gate.readiness(), Readiness::NotReady);
        assert!(gate.ready_frame().is_none());
    }

    #[test]
    fn test_completion_before_mount_is_ignored() {
        let gate = ReadinessGate::new();
        assert!(!gate.complete(FrameId::INITIAL));
        assert!(!gate.is_ready());

        gate.set_mounted(true);
        assert!(gate.complete(FrameId::INITIAL));
        assert!(gate.is_ready());
    }

    #[test]
    fn test_arm_resets_to_not_ready() {
        let gate = mounted_gate();
        gate.complete(FrameId::INITIAL);
        assert!(gate.is_ready());

        gate.arm(FrameId(1));
        assert_eq!(gate.readiness(), Readiness::NotReady);

        assert!(gate.complete(FrameId(1)));
        assert_eq!(gate.ready_frame(), Some(FrameId(1)));
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let gate = mounted_gate();
        gate.arm(FrameId(1));
        gate.arm(FrameId(2));

        assert!(!gate.complete(FrameId(1)));
        assert!(!gate.is_ready());
        assert!(gate.complete(FrameId(2)));
    }

    #[test]
    fn test_unmount_drops_readiness() {
        let gate = mounted_gate();
        assert!(gate.complete(FrameId::INITIAL));

        gate.set_mounted(false);
        assert_eq!(gate.readiness(), Readiness::NotReady);
        assert!(!gate.complete(FrameId::INITIAL));

        gate.set_mounted(true);
        assert!(gate.complete(FrameId::INITIAL));
    }

    #[test]
    fn test_repeat_completion_does_not_retrigger() {
        let gate = mounted_gate();
        assert!(gate.complete(FrameId::INITIAL));
        assert!(!gate.complete(FrameId::INITIAL));
        assert!(gate.is_ready());
    }

    #[test]
    fn test_wait_ready_times_out() {
        let gate = mounted_gate();
        assert!(!gate.wait_ready(Duration::from_millis(10)));
    }

    #[test]
    fn test_wait_ready_wakes_on_completion() {
        let gate = Arc::new(mounted_gate());
        gate.arm(FrameId(3));

        let signaller = Arc::clone(&gate);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            signaller.complete(FrameId(3));
        });

        assert!(gate.wait_ready(Duration::from_secs(10)));
        handle.join().unwrap();
    }
}
