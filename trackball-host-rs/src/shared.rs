//! State shared between the acquisition loop and readers.
//!
//! The acquisition side publishes a complete [`TrackballSnapshot`] after
//! each tick; readers copy the latest one out. Both happen inside a short
//! critical section, so no reader ever sees a half-updated buffer. The
//! output mode lives here too so a display context can toggle it.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use trackball::OutputMode;

use crate::session::TrackballSnapshot;

struct SharedState {
    snapshot: TrackballSnapshot,
    mode: OutputMode,
}

/// Snapshot and mode storage, usable from a `static`.
///
/// ```ignore
/// static SHARED: SharedTrackball = SharedTrackball::new();
/// ```
pub struct SharedTrackball {
    state: Mutex<CriticalSectionRawMutex, RefCell<SharedState>>,
}

impl Default for SharedTrackball {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedTrackball {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(SharedState {
                snapshot: TrackballSnapshot::new(),
                mode: OutputMode::PerSensor,
            })),
        }
    }

    pub fn publish(&self, snapshot: &TrackballSnapshot) {
        self.state.lock(|s| s.borrow_mut().snapshot = *snapshot);
    }

    /// Copy of the latest published snapshot.
    pub fn snapshot(&self) -> TrackballSnapshot {
        self.state.lock(|s| s.borrow().snapshot)
    }

    pub fn mode(&self) -> OutputMode {
        self.state.lock(|s| s.borrow().mode)
    }

    pub fn set_mode(&self, mode: OutputMode) {
        self.state.lock(|s| s.borrow_mut().mode = mode);
    }

    /// Flip between per-sensor and free-ball output; returns the new mode.
    pub fn toggle_mode(&self) -> OutputMode {
        self.state.lock(|s| {
            let mut state = s.borrow_mut();
            state.mode = state.mode.toggled();
            state.mode
        })
    }
}
