/*!
 * Unload Latch
 * One-way ticket: once memory has been handed over, teardown is forbidden
 */

use super::traits::ModuleRef;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Latch states; `Pinned` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatchState {
    Unloadable,
    Pinned,
}

impl fmt::Display for LatchState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LatchState::Unloadable => write!(f, "unloadable"),
            LatchState::Pinned => write!(f, "pinned"),
        }
    }
}

pub struct UnloadLatch {
    state: Mutex<LatchState>,
    module: Arc<dyn ModuleRef>,
}

impl UnloadLatch {
    pub fn new(module: Arc<dyn ModuleRef>) -> Self {
        Self {
            state: Mutex::new(LatchState::Unloadable),
            module,
        }
    }

    /// Take a reference that prevents teardown
    ///
    /// Best effort: if the reference cannot be acquired the latch stays
    /// unloadable and the caller's operation still succeeds.
    pub fn pin(&self) {
        let mut state = self.state.lock();
        if *state == LatchState::Pinned {
            return;
        }

        if !self.module.try_get() {
            warn!("Could not prevent unloading. This subsystem will be disabled.");
            return;
        }

        *state = LatchState::Pinned;
        info!("Memory handed over, unloading is now disabled");
    }

    pub fn state(&self) -> LatchState {
        *self.state.lock()
    }

    pub fn is_pinned(&self) -> bool {
        self.state() == LatchState::Pinned
    }
}

impl fmt::Debug for UnloadLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnloadLatch")
            .field("state", &self.state())
            .finish()
    }
}
