//! Scratch directory teardown on drop and on SIGINT/SIGTERM.

use std::sync::Arc;

use tracing::{debug, info};

use crate::scratch::ScratchRegistry;

/// Exit code used after a signal-driven teardown, for SIGINT and SIGTERM
/// alike (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Removes the registered scratch directories when dropped.
///
/// Keep the guard alive for as long as extracted libraries may be loaded;
/// dropping it deletes their files.
#[derive(Debug)]
pub struct TeardownGuard {
    registry: Arc<ScratchRegistry>,
    armed: bool,
}

impl TeardownGuard {
    /// Armed guard over `registry`.
    pub fn new(registry: Arc<ScratchRegistry>) -> Self {
        Self {
            registry,
            armed: true,
        }
    }

    /// Leave the directories in place when the guard drops.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        if self.armed {
            let removed = self.registry.cleanup();
            debug!(removed, "scratch teardown complete");
        }
    }
}

/// Install a SIGINT/SIGTERM handler that removes the registered scratch
/// directories and exits with [`EXIT_CODE_INTERRUPTED`].
///
/// The handler cannot tell the two signals apart, so SIGTERM also exits
/// with 130 rather than 143.
///
/// Only one handler may be installed per process; a second call fails with
/// `ctrlc::Error::MultipleHandlers`.
pub fn install_signal_teardown(registry: Arc<ScratchRegistry>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        let removed = registry.cleanup();
        info!(removed, "received termination signal, removed scratch directories");
        std::process::exit(EXIT_CODE_INTERRUPTED);
    })
}
