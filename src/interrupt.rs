//! Ctrl+C handling while a response source call is in flight.
//!
//! At the prompt the line editor sees Ctrl+C as a key press and the chat loop
//! exits normally. While waiting on the agent no input is read, so SIGINT is
//! delivered as a signal; the handler then terminates the process with 130.
//! Outside a call SIGINT keeps its default action.

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

/// Exit code for a process killed by SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

static REGISTER: Once = Once::new();

/// Number of source calls currently running.
static IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);

/// Register the SIGINT handler. Safe to call multiple times (only the first
/// call registers; subsequent calls are no-ops).
///
/// During a source call the handler exits with 130. Anywhere else it performs
/// the default action, so the process terminates either way.
pub fn register_signal_handler() -> Result<()> {
    let mut outcome = Ok(());
    REGISTER.call_once(|| {
        // SAFETY: the closure only reads an atomic and calls the
        // async-signal-safe `_exit` and default-action emulation.
        let registered = unsafe {
            signal_hook::low_level::register(signal_hook::consts::SIGINT, || {
                if IN_FLIGHT.load(Ordering::SeqCst) > 0 {
                    signal_hook::low_level::exit(INTERRUPTED_EXIT_CODE);
                }
                let _ = signal_hook::low_level::emulate_default_handler(signal_hook::consts::SIGINT);
            })
        };
        outcome = registered.map(|_| ());
    });
    Ok(outcome?)
}

/// Marks a source call as in flight until dropped.
#[must_use]
pub struct InFlight {
    _private: (),
}

impl InFlight {
    pub fn begin() -> Self {
        IN_FLIGHT.fetch_add(1, Ordering::SeqCst);
        InFlight { _private: () }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn in_flight() -> bool {
    IN_FLIGHT.load(Ordering::SeqCst) > 0
}
