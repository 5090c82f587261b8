//! Interrupt handling
//!
//! The process owns exactly one [`RunnerHandle`]. It records whether an
//! engine call is in flight and, while a password prompt is open, the
//! terminal attributes to put back. The Ctrl-C handler consults it:
//!
//! - idle: the terminal is restored and the process exits with code 1;
//! - running: the in-flight call's [`CancelToken`] is cancelled and the
//!   engine unwinds through its normal error path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Exit code used when an idle process is interrupted
pub const INTERRUPT_EXIT_CODE: i32 = 1;

/// Cancellation flag shared between the interrupt handler and an engine call
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What the interrupt handler should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Nothing was running: exit immediately with this code
    Exit(i32),
    /// The in-flight engine call was told to stop
    Cancelled,
}

#[derive(Debug, Default)]
struct HandleState {
    in_flight: Option<CancelToken>,
    #[cfg(unix)]
    terminal: Option<TerminalSnapshot>,
}

/// Reference to the in-flight engine invocation, if any
#[derive(Debug, Clone, Default)]
pub struct RunnerHandle {
    state: Arc<Mutex<HandleState>>,
}

impl RunnerHandle {
    /// Create an idle handle
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HandleState> {
        // A poisoned lock still holds consistent data: every update is a
        // single field assignment.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark an engine call as in flight until the returned guard drops
    pub fn register(&self) -> RunGuard {
        let token = CancelToken::new();
        self.lock().in_flight = Some(token.clone());
        debug!("runner registered");
        RunGuard {
            handle: self.clone(),
            token,
        }
    }

    /// Whether an engine call is in flight
    pub fn is_running(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    /// React to an interrupt according to the current state
    pub fn interrupt(&self) -> InterruptAction {
        let state = self.lock();
        match &state.in_flight {
            Some(token) => {
                token.cancel();
                InterruptAction::Cancelled
            }
            None => InterruptAction::Exit(INTERRUPT_EXIT_CODE),
        }
    }

    fn clear(&self) {
        self.lock().in_flight = None;
        debug!("runner cleared");
    }

    /// Snapshot the controlling terminal until the returned guard drops
    ///
    /// Used around password prompts: the snapshot is written back when the
    /// guard drops and also when an idle interrupt exits the process.
    pub fn guard_terminal(&self) -> TerminalGuard {
        #[cfg(unix)]
        {
            self.lock().terminal = TerminalSnapshot::capture();
        }
        TerminalGuard {
            handle: self.clone(),
        }
    }

    /// Write back the terminal snapshot, if one is held
    pub fn restore_terminal(&self) {
        #[cfg(unix)]
        {
            let snapshot = self.lock().terminal.take();
            if let Some(snapshot) = snapshot {
                snapshot.restore();
            }
        }
    }
}

/// Keeps a [`RunnerHandle`] in the running state
#[derive(Debug)]
pub struct RunGuard {
    handle: RunnerHandle,
    token: CancelToken,
}

impl RunGuard {
    /// Token the engine call must watch
    pub const fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.handle.clear();
    }
}

/// Restores the terminal snapshot taken by [`RunnerHandle::guard_terminal`]
#[derive(Debug)]
pub struct TerminalGuard {
    handle: RunnerHandle,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        self.handle.restore_terminal();
    }
}

#[cfg(unix)]
#[derive(Debug)]
struct TerminalSnapshot {
    tty: std::fs::File,
    attrs: nix::sys::termios::Termios,
}

#[cfg(unix)]
impl TerminalSnapshot {
    fn capture() -> Option<Self> {
        let tty = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .ok()?;
        let attrs = nix::sys::termios::tcgetattr(&tty).ok()?;
        Some(Self { tty, attrs })
    }

    fn restore(&self) {
        use nix::sys::termios::{SetArg, tcsetattr};

        if let Err(e) = tcsetattr(&self.tty, SetArg::TCSANOW, &self.attrs) {
            debug!("failed to restore terminal attributes: {}", e);
        }
    }
}

/// Process-wide Ctrl-C listener
#[derive(Debug)]
pub struct CancellationHandler;

impl CancellationHandler {
    /// Install the handler for `handle`
    ///
    /// Can only succeed once per process.
    pub fn install(handle: RunnerHandle) -> Result<(), ctrlc::Error> {
        ctrlc::set_handler(move || {
            if let InterruptAction::Exit(code) = handle.interrupt() {
                handle.restore_terminal();
                std::process::exit(code);
            }
        })
    }
}
