//! # Session: scoped ownership of the live display.
//!
//! A [`Session`] brackets one dispatch: the cursor is hidden and a frame is
//! opened on creation; the frame is closed (once) and the cursor shown again
//! when the session is released or dropped, including during unwinding.
//!
//! ## State machine
//! ```text
//! Running ──begin_drain()──► Draining ──close()──► Closed      (in-band, terminal event)
//!    │                          ▲
//!    └────────release()/Drop────┘──────────────► Closed        (fallback, every other exit)
//! ```
//! - Transitions only move forward.
//! - `close()` is legal only from `Draining`; anything else is [`UiError::InvalidTransition`].
//! - `release()` is idempotent; the physical close and the cursor restore each run once.

use tracing::debug;

use super::{Frame, Placement, Terminal};
use crate::error::UiError;

/// Lifecycle state of a session (and of the dispatch loop driving it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoopState {
    /// Accepting events; handlers may write.
    Running,
    /// Waiting for background updaters; no new work is dispatched.
    Draining,
    /// Frame released; no further writes.
    Closed,
}

/// Guard over one live frame on a [`Terminal`].
pub struct Session<'t> {
    terminal: &'t Terminal,
    frame: Frame,
    state: LoopState,
    cursor_restored: bool,
}

impl<'t> Session<'t> {
    pub(super) fn open(terminal: &'t Terminal, placement: Placement) -> Result<Self, UiError> {
        terminal.hide_cursor().map_err(UiError::Setup)?;
        let frame = match terminal.open_frame(placement) {
            Ok(frame) => frame,
            Err(e) => {
                terminal.show_cursor();
                return Err(UiError::Setup(e));
            }
        };
        Ok(Self {
            terminal,
            frame,
            state: LoopState::Running,
            cursor_restored: false,
        })
    }

    /// The live frame. Clones may be handed to handlers and updaters.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Current state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// `Running → Draining`.
    pub fn begin_drain(&mut self) -> Result<(), UiError> {
        self.transition(LoopState::Running, LoopState::Draining)
    }

    /// `Draining → Closed`: closes the frame in-band. The cursor stays hidden
    /// until the session is released.
    pub fn close(&mut self) -> Result<(), UiError> {
        self.transition(LoopState::Draining, LoopState::Closed)?;
        if self.frame.close() {
            self.terminal.record_close(true);
        }
        Ok(())
    }

    /// Releases everything still held: closes the frame if no in-band close
    /// happened, then shows the cursor. Calling it again does nothing.
    pub fn release(&mut self) {
        if self.state != LoopState::Closed {
            debug!(target: "etui", from = ?self.state, "releasing session on fallback path");
            self.state = LoopState::Closed;
            if self.frame.close() {
                self.terminal.record_close(false);
            }
        }
        if !self.cursor_restored {
            self.cursor_restored = true;
            self.terminal.show_cursor();
            self.terminal.release_busy();
        }
    }

    fn transition(&mut self, from: LoopState, to: LoopState) -> Result<(), UiError> {
        if self.state != from {
            return Err(UiError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::tests::Capture;

    #[test]
    fn in_band_close_is_not_repeated_on_release() {
        let term = Terminal::new(Capture::default());
        {
            let mut s = term.session(Placement::FloatForward).unwrap();
            s.begin_drain().unwrap();
            s.close().unwrap();
            assert_eq!(s.state(), LoopState::Closed);
            assert!(!s.frame().is_open());
            s.release();
            s.release();
        }
        let stats = term.stats();
        assert_eq!(stats.closed_in_band, 1);
        assert_eq!(stats.closed_on_release, 0);
        assert_eq!(stats.cursor_shown, 1);
    }

    #[test]
    fn close_from_running_is_illegal() {
        let term = Terminal::new(Capture::default());
        let mut s = term.session(Placement::FloatForward).unwrap();
        let err = s.close().unwrap_err();
        assert!(matches!(
            err,
            UiError::InvalidTransition {
                from: LoopState::Running,
                to: LoopState::Closed
            }
        ));
        assert!(s.frame().is_open());
    }

    #[test]
    fn transitions_never_go_back() {
        let term = Terminal::new(Capture::default());
        let mut s = term.session(Placement::FloatForward).unwrap();
        s.begin_drain().unwrap();
        assert!(s.begin_drain().is_err());
        s.close().unwrap();
        assert!(s.close().is_err());
        assert!(s.begin_drain().is_err());
    }

    #[test]
    fn release_runs_during_unwind() {
        let term = Terminal::new(Capture::default());
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _s = term.session(Placement::FloatForward).unwrap();
            if true {
                panic!("render bug");
            }
        }));
        assert!(res.is_err());
        let stats = term.stats();
        assert_eq!(stats.cursor_hidden, 1);
        assert_eq!(stats.cursor_shown, 1);
        assert_eq!(stats.closed_on_release, 1);
    }
}
