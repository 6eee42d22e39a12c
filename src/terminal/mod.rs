//! Terminal ownership: the caller-owned [`Terminal`], its live [`Frame`] and
//! the scoped [`Session`] guard.
//!
//! ```text
//! Terminal (caller-owned, no global state)
//!   └─► Terminal::session(placement)      hide cursor → open frame
//!          └─► Session (guard, LoopState)
//!                 ├─► Frame ─► Line, Line, ...   (shared with handlers/updaters)
//!                 └─► Drop / release()          close frame (once) → show cursor
//! ```

mod frame;
mod session;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub use frame::{Frame, Line, Placement};
pub use session::{LoopState, Session};

use crate::error::UiError;
use crate::sync::lock;

/// Shared output stream.
pub(crate) type Output = Arc<Mutex<Box<dyn Write + Send>>>;

/// Lifetime counters of a [`Terminal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminalStats {
    /// Times the cursor was hidden.
    pub cursor_hidden: usize,
    /// Times the cursor was shown again.
    pub cursor_shown: usize,
    /// Frames opened.
    pub frames_opened: usize,
    /// Frames closed in-band by the terminal-event path.
    pub closed_in_band: usize,
    /// Frames closed by the guard on any other exit path.
    pub closed_on_release: usize,
}

#[derive(Default)]
struct Counters {
    cursor_hidden: AtomicUsize,
    cursor_shown: AtomicUsize,
    frames_opened: AtomicUsize,
    closed_in_band: AtomicUsize,
    closed_on_release: AtomicUsize,
}

/// A writable terminal stream, owned by the caller and lent to the dispatcher.
///
/// At most one [`Session`] is live per terminal at a time.
pub struct Terminal {
    out: Output,
    width: Option<u16>,
    busy: AtomicBool,
    counters: Counters,
}

impl Terminal {
    /// Wraps an arbitrary writer. No width is assumed, so lines are not clipped.
    pub fn new<W: Write + Send + 'static>(out: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
            width: None,
            busy: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Live output on stderr; stdout stays reserved for the final report.
    pub fn stderr() -> Self {
        let width = crossterm::terminal::size().ok().map(|(w, _)| w);
        Self::new(io::stderr()).with_width(width)
    }

    /// Sets the column count used to clip lines.
    pub fn with_width(mut self, width: Option<u16>) -> Self {
        self.width = width;
        self
    }

    /// Opens a session: hides the cursor, then opens a frame.
    ///
    /// ### Errors
    /// [`UiError::Setup`] if a session is already live on this terminal, or if
    /// the cursor or frame cannot be set up. The cursor is restored before returning.
    pub fn session(&self, placement: Placement) -> Result<Session<'_>, UiError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(UiError::Setup(io::Error::other(
                "a session is already live on this terminal",
            )));
        }
        Session::open(self, placement).inspect_err(|_| self.busy.store(false, Ordering::Release))
    }

    /// Snapshot of lifetime counters.
    pub fn stats(&self) -> TerminalStats {
        let c = &self.counters;
        TerminalStats {
            cursor_hidden: c.cursor_hidden.load(Ordering::Relaxed),
            cursor_shown: c.cursor_shown.load(Ordering::Relaxed),
            frames_opened: c.frames_opened.load(Ordering::Relaxed),
            closed_in_band: c.closed_in_band.load(Ordering::Relaxed),
            closed_on_release: c.closed_on_release.load(Ordering::Relaxed),
        }
    }

    fn hide_cursor(&self) -> io::Result<()> {
        let mut w = lock(&self.out);
        crossterm::execute!(w, crossterm::cursor::Hide)?;
        self.counters.cursor_hidden.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn show_cursor(&self) {
        let mut w = lock(&self.out);
        let _ = crossterm::execute!(w, crossterm::cursor::Show);
        self.counters.cursor_shown.fetch_add(1, Ordering::Relaxed);
    }

    fn open_frame(&self, placement: Placement) -> io::Result<Frame> {
        let frame = Frame::open(Arc::clone(&self.out), placement, self.width)?;
        self.counters.frames_opened.fetch_add(1, Ordering::Relaxed);
        Ok(frame)
    }

    fn record_close(&self, in_band: bool) {
        let counter = if in_band {
            &self.counters.closed_in_band
        } else {
            &self.counters.closed_on_release
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn release_busy(&self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory writer shared between a terminal and the test body.
    #[derive(Clone, Default)]
    pub(crate) struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        pub(crate) fn output(&self) -> Output {
            Arc::new(Mutex::new(Box::new(self.clone())))
        }

        pub(crate) fn text(&self) -> String {
            String::from_utf8_lossy(&lock(&self.0)).into_owned()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            lock(&self.0).extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn session_hides_then_shows_cursor() {
        let cap = Capture::default();
        let term = Terminal::new(cap.clone());
        {
            let _session = term.session(Placement::FloatForward).unwrap();
            assert!(cap.text().contains("\x1b[?25l"));
            assert!(!cap.text().contains("\x1b[?25h"));
        }
        let text = cap.text();
        assert!(text.find("\x1b[?25l").unwrap() < text.find("\x1b[?25h").unwrap());
        let stats = term.stats();
        assert_eq!(stats.cursor_hidden, 1);
        assert_eq!(stats.cursor_shown, 1);
        assert_eq!(stats.closed_on_release, 1);
    }

    #[test]
    fn second_live_session_is_refused() {
        let term = Terminal::new(Capture::default());
        let first = term.session(Placement::FloatForward).unwrap();
        let second = term.session(Placement::FloatForward);
        assert!(matches!(second, Err(UiError::Setup(_))));
        drop(first);
        assert!(term.session(Placement::FloatForward).is_ok());
        let stats = term.stats();
        assert_eq!(stats.cursor_hidden, stats.cursor_shown);
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("closed pipe"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn setup_failure_is_surfaced() {
        let term = Terminal::new(Broken);
        let res = term.session(Placement::FloatForward);
        assert!(matches!(res, Err(UiError::Setup(_))));
        assert_eq!(term.stats().frames_opened, 0);
    }
}
