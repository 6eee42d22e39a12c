//! # Frame: line-allocated live region of the terminal.
//!
//! A [`Frame`] owns a growing set of rows. Handlers call [`Frame::append`] to
//! reserve a row and get a [`Line`] back; each `Line` repaints only its own
//! row. The frame mutex is the serialization point for interleaved writes
//! from the loop and background updaters.
//!
//! ## Placement
//! ```text
//! FloatForward (cursor kept one row below the frame):
//!   row 0  ⠋ catalog [████      ] 4/10
//!   row 1  ✔ index
//!   >_     cursor
//!
//! Fixed { row: r }: row i is painted at absolute screen row r + i.
//! ```
//!
//! ## Rules
//! - Writes after [`Frame::close`] fail with [`RenderError::SessionClosed`].
//! - `close` is physical and happens once; later calls are no-ops.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossterm::{
    cursor::{MoveTo, MoveToNextLine, MoveToPreviousLine},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use super::Output;
use crate::sync::lock;
use crate::error::RenderError;

/// Where the frame lives on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Start at the current cursor position and grow downward.
    #[default]
    FloatForward,
    /// Start at a fixed screen row.
    Fixed {
        /// Zero-based screen row of the first frame line.
        row: u16,
    },
}

struct Rows {
    /// Number of rows allocated so far.
    count: u16,
}

struct Shared {
    out: Output,
    placement: Placement,
    width: Option<u16>,
    open: AtomicBool,
    rows: Mutex<Rows>,
}

/// Handle to the live region. Cheap to clone; every clone refers to the same frame.
#[derive(Clone)]
pub struct Frame {
    shared: Arc<Shared>,
}

impl Frame {
    /// Opens a frame on `out`.
    ///
    /// For [`Placement::Fixed`] the cursor is moved to the first row.
    pub(crate) fn open(
        out: Output,
        placement: Placement,
        width: Option<u16>,
    ) -> std::io::Result<Self> {
        {
            let mut w = lock(&out);
            if let Placement::Fixed { row } = placement {
                queue!(w, MoveTo(0, row))?;
            }
            w.flush()?;
        }
        Ok(Self {
            shared: Arc::new(Shared {
                out,
                placement,
                width,
                open: AtomicBool::new(true),
                rows: Mutex::new(Rows { count: 0 }),
            }),
        })
    }

    /// Reserves a new row at the bottom of the frame.
    pub fn append(&self) -> Result<Line, RenderError> {
        let mut rows = lock(&self.shared.rows);
        if !self.is_open() {
            return Err(RenderError::SessionClosed);
        }
        let index = rows.count;
        {
            let mut w = lock(&self.shared.out);
            match self.shared.placement {
                Placement::FloatForward => {
                    queue!(w, Clear(ClearType::CurrentLine), Print("\n"))?;
                }
                Placement::Fixed { row } => {
                    queue!(w, MoveTo(0, row.saturating_add(index)), Clear(ClearType::CurrentLine))?;
                }
            }
            w.flush()?;
        }
        rows.count = rows.count.saturating_add(1);
        Ok(Line {
            frame: self.clone(),
            index,
        })
    }

    /// Number of rows allocated.
    pub fn len(&self) -> usize {
        lock(&self.shared.rows).count as usize
    }

    /// True if no row has been allocated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True until [`close`](Self::close) runs.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    /// Closes the frame and leaves the cursor below it.
    ///
    /// Returns `true` if this call performed the close.
    pub(crate) fn close(&self) -> bool {
        let rows = lock(&self.shared.rows);
        if !self.shared.open.swap(false, Ordering::AcqRel) {
            return false;
        }
        let mut w = lock(&self.shared.out);
        if let Placement::Fixed { row } = self.shared.placement {
            let _ = queue!(w, MoveTo(0, row.saturating_add(rows.count)));
        }
        let _ = w.flush();
        true
    }

    fn paint(&self, index: u16, text: &str) -> Result<(), RenderError> {
        let rows = lock(&self.shared.rows);
        if !self.is_open() {
            return Err(RenderError::SessionClosed);
        }
        let text = clip(text, self.shared.width);
        let mut w = lock(&self.shared.out);
        match self.shared.placement {
            Placement::FloatForward => {
                let up = rows.count - index;
                queue!(
                    w,
                    MoveToPreviousLine(up),
                    Clear(ClearType::CurrentLine),
                    Print(text),
                    MoveToNextLine(up)
                )?;
            }
            Placement::Fixed { row } => {
                queue!(
                    w,
                    MoveTo(0, row.saturating_add(index)),
                    Clear(ClearType::CurrentLine),
                    Print(text),
                    MoveTo(0, row.saturating_add(rows.count))
                )?;
            }
        }
        w.flush()?;
        Ok(())
    }
}

/// One reserved row of a [`Frame`].
#[derive(Clone)]
pub struct Line {
    frame: Frame,
    index: u16,
}

impl Line {
    /// Replaces this row's content.
    pub fn render(&self, text: &str) -> Result<(), RenderError> {
        self.frame.paint(self.index, text)
    }

    /// Zero-based position within the frame.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// True while the owning frame accepts writes.
    pub fn is_open(&self) -> bool {
        self.frame.is_open()
    }
}

/// Cuts `text` to fit in `width - 1` columns so a repaint never wraps.
fn clip(text: &str, width: Option<u16>) -> &str {
    let Some(width) = width else { return text };
    let max = (width as usize).saturating_sub(1);
    match text.char_indices().nth(max) {
        Some((at, _)) => &text[..at],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::tests::Capture;

    #[test]
    fn append_allocates_rows_in_order() {
        let cap = Capture::default();
        let frame = Frame::open(cap.output(), Placement::FloatForward, None).unwrap();
        let a = frame.append().unwrap();
        let b = frame.append().unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(frame.len(), 2);

        a.render("first").unwrap();
        b.render("second").unwrap();
        let text = cap.text();
        assert!(text.contains("first"));
        assert!(text.contains("second"));
    }

    #[test]
    fn write_after_close_is_rejected() {
        let cap = Capture::default();
        let frame = Frame::open(cap.output(), Placement::FloatForward, None).unwrap();
        let line = frame.append().unwrap();
        assert!(frame.close());
        assert!(!frame.close());
        assert!(!line.is_open());
        assert!(matches!(line.render("late"), Err(RenderError::SessionClosed)));
        assert!(matches!(frame.append(), Err(RenderError::SessionClosed)));
        assert!(!cap.text().contains("late"));
    }

    #[test]
    fn fixed_placement_paints_absolute_rows() {
        let cap = Capture::default();
        let frame = Frame::open(cap.output(), Placement::Fixed { row: 3 }, None).unwrap();
        let line = frame.append().unwrap();
        line.render("pinned").unwrap();
        // MoveTo(0, 3) is CSI 4;1H (1-based)
        assert!(cap.text().contains("\x1b[4;1H"));
        assert!(cap.text().contains("pinned"));
    }

    #[test]
    fn clip_respects_width() {
        assert_eq!(clip("abcdef", Some(4)), "abc");
        assert_eq!(clip("ab", Some(4)), "ab");
        assert_eq!(clip("⠋⠙⠹⠸", Some(3)), "⠋⠙");
        assert_eq!(clip("anything", None), "anything");
    }
}
