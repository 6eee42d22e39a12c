//! # Dispatcher configuration.
//!
//! Provides [`UiConfig`] centralized settings for the dispatcher, its frame and the
//! built-in handlers.
//!
//! ## Sentinel values
//! - `grace = 0s` → no bounded drain on fallback exits (close immediately)
//! - `repaint_interval = 0s` → clamped to [`MIN_REPAINT`]

use std::time::Duration;

use crate::terminal::Placement;

/// Lower bound for the repaint interval of background updaters.
pub const MIN_REPAINT: Duration = Duration::from_millis(10);

/// Configuration for the dispatcher runtime.
///
/// ## Field semantics
/// - `repaint_interval`: how often each background updater redraws its line
/// - `placement`: where the frame sits on screen
/// - `grace`: maximum wait for updaters on the end-of-stream and cancellation exits
/// - `bar_width`: progress bar width in cells
/// - `cancel_on_signal`: stop the loop on SIGINT/SIGTERM/SIGQUIT
/// - `app_name`: host application named in the update banner; unset by default
#[derive(Clone, Debug)]
pub struct UiConfig {
    /// Interval between repaints of a live progress line.
    pub repaint_interval: Duration,

    /// Frame placement policy.
    pub placement: Placement,

    /// Bounded drain used when the loop exits without the terminal event.
    ///
    /// The terminal-event path always waits without a bound.
    pub grace: Duration,

    /// Width of the progress bar in cells.
    pub bar_width: usize,

    /// Install an OS signal listener that cancels the loop.
    pub cancel_on_signal: bool,

    /// Host application named in the update banner.
    ///
    /// Set this (or build with [`UiConfig::for_app`]); when `None` the banner
    /// carries no name rather than naming this library.
    pub app_name: Option<&'static str>,
}

impl UiConfig {
    /// Default configuration for the named host application.
    pub fn for_app(app_name: &'static str) -> Self {
        Self {
            app_name: Some(app_name),
            ..Self::default()
        }
    }

    /// Returns the repaint interval clamped to [`MIN_REPAINT`].
    #[inline]
    pub fn repaint(&self) -> Duration {
        self.repaint_interval.max(MIN_REPAINT)
    }

    /// Returns the fallback drain bound as an `Option`.
    ///
    /// - `None` → do not wait
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for UiConfig {
    /// Default configuration:
    ///
    /// - `repaint_interval = 100ms`
    /// - `placement = Placement::FloatForward`
    /// - `grace = 2s`
    /// - `bar_width = 20`
    /// - `cancel_on_signal = false`
    /// - `app_name = None`
    fn default() -> Self {
        Self {
            repaint_interval: Duration::from_millis(100),
            placement: Placement::FloatForward,
            grace: Duration::from_secs(2),
            bar_width: 20,
            cancel_on_signal: false,
            app_name: None,
        }
    }
}
