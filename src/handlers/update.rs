//! Update-available banner: a one-shot line, no background work.

use super::handler::{Ctx, Handler};
use crate::error::RenderError;
use crate::events::{Event, EventKind, Payload};

/// Renders [`EventKind::AppUpdateAvailable`] as a single banner line.
#[derive(Default)]
pub struct UpdateHandler;

impl UpdateHandler {
    /// Construct a new [`UpdateHandler`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Handler for UpdateHandler {
    fn kinds(&self) -> &'static [EventKind] {
        &[EventKind::AppUpdateAvailable]
    }

    fn handle(&self, ctx: &Ctx<'_>, event: &Event) -> Result<(), RenderError> {
        let Payload::Version { current, latest } = &event.payload else {
            return Err(RenderError::Payload {
                kind: event.kind.as_label(),
                expected: "version",
            });
        };
        let line = ctx.frame.append()?;
        line.render(&banner(ctx.cfg.app_name, current, latest))
    }

    fn name(&self) -> &'static str {
        "update"
    }
}

fn banner(app_name: Option<&str>, current: &str, latest: &str) -> String {
    match app_name {
        Some(app) => {
            format!("New version of {app} is available: {latest} (currently running: {current})")
        }
        None => format!("New version is available: {latest} (currently running: {current})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiConfig;
    use crate::core::Tracker;
    use crate::terminal::{Placement, Terminal, tests::Capture};
    use tokio_util::sync::CancellationToken;

    #[test]
    fn banner_names_both_versions() {
        let cap = Capture::default();
        let term = Terminal::new(cap.clone());
        let session = term.session(Placement::FloatForward).unwrap();
        let tracker = Tracker::new(CancellationToken::new());
        let cfg = UiConfig::for_app("syft");
        let ctx = Ctx {
            frame: session.frame(),
            tracker: &tracker,
            cfg: &cfg,
        };

        UpdateHandler::new()
            .handle(&ctx, &Event::update_available("0.9.0", "1.0.0"))
            .unwrap();
        assert_eq!(session.frame().len(), 1);
        assert_eq!(tracker.outstanding(), 0);
        assert!(
            cap.text()
                .contains("New version of syft is available: 1.0.0 (currently running: 0.9.0)")
        );

        let err = UpdateHandler::new()
            .handle(&ctx, &Event::new(EventKind::AppUpdateAvailable))
            .unwrap_err();
        assert_eq!(err.as_label(), "render_bad_payload");
    }

    #[test]
    fn unnamed_banner_does_not_name_the_library() {
        let text = banner(UiConfig::default().app_name, "0.9.0", "1.0.0");
        assert_eq!(text, "New version is available: 1.0.0 (currently running: 0.9.0)");
        assert!(!text.contains(env!("CARGO_PKG_NAME")));
    }
}
