//! Presentation interception
//!
//! The platform-independent half of the interposed presentation call: the
//! cached original symbol, the per-process [`HudSession`], status line
//! layout, and [`intercept`], which runs overlay work and then always
//! forwards to the real implementation.
//!
//! # Usage
//!
//! ```rust,no_run
//! use swaphud_core::intercept::intercept;
//!
//! let presented = intercept(
//!     || { /* draw the overlay */ },
//!     || { /* call the original presentation function */ true },
//! );
//! assert!(presented);
//! ```

pub mod layout;
pub mod session;
pub mod symbol;

pub use layout::{status_origin, HudReadout};
pub use session::{AtlasLoader, HudSession, OverlayStatus, PresentSurface};
pub use symbol::{OriginalSymbol, SymbolResolver};

use std::panic::{self, AssertUnwindSafe};

/// Run `overlay`, then `forward`, returning what `forward` returns.
///
/// A panic in `overlay` is caught and logged; `forward` runs regardless.
pub fn intercept<R>(overlay: impl FnOnce(), forward: impl FnOnce() -> R) -> R {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(overlay)) {
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        log::error!("Overlay panicked, frame forwarded without it: {}", message);
    }
    forward()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetPaths;
    use crate::error::BootstrapError;
    use crate::graphics::fake::FakeBackend;
    use crate::metrics::{MetricsSampler, ProcStat};
    use std::path::PathBuf;
    use std::time::Instant;

    struct Surface(FakeBackend);

    impl PresentSurface for Surface {
        type Backend = FakeBackend;

        fn drawable_size(&self) -> Option<(u32, u32)> {
            Some((800, 600))
        }

        fn create_backend(&self) -> Result<FakeBackend, BootstrapError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn forwards_every_frame_when_font_is_missing() {
        let gl = FakeBackend::new();
        let surface = Surface(gl.clone());
        let assets = AssetPaths {
            config: PathBuf::from("/nonexistent/swaphud/config.ini"),
            font: PathBuf::from("/nonexistent/swaphud/DejaVuSans.ttf"),
        };
        let mut session: HudSession<FakeBackend, ProcStat> = HudSession::new(
            assets,
            MetricsSampler::new(ProcStat::with_path("/nonexistent/stat")),
        );

        let mut forwarded = 0;
        for _ in 0..3 {
            let result = intercept(
                || session.on_present(&surface, Instant::now()),
                || {
                    forwarded += 1;
                    forwarded
                },
            );
            assert_eq!(result, forwarded);
        }
        assert_eq!(forwarded, 3);
        assert_eq!(session.status(), OverlayStatus::Disabled);
        assert!(gl.draws().is_empty());
    }

    #[test]
    fn forwards_after_overlay_panic() {
        let forwarded = intercept(|| panic!("overlay bug"), || "presented");
        assert_eq!(forwarded, "presented");

        let formatted = intercept(|| panic!("bad frame {}", 7), || 1);
        assert_eq!(formatted, 1);
    }
}
