//! Overlay session
//!
//! Everything the interposed presentation call keeps across frames: the
//! loaded settings, the metrics samplers, and once bootstrapped, the GL
//! backend and text renderer. The session moves through three phases:
//!
//! - **Uninitialized**: no frame seen yet. The next presented frame
//!   bootstraps the overlay.
//! - **Ready**: bootstrap succeeded. Every frame draws the status line with
//!   the host's bindings captured before and restored after.
//! - **Disabled**: bootstrap failed. Frames are left alone for the rest of
//!   the process; bootstrap is never retried.

use super::layout::{status_origin, HudReadout};
use crate::config::{AssetPaths, DisplayConfig};
use crate::error::BootstrapError;
use crate::graphics::{CapturedBindingSet, GlyphAtlas, GraphicsBackend, OverlayRenderer};
use crate::metrics::{CpuTickSource, FrameRateCounter, MetricsSampler, ProcStat};
use std::path::Path;
use std::time::Instant;

/// The surface being presented, as seen from inside the presentation call.
pub trait PresentSurface {
    type Backend: GraphicsBackend;

    /// Pixel size of the drawable, if the windowing system reports one.
    fn drawable_size(&self) -> Option<(u32, u32)>;

    /// A backend bound to the GL context current on this thread.
    fn create_backend(&self) -> Result<Self::Backend, BootstrapError>;
}

/// Which phase a [`HudSession`] is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStatus {
    Uninitialized,
    Ready,
    Disabled,
}

/// Loads and bakes the glyph atlas from a font path.
pub type AtlasLoader = fn(&Path) -> Result<GlyphAtlas, BootstrapError>;

struct Overlay<B> {
    gl: B,
    renderer: OverlayRenderer,
    viewport: (u32, u32),
}

enum Phase<B> {
    Uninitialized,
    Ready(Overlay<B>),
    Disabled,
}

/// Puts the captured bindings back when dropped, so unwinding out of overlay
/// code still leaves the host's state intact.
struct Preserved<'a, B: GraphicsBackend> {
    gl: &'a B,
    saved: CapturedBindingSet,
}

impl<'a, B: GraphicsBackend> Preserved<'a, B> {
    fn capture(gl: &'a B) -> Self {
        Self {
            gl,
            saved: CapturedBindingSet::capture(gl),
        }
    }
}

impl<B: GraphicsBackend> Drop for Preserved<'_, B> {
    fn drop(&mut self) {
        self.saved.restore(self.gl);
    }
}

/// Process-lifetime overlay state, driven once per presented frame.
pub struct HudSession<B, S = ProcStat> {
    assets: AssetPaths,
    atlas_loader: AtlasLoader,
    config: DisplayConfig,
    sampler: MetricsSampler<S>,
    frames: FrameRateCounter,
    readout: HudReadout,
    phase: Phase<B>,
}

impl<B: GraphicsBackend, S: CpuTickSource> HudSession<B, S> {
    pub fn new(assets: AssetPaths, sampler: MetricsSampler<S>) -> Self {
        Self {
            assets,
            atlas_loader: GlyphAtlas::from_font_file,
            config: DisplayConfig::default(),
            sampler,
            frames: FrameRateCounter::new(),
            readout: HudReadout::default(),
            phase: Phase::Uninitialized,
        }
    }

    /// Replace how the glyph atlas is produced from the font path.
    pub fn with_atlas_loader(mut self, loader: AtlasLoader) -> Self {
        self.atlas_loader = loader;
        self
    }

    pub fn status(&self) -> OverlayStatus {
        match self.phase {
            Phase::Uninitialized => OverlayStatus::Uninitialized,
            Phase::Ready(_) => OverlayStatus::Ready,
            Phase::Disabled => OverlayStatus::Disabled,
        }
    }

    /// Settings in effect; defaults until bootstrap has loaded them.
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn readout(&self) -> HudReadout {
        self.readout
    }

    /// Viewport the projection was built for, once ready.
    pub fn viewport(&self) -> Option<(u32, u32)> {
        match &self.phase {
            Phase::Ready(overlay) => Some(overlay.viewport),
            _ => None,
        }
    }

    /// Run the overlay's part of one presentation call at time `now`.
    ///
    /// Bootstraps on the first call. Never fails: a failed bootstrap moves
    /// the session to [`OverlayStatus::Disabled`] and later calls return
    /// immediately.
    pub fn on_present<P>(&mut self, surface: &P, now: Instant)
    where
        P: PresentSurface<Backend = B>,
    {
        if matches!(self.phase, Phase::Uninitialized) {
            self.phase = match self.bootstrap(surface) {
                Ok(overlay) => Phase::Ready(overlay),
                Err(e) => {
                    log::error!("Overlay disabled for this process: {}", e);
                    Phase::Disabled
                }
            };
        }

        let Phase::Ready(overlay) = &self.phase else {
            return;
        };

        let gl = &overlay.gl;
        let _preserved = Preserved::capture(gl);
        overlay.renderer.bind(gl);

        if let Some(fps) = self.frames.record_frame(now) {
            self.readout = HudReadout {
                fps,
                cpu_percent: self.sampler.sample_cpu_percent(),
            };
        }

        let line = self.readout.status_line();
        let (x, y) = status_origin(self.config.corner, overlay.viewport.0, line.chars().count());
        overlay
            .renderer
            .draw_text(gl, &line, x, y, self.config.color);
    }

    fn bootstrap<P>(&mut self, surface: &P) -> Result<Overlay<B>, BootstrapError>
    where
        P: PresentSurface<Backend = B>,
    {
        let drawable = surface.drawable_size().filter(|&(w, h)| w > 0 && h > 0);
        let gl = surface.create_backend()?;
        let viewport = drawable.unwrap_or_else(|| gl.viewport_size());

        self.config = DisplayConfig::load(&self.assets.config);
        let atlas = (self.atlas_loader)(&self.assets.font)?;

        let renderer = {
            let _preserved = Preserved::capture(&gl);
            OverlayRenderer::new(&gl, atlas, viewport)?
        };

        // Prime the CPU counters so the first published reading is a real delta.
        self.sampler.sample_cpu_percent();

        log::info!(
            "Overlay initialized: {}x{} viewport, {} corner",
            viewport.0,
            viewport.1,
            self.config.corner
        );
        Ok(Overlay {
            gl,
            renderer,
            viewport,
        })
    }
}
