//! swaphud preload library
//!
//! Built as a `cdylib` and injected with `LD_PRELOAD`. Exports its own
//! `glXSwapBuffers`, which the dynamic linker binds in place of libGL's:
//! each call draws the frame rate and CPU status line into the back buffer
//! and then forwards to the real `glXSwapBuffers`.
//!
//! # Environment
//! - `SWAPHUD_CONFIG`: settings file (default `config.ini`)
//! - `SWAPHUD_FONT`: TrueType font (default `DejaVuSans.ttf`)
//! - `SWAPHUD_LOG`: log filter (default `info`), written to stderr

mod glx;

pub use glx::{GlxSurface, NextInSearchOrder};

use std::ffi::{c_ulong, c_void};
use std::sync::{Mutex, Once};
use std::time::Instant;
use swaphud_core::graphics::GlowBackend;
use swaphud_core::intercept::{intercept, HudSession, OriginalSymbol};
use swaphud_core::metrics::MetricsSampler;
use swaphud_core::AssetPaths;

/// Environment variable holding the log filter.
pub const LOG_FILTER_ENV: &str = "SWAPHUD_LOG";

type SwapBuffersFn = unsafe extern "C" fn(display: *mut c_void, drawable: c_ulong);

static REAL_SWAP_BUFFERS: OriginalSymbol = OriginalSymbol::new(c"glXSwapBuffers");
static SESSION: Mutex<Option<ContextSession>> = Mutex::new(None);
static LOGGER: Once = Once::new();

/// The process's overlay session.
struct ContextSession(HudSession<GlowBackend>);

// SAFETY: the session, and the GL entry points inside it, are only touched
// while `SESSION` is locked, from within the host's `glXSwapBuffers` call on
// the thread whose context is current.
unsafe impl Send for ContextSession {}

fn init_logging() {
    LOGGER.call_once(|| {
        let env = env_logger::Env::new().filter_or(LOG_FILTER_ENV, "info");
        // A logger installed by the host takes precedence.
        let _ = env_logger::Builder::from_env(env)
            .target(env_logger::Target::Stderr)
            .try_init();
    });
}

fn draw_overlay(display: *mut c_void, drawable: c_ulong) {
    // Poisoned by an earlier overlay panic: stay out of the way for good.
    let Ok(mut guard) = SESSION.lock() else {
        return;
    };
    let session = guard.get_or_insert_with(|| {
        ContextSession(HudSession::new(
            AssetPaths::from_env(),
            MetricsSampler::from_proc_stat(),
        ))
    });
    let surface = GlxSurface::new(display, drawable);
    session.0.on_present(&surface, Instant::now());
}

/// Interposed `glXSwapBuffers`.
///
/// # Safety
/// Called by the host with the same contract as libGL's `glXSwapBuffers`:
/// a valid display connection and a drawable on it.
#[no_mangle]
pub unsafe extern "C" fn glXSwapBuffers(display: *mut c_void, drawable: c_ulong) {
    init_logging();

    let Some(address) = REAL_SWAP_BUFFERS.address(&NextInSearchOrder) else {
        return;
    };
    // SAFETY: the next definition of `glXSwapBuffers` has this signature.
    let real: SwapBuffersFn = std::mem::transmute(address.as_ptr());

    intercept(
        || draw_overlay(display, drawable),
        || real(display, drawable),
    )
}
