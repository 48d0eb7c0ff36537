//! swaphud core
//!
//! Everything behind the interposed `glXSwapBuffers` that does not need a
//! live GL context or the dynamic linker:
//!
//! - [`config`]: the `key = value` settings file and asset locations
//! - [`metrics`]: frame rate and system CPU utilisation
//! - [`graphics`]: glyph atlas, text renderer and host binding capture
//! - [`intercept`]: the per-process overlay session and forwarding wrapper
//! - [`error`]: error types
//!
//! The `swaphud-preload` crate supplies the GLX surface and symbol resolver
//! and exports the interposed entry point.

pub mod config;
pub mod error;
pub mod graphics;
pub mod intercept;
pub mod metrics;

pub use config::{AssetPaths, Corner, DisplayConfig};
pub use error::{BootstrapError, ConfigError, MetricsError};
pub use intercept::{intercept, HudSession, OverlayStatus, PresentSurface};
