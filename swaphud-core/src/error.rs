//! Error Types
//!
//! This module provides the error types for the overlay using `thiserror`.
//!
//! # Error Categories
//! - **Bootstrap errors**: font loading, atlas baking, shader compilation and
//!   GPU allocation. Any of these permanently disables the overlay for the
//!   process; none of them reach the host application.
//! - **Metrics errors**: the CPU tick source could not be read or parsed.
//!   The sampler degrades to its previous reading.
//! - **Config errors**: only raised when *writing* settings. Loading never
//!   fails; malformed fields fall back to their defaults individually.

use std::path::PathBuf;
use thiserror::Error;

/// Shader stage, used to label compile failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failure while building the overlay's rendering pipeline.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The font file could not be read.
    #[error("could not read font file {path:?}: {source}")]
    FontUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The font bytes are not a TrueType/OpenType font.
    #[error("font data is not a valid TrueType/OpenType font")]
    InvalidFont,

    /// The glyphs did not fit in the fixed-size atlas.
    ///
    /// `baked` is the number of glyphs placed before space ran out.
    #[error("glyph atlas overflow after {baked} glyphs")]
    AtlasOverflow { baked: usize },

    /// A shader stage failed to compile.
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    /// The shader program failed to link.
    #[error("shader program failed to link: {log}")]
    ProgramLink { log: String },

    /// A GPU object could not be created.
    #[error("failed to allocate {resource}: {message}")]
    ResourceAllocation {
        resource: &'static str,
        message: String,
    },

    /// No usable graphics backend for the current context.
    #[error("graphics backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl BootstrapError {
    /// Create a resource allocation error.
    #[cold]
    pub fn allocation(resource: &'static str, message: impl Into<String>) -> Self {
        Self::ResourceAllocation {
            resource,
            message: message.into(),
        }
    }
}

/// Failure while reading the CPU tick source.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("metrics source unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed metrics source: {0}")]
    Malformed(String),
}

/// Failure while persisting settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not write settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
