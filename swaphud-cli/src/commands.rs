// CLI command handlers
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use swaphud_core::config::{parse_hex_color, CONFIG_PATH_ENV, FONT_PATH_ENV};
use swaphud_core::{Corner, DisplayConfig};

/// File name of the preload library built by `swaphud-preload`.
pub const PRELOAD_LIBRARY: &str = "libswaphud_preload.so";

#[derive(Serialize)]
struct ShowReport<'a> {
    path: &'a Path,
    exists: bool,
    #[serde(flatten)]
    config: DisplayConfig,
    warnings: Vec<String>,
}

/// Print the effective settings read from `path`.
pub fn show_config(path: &Path, json: bool) -> Result<()> {
    let (exists, parsed) = match fs::read_to_string(path) {
        Ok(text) => (true, DisplayConfig::parse(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (false, DisplayConfig::parse(""))
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    if json {
        let report = ShowReport {
            path,
            exists,
            config: parsed.config,
            warnings: parsed.warnings.iter().map(ToString::to_string).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if exists {
        println!("Settings: {}", path.display());
    } else {
        println!("Settings: {} (not found, using defaults)", path.display());
    }
    let [r, g, b] = parsed.config.color;
    println!("  position: {}", parsed.config.corner);
    println!("  color:    {:.3}, {:.3}, {:.3}", r, g, b);
    for warning in &parsed.warnings {
        println!("  warning:  {}", warning);
    }
    Ok(())
}

/// Apply `position` and `color` to the settings at `path` and save them.
///
/// Fields not given keep their current (or default) values.
pub fn set_config(
    path: &Path,
    position: Option<Corner>,
    color: Option<[f32; 3]>,
) -> Result<DisplayConfig> {
    if position.is_none() && color.is_none() {
        bail!("Nothing to change: pass --position, --color or --hex");
    }

    let mut config = match fs::read_to_string(path) {
        Ok(text) => DisplayConfig::parse(&text).config,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => DisplayConfig::default(),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    if let Some(corner) = position {
        config.corner = corner;
    }
    if let Some(color) = color {
        config.color = color;
    }

    config
        .save(path)
        .with_context(|| format!("Failed to save settings to {}", path.display()))?;
    log::info!("Saved settings to {}", path.display());
    Ok(config)
}

/// Parse `R,G,B` with each component in [0, 1].
pub fn parse_rgb(value: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(format!("expected R,G,B, got '{}'", value));
    };

    let mut color = [0.0f32; 3];
    for (slot, part) in color.iter_mut().zip([r, g, b]) {
        let component: f32 = part
            .parse()
            .map_err(|_| format!("'{}' is not a number", part))?;
        if !(0.0..=1.0).contains(&component) {
            return Err(format!("{} is outside 0..=1", component));
        }
        *slot = component;
    }
    Ok(color)
}

/// Parse `#RRGGBB` (the `#` is optional).
pub fn parse_hex(value: &str) -> Result<[f32; 3], String> {
    parse_hex_color(value).ok_or_else(|| format!("expected #RRGGBB, got '{}'", value))
}

/// How to start a program with the overlay injected.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub config: PathBuf,
    pub font: PathBuf,
    pub library: Option<PathBuf>,
    pub detach: bool,
    pub program: OsString,
    pub args: Vec<OsString>,
}

/// `LD_PRELOAD` with `library` in front of whatever was already there.
pub fn preload_value(library: &Path, existing: Option<&OsStr>) -> OsString {
    let mut value = library.as_os_str().to_os_string();
    if let Some(existing) = existing.filter(|e| !e.is_empty()) {
        value.push(":");
        value.push(existing);
    }
    value
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

/// `libswaphud_preload.so` next to the running executable, else in the
/// current directory.
pub fn default_library() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(PRELOAD_LIBRARY)))
        .filter(|candidate| candidate.is_file())
        .unwrap_or_else(|| Path::new(".").join(PRELOAD_LIBRARY))
}

/// Start the program with the overlay preloaded.
///
/// Returns the child's exit code once it exits, or `None` when detached or
/// killed by a signal.
pub fn launch(options: &LaunchOptions) -> Result<Option<i32>> {
    let library = match &options.library {
        Some(library) => library.clone(),
        None => default_library(),
    };
    let library = absolute(&library)?;
    if !library.is_file() {
        bail!(
            "Preload library not found at {} (build swaphud-preload or pass --library)",
            library.display()
        );
    }

    let config = absolute(&options.config)?;
    let font = absolute(&options.font)?;
    if !font.is_file() {
        log::warn!(
            "Font {} not found; the overlay will stay disabled",
            font.display()
        );
    }

    let preload = preload_value(&library, std::env::var_os("LD_PRELOAD").as_deref());
    log::debug!("LD_PRELOAD={:?}", preload);

    let mut child = Command::new(&options.program)
        .args(&options.args)
        .env("LD_PRELOAD", preload)
        .env(CONFIG_PATH_ENV, &config)
        .env(FONT_PATH_ENV, &font)
        .spawn()
        .with_context(|| format!("Failed to start {:?}", options.program))?;

    println!(
        "Launched {:?} (pid {}) with overlay {}",
        options.program,
        child.id(),
        library.display()
    );
    if options.detach {
        return Ok(None);
    }

    let status = child
        .wait()
        .with_context(|| format!("Failed to wait for {:?}", options.program))?;
    Ok(status.code())
}
