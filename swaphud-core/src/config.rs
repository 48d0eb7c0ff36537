// Settings persistence
//
// The settings file is a line-oriented `key = value` text file shared with the
// `swaphud` editor. Loading never fails: every field that is missing or
// malformed keeps its default on its own.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default settings file, relative to the host's working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.ini";
/// Default font file, relative to the host's working directory.
pub const DEFAULT_FONT_PATH: &str = "DejaVuSans.ttf";
/// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "SWAPHUD_CONFIG";
/// Environment variable overriding [`DEFAULT_FONT_PATH`].
pub const FONT_PATH_ENV: &str = "SWAPHUD_FONT";

const SECTION_HEADER: &str = "[Overlay]";

/// Screen corner the status line is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    #[default]
    TopLeft,
    TopRight,
}

impl Corner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top_left",
            Corner::TopRight => "top_right",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Corner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_left" => Ok(Corner::TopLeft),
            "top_right" => Ok(Corner::TopRight),
            other => Err(format!("unknown position '{}'", other)),
        }
    }
}

/// Placement and colour of the overlay text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub corner: Corner,
    /// RGB, each component in [0, 1].
    pub color: [f32; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            corner: Corner::TopLeft,
            color: [1.0, 1.0, 0.0], // yellow
        }
    }
}

/// A field that could not be used as written and was defaulted or clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsWarning {
    pub line: usize,
    pub key: String,
    pub message: String,
}

impl fmt::Display for SettingsWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.key, self.message)
    }
}

/// Result of parsing a settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSettings {
    pub config: DisplayConfig,
    pub warnings: Vec<SettingsWarning>,
}

impl DisplayConfig {
    /// Parse settings text. Unknown keys, comments, section headers and lines
    /// without `=` are ignored.
    pub fn parse(text: &str) -> ParsedSettings {
        let mut config = DisplayConfig::default();
        let mut warnings = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with(';')
                || line.starts_with('[')
            {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            let mut warn = |message: String| {
                warnings.push(SettingsWarning {
                    line: index + 1,
                    key: key.to_string(),
                    message,
                })
            };

            match key {
                "position" => match value.parse::<Corner>() {
                    Ok(corner) => config.corner = corner,
                    Err(e) => {
                        config.corner = Corner::TopLeft;
                        warn(format!("{}, using top_left", e));
                    }
                },
                "color_r" | "color_g" | "color_b" => {
                    let channel = match key {
                        "color_r" => 0,
                        "color_g" => 1,
                        _ => 2,
                    };
                    match parse_component(value) {
                        Ok((component, None)) => config.color[channel] = component,
                        Ok((component, Some(note))) => {
                            config.color[channel] = component;
                            warn(note);
                        }
                        Err(note) => warn(note),
                    }
                }
                _ => {}
            }
        }

        ParsedSettings { config, warnings }
    }

    /// Load settings from `path`, falling back to defaults per field.
    ///
    /// A missing or unreadable file yields the full default configuration.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                log::info!(
                    "Settings file {:?} not readable ({}), using defaults",
                    path,
                    e
                );
                return Self::default();
            }
        };

        let parsed = Self::parse(&text);
        for warning in &parsed.warnings {
            log::warn!("Settings {:?} {}", path, warning);
        }
        log::info!("Loaded settings from {:?}", path);
        parsed.config
    }

    fn key_values(&self) -> [(&'static str, String); 4] {
        [
            ("position", self.corner.to_string()),
            ("color_r", self.color[0].to_string()),
            ("color_g", self.color[1].to_string()),
            ("color_b", self.color[2].to_string()),
        ]
    }

    /// Render the settings file contents.
    pub fn to_ini_string(&self) -> String {
        let mut text = format!("{}\n\n", SECTION_HEADER);
        for (key, value) in self.key_values() {
            text.push_str(&format!("{} = {}\n", key, value));
        }
        text
    }

    /// Rewrite existing settings text with these values.
    ///
    /// Known keys are replaced where they stand; comments, other sections and
    /// unrecognised keys are kept. Keys the text lacks go at the end of the
    /// `[Overlay]` section, which is appended when absent.
    pub fn merge_into_ini(&self, existing: &str) -> String {
        let values = self.key_values();
        let mut written = [false; 4];
        let mut lines: Vec<String> = Vec::new();
        let mut in_overlay = false;
        let mut overlay_end = None;

        for raw in existing.lines() {
            let line = raw.trim();
            if line.starts_with('[') {
                if in_overlay {
                    overlay_end = Some(lines.len());
                }
                in_overlay = line == SECTION_HEADER;
            }
            let known = if line.starts_with('#') || line.starts_with(';') {
                None
            } else {
                line.split_once('=')
                    .and_then(|(key, _)| values.iter().position(|(k, _)| *k == key.trim()))
            };
            match known {
                Some(i) => {
                    lines.push(format!("{} = {}", values[i].0, values[i].1));
                    written[i] = true;
                }
                None => lines.push(raw.to_string()),
            }
        }
        if in_overlay {
            overlay_end = Some(lines.len());
        }

        let missing: Vec<String> = values
            .iter()
            .zip(written)
            .filter(|(_, done)| !done)
            .map(|((key, value), _)| format!("{} = {}", key, value))
            .collect();
        if !missing.is_empty() {
            match overlay_end {
                Some(mut at) => {
                    // Stay above blank lines separating the next section.
                    while at > 0 && lines[at - 1].trim().is_empty() {
                        at -= 1;
                    }
                    lines.splice(at..at, missing);
                }
                None => {
                    if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                        lines.push(String::new());
                    }
                    lines.push(SECTION_HEADER.to_string());
                    lines.extend(missing);
                }
            }
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Write the settings file, creating its parent directory if needed.
    ///
    /// An existing file is updated with [`merge_into_ini`](Self::merge_into_ini),
    /// so lines this crate does not understand survive the rewrite.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let text = match std::fs::read_to_string(path) {
            Ok(existing) => self.merge_into_ini(&existing),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.to_ini_string(),
            Err(e) => return Err(io_err(e)),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, text).map_err(io_err)
    }
}

/// Parse one colour component. `Ok` carries an optional note when the value
/// had to be clamped; `Err` means the field keeps its default.
fn parse_component(value: &str) -> Result<(f32, Option<String>), String> {
    let parsed: f32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number, keeping default", value))?;
    if !parsed.is_finite() {
        return Err(format!("'{}' is not finite, keeping default", value));
    }
    if (0.0..=1.0).contains(&parsed) {
        Ok((parsed, None))
    } else {
        let clamped = parsed.clamp(0.0, 1.0);
        Ok((clamped, Some(format!("{} out of [0, 1], clamped to {}", parsed, clamped))))
    }
}

/// Parse a `#RRGGBB` (or `RRGGBB`) colour into normalised RGB.
pub fn parse_hex_color(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let mut color = [0.0; 3];
    for (channel, slot) in color.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&digits[channel * 2..channel * 2 + 2], 16).ok()?;
        *slot = byte as f32 / 255.0;
    }
    Some(color)
}

/// Locations of the files read at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub config: PathBuf,
    pub font: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            font: PathBuf::from(DEFAULT_FONT_PATH),
        }
    }
}

impl AssetPaths {
    /// Default paths, overridden by `SWAPHUD_CONFIG` / `SWAPHUD_FONT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            config: std::env::var_os(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.config),
            font: std::env::var_os(FONT_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.font),
        }
    }
}
