use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Default maximum number of matches kept after ranking
pub const DEFAULT_MAX_MATCHES: usize = 100;

/// Default number of result rows visible without scrolling
pub const DEFAULT_MAX_VISIBLE_ROWS: usize = 6;

/// Default zoom applied while Shift-preview is active (full navigation uses 1.0)
pub const DEFAULT_PREVIEW_ZOOM: f32 = 0.5;

/// Default hover-suppression window after keyboard navigation, in milliseconds
pub const DEFAULT_HOVER_SUPPRESS_MS: u64 = 120;

/// Default grace delay before an input blur closes the palette, in milliseconds
pub const DEFAULT_BLUR_GRACE_MS: u64 = 150;

/// Hotkey chord that opens the palette.
///
/// Stored as an opaque chord string (e.g. "ctrl k"); parsing and OS
/// registration are the host's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    pub chord: String,
    /// Secondary chord that also opens the palette
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<String>,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        HotkeyConfig {
            chord: "ctrl k".to_string(),
            alternate: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotlightConfig {
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    /// Maximum number of matches kept after ranking
    #[serde(default = "default_max_matches", rename = "maxMatches")]
    pub max_matches: usize,
    /// Number of result rows visible without scrolling
    #[serde(default = "default_max_visible_rows", rename = "maxVisibleRows")]
    pub max_visible_rows: usize,
    /// Enables the multi-select mode and selection commands
    #[serde(default, rename = "multiSelect")]
    pub multi_select: bool,
    /// Zoom level used for Shift-preview navigation
    #[serde(default = "default_preview_zoom", rename = "previewZoom")]
    pub preview_zoom: f32,
    /// Hover-suppression window after keyboard navigation (ms)
    #[serde(default = "default_hover_suppress_ms", rename = "hoverSuppressMs")]
    pub hover_suppress_ms: u64,
    /// Grace delay before input blur closes the palette (ms)
    #[serde(default = "default_blur_grace_ms", rename = "blurGraceMs")]
    pub blur_grace_ms: u64,
}

fn default_max_matches() -> usize {
    DEFAULT_MAX_MATCHES
}
fn default_max_visible_rows() -> usize {
    DEFAULT_MAX_VISIBLE_ROWS
}
fn default_preview_zoom() -> f32 {
    DEFAULT_PREVIEW_ZOOM
}
fn default_hover_suppress_ms() -> u64 {
    DEFAULT_HOVER_SUPPRESS_MS
}
fn default_blur_grace_ms() -> u64 {
    DEFAULT_BLUR_GRACE_MS
}

impl Default for SpotlightConfig {
    fn default() -> Self {
        SpotlightConfig {
            hotkey: HotkeyConfig::default(),
            max_matches: DEFAULT_MAX_MATCHES,
            max_visible_rows: DEFAULT_MAX_VISIBLE_ROWS,
            multi_select: false,
            preview_zoom: DEFAULT_PREVIEW_ZOOM,
            hover_suppress_ms: DEFAULT_HOVER_SUPPRESS_MS,
            blur_grace_ms: DEFAULT_BLUR_GRACE_MS,
        }
    }
}

/// Load configuration from a JSON file, falling back to defaults.
///
/// A missing file is not an error (first run); a malformed file is logged
/// and ignored so a broken config never blocks the palette from opening.
pub fn load_config(path: &Path) -> SpotlightConfig {
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return SpotlightConfig::default();
    }

    match std::fs::read_to_string(path) {
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to read config, using defaults");
            SpotlightConfig::default()
        }
        Ok(contents) => match serde_json::from_str::<SpotlightConfig>(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "Successfully loaded config");
                config
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to parse config JSON, using defaults");
                SpotlightConfig::default()
            }
        },
    }
}
