use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::canvas::{BLACK, Bitmap, WHITE};
use crate::ops::fill::FillOptions;

// ============================================================================
// FALLBACK TEMPLATE
// ============================================================================

/// Synthesised line art used when a template fails to decode: a white canvas
/// with a 3px black ring centred in it, radius 40% of the shorter side.
pub fn fallback_template(width: u32, height: u32) -> Bitmap {
    let width = width.max(1);
    let height = height.max(1);
    let mut bmp = Bitmap::new_filled(width, height, WHITE);

    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let radius = width.min(height) as f32 * 0.4;
    let half_stroke = 1.5;

    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            if (d - radius).abs() <= half_stroke {
                bmp.put_pixel(x as i32, y as i32, BLACK);
            }
        }
    }
    bmp
}

// ============================================================================
// ENGINE SETTINGS
// ============================================================================

/// Engine settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    /// Per-channel flood-fill tolerance
    pub fill_tolerance: u8,
    /// Per-channel window for "seed already has the fill colour"
    pub match_tolerance: u8,
    /// Seed nudging search radius
    pub nudge_radius: u32,
    /// Default brush / eraser radius in pixels
    pub brush_radius: u32,
    /// Minimum interval between re-encodes while dragging
    pub encode_throttle_ms: u64,
    /// Maximum number of undo steps (0 = unbounded)
    pub max_undo_steps: usize,
    /// Size of the fallback template when none could be decoded
    pub fallback_width: u32,
    pub fallback_height: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fill_tolerance: 20,
            match_tolerance: 10,
            nudge_radius: 5,
            brush_radius: 8,
            encode_throttle_ms: 120,
            max_undo_steps: 50,
            fallback_width: 512,
            fallback_height: 512,
        }
    }
}

impl EngineSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/inkfill/inkfill_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\InkFill\inkfill_settings.cfg
    /// On macOS:   ~/Library/Application Support/InkFill/inkfill_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("InkFill").join("inkfill_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("InkFill")
                    .join("inkfill_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("inkfill").join("inkfill_settings.cfg"))
        }
    }

    pub fn fill_options(&self) -> FillOptions {
        FillOptions {
            tolerance: self.fill_tolerance,
            match_tolerance: self.match_tolerance,
            max_nudge_radius: self.nudge_radius,
        }
    }

    pub fn encode_throttle(&self) -> Duration {
        Duration::from_millis(self.encode_throttle_ms)
    }

    pub fn to_config(&self) -> String {
        format!(
            "fill_tolerance={}\n\
             match_tolerance={}\n\
             nudge_radius={}\n\
             brush_radius={}\n\
             encode_throttle_ms={}\n\
             max_undo_steps={}\n\
             fallback_width={}\n\
             fallback_height={}\n",
            self.fill_tolerance,
            self.match_tolerance,
            self.nudge_radius,
            self.brush_radius,
            self.encode_throttle_ms,
            self.max_undo_steps,
            self.fallback_width,
            self.fallback_height,
        )
    }

    /// Parse `key=value` lines. Unknown keys, comments and unparsable values
    /// are skipped and leave the default in place.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "fill_tolerance" => {
                    s.fill_tolerance = val.parse().unwrap_or(s.fill_tolerance);
                }
                "match_tolerance" => {
                    s.match_tolerance = val.parse().unwrap_or(s.match_tolerance);
                }
                "nudge_radius" => {
                    s.nudge_radius = val.parse().unwrap_or(s.nudge_radius);
                }
                "brush_radius" => {
                    s.brush_radius = val.parse().unwrap_or(s.brush_radius);
                }
                "encode_throttle_ms" => {
                    s.encode_throttle_ms = val.parse().unwrap_or(s.encode_throttle_ms);
                }
                "max_undo_steps" => {
                    s.max_undo_steps = val.parse().unwrap_or(s.max_undo_steps);
                }
                "fallback_width" => {
                    s.fallback_width = val.parse().unwrap_or(s.fallback_width);
                }
                "fallback_height" => {
                    s.fallback_height = val.parse().unwrap_or(s.fallback_height);
                }
                _ => {}
            }
        }
        s
    }

    /// Load settings from `path` (returns default if file missing or corrupt)
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Load settings from the user config directory.
    pub fn load() -> Self {
        Self::settings_path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config())
    }

    /// Save settings to the user config directory.
    pub fn save(&self) -> std::io::Result<()> {
        match Self::settings_path() {
            Some(path) => self.save_to(&path),
            None => Err(std::io::Error::other("no settings directory")),
        }
    }
}
