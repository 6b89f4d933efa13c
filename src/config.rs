use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::{parse_color, Rgb};
use crate::error::{PlotError, Result};

/// Environment variable naming an optional YAML style file.
pub const STYLE_ENV: &str = "RUSTY_BIOPLOT_STYLE";

/// Largest accepted canvas side in pixels.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Figure appearance shared by all plot types, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Background colour (`#rrggbb`, grey level or name).
    pub background: String,
    /// Grid line colour.
    pub grid_color: String,
    /// Radius of scatter markers in pixels.
    pub marker_size: u32,
    /// Width of density curves in pixels.
    pub line_width: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: "white".to_string(),
            grid_color: "0.9".to_string(),
            marker_size: 3,
            line_width: 2,
        }
    }
}

impl StyleConfig {
    pub fn background_rgb(&self) -> Result<Rgb> {
        parse_color(&self.background)
    }

    pub fn grid_rgb(&self) -> Result<Rgb> {
        parse_color(&self.grid_color)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PlotError::invalid(format!(
                "canvas size {}x{} must be positive",
                self.width, self.height
            )));
        }
        if self.width > MAX_CANVAS_SIDE || self.height > MAX_CANVAS_SIDE {
            return Err(PlotError::invalid(format!(
                "canvas size {}x{} exceeds {MAX_CANVAS_SIDE} pixels per side",
                self.width, self.height
            )));
        }
        self.background_rgb()?;
        self.grid_rgb()?;
        Ok(())
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let style: StyleConfig = serde_yaml::from_str(text)
            .map_err(|e| PlotError::invalid(format!("parsing style: {e}")))?;
        style.validate()?;
        Ok(style)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            PlotError::invalid(format!("reading style file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }
}

/// Resolve the style: explicit file, then `RUSTY_BIOPLOT_STYLE`, then defaults.
///
/// An explicit file must load; a broken file named by the environment
/// variable only logs a warning.
pub fn load_style(explicit: Option<&Path>) -> Result<StyleConfig> {
    if let Some(path) = explicit {
        return StyleConfig::from_file(path);
    }
    if let Ok(path) = env::var(STYLE_ENV) {
        match StyleConfig::from_file(Path::new(&path)) {
            Ok(style) => return Ok(style),
            Err(e) => log::warn!("Ignoring style from {STYLE_ENV}: {e}"),
        }
    }
    Ok(StyleConfig::default())
}
