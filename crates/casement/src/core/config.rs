use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    canvas::Color,
    error::{Error, Result},
    geom::Expanse,
};

/// Toolkit configuration.
///
/// Every field has a default, so a configuration file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Screen width in pixels.
    pub width: u32,
    /// Screen height in pixels.
    pub height: u32,
    /// Delay before a held key starts repeating.
    pub key_repeat_delay_ms: u64,
    /// Interval between repeats once repeating.
    pub key_repeat_rate_ms: u64,
    /// Pixels flushed per cycle by the redraw manager. Zero means one full
    /// screen.
    pub redraw_pixel_budget: u64,
    /// Maximum clipping stack depth.
    pub clip_depth: usize,
    /// Maximum number of scheduled ticks.
    pub max_ticks: usize,
    /// Maximum nesting of transparent windows repainted behind one another.
    pub drawbehind_depth: usize,
    /// Colour of the desktop behind all windows.
    pub background: Color,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            key_repeat_delay_ms: 250,
            key_repeat_rate_ms: 30,
            redraw_pixel_budget: 0,
            clip_depth: 64,
            max_ticks: 64,
            drawbehind_depth: 8,
            background: Color::rgb(0x30, 0x40, 0x50),
        }
    }
}

impl Config {
    /// Parse a JSON configuration and validate it.
    pub fn from_json(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&s)
    }

    /// Check invariants the rest of the toolkit relies on.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config("screen size must be non-zero".into()));
        }
        if self.key_repeat_rate_ms == 0 {
            return Err(Error::Config("key_repeat_rate_ms must be non-zero".into()));
        }
        if self.clip_depth == 0 {
            return Err(Error::Config("clip_depth must be non-zero".into()));
        }
        if self.max_ticks == 0 {
            return Err(Error::Config("max_ticks must be non-zero".into()));
        }
        Ok(())
    }

    /// Screen size.
    pub fn screen_size(&self) -> Expanse {
        Expanse::new(self.width, self.height)
    }

    /// Effective per-cycle pixel budget.
    pub fn pixel_budget(&self) -> u64 {
        if self.redraw_pixel_budget == 0 {
            self.screen_size().area()
        } else {
            self.redraw_pixel_budget
        }
    }
}
