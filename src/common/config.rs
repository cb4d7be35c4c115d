use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout_engine::{Orientation, Resolution};

const MIN_SPLIT_RATIO: u8 = 1;
const MAX_SPLIT_RATIO: u8 = 99;

pub fn config_file() -> Option<PathBuf> { dirs::home_dir().map(|home| home.join(".tiler.toml")) }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub tiling: TilingSettings,
    #[serde(default)]
    pub screen: ScreenSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct TilingSettings {
    /// Axis of the very first split; deeper splits alternate from there.
    #[serde(default)]
    pub initial_orientation: Orientation,
    /// Share of a new branch given to its left child, in percent.
    #[serde(default = "default_split_ratio")]
    pub split_ratio: u8,
    #[serde(default = "yes")]
    pub collapse_on_remove: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScreenSettings {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for TilingSettings {
    fn default() -> Self {
        Self {
            initial_orientation: Orientation::Vertical,
            split_ratio: default_split_ratio(),
            collapse_on_remove: true,
        }
    }
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn yes() -> bool { true }

fn default_split_ratio() -> u8 { 50 }

fn default_width() -> u32 { 1920 }

fn default_height() -> u32 { 1080 }

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.tiling.validate());
        issues.extend(self.screen.validate());
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize { self.tiling.auto_fix_values() }
}

impl TilingSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(MIN_SPLIT_RATIO..=MAX_SPLIT_RATIO).contains(&self.split_ratio) {
            issues.push(format!(
                "split_ratio must be between {MIN_SPLIT_RATIO} and {MAX_SPLIT_RATIO}, got {}",
                self.split_ratio
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let fixed = self.split_ratio.clamp(MIN_SPLIT_RATIO, MAX_SPLIT_RATIO);
        if fixed == self.split_ratio {
            return 0;
        }
        self.split_ratio = fixed;
        1
    }
}

impl ScreenSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.width == 0 || self.height == 0 {
            issues.push(format!(
                "screen size should be non-zero, got {}x{}",
                self.width, self.height
            ));
        }

        issues
    }

    pub fn resolution(&self) -> Resolution { Resolution::new(self.width, self.height) }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&buf).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }

    /// Reads `path` if given, else the default config file if one exists,
    /// else falls back to the built-in defaults. Out-of-range values are
    /// fixed up with a warning.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => match config_file() {
                Some(default) if default.exists() => Self::read(&default)?,
                _ => {
                    debug!("no config file, using defaults");
                    Config::default()
                }
            },
        };
        for issue in config.validate() {
            warn!("config: {issue}");
        }
        let fixes = config.auto_fix_values();
        if fixes > 0 {
            warn!(fixes, "adjusted out-of-range config values");
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize { self.settings.auto_fix_values() }
}
