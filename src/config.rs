//! `pprofiler.toml` config loading.

use serde::{Deserialize, Serialize};

use std::path::{Path, PathBuf};

use crate::{AnsiHighlighter, Highlighter, PlainHighlighter};

pub const DEFAULT_CONFIG_FILE: &str = "pprofiler.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Directory holding cached profile artifacts.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Colorize source and dumps on the terminal.
    #[serde(default = "default_color")]
    pub color: bool,

    /// Default minimum duration for `ls` and `filter`.
    #[serde(default)]
    pub threshold: f64,
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_color() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            color: default_color(),
            threshold: 0.0,
        }
    }
}

impl Config {
    pub fn load_optional(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => match toml::from_str::<Config>(&s) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!("failed to parse config {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::warn!("failed to read config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Picks the rendering capability once; falls back to plain text when
    /// color is off or the highlighter cannot be built.
    pub fn highlighter(&self, no_color: bool) -> Box<dyn Highlighter> {
        if !self.color || no_color {
            return Box::new(PlainHighlighter);
        }
        match AnsiHighlighter::new() {
            Ok(h) => Box::new(h),
            Err(err) => {
                tracing::warn!("color disabled: {err}");
                Box::new(PlainHighlighter)
            }
        }
    }
}
