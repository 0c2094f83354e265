//! Project configuration (qrstyle.yaml).
//!
//! Holds output settings, the SVG export mode, how long the CLI waits for a
//! draw, and the defaults merged under descriptors that omit fields.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QrError, Result};
use crate::export::SvgMode;
use crate::types::DescriptorDefaults;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "qrstyle.yaml";

/// Project configuration loaded from qrstyle.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output directory for exported files.
    pub output: PathBuf,

    /// SVG export mode.
    pub svg: SvgMode,

    /// How long to wait for a draw before giving up, in milliseconds.
    pub draw_timeout_ms: u64,

    /// Values for descriptor fields left out of a descriptor file.
    pub defaults: DescriptorDefaults,
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: default_output(),
            svg: SvgMode::default(),
            draw_timeout_ms: 5000,
            defaults: DescriptorDefaults::default(),
        }
    }
}

impl Config {
    /// Load config from a qrstyle.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| QrError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse config from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| QrError::Parse {
            message: format!("Invalid config: {}", e),
            help: Some(format!("Check {} syntax", CONFIG_FILENAME)),
        })
    }

    /// Load the explicitly named config, or `qrstyle.yaml` in `dir` when it
    /// exists, or built-in defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            log::debug!("using config {}", candidate.display());
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn draw_timeout(&self) -> Duration {
        Duration::from_millis(self.draw_timeout_ms)
    }

    /// The config as written by `qrstyle init`.
    pub fn template() -> String {
        format!(
            "# qrstyle project configuration\n\
             output: dist\n\
             svg: embedded         # embedded | vector\n\
             draw_timeout_ms: 5000\n\
             defaults:\n\
             \x20 size: {}\n\
             \x20 foreground: \"#000000\"\n\
             \x20 background: \"#FFFFFF\"\n\
             \x20 pattern: squares   # squares | dots | rounded | classy\n\
             \x20 level: M           # L | M | Q | H\n",
            crate::types::DEFAULT_SIZE
        )
    }
}
