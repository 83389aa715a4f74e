use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use chunkbrot_core::FractalParams;
use chunkbrot_render::{builtin_themes, ColorGradient, DEFAULT_CHUNK_SIZE};

use crate::app_dir;
use crate::error::ConfigError;

/// Startup configuration. Read once; not changed while running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_escape_radius_sq")]
    pub escape_radius_sq: f64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Worker concurrency cap. 0 means one worker per available CPU.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Half of the home view's vertical span.
    #[serde(default = "default_half_extent")]
    pub initial_half_extent: f64,
    #[serde(default = "default_zoom_in")]
    pub zoom_in_factor: f64,
    #[serde(default = "default_zoom_out")]
    pub zoom_out_factor: f64,
    /// Index of the theme active at startup.
    #[serde(default)]
    pub theme: usize,
    /// Replaces the builtin theme table when non-empty.
    #[serde(default)]
    pub themes: Vec<ColorGradient>,
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,
}

fn default_chunk_size() -> u32 {
    DEFAULT_CHUNK_SIZE
}
fn default_max_iterations() -> u32 {
    FractalParams::DEFAULT_MAX_ITERATIONS
}
fn default_escape_radius_sq() -> f64 {
    FractalParams::DEFAULT_ESCAPE_RADIUS_SQ
}
fn default_debounce_ms() -> u64 {
    200
}
fn default_workers() -> usize {
    1
}
fn default_half_extent() -> f64 {
    2.0
}
fn default_zoom_in() -> f64 {
    0.9
}
fn default_zoom_out() -> f64 {
    1.1
}
fn default_window_width() -> f32 {
    1280.0
}
fn default_window_height() -> f32 {
    720.0
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_iterations: default_max_iterations(),
            escape_radius_sq: default_escape_radius_sq(),
            debounce_ms: default_debounce_ms(),
            workers: default_workers(),
            initial_half_extent: default_half_extent(),
            zoom_in_factor: default_zoom_in(),
            zoom_out_factor: default_zoom_out(),
            theme: 0,
            themes: Vec::new(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl RenderConfig {
    /// Load `chunkbrot.json` from next to the executable.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&app_dir::config_file())
    }

    /// Load and validate a config file. A missing file yields the defaults;
    /// an unreadable, malformed or out-of-range one is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = match fs::read_to_string(path) {
            Ok(json) => {
                let config: Self =
                    serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
                        path: path.to_path_buf(),
                        source,
                    })?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No configuration file at {}, using defaults", path.display());
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every setting, failing on the first bad one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: String| ConfigError::Invalid { field, reason };

        if self.chunk_size == 0 {
            return Err(invalid("chunk_size", "must be > 0".into()));
        }
        self.fractal_params()?;
        if self.debounce_ms == 0 {
            return Err(invalid("debounce_ms", "must be > 0".into()));
        }
        if !(self.initial_half_extent.is_finite() && self.initial_half_extent > 0.0) {
            return Err(invalid(
                "initial_half_extent",
                format!("must be positive and finite, got {}", self.initial_half_extent),
            ));
        }
        if !(self.zoom_in_factor > 0.0 && self.zoom_in_factor < 1.0) {
            return Err(invalid(
                "zoom_in_factor",
                format!("must lie in (0, 1), got {}", self.zoom_in_factor),
            ));
        }
        if !(self.zoom_out_factor.is_finite() && self.zoom_out_factor > 1.0) {
            return Err(invalid(
                "zoom_out_factor",
                format!("must be finite and > 1, got {}", self.zoom_out_factor),
            ));
        }
        if !(self.window_width > 0.0 && self.window_height > 0.0) {
            return Err(invalid(
                "window_width",
                format!(
                    "window size must be positive, got {}x{}",
                    self.window_width, self.window_height
                ),
            ));
        }
        let theme_count = self.themes()?.len();
        if self.theme >= theme_count {
            return Err(invalid(
                "theme",
                format!("index {} out of range ({theme_count} themes)", self.theme),
            ));
        }
        Ok(())
    }

    pub fn fractal_params(&self) -> Result<FractalParams, ConfigError> {
        Ok(FractalParams::new(self.max_iterations, self.escape_radius_sq)?)
    }

    /// The configured themes, or the builtin table when none are configured.
    pub fn themes(&self) -> Result<Vec<ColorGradient>, ConfigError> {
        if self.themes.is_empty() {
            Ok(builtin_themes()?)
        } else {
            Ok(self.themes.clone())
        }
    }

    /// Effective worker concurrency cap.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
