use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arena_engine::{AgentDescriptor, ConfigError, LoopConfig, SimConfig};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ViewerConfigError {
    #[error("failed to read viewer config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse viewer config {path} at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid simulation config: {0}")]
    Invalid(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ViewerConfig {
    pub(crate) simulation: SimConfig,
    pub(crate) window: WindowConfig,
    pub(crate) demo: DemoConfig,
    /// Fixed seed for reproducible runs; the OS seeds the run when absent.
    pub(crate) seed: Option<u64>,
    pub(crate) roster: Vec<AgentDescriptor>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            simulation: SimConfig::default(),
            window: WindowConfig::default(),
            demo: DemoConfig::default(),
            seed: None,
            roster: default_roster(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowConfig {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) max_frame_delta_ms: u64,
    pub(crate) metrics_log_interval_s: u64,
    pub(crate) max_render_fps: Option<u32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Agent Arena".to_string(),
            width: 800,
            height: 600,
            max_frame_delta_ms: 100,
            metrics_log_interval_s: 5,
            max_render_fps: Some(60),
        }
    }
}

impl WindowConfig {
    pub(crate) fn to_loop_config(&self) -> LoopConfig {
        LoopConfig {
            window_title: self.title.clone(),
            window_width: self.width,
            window_height: self.height,
            max_frame_delta: Duration::from_millis(self.max_frame_delta_ms),
            metrics_log_interval: Duration::from_secs(self.metrics_log_interval_s),
            max_render_fps: self.max_render_fps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DemoConfig {
    /// Wall-clock gap between two scripted activity changes.
    pub(crate) activity_interval_ms: f64,
    pub(crate) initial_active_chance: f64,
    pub(crate) execute_chance: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            activity_interval_ms: 1500.0,
            initial_active_chance: 0.5,
            execute_chance: 0.4,
        }
    }
}

pub(crate) fn default_roster() -> Vec<AgentDescriptor> {
    [
        ("atlas", "Atlas", "A"),
        ("beacon", "Beacon", "B"),
        ("cipher", "Cipher", "C"),
        ("drift", "Drift", "D"),
        ("echo", "Echo", "E"),
        ("forge", "Forge", "F"),
    ]
    .into_iter()
    .enumerate()
    .map(|(seed, (id, name, glyph))| {
        AgentDescriptor::new(id)
            .with_name(name)
            .with_glyph(glyph)
            .with_color_seed(seed as u64)
    })
    .collect()
}

/// Reads the viewer config at `path`, or the defaults when no path is given.
pub(crate) fn load_viewer_config(path: Option<&Path>) -> Result<ViewerConfig, ViewerConfigError> {
    let Some(path) = path else {
        return Ok(ViewerConfig::default());
    };
    let raw = fs::read_to_string(path).map_err(|source| ViewerConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_viewer_config(&raw, path)
}

fn parse_viewer_config(raw: &str, path: &Path) -> Result<ViewerConfig, ViewerConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: ViewerConfig = serde_path_to_error::deserialize(&mut deserializer).map_err(
        |error| {
            let field = error.path().to_string();
            ViewerConfigError::Parse {
                path: path.to_path_buf(),
                field: if field.is_empty() { ".".to_string() } else { field },
                source: error.into_inner(),
            }
        },
    )?;
    config.simulation.validate()?;
    Ok(config)
}
