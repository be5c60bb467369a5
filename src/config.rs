//! Layout and application configuration.
//!
//! [`LayoutConfig`] is the explicit configuration handed to a
//! [`LayoutSurface`](crate::surface::LayoutSurface) at construction: grid step,
//! canvas bounds, minimum tile size and handle margin. [`AppConfig`] wraps it
//! with the storage settings of the command-line tool and is read from
//! `TILEBOARD_*` environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

use tracing::warn;

use crate::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_CORE_COUNT, DEFAULT_GRID_SIZE, HANDLE_MARGIN};
use crate::geometry::Rect;
use crate::store::Profile;

pub const DEFAULT_SYSTEM_NAME: &str = "AP1";
pub const DEFAULT_DATA_DIR: &str = ".";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid size must be positive and finite, got {0}")]
    InvalidGridSize(f64),
    #[error("minimum tile size {min} must be a positive multiple of the grid size {grid}")]
    InvalidMinTileSize { min: f64, grid: f64 },
    #[error("handle margin must be non-negative and finite, got {0}")]
    InvalidHandleMargin(f64),
    #[error("canvas bounds must have positive size, got {width}x{height}")]
    EmptyBounds { width: f64, height: f64 },
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
}

/// Configuration of one layout surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Grid step; every committed coordinate and size is a multiple of it.
    pub grid_size: f64,
    /// Initial canvas bounds. The host may resize them later.
    pub bounds: Rect,
    /// Smallest width/height a resize may produce. Defaults to one grid cell.
    pub min_tile_size: f64,
    /// Width of the resize handle band inside each tile edge.
    pub handle_margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            bounds: Rect::new(0.0, 0.0, DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT),
            min_tile_size: DEFAULT_GRID_SIZE,
            handle_margin: HANDLE_MARGIN,
        }
    }
}

impl LayoutConfig {
    /// Config with the given grid step; the minimum tile size follows the grid.
    #[must_use]
    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self.min_tile_size = grid_size;
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    #[must_use]
    pub fn with_min_tile_size(mut self, min_tile_size: f64) -> Self {
        self.min_tile_size = min_tile_size;
        self
    }

    #[must_use]
    pub fn with_handle_margin(mut self, handle_margin: f64) -> Self {
        self.handle_margin = handle_margin;
        self
    }

    /// Check the invariants the layout engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        let cells = self.min_tile_size / self.grid_size;
        if !cells.is_finite() || cells < 1.0 || cells.fract().abs() > 1e-9 {
            return Err(ConfigError::InvalidMinTileSize { min: self.min_tile_size, grid: self.grid_size });
        }
        if !self.handle_margin.is_finite() || self.handle_margin < 0.0 {
            return Err(ConfigError::InvalidHandleMargin(self.handle_margin));
        }
        if !(self.bounds.width > 0.0 && self.bounds.height > 0.0) {
            return Err(ConfigError::EmptyBounds { width: self.bounds.width, height: self.bounds.height });
        }
        Ok(())
    }
}

/// Settings of the `tileboard` tool.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding `dashboard_state_*.json` and `app_config.json`.
    pub data_dir: PathBuf,
    /// Section of the profile file this dashboard reads and writes.
    pub system_name: String,
    /// Profile override; when absent the last used profile is restored.
    pub profile: Option<Profile>,
    pub layout: LayoutConfig,
    /// Number of cores populated into a default layout.
    pub core_count: usize,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `TILEBOARD_DATA_DIR`: default `.`
    /// - `TILEBOARD_SYSTEM`: default `AP1`
    /// - `TILEBOARD_PROFILE`: `ALL`, `GRAPH` or `GAUGE`
    /// - `TILEBOARD_GRID_SIZE`: default 10
    /// - `TILEBOARD_CANVAS_WIDTH` / `TILEBOARD_CANVAS_HEIGHT`: default 600
    /// - `TILEBOARD_MIN_TILE_SIZE`: default one grid cell
    /// - `TILEBOARD_HANDLE_MARGIN`: default 10
    /// - `TILEBOARD_CORE_COUNT`: default 9
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unknown profile or an invalid layout config.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var_os(key).map(|v| v.to_string_lossy().into_owned()))
    }

    /// Same as [`AppConfig::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unknown profile or an invalid layout config.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = PathBuf::from(lookup("TILEBOARD_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));
        let system_name = lookup("TILEBOARD_SYSTEM").unwrap_or_else(|| DEFAULT_SYSTEM_NAME.into());
        let profile = match lookup("TILEBOARD_PROFILE") {
            Some(raw) => Some(raw.parse::<Profile>()?),
            None => None,
        };

        let grid_size = lookup_parse(&lookup, "TILEBOARD_GRID_SIZE", DEFAULT_GRID_SIZE);
        let width = lookup_parse(&lookup, "TILEBOARD_CANVAS_WIDTH", DEFAULT_CANVAS_WIDTH);
        let height = lookup_parse(&lookup, "TILEBOARD_CANVAS_HEIGHT", DEFAULT_CANVAS_HEIGHT);
        let min_tile_size = lookup_parse(&lookup, "TILEBOARD_MIN_TILE_SIZE", grid_size);
        let handle_margin = lookup_parse(&lookup, "TILEBOARD_HANDLE_MARGIN", HANDLE_MARGIN);
        let core_count = lookup_parse(&lookup, "TILEBOARD_CORE_COUNT", DEFAULT_CORE_COUNT);

        let layout = LayoutConfig {
            grid_size,
            bounds: Rect::new(0.0, 0.0, width, height),
            min_tile_size,
            handle_margin,
        };
        layout.validate()?;

        Ok(Self { data_dir, system_name, profile, layout, core_count })
    }
}

/// Parse `key` through `lookup`, falling back to `default` when absent or malformed.
pub(crate) fn lookup_parse<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    if let Ok(value) = raw.trim().parse::<T>() {
        value
    } else {
        warn!(key, value = %raw, "ignoring malformed config value");
        default
    }
}

