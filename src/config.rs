// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Settings are stored as TOML through confy, either in the platform config
//! directory under `areatiles/config` or in an explicit `--config` file.
//! Every field has a serde default, so partial files load cleanly. Command
//! line flags are applied on top of the loaded values.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tile_render::cache::DEFAULT_CACHE_MAX_BYTES;
use tile_render::projection::DEFAULT_TILE_SIZE;
use tile_render::raster::DEFAULT_STROKE_WIDTH;
use tile_render::{CanvasSize, ColorPolicy, RenderOptions};

const APP_NAME: &str = "areatiles";
const CONFIG_NAME: &str = "config";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// GeoJSON FeatureCollection with the boundary polygons
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Address the HTTP server binds to
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Tile canvas width in pixels
    #[serde(default = "default_tile_size")]
    pub tile_width: u32,

    /// Tile canvas height in pixels
    #[serde(default = "default_tile_size")]
    pub tile_height: u32,

    /// Outline width in pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,

    /// Byte budget of the in-memory tile cache (0 disables it)
    #[serde(default = "default_cache_max_bytes")]
    pub cache_max_bytes: usize,

    /// Seed for reproducible feature colors; random on every start when unset
    #[serde(default)]
    pub color_seed: Option<u64>,

    /// Directory served under `/assets`
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Page served at `/`
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Directory that `export` writes tiles into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Default value functions for serde
fn default_data_path() -> PathBuf {
    PathBuf::from("areas.geojson")
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_tile_size() -> u32 {
    DEFAULT_TILE_SIZE
}

fn default_stroke_width() -> f32 {
    DEFAULT_STROKE_WIDTH
}

fn default_cache_max_bytes() -> usize {
    DEFAULT_CACHE_MAX_BYTES
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("index.html")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Tiles")
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            listen: default_listen(),
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            stroke_width: DEFAULT_STROKE_WIDTH,
            cache_max_bytes: DEFAULT_CACHE_MAX_BYTES,
            color_seed: None,
            assets_dir: default_assets_dir(),
            index_path: default_index_path(),
            output_dir: default_output_dir(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or from the user config directory
    pub fn load(path: Option<&Path>) -> Result<Self, confy::ConfyError> {
        match path {
            Some(path) => confy::load_path(path),
            None => confy::load(APP_NAME, CONFIG_NAME),
        }
    }

    /// Get the config file path for display to user
    pub fn get_config_path(path: Option<&Path>) -> Result<PathBuf, confy::ConfyError> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => confy::get_configuration_file_path(APP_NAME, CONFIG_NAME),
        }
    }

    /// Reject settings that would make every render fail
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tile_width == 0 || self.tile_height == 0 {
            anyhow::bail!(
                "tile size must be non-zero, got {}x{}",
                self.tile_width,
                self.tile_height
            );
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            anyhow::bail!(
                "stroke_width must be a finite, non-negative number, got {}",
                self.stroke_width
            );
        }
        Ok(())
    }

    /// Canvas and outline settings for the rasterizer
    #[must_use]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            canvas: CanvasSize::new(self.tile_width, self.tile_height),
            stroke_width: self.stroke_width,
        }
    }

    /// Seeded colors when `color_seed` is set, random otherwise
    #[must_use]
    pub fn color_policy(&self) -> ColorPolicy {
        self.color_seed.map_or(ColorPolicy::Random, ColorPolicy::Seeded)
    }

    /// Per-request timeout for the HTTP server
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_server_conventions() {
        let config = AppConfig::default();
        assert_eq!(config.listen.to_string(), "0.0.0.0:3000");
        assert_eq!(config.render_options(), RenderOptions::default());
        assert_eq!(config.output_dir, PathBuf::from("Tiles"));
        assert_eq!(config.color_policy(), ColorPolicy::Random);
    }

    #[test]
    fn test_validate_rejects_unusable_canvas() {
        assert!(AppConfig::default().validate().is_ok());

        let zero_width = AppConfig {
            tile_width: 0,
            ..AppConfig::default()
        };
        assert!(zero_width.validate().is_err());

        let zero_height = AppConfig {
            tile_height: 0,
            ..AppConfig::default()
        };
        assert!(zero_height.validate().is_err());

        for stroke_width in [-1.0, f32::NAN, f32::INFINITY] {
            let config = AppConfig {
                stroke_width,
                ..AppConfig::default()
            };
            assert!(config.validate().is_err(), "accepted stroke width {stroke_width}");
        }

        let no_outline = AppConfig {
            stroke_width: 0.0,
            ..AppConfig::default()
        };
        assert!(no_outline.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("areatiles.toml");
        std::fs::write(&path, "tile_width = 512\ncolor_seed = 9\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.tile_width, 512);
        assert_eq!(config.tile_height, DEFAULT_TILE_SIZE);
        assert_eq!(config.color_policy(), ColorPolicy::Seeded(9));
        assert_eq!(config.data_path, PathBuf::from("areas.geojson"));
    }

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.toml");

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }
}
