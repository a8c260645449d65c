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

//! Tile addressing.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// URL prefix of the tile route.
pub const TILE_ROUTE_PREFIX: &str = "/tile/";

/// Errors from parsing a tile address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileParseError {
    #[error("expected z/x/y, got '{0}'")]
    InvalidFormat(String),

    #[error("invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

/// One tile in a power-of-two grid.
///
/// Values are projection parameters only; they are not checked against the
/// grid extent for the zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRequest {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileRequest {
    #[must_use]
    pub const fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Canonical request path, `/tile/{z}/{x}/{y}`.
    #[must_use]
    pub fn path(&self) -> String {
        format!("{TILE_ROUTE_PREFIX}{}/{}/{}", self.zoom, self.x, self.y)
    }

    /// File name used by batch export, `{z}{x}{y}.png`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}{}{}.png", self.zoom, self.x, self.y)
    }

    #[must_use]
    pub fn file_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    /// Parse `z`, `x` and `y` from separate fields.
    pub fn from_parts(zoom: &str, x: &str, y: &str) -> Result<Self, TileParseError> {
        Ok(Self {
            zoom: parse_field("zoom", zoom)?,
            x: parse_field("x", x)?,
            y: parse_field("y", y)?,
        })
    }
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, TileParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| TileParseError::InvalidValue {
            field,
            value: value.to_string(),
        })
}

impl fmt::Display for TileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

impl FromStr for TileRequest {
    type Err = TileParseError;

    /// Accepts `z/x/y`, optionally prefixed by `/tile/`, or whitespace
    /// separated `z x y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix(TILE_ROUTE_PREFIX)
            .unwrap_or(trimmed)
            .trim_start_matches('/');

        let parts: Vec<&str> = if trimmed.contains('/') {
            trimmed.split('/').collect()
        } else {
            trimmed.split_whitespace().collect()
        };

        match parts.as_slice() {
            [zoom, x, y] => Self::from_parts(zoom, x, y),
            _ => Err(TileParseError::InvalidFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_path() {
        assert_eq!(
            "/tile/3/4/5".parse::<TileRequest>(),
            Ok(TileRequest::new(3, 4, 5))
        );
    }

    #[test]
    fn test_parse_bare_and_whitespace_forms() {
        assert_eq!("3/4/5".parse::<TileRequest>(), Ok(TileRequest::new(3, 4, 5)));
        assert_eq!("  3 4\t5 ".parse::<TileRequest>(), Ok(TileRequest::new(3, 4, 5)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            "/tile/3/4".parse::<TileRequest>(),
            Err(TileParseError::InvalidFormat(_))
        ));
        assert_eq!(
            "/tile/3/four/5".parse::<TileRequest>(),
            Err(TileParseError::InvalidValue {
                field: "x",
                value: "four".to_string()
            })
        );
        assert!("/tile/3/-1/5".parse::<TileRequest>().is_err());
        assert!("/tile/300/1/5".parse::<TileRequest>().is_err());
    }

    #[test]
    fn test_path_and_file_name() {
        let tile = TileRequest::new(2, 10, 3);
        assert_eq!(tile.path(), "/tile/2/10/3");
        assert_eq!(tile.file_name(), "2103.png");
        assert_eq!(
            tile.file_path(Path::new("Tiles")),
            PathBuf::from("Tiles/2103.png")
        );
    }
}
