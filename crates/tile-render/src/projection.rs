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

//! Geographic to tile-pixel projection.
//!
//! Coordinates go through a spherical (Web) Mercator forward projection, a
//! regional re-centering step, and finally a zoom-dependent scale and
//! translation into the pixel frame of one tile.
//!
//! The re-centering offset and the origin offsets below are fitted to the
//! boundary dataset this server was built for (it keeps Russia contiguous in
//! projected space). They are not a general antimeridian treatment and are
//! applied unchanged for every canvas size.

use crate::geometry::LonLat;
use crate::tile::TileRequest;

/// Half the circumference of the Mercator world in meters.
pub const MERCATOR_MAX: f64 = 20_037_508.342_789_244;

/// Projected meters subtracted from eastern-hemisphere X so that the region
/// of interest sits centered in projected space.
pub const REGION_WEST_OFFSET: f64 = 1_635_093.158_838_66;

/// Horizontal pixel offset of the projected origin at zoom 0.
pub const ORIGIN_OFFSET_X: f64 = 138.5;

/// Vertical pixel offset of the projected origin at zoom 0.
pub const ORIGIN_OFFSET_Y: f64 = 128.0;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Spherical Mercator forward projection.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator;

impl WebMercator {
    /// Convert longitude/latitude in degrees to projected meters.
    #[must_use]
    pub fn to_meters(lon: f64, lat: f64) -> (f64, f64) {
        let x = lon * MERCATOR_MAX / 180.0;
        let y = ((90.0 + lat) * std::f64::consts::PI / 360.0).tan().ln()
            / (std::f64::consts::PI / 180.0);
        (x, y * MERCATOR_MAX / 180.0)
    }
}

/// Shift western longitudes down by a full turn.
///
/// `[-180, 0)` becomes `[-540, -360)`, which the re-centering step then
/// wraps to the far side of the region of interest.
#[must_use]
pub fn normalize_longitude(lon: f64) -> f64 {
    if lon < 0.0 {
        lon - 360.0
    } else {
        lon
    }
}

/// Apply the regional re-centering to projected X.
///
/// Positive X moves west by [`REGION_WEST_OFFSET`]; everything else (including
/// exactly zero) wraps forward by two world half-widths first.
#[must_use]
pub fn recenter(mx: f64) -> f64 {
    if mx > 0.0 {
        mx - REGION_WEST_OFFSET
    } else {
        mx + 2.0 * MERCATOR_MAX - REGION_WEST_OFFSET
    }
}

/// Pixel dimensions of a rendered tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Canvas of `width` by `height` pixels.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square canvas with edge `size`.
    #[must_use]
    pub const fn square(size: u32) -> Self {
        Self::new(size, size)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::square(DEFAULT_TILE_SIZE)
    }
}

/// Maps geographic coordinates into the pixel frame of a single tile.
///
/// Output Y grows upward (geographic north); the rasterizer flips the canvas
/// to match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    scale_x: f64,
    scale_y: f64,
    zoom_scale: f64,
    dx: f64,
    dy: f64,
}

impl Projector {
    /// Projector for `tile` rendered into `canvas`.
    #[must_use]
    pub fn new(canvas: CanvasSize, tile: TileRequest) -> Self {
        let width = f64::from(canvas.width);
        let height = f64::from(canvas.height);
        let zoom_scale = 2f64.powi(i32::from(tile.zoom));

        Self {
            scale_x: width / MERCATOR_MAX,
            scale_y: height / MERCATOR_MAX,
            zoom_scale,
            dx: width * f64::from(tile.x) - ORIGIN_OFFSET_X * zoom_scale,
            dy: height * (zoom_scale - 1.0 - f64::from(tile.y)) - ORIGIN_OFFSET_Y * zoom_scale,
        }
    }

    /// Project a coordinate to tile-local pixels.
    #[must_use]
    pub fn project(&self, coord: LonLat) -> (f64, f64) {
        let (mx, my) = WebMercator::to_meters(normalize_longitude(coord.lon), coord.lat);
        let mx = recenter(mx);

        let px = mx * self.scale_x * self.zoom_scale * 0.5 - self.dx;
        let py = my * self.scale_y * self.zoom_scale * 0.5 - self.dy;
        (px, py)
    }

    /// Tile `(x, y)` at `zoom` whose canvas contains `coord`.
    ///
    /// The result is not clamped to the tile grid and may be negative.
    #[must_use]
    pub fn tile_containing(canvas: CanvasSize, coord: LonLat, zoom: u8) -> (i64, i64) {
        let origin = Self::new(canvas, TileRequest::new(zoom, 0, 0));
        let (px, py) = origin.project(coord);

        let x = (px / f64::from(canvas.width)).floor();
        let y = -(py / f64::from(canvas.height)).floor();
        (x as i64, y as i64)
    }
}
