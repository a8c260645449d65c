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

//! Tile rasterization.
//!
//! A tile is drawn in two passes over the feature list: every outer ring is
//! filled with its feature's color, then every ring is outlined in black.
//! Outlines therefore always sit on top of fills, whatever the feature order.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use log::trace;
use thiserror::Error;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform,
};

use crate::geometry::{Feature, FeatureCollection, LonLat};
use crate::palette::Palette;
use crate::projection::{CanvasSize, Projector};
use crate::tile::TileRequest;

/// Outline width used when none is configured.
pub const DEFAULT_STROKE_WIDTH: f32 = 2.0;

/// Errors that can occur while producing the encoded image.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
}

/// Canvas and outline settings shared by every render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub canvas: CanvasSize,
    pub stroke_width: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }
}

/// Draws feature polygons into tile-sized canvases.
///
/// Holds no canvas between calls, so one rasterizer can serve concurrent
/// renders of different tiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rasterizer {
    options: RenderOptions,
}

impl Rasterizer {
    /// Create a rasterizer for the given canvas and outline settings.
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render one tile into a fresh canvas.
    pub fn rasterize(
        &self,
        features: &FeatureCollection,
        palette: &Palette,
        tile: TileRequest,
    ) -> Result<Pixmap, EncodingError> {
        let CanvasSize { width, height } = self.options.canvas;
        let mut pixmap = Pixmap::new(width, height).ok_or(EncodingError::Canvas { width, height })?;

        let projector = Projector::new(self.options.canvas, tile);
        // Geographic north is canvas up.
        let flip = Transform::from_row(1.0, 0.0, 0.0, -1.0, 0.0, height as f32);

        let paths: Vec<Vec<Path>> = features
            .iter()
            .map(|feature| feature_paths(feature, &projector))
            .collect();

        let mut paint = Paint {
            anti_alias: true,
            ..Paint::default()
        };

        for (index, feature_paths) in paths.iter().enumerate() {
            let [r, g, b, a] = palette.color(index).to_rgba8();
            paint.set_color_rgba8(r, g, b, a);
            for path in feature_paths {
                pixmap.fill_path(path, &paint, FillRule::Winding, flip, None);
            }
        }

        if self.options.stroke_width > 0.0 {
            let stroke = Stroke {
                width: self.options.stroke_width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            paint.set_color_rgba8(0, 0, 0, u8::MAX);
            for path in paths.iter().flatten() {
                pixmap.stroke_path(path, &paint, &stroke, flip, None);
            }
        }

        trace!(
            "rasterized tile {tile} with {} path(s)",
            paths.iter().map(Vec::len).sum::<usize>()
        );
        Ok(pixmap)
    }

    /// Render one tile and return straight-alpha RGBA pixels.
    pub fn render_image(
        &self,
        features: &FeatureCollection,
        palette: &Palette,
        tile: TileRequest,
    ) -> Result<RgbaImage, EncodingError> {
        self.rasterize(features, palette, tile).map(|pixmap| to_image(&pixmap))
    }

    /// Render one tile and encode it as PNG.
    pub fn render_png(
        &self,
        features: &FeatureCollection,
        palette: &Palette,
        tile: TileRequest,
    ) -> Result<Vec<u8>, EncodingError> {
        encode_png(&self.render_image(features, palette, tile)?)
    }
}

/// Closed paths for each outer ring of a feature.
fn feature_paths(feature: &Feature, projector: &Projector) -> Vec<Path> {
    feature
        .polygons
        .iter()
        .filter_map(|polygon| polygon.outer())
        .filter_map(|ring| ring_path(ring, projector))
        .collect()
}

/// Build a closed path from every point of `ring` but the last.
///
/// Rings with fewer than two drawable points yield `None`.
fn ring_path(ring: &[LonLat], projector: &Projector) -> Option<Path> {
    let (_, points) = ring.split_last()?;
    if points.len() < 2 {
        return None;
    }

    let mut builder = PathBuilder::with_capacity(points.len() + 1, points.len());
    for (i, coord) in points.iter().enumerate() {
        let (x, y) = projector.project(*coord);
        if i == 0 {
            builder.move_to(x as f32, y as f32);
        } else {
            builder.line_to(x as f32, y as f32);
        }
    }
    builder.close();
    builder.finish()
}

/// Convert premultiplied canvas pixels to a straight-alpha image.
#[must_use]
pub fn to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    image
}

/// Encode straight-alpha RGBA pixels as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, EncodingError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}
