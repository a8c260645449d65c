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

//! Slippy-map tile rendering for administrative-boundary polygons.
//!
//! This library turns a GeoJSON FeatureCollection of MultiPolygons into
//! fixed-size PNG tiles addressed by `(zoom, x, y)`. It is split into layers
//! that can be used on their own:
//!
//! - **Geometry**: FeatureCollection bytes to per-feature outer rings
//! - **Palette**: one fill color per feature, random or seeded
//! - **Projection**: lon/lat to tile-local pixels for a regionally re-centred grid
//! - **Raster**: fill pass, outline pass and PNG encoding
//! - **Cache**: byte-bounded LRU of encoded tiles keyed by data version
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tile_render::{ColorPolicy, Dataset, RenderOptions, TileCache, TileRequest, TileService};
//!
//! let geojson = br#"{"type": "FeatureCollection", "features": [
//!     {"type": "Feature", "properties": {}, "geometry": {"type": "MultiPolygon",
//!      "coordinates": [[[[0,0],[1,0],[1,1],[0,1],[0,0]]]]}}
//! ]}"#;
//!
//! let dataset = Dataset::from_bytes(geojson, ColorPolicy::Seeded(42)).unwrap();
//! let service = TileService::new(Arc::new(dataset), RenderOptions::default(), TileCache::default());
//!
//! let tile: TileRequest = "/tile/0/0/0".parse().unwrap();
//! let png = service.render(tile).unwrap();
//! assert!(png.bytes.starts_with(b"\x89PNG"));
//! ```

pub mod cache;
pub mod dataset;
pub mod geometry;
pub mod palette;
pub mod projection;
pub mod raster;
pub mod service;
pub mod tile;

use std::path::PathBuf;

use thiserror::Error;

pub use cache::{CacheKey, CacheStats, TileCache};
pub use dataset::{DataVersion, Dataset};
pub use geometry::{extract, Feature, FeatureCollection, LonLat, ParseError, Polygon};
pub use palette::{ColorPolicy, Palette, Rgb};
pub use projection::{CanvasSize, Projector};
pub use raster::{EncodingError, Rasterizer, RenderOptions};
pub use service::{RenderedTile, TileService};
pub use tile::{TileParseError, TileRequest};

/// Errors surfaced by loading and rendering.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
