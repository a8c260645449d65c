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

//! Cached tile rendering for a loaded dataset.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use tempfile::NamedTempFile;

use crate::cache::{CacheKey, CacheStats, TileCache};
use crate::dataset::Dataset;
use crate::raster::{Rasterizer, RenderOptions};
use crate::tile::TileRequest;
use crate::Error;

/// Encoded PNG bytes and the key they were rendered for.
#[derive(Debug, Clone)]
pub struct RenderedTile {
    pub bytes: Arc<[u8]>,
    pub key: CacheKey,
}

impl RenderedTile {
    /// Write the tile as `{z}{x}{y}.png` inside `dir`, creating it if needed.
    ///
    /// The bytes go to a temporary file in `dir` that is renamed into place,
    /// so a failed write never leaves a truncated tile behind.
    pub fn write_to_dir(&self, dir: &Path, tile: TileRequest) -> Result<PathBuf, Error> {
        let io_error = |path: &Path, source| Error::Io {
            path: path.to_path_buf(),
            source,
        };

        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        let path = tile.file_path(dir);

        let mut file = NamedTempFile::new_in(dir).map_err(|e| io_error(dir, e))?;
        file.write_all(&self.bytes)
            .map_err(|e| io_error(file.path(), e))?;
        file.persist(&path).map_err(|e| io_error(&path, e.error))?;
        Ok(path)
    }
}

/// Renders tiles of one dataset, consulting the cache first.
#[derive(Debug)]
pub struct TileService {
    dataset: Arc<Dataset>,
    rasterizer: Rasterizer,
    cache: TileCache,
}

impl TileService {
    /// Create a service rendering `dataset` with `options`, backed by `cache`.
    #[must_use]
    pub fn new(dataset: Arc<Dataset>, options: RenderOptions, cache: TileCache) -> Self {
        Self {
            dataset,
            rasterizer: Rasterizer::new(options),
            cache,
        }
    }

    /// Counters of the underlying cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Return the tile from cache, rendering and storing it on a miss.
    pub fn render(&self, tile: TileRequest) -> Result<RenderedTile, Error> {
        let key = CacheKey::new(self.dataset.version(), tile);
        if let Some(bytes) = self.cache.get(&key) {
            debug!("cache hit for {}", key.path);
            return Ok(RenderedTile { bytes, key });
        }

        let rendered = self.render_uncached(tile)?;
        self.cache.insert(rendered.key.clone(), Arc::clone(&rendered.bytes));
        Ok(rendered)
    }

    /// Render without reading or writing the cache.
    pub fn render_uncached(&self, tile: TileRequest) -> Result<RenderedTile, Error> {
        let bytes = self.rasterizer.render_png(
            self.dataset.features(),
            self.dataset.palette(),
            tile,
        )?;
        debug!("rendered {tile} ({} bytes)", bytes.len());
        Ok(RenderedTile {
            bytes: bytes.into(),
            key: CacheKey::new(self.dataset.version(), tile),
        })
    }
}
