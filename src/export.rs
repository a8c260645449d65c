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

//! Batch export of tiles to PNG files.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{error, info};
use tile_render::{TileRequest, TileService};

/// Parse whitespace separated `z x y` triples.
pub fn parse_triples(input: &str) -> Result<Vec<TileRequest>> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let chunks = tokens.chunks_exact(3);
    if !chunks.remainder().is_empty() {
        bail!(
            "incomplete tile triple at end of input: {:?}",
            chunks.remainder().join(" ")
        );
    }
    chunks
        .map(|triple| {
            TileRequest::from_parts(triple[0], triple[1], triple[2])
                .with_context(|| format!("invalid tile {:?}", triple.join(" ")))
        })
        .collect()
}

pub fn read_tiles(mut reader: impl Read) -> Result<Vec<TileRequest>> {
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .context("failed to read tile list")?;
    parse_triples(&input)
}

/// Render every tile into `output_dir`.
///
/// Failed tiles are logged and the export continues; the result is an error
/// if any tile failed.
pub fn run(service: &TileService, tiles: &[TileRequest], output_dir: &Path) -> Result<()> {
    let mut failed = 0usize;
    for &tile in tiles {
        match service
            .render_uncached(tile)
            .and_then(|rendered| rendered.write_to_dir(output_dir, tile))
        {
            Ok(path) => info!("wrote {}", path.display()),
            Err(e) => {
                error!("tile {tile}: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} tile(s) failed to export", tiles.len());
    }
    info!("exported {} tile(s) to {}", tiles.len(), output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tile_render::{ColorPolicy, Dataset, RenderOptions, TileCache};

    const SQUARE: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {}, "geometry": {"type": "MultiPolygon",
         "coordinates": [[[[0,0],[1,0],[1,1],[0,1],[0,0]]]]}}
    ]}"#;

    #[test]
    fn test_parse_triples() {
        let tiles = parse_triples("5 19 10\n0 0 0\n").unwrap();
        assert_eq!(tiles, vec![TileRequest::new(5, 19, 10), TileRequest::new(0, 0, 0)]);
        assert!(parse_triples("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_triples_rejects_bad_input() {
        assert!(parse_triples("5 19").is_err());
        assert!(parse_triples("5 19 -1").is_err());
    }

    #[test]
    fn test_read_tiles_from_reader() {
        let tiles = read_tiles("1 0 0".as_bytes()).unwrap();
        assert_eq!(tiles, vec![TileRequest::new(1, 0, 0)]);
    }

    #[test]
    fn test_export_writes_named_files() {
        let dataset = Dataset::from_bytes(SQUARE.as_bytes(), ColorPolicy::Seeded(1)).unwrap();
        let service = TileService::new(
            Arc::new(dataset),
            RenderOptions::default(),
            TileCache::new(0),
        );
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Tiles");

        run(&service, &[TileRequest::new(0, 0, 0), TileRequest::new(5, 19, 10)], &out).unwrap();

        let png = std::fs::read(out.join("000.png")).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (256, 256));
        assert!(out.join("51910.png").exists());
    }
}
