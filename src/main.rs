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

mod cli;
mod config;
mod export;
mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use mimalloc::MiMalloc;
use tile_render::{Dataset, TileCache, TileService};

use cli::{Cli, Commands};
use config::AppConfig;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    match AppConfig::get_config_path(cli.config.as_deref()) {
        Ok(path) => info!("configuration: {}", path.display()),
        Err(e) => warn!("cannot resolve configuration path: {e}"),
    }
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let dataset = Dataset::load(&config.data_path, config.color_policy())
        .with_context(|| format!("failed to load feature data from {}", config.data_path.display()))?;

    match &cli.command {
        Commands::Serve(_) => {
            let service = Arc::new(TileService::new(
                Arc::new(dataset),
                config.render_options(),
                TileCache::new(config.cache_max_bytes),
            ));
            let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(server::serve(service, &config))
        }
        Commands::Export(args) => {
            let tiles = if args.tiles.is_empty() {
                export::read_tiles(std::io::stdin().lock())?
            } else {
                args.tiles.clone()
            };
            let service = TileService::new(Arc::new(dataset), config.render_options(), TileCache::new(0));
            export::run(&service, &tiles, &config.output_dir)
        }
    }
}
