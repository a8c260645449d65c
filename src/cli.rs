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

//! Command line schema.

use std::net::SocketAddr;
use std::path::PathBuf;

use tile_render::TileRequest;

use crate::config::AppConfig;

/// Render and serve slippy-map tiles of boundary polygons
#[derive(clap::Parser, Debug)]
#[command(name = "areatiles", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file; the user config directory is used when omitted
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// GeoJSON FeatureCollection to render
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub data: Option<PathBuf>,

    /// Seed feature colors so they are identical across runs
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Serve tiles, static assets and the index page over HTTP
    Serve(ServeArgs),

    /// Render tiles to PNG files
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on, e.g. 127.0.0.1:3000
    #[arg(short, long)]
    pub listen: Option<SocketAddr>,

    /// Directory served under /assets
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub assets: Option<PathBuf>,

    /// Page served at /
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub index: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Tiles as z/x/y; whitespace separated "z x y" triples are read from
    /// stdin when none are given
    pub tiles: Vec<TileRequest>,

    /// Output directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(data) = &self.data {
            config.data_path.clone_from(data);
        }
        if self.seed.is_some() {
            config.color_seed = self.seed;
        }

        match &self.command {
            Commands::Serve(args) => {
                if let Some(listen) = args.listen {
                    config.listen = listen;
                }
                if let Some(assets) = &args.assets {
                    config.assets_dir.clone_from(assets);
                }
                if let Some(index) = &args.index {
                    config.index_path.clone_from(index);
                }
            }
            Commands::Export(args) => {
                if let Some(output) = &args.output {
                    config.output_dir.clone_from(output);
                }
            }
        }
    }

    /// Log filter implied by the verbosity flag.
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[test]
    fn test_command_schema() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "areatiles",
            "--data",
            "regions.geojson",
            "serve",
            "--listen",
            "127.0.0.1:8080",
            "-vv",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.data_path, PathBuf::from("regions.geojson"));
        assert_eq!(config.listen.to_string(), "127.0.0.1:8080");
        assert_eq!(cli.log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_export_tiles_parse() {
        let cli = Cli::try_parse_from(["areatiles", "export", "5/19/10", "0/0/0", "-o", "out"]).unwrap();
        let Commands::Export(args) = &cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.tiles, vec![TileRequest::new(5, 19, 10), TileRequest::new(0, 0, 0)]);

        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_export_rejects_bad_tile() {
        assert!(Cli::try_parse_from(["areatiles", "export", "5/x/10"]).is_err());
    }
}
