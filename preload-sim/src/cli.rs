/*
 * preload-sim: headless runner for preloader sessions.
 * Copyright (c) 2022  Ruifeng Xie
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Command line interface for `preload-sim`.

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};
use clap::{ArgEnum, Parser, Subcommand};
use fern::colors::{Color::*, ColoredLevelConfig};
use log::LevelFilter;
use preloader::path::{resolve_with, DEFAULT_DENSITY_MARKER};
use crate::manifest::Manifest;
use crate::sim::simulate;

/// Arguments of `preload-sim`.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct Cli {
    /// How much of the session to report on stderr (`info` if given without a level).
    #[clap(long, arg_enum, global = true)]
    pub verbose: Option<Option<Verbosity>>,
    /// What to do.
    #[clap(subcommand)]
    pub commands: Commands,
}

/// Log levels selectable with `--verbose`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ArgEnum)]
#[allow(missing_docs)]
pub enum Verbosity { Off, Error, Warn, Info, Debug, Trace }

impl From<Verbosity> for LevelFilter {
    fn from(verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Off => LevelFilter::Off,
            Verbosity::Error => LevelFilter::Error,
            Verbosity::Warn => LevelFilter::Warn,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
            Verbosity::Trace => LevelFilter::Trace,
        }
    }
}

/// Things `preload-sim` can do.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Simulate the load session described in a manifest.
    Run {
        /// Manifest file (`.yaml`, `.yml`, or `.json`).
        manifest: PathBuf,
        /// Frame interval, in milliseconds.
        #[clap(long, default_value_t = 16)]
        tick: u64,
    },
    /// Resolve a logical asset path to the path actually fetched.
    Resolve {
        /// Logical asset path.
        path: String,
        /// Resolve to the high-density variant.
        #[clap(long)]
        high_density: bool,
        /// Marker for high-density variants.
        #[clap(long, default_value = DEFAULT_DENSITY_MARKER)]
        marker: String,
    },
}

const LEVEL_COLOURS: ColoredLevelConfig = ColoredLevelConfig {
    error: BrightRed,
    warn: BrightYellow,
    info: BrightCyan,
    debug: BrightBlue,
    trace: Cyan,
};

/// Log targets inside this binary are shown relative to the crate root.
fn short_target(target: &str) -> &str {
    target.strip_prefix("preload_sim::").unwrap_or(target)
}

fn setup_logger(verbose: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record|
            out.finish(format_args!(
                "{}: {}: {}",
                short_target(record.target()),
                LEVEL_COLOURS.color(record.level()),
                message,
            )))
        .level(verbose)
        .chain(std::io::stderr())
        .apply()
        .context("failed to install logger")
}

impl Cli {
    /// Log level selected by `--verbose`: errors only when absent.
    pub fn log_level(&self) -> LevelFilter {
        self.verbose.map_or(LevelFilter::Error, |level| level.map_or(LevelFilter::Info, LevelFilter::from))
    }

    /// Parse the arguments, and carry out the subcommand.
    pub fn run() -> Result<()> {
        let args = Cli::parse();
        setup_logger(args.log_level())?;
        match args.commands {
            Commands::Run { manifest, tick } => {
                let session = Manifest::load(&manifest)?;
                let report = simulate(session, Duration::from_millis(tick))
                    .with_context(|| format!("load session {manifest:?} failed"))?;
                let percents: Vec<_> = report.percents.iter().map(u8::to_string).collect();
                println!("{}", percents.join(" "));
                println!("{} after {:?}", report.state, report.elapsed);
            }
            Commands::Resolve { path, high_density, marker } =>
                println!("{}", resolve_with(&path, high_density, &marker)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use super::*;

    #[test]
    fn arguments() {
        Cli::command().debug_assert();
        let cli = Cli::try_parse_from(["preload-sim", "resolve", "bg.jpg", "--high-density"]).unwrap();
        match cli.commands {
            Commands::Resolve { path, high_density, marker } => {
                assert_eq!(path, "bg.jpg");
                assert!(high_density);
                assert_eq!(marker, "@2x");
            }
            other => panic!("unexpected subcommand: {other:?}"),
        }
        let cli = Cli::try_parse_from(["preload-sim", "run", "lawn.yaml", "--verbose=debug"]).unwrap();
        assert_eq!(cli.verbose, Some(Some(Verbosity::Debug)));
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        assert!(matches!(cli.commands, Commands::Run { tick: 16, .. }));
    }

    #[test]
    fn default_log_levels() {
        let quiet = Cli::try_parse_from(["preload-sim", "resolve", "bg.jpg"]).unwrap();
        assert_eq!(quiet.log_level(), LevelFilter::Error);
        let chatty = Cli::try_parse_from(["preload-sim", "resolve", "bg.jpg", "--verbose"]).unwrap();
        assert_eq!(chatty.log_level(), LevelFilter::Info);
    }
}
