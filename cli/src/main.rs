// This file is part of hwoverlay, an application to resolve FPGA fabric designs into device-tree overlays.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// hwoverlay is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// hwoverlay is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

use clap::{Parser, Subcommand};
use log::{debug, error};
use std::path::PathBuf;
use std::process::ExitCode;

mod generate;
mod install;
mod resolve;

#[derive(Parser, Debug)]
#[command(name = "hwoverlay")]
#[command(bin_name = "hwoverlay")]
#[command(version, about = "Turn FPGA fabric designs into device-tree overlays")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a hand written module list and print it with its connection annotations
    Resolve {
        #[arg(help = "YAML module list with a top level `hw:` key")]
        config: PathBuf,
    },
    /// Print the overlay source for a hand-off design
    Generate {
        #[arg(
            help = r#"a .hwh file, a .hdf archive, or a directory holding either
an extracted hand-off bundle (with sysdef.xml) or a .hdf archive"#
        )]
        path: PathBuf,
    },
    /// Generate, compile and install the overlay for a hand-off design. Requires root.
    Install {
        #[arg(help = "same inputs as `generate`")]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    debug!("parsed cli command with {cli:?}");
    let result = match cli.command {
        Commands::Resolve { config } => resolve::resolve_handler(&config),
        Commands::Generate { path } => generate::generate_handler(&path),
        Commands::Install { path } => install::install_handler(&path),
    };
    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
