// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

#![doc = include_str!("../README.md")]

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

mod commands;
use commands::{CliArgs, Commands, Outcome};

/// Exit status when the chain was rejected.
const EXIT_REJECTED: u8 = 3;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // RUST_LOG still wins over -v
    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match run(args) {
        Ok(Outcome::Accepted) => ExitCode::SUCCESS,
        Ok(Outcome::Rejected) => ExitCode::from(EXIT_REJECTED),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<Outcome> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("could not start async runtime")?;

    match args.command {
        Commands::Validate(validate) => runtime.block_on(validate.execute()),
        Commands::Anchors(anchors) => anchors.execute().map(|()| Outcome::Accepted),
    }
}
