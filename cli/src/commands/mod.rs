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

mod anchors;
mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use devcert_auth::settings::Settings;

pub use self::{anchors::Anchors, validate::Validate};

/// Tool for validating device certificate chains against configured trust
/// anchors.
#[derive(Debug, Parser)]
#[command(author, version, about, arg_required_else_help = true)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Use verbose output (-vv very verbose output).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a certificate chain presented by a device.
    Validate(Validate),
    /// List the configured trust anchors.
    Anchors(Anchors),
}

/// What a command concluded about its input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Accepted,
    Rejected,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Path to the trust anchor configuration (.toml or .json).
    #[clap(short, long, env = "DEVCERT_CONFIG")]
    pub config: PathBuf,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<Settings> {
        Settings::from_file(&self.config)
            .with_context(|| format!("could not load configuration from {:?}", self.config))
    }
}
