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

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use devcert_auth::{CertificateChain, DeviceCertificateValidator, ValidationError};
use log::debug;

use crate::commands::{ConfigArgs, Outcome};

#[derive(Debug, Parser)]
pub struct Validate {
    /// PEM file holding the chain, leaf certificate first.
    #[clap(long)]
    pub chain: PathBuf,

    #[clap(flatten)]
    pub config: ConfigArgs,
}

impl Validate {
    pub async fn execute(&self) -> Result<Outcome> {
        let settings = self.config.load()?;
        let anchors = settings.anchor_set()?;
        debug!("loaded {} trust anchor(s)", anchors.len());

        let pem = fs::read(&self.chain)
            .with_context(|| format!("could not read chain from {:?}", self.chain))?;
        let chain = CertificateChain::from_pem(&pem)
            .with_context(|| format!("could not parse chain from {:?}", self.chain))?;

        let validator = DeviceCertificateValidator::with_settings(settings.validator);

        match validator.validate(&chain, &anchors).await {
            Ok(()) => {
                println!("accepted");
                Ok(Outcome::Accepted)
            }
            Err(err) => {
                println!("rejected: {err}");
                if let ValidationError::ChainNotTrusted { failures } = &err {
                    for failure in failures {
                        println!("  - {failure}");
                    }
                }
                Ok(Outcome::Rejected)
            }
        }
    }
}
