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

use anyhow::Result;
use clap::Parser;

use crate::commands::ConfigArgs;

#[derive(Debug, Parser)]
pub struct Anchors {
    #[clap(flatten)]
    pub config: ConfigArgs,
}

impl Anchors {
    pub fn execute(&self) -> Result<()> {
        let anchors = self.config.load()?.anchor_set()?;

        println!("{} trust anchor(s)", anchors.len());
        for anchor in &anchors {
            println!("{}", anchor.subject());
            match anchor.ocsp() {
                Some(ocsp) => println!(
                    "  ocsp: {} (nonce {})",
                    ocsp.responder_uri(),
                    if ocsp.nonce_enabled() { "on" } else { "off" }
                ),
                None => println!("  ocsp: disabled"),
            }
        }

        Ok(())
    }
}
