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

use std::sync::Arc;

use log::{debug, info};

use crate::{
    anchor_matcher,
    http::{AsyncGenericResolver, AsyncHttpResolver},
    internal::time,
    ocsp::RevocationChecker,
    path_validator,
    settings::ValidatorSettings,
    AnchorSet, CertificateChain, Result, TrustAnchor, ValidationError,
};

/// Decides whether a device certificate chain is trusted.
///
/// A validator holds no per-call state, so a single instance can be cloned
/// and shared across tasks validating many handshakes concurrently.
#[derive(Clone)]
pub struct DeviceCertificateValidator {
    revocation_checker: RevocationChecker,
}

impl DeviceCertificateValidator {
    /// Create a validator with default settings that reaches OCSP responders
    /// through [`AsyncGenericResolver`].
    pub fn new() -> Self {
        Self::with_settings(ValidatorSettings::default())
    }

    /// Create a validator with `settings` that reaches OCSP responders
    /// through [`AsyncGenericResolver`].
    pub fn with_settings(settings: ValidatorSettings) -> Self {
        Self::with_resolver(settings, Arc::new(AsyncGenericResolver::new()))
    }

    /// Create a validator that reaches OCSP responders through `resolver`.
    pub fn with_resolver(settings: ValidatorSettings, resolver: Arc<dyn AsyncHttpResolver>) -> Self {
        Self {
            revocation_checker: RevocationChecker::new(resolver, settings),
        }
    }

    /// Validate `chain` (leaf first) against `anchors`.
    ///
    /// Candidate anchors are tried best match first. The first anchor that
    /// yields a valid path (and, when the anchor enables OCSP, a good
    /// revocation status for the leaf) accepts the chain. A revoked leaf
    /// rejects the chain outright. Any other failure moves on to the next
    /// candidate.
    ///
    /// Returns [`ValidationError::NoTrustedAnchor`] if no anchor matches,
    /// the failure of the only candidate if there was just one, or
    /// [`ValidationError::ChainNotTrusted`] listing every candidate's failure.
    pub async fn validate(&self, chain: &CertificateChain, anchors: &AnchorSet) -> Result<()> {
        let candidates = anchor_matcher::candidates(chain, anchors)?;
        if candidates.is_empty() {
            debug!("no trust anchor matches the chain");
            return Err(ValidationError::NoTrustedAnchor);
        }

        let mut failures = Vec::with_capacity(candidates.len());

        for anchor in candidates {
            match self.try_anchor(chain, anchor).await {
                Ok(()) => {
                    info!("chain accepted by trust anchor \"{}\"", anchor.subject());
                    return Ok(());
                }
                Err(err) if err.is_definitive() => return Err(err),
                Err(err) => {
                    debug!("trust anchor \"{}\" rejected chain: {err}", anchor.subject());
                    failures.push(err);
                }
            }
        }

        if failures.len() == 1 {
            if let Some(err) = failures.pop() {
                return Err(err);
            }
        }

        Err(ValidationError::ChainNotTrusted { failures })
    }

    /// Validate `chain` against a single anchor.
    ///
    /// Behaves exactly like [`DeviceCertificateValidator::validate`] with a
    /// one-element [`AnchorSet`]: a chain the anchor could not have issued
    /// fails with [`ValidationError::NoTrustedAnchor`] and no revocation
    /// check is made.
    pub async fn validate_with_anchor(
        &self,
        chain: &CertificateChain,
        anchor: &TrustAnchor,
    ) -> Result<()> {
        self.validate(chain, &AnchorSet::from(anchor.clone())).await
    }

    // Path validation, then the revocation check when the anchor enables it.
    async fn try_anchor(&self, chain: &CertificateChain, anchor: &TrustAnchor) -> Result<()> {
        let path = path_validator::verify(chain, anchor, time::utc_now())?;

        match anchor.ocsp() {
            Some(ocsp) => {
                self.revocation_checker
                    .check(path.revocation_target(), ocsp)
                    .await
            }
            None => Ok(()),
        }
    }
}

impl Default for DeviceCertificateValidator {
    fn default() -> Self {
        Self::new()
    }
}
