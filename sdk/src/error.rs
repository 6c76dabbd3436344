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

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Describes the ways a device certificate chain can fail validation.
///
/// The revocation variants are mutually distinguishable so callers can tell
/// a revoked device apart from a responder that could not be consulted.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    /// No configured trust anchor could plausibly have issued the chain.
    #[error("no trust anchor matches the certificate chain")]
    NoTrustedAnchor,

    /// A certificate in the chain is outside its validity window.
    #[error("certificate \"{subject}\" is expired or not yet valid")]
    ExpiredOrNotYetValid {
        /// Subject of the offending certificate.
        subject: String,
    },

    /// A certificate in the chain does not carry a valid signature from
    /// its issuer.
    #[error("signature on certificate \"{subject}\" does not verify")]
    SignatureInvalid {
        /// Subject of the offending certificate.
        subject: String,
    },

    /// The chain could not be parsed or is structurally invalid.
    #[error("malformed certificate chain: {0}")]
    MalformedChain(String),

    /// The OCSP responder reported the leaf certificate as revoked.
    #[error("certificate revoked at {revoked_at}{}", reason_suffix(.reason))]
    CertificateRevoked {
        /// Time of revocation as reported by the responder.
        revoked_at: DateTime<Utc>,

        /// Revocation reason, if the responder supplied one.
        reason: Option<String>,
    },

    /// The responder answered but the answer does not establish a status
    /// for the leaf certificate.
    #[error("revocation status unknown or unavailable: {0}")]
    RevocationStatusUnknownOrUnavailable(String),

    /// The responder could not be reached or returned an unusable answer.
    #[error("revocation check failed: {0}")]
    RevocationCheckFailed(String),

    /// The response did not echo the nonce sent in the request.
    #[error("OCSP response nonce does not match the request")]
    NonceMismatch,

    /// More than one anchor was tried and every one of them failed.
    #[error("certificate chain not trusted; {} candidate anchors failed", .failures.len())]
    ChainNotTrusted {
        /// Failure reported for each candidate, in the order tried.
        failures: Vec<ValidationError>,
    },

    /// A trust anchor or its OCSP configuration is unusable.
    #[error("invalid trust anchor configuration: {0}")]
    InvalidConfiguration(String),
}

impl ValidationError {
    /// Returns `true` if the error is a definitive statement that the device
    /// must not be trusted, such that no other anchor should be consulted.
    pub fn is_definitive(&self) -> bool {
        matches!(self, Self::CertificateRevoked { .. })
    }

    /// Returns `true` if the error came from the revocation check rather
    /// than from path validation.
    pub fn is_revocation_failure(&self) -> bool {
        matches!(
            self,
            Self::CertificateRevoked { .. }
                | Self::RevocationStatusUnknownOrUnavailable(_)
                | Self::RevocationCheckFailed(_)
                | Self::NonceMismatch
        )
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|reason| format!(" ({reason})"))
        .unwrap_or_default()
}

/// A specialized `Result` type for device certificate validation.
pub type Result<T> = std::result::Result<T, ValidationError>;
