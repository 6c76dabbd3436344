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

//! Tools for checking the revocation status of a device certificate with
//! OCSP (RFC 6960).

mod checker;
pub use checker::RevocationChecker;

mod request;
pub use request::OcspRequest;
#[cfg(test)]
pub(crate) use request::nonce_extension;

mod response;
pub use response::OcspResponse;

/// A certificate whose revocation status is to be checked, together with
/// the public key of its issuer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevocationTarget {
    certificate_der: Vec<u8>,
    issuer_public_key_der: Vec<u8>,
}

impl RevocationTarget {
    /// Create a target from a DER-encoded certificate and the DER-encoded
    /// `SubjectPublicKeyInfo` of its issuer.
    pub fn new(certificate_der: Vec<u8>, issuer_public_key_der: Vec<u8>) -> Self {
        Self {
            certificate_der,
            issuer_public_key_der,
        }
    }

    /// DER encoding of the certificate being checked.
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    /// DER encoding of the issuer's `SubjectPublicKeyInfo`.
    pub fn issuer_public_key_der(&self) -> &[u8] {
        &self.issuer_public_key_der
    }
}
