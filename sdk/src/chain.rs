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

use x509_parser::{
    pem::Pem,
    prelude::{FromDer, X509Certificate},
};

use crate::{Result, ValidationError};

/// A certificate chain as presented by a device, leaf first.
///
/// The chain may or may not end with the certificate of the anchor that
/// issued it; both forms are accepted during validation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateChain {
    certificates: Vec<Vec<u8>>,
}

impl CertificateChain {
    /// Build a chain from DER-encoded certificates, leaf first.
    ///
    /// Fails if the chain is empty or any entry is not a well-formed
    /// certificate.
    pub fn from_der(certificates: Vec<Vec<u8>>) -> Result<Self> {
        if certificates.is_empty() {
            return Err(ValidationError::MalformedChain(
                "certificate chain is empty".into(),
            ));
        }

        for (index, der) in certificates.iter().enumerate() {
            parse_certificate(index, der)?;
        }

        Ok(Self { certificates })
    }

    /// Build a chain from a buffer holding one or more PEM `CERTIFICATE`
    /// blocks, leaf first.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let mut certificates = Vec::new();

        for pem in Pem::iter_from_buffer(pem) {
            let pem = pem.map_err(|err| {
                ValidationError::MalformedChain(format!("invalid PEM data: {err}"))
            })?;

            if pem.label == "CERTIFICATE" {
                certificates.push(pem.contents);
            }
        }

        Self::from_der(certificates)
    }

    /// DER encoding of the leaf (device) certificate.
    pub fn leaf_der(&self) -> &[u8] {
        // A chain is never empty once constructed.
        &self.certificates[0]
    }

    /// All certificates, leaf first.
    pub fn certificates(&self) -> &[Vec<u8>] {
        &self.certificates
    }

    /// Number of certificates in the chain.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Always `false`; see [`CertificateChain::from_der`].
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub(crate) fn parse(&self) -> Result<Vec<X509Certificate<'_>>> {
        self.certificates
            .iter()
            .enumerate()
            .map(|(index, der)| parse_certificate(index, der))
            .collect()
    }
}

fn parse_certificate(index: usize, der: &[u8]) -> Result<X509Certificate<'_>> {
    match X509Certificate::from_der(der) {
        Ok((rem, cert)) if rem.is_empty() => Ok(cert),
        Ok(_) => Err(ValidationError::MalformedChain(format!(
            "trailing data after certificate {index}"
        ))),
        Err(err) => Err(ValidationError::MalformedChain(format!(
            "certificate {index} could not be parsed: {err}"
        ))),
    }
}
