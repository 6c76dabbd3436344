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

use std::hash::{Hash, Hasher};

use url::Url;
use x509_parser::{
    pem::Pem,
    prelude::{FromDer, X509Certificate},
    x509::{SubjectPublicKeyInfo, X509Name},
};

use crate::{hash::sha1, name::parse_name, Result, ValidationError};

/// A certification authority trusted to issue device certificates.
///
/// An anchor is identified by its subject name and public key. Optional
/// OCSP settings control whether leaf certificates chaining to this anchor
/// are checked for revocation.
#[derive(Clone, Debug)]
pub struct TrustAnchor {
    subject_der: Vec<u8>,
    subject: String,
    public_key_der: Vec<u8>,
    ocsp: Option<OcspConfig>,
}

impl TrustAnchor {
    /// Create an anchor from a DER-encoded subject `Name` and a DER-encoded
    /// `SubjectPublicKeyInfo`.
    pub fn new(subject_der: impl Into<Vec<u8>>, public_key_der: impl Into<Vec<u8>>) -> Result<Self> {
        let subject_der = subject_der.into();
        let public_key_der = public_key_der.into();

        let subject = parse_name(&subject_der)
            .ok_or_else(|| {
                ValidationError::InvalidConfiguration("anchor subject is not a valid name".into())
            })?
            .to_string();

        match SubjectPublicKeyInfo::from_der(&public_key_der) {
            Ok((rem, _)) if rem.is_empty() => {}
            _ => {
                return Err(ValidationError::InvalidConfiguration(format!(
                    "public key of anchor \"{subject}\" is not a valid SubjectPublicKeyInfo"
                )));
            }
        }

        Ok(Self {
            subject_der,
            subject,
            public_key_der,
            ocsp: None,
        })
    }

    /// Create an anchor from the subject and public key of a DER-encoded
    /// certificate.
    pub fn from_certificate_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der).map_err(|err| {
            ValidationError::InvalidConfiguration(format!("invalid anchor certificate: {err}"))
        })?;

        Self::new(cert.subject().as_raw(), cert.public_key().raw)
    }

    /// Create an anchor from the first certificate in a PEM buffer.
    pub fn from_certificate_pem(pem: &[u8]) -> Result<Self> {
        let der = first_pem_certificate(pem).ok_or_else(|| {
            ValidationError::InvalidConfiguration("no certificate found in PEM data".into())
        })?;

        Self::from_certificate_der(&der)
    }

    /// Enable OCSP revocation checking for chains validated by this anchor.
    pub fn with_ocsp(mut self, ocsp: OcspConfig) -> Self {
        self.ocsp = Some(ocsp);
        self
    }

    /// Human readable form of the anchor subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// DER encoding of the anchor subject `Name`.
    pub fn subject_der(&self) -> &[u8] {
        &self.subject_der
    }

    /// DER encoding of the anchor `SubjectPublicKeyInfo`.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    /// OCSP settings, if revocation checking is enabled.
    pub fn ocsp(&self) -> Option<&OcspConfig> {
        self.ocsp.as_ref()
    }

    /// Returns `true` if leaf certificates must be checked for revocation.
    pub fn is_revocation_enabled(&self) -> bool {
        self.ocsp.is_some()
    }

    pub(crate) fn subject_name(&self) -> Option<X509Name<'_>> {
        parse_name(&self.subject_der)
    }

    /// SHA-1 of the subject public key bits, the usual way issuers derive
    /// the authority key identifier carried by the certificates they sign.
    pub(crate) fn key_identifier(&self) -> Option<Vec<u8>> {
        let (_, spki) = SubjectPublicKeyInfo::from_der(&self.public_key_der).ok()?;
        Some(sha1(&spki.subject_public_key.data))
    }
}

impl PartialEq for TrustAnchor {
    fn eq(&self, other: &Self) -> bool {
        self.subject_der == other.subject_der && self.public_key_der == other.public_key_der
    }
}

impl Eq for TrustAnchor {}

impl Hash for TrustAnchor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.subject_der.hash(state);
        self.public_key_der.hash(state);
    }
}

/// OCSP settings attached to a [`TrustAnchor`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspConfig {
    responder_uri: Url,
    responder_certificate_der: Option<Vec<u8>>,
    nonce_enabled: bool,
}

impl OcspConfig {
    /// Query the responder at `responder_uri`, without a nonce.
    pub fn new(responder_uri: Url) -> Self {
        Self {
            responder_uri,
            responder_certificate_der: None,
            nonce_enabled: false,
        }
    }

    /// Require responses to be signed by this certificate.
    ///
    /// Without it, responses must be signed by the issuer of the leaf or by
    /// a responder certificate that the issuer delegated OCSP signing to.
    pub fn with_responder_certificate_der(mut self, der: Vec<u8>) -> Result<Self> {
        if X509Certificate::from_der(&der).is_err() {
            return Err(ValidationError::InvalidConfiguration(
                "invalid OCSP responder certificate".into(),
            ));
        }

        self.responder_certificate_der = Some(der);
        Ok(self)
    }

    /// Send a nonce with each request and require the response to echo it.
    pub fn with_nonce(mut self, enabled: bool) -> Self {
        self.nonce_enabled = enabled;
        self
    }

    /// Location of the OCSP responder.
    pub fn responder_uri(&self) -> &Url {
        &self.responder_uri
    }

    /// DER encoding of the configured responder certificate, if any.
    pub fn responder_certificate_der(&self) -> Option<&[u8]> {
        self.responder_certificate_der.as_deref()
    }

    /// Returns `true` if requests carry a nonce.
    pub fn nonce_enabled(&self) -> bool {
        self.nonce_enabled
    }
}

/// An ordered collection of trust anchors.
///
/// Insertion order is preserved and used to break ties when several anchors
/// match a chain equally well. Inserting an anchor with the same subject and
/// public key as one already present has no effect.
#[derive(Clone, Debug, Default)]
pub struct AnchorSet {
    anchors: Vec<TrustAnchor>,
}

impl AnchorSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anchor. Returns `false` if an anchor with the same identity was
    /// already present.
    pub fn insert(&mut self, anchor: TrustAnchor) -> bool {
        if self.anchors.contains(&anchor) {
            return false;
        }

        self.anchors.push(anchor);
        true
    }

    /// Iterate over the anchors in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, TrustAnchor> {
        self.anchors.iter()
    }

    /// Number of anchors in the set.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns `true` if the set holds no anchors.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl From<TrustAnchor> for AnchorSet {
    fn from(anchor: TrustAnchor) -> Self {
        Self {
            anchors: vec![anchor],
        }
    }
}

impl FromIterator<TrustAnchor> for AnchorSet {
    fn from_iter<I: IntoIterator<Item = TrustAnchor>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<TrustAnchor> for AnchorSet {
    fn extend<I: IntoIterator<Item = TrustAnchor>>(&mut self, iter: I) {
        for anchor in iter {
            self.insert(anchor);
        }
    }
}

impl<'a> IntoIterator for &'a AnchorSet {
    type Item = &'a TrustAnchor;
    type IntoIter = std::slice::Iter<'a, TrustAnchor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub(crate) fn first_pem_certificate(pem: &[u8]) -> Option<Vec<u8>> {
    Pem::iter_from_buffer(pem)
        .filter_map(|pem| pem.ok())
        .find(|pem| pem.label == "CERTIFICATE")
        .map(|pem| pem.contents)
}
