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

//! Certification path validation against a single trust anchor.

use chrono::{DateTime, Utc};
use log::debug;
use x509_parser::{prelude::X509Certificate, time::ASN1Time};

use crate::{
    name::names_match, ocsp::RevocationTarget, raw_signature::validate_signature,
    CertificateChain, Result, TrustAnchor, ValidationError,
};

/// The outcome of a successful path validation.
#[derive(Clone, Debug)]
pub struct ValidatedPath {
    depth: usize,
    target: RevocationTarget,
}

impl ValidatedPath {
    /// Number of certificates validated, excluding the anchor.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The leaf certificate together with its issuer's key, which is what a
    /// revocation check needs.
    pub fn revocation_target(&self) -> &RevocationTarget {
        &self.target
    }
}

/// Validate `chain` against `anchor` at time `at`.
///
/// Every certificate must be within its validity window, each certificate
/// must be issued and signed by the next one in the chain, every issuer in
/// the chain must be a CA allowed to sign certificates, and the top-most
/// certificate must be signed by the anchor key. If the chain ends with the
/// anchor's own certificate, that certificate is not validated.
///
/// Revocation is not checked here.
pub fn verify(
    chain: &CertificateChain,
    anchor: &TrustAnchor,
    at: DateTime<Utc>,
) -> Result<ValidatedPath> {
    let mut certs = chain.parse()?;

    if certs.len() > 1 && certs.last().is_some_and(|top| is_anchor_certificate(top, anchor)) {
        debug!("chain ends with the certificate of anchor \"{}\"", anchor.subject());
        certs.pop();
    }

    let time = ASN1Time::from_timestamp(at.timestamp())
        .map_err(|_| ValidationError::MalformedChain(format!("invalid validation time {at}")))?;

    for cert in &certs {
        if !cert.validity().is_valid_at(time) {
            return Err(ValidationError::ExpiredOrNotYetValid {
                subject: cert.subject().to_string(),
            });
        }
    }

    for (certs_below, pair) in certs.windows(2).enumerate() {
        let (child, parent) = (&pair[0], &pair[1]);

        if !names_match(child.issuer(), parent.subject()) {
            return Err(ValidationError::MalformedChain(format!(
                "issuer of \"{}\" is not \"{}\"",
                child.subject(),
                parent.subject()
            )));
        }

        check_issuer_constraints(parent, certs_below)?;
        verify_signed_by(child, parent.public_key().raw)?;
    }

    let top = certs
        .last()
        .ok_or_else(|| ValidationError::MalformedChain("certificate chain is empty".into()))?;

    let anchor_name = anchor.subject_name().ok_or_else(|| {
        ValidationError::InvalidConfiguration(format!(
            "anchor \"{}\" has an invalid subject",
            anchor.subject()
        ))
    })?;

    if !names_match(top.issuer(), &anchor_name) {
        debug!(
            "issuer \"{}\" of \"{}\" differs from anchor \"{}\"; relying on key match",
            top.issuer(),
            top.subject(),
            anchor.subject()
        );
    }

    verify_signed_by(top, anchor.public_key_der())?;

    let issuer_public_key_der = match certs.get(1) {
        Some(issuer) => issuer.public_key().raw.to_vec(),
        None => anchor.public_key_der().to_vec(),
    };

    Ok(ValidatedPath {
        depth: certs.len(),
        target: RevocationTarget::new(chain.leaf_der().to_vec(), issuer_public_key_der),
    })
}

fn is_anchor_certificate(cert: &X509Certificate<'_>, anchor: &TrustAnchor) -> bool {
    cert.public_key().raw == anchor.public_key_der()
        && anchor
            .subject_name()
            .is_some_and(|subject| names_match(cert.subject(), &subject))
}

fn check_issuer_constraints(issuer: &X509Certificate<'_>, certs_below: usize) -> Result<()> {
    let not_a_ca = || {
        ValidationError::MalformedChain(format!(
            "\"{}\" is not a certificate authority",
            issuer.subject()
        ))
    };

    let Ok(Some(constraints)) = issuer.basic_constraints() else {
        return Err(not_a_ca());
    };

    if !constraints.value.ca {
        return Err(not_a_ca());
    }

    if let Some(path_len) = constraints.value.path_len_constraint {
        if certs_below > path_len as usize {
            return Err(ValidationError::MalformedChain(format!(
                "path length constraint of \"{}\" exceeded",
                issuer.subject()
            )));
        }
    }

    if let Ok(Some(key_usage)) = issuer.key_usage() {
        if !key_usage.value.key_cert_sign() {
            return Err(ValidationError::MalformedChain(format!(
                "\"{}\" is not allowed to sign certificates",
                issuer.subject()
            )));
        }
    }

    Ok(())
}

fn verify_signed_by(cert: &X509Certificate<'_>, issuer_public_key: &[u8]) -> Result<()> {
    let data = cert.tbs_certificate.as_ref();
    let sig = cert.signature_value.as_ref();

    validate_signature(&cert.signature_algorithm.algorithm, sig, data, issuer_public_key).map_err(
        |err| {
            debug!("signature on \"{}\" rejected: {err}", cert.subject());
            ValidationError::SignatureInvalid {
                subject: cert.subject().to_string(),
            }
        },
    )
}
