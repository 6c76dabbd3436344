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

use rasn::types::{Any, ObjectIdentifier, OctetString, Oid};
use rasn_ocsp::{CertId, Request, TbsRequest};
use rasn_pkix::{AlgorithmIdentifier, Certificate, Extension};
use x509_parser::{
    prelude::{FromDer, X509Certificate},
    x509::SubjectPublicKeyInfo,
};

use crate::{
    hash::{sha1, sha256},
    ocsp::RevocationTarget,
    raw_signature::{OCSP_NONCE_ARCS, SHA1_ARCS, SHA256_ARCS},
    Result, ValidationError,
};

/// Length in bytes of generated nonces.
const NONCE_LEN: usize = 16;

/// An encoded OCSP request for a single certificate.
#[derive(Clone, Debug)]
pub struct OcspRequest {
    der: Vec<u8>,
    cert_id: CertId,
    nonce: Option<Vec<u8>>,
    issuer_name_der: Vec<u8>,
    issuer_key_bits: Vec<u8>,
}

impl OcspRequest {
    /// Build a request for `target`, optionally carrying a fresh random
    /// nonce.
    ///
    /// The issuer name hash is taken over the issuer name bytes exactly as
    /// they appear in the certificate. Re-encoding the name could change its
    /// string types and produce a hash the responder does not recognise.
    pub fn new(target: &RevocationTarget, with_nonce: bool) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(target.certificate_der())
            .map_err(|err| malformed(format!("certificate could not be parsed: {err}")))?;
        let issuer_name_der = cert.issuer().as_raw().to_vec();

        let (_, issuer_key) = SubjectPublicKeyInfo::from_der(target.issuer_public_key_der())
            .map_err(|err| malformed(format!("issuer public key could not be parsed: {err}")))?;
        let issuer_key_bits = issuer_key.subject_public_key.data.to_vec();

        let certificate: Certificate = rasn::der::decode(target.certificate_der())
            .map_err(|err| malformed(format!("certificate could not be decoded: {err}")))?;

        let cert_id = CertId {
            hash_algorithm: sha1_algorithm()?,
            issuer_name_hash: OctetString::from(sha1(&issuer_name_der)),
            issuer_key_hash: OctetString::from(sha1(&issuer_key_bits)),
            serial_number: certificate.tbs_certificate.serial_number,
        };

        let nonce = with_nonce.then(|| rand::random::<[u8; NONCE_LEN]>().to_vec());
        let request_extensions = match &nonce {
            Some(nonce) => Some(vec![nonce_extension(nonce)?].into()),
            None => None,
        };

        let request = rasn_ocsp::OcspRequest {
            tbs_request: TbsRequest {
                version: rasn_ocsp::Version::from(0u8),
                requestor_name: None,
                request_list: vec![Request {
                    req_cert: cert_id.clone(),
                    single_request_extensions: None,
                }],
                request_extensions,
            },
            optional_signature: None,
        };

        let der = rasn::der::encode(&request)
            .map_err(|err| failed(format!("could not encode OCSP request: {err}")))?;

        Ok(Self {
            der,
            cert_id,
            nonce,
            issuer_name_der,
            issuer_key_bits,
        })
    }

    /// DER encoding of the request.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The certificate identifier the request asks about.
    pub fn cert_id(&self) -> &CertId {
        &self.cert_id
    }

    /// The nonce sent with the request, if any.
    pub fn nonce(&self) -> Option<&[u8]> {
        self.nonce.as_deref()
    }

    /// Returns `true` if `cert_id` from a response identifies the same
    /// certificate as this request.
    ///
    /// Responders may answer with a different hash algorithm than the one
    /// requested, so the hashes are recomputed for SHA-1 and SHA-256.
    pub fn matches(&self, cert_id: &CertId) -> bool {
        if cert_id.serial_number != self.cert_id.serial_number {
            return false;
        }

        let algorithm: &[u32] = &cert_id.hash_algorithm.algorithm;
        let (name_hash, key_hash) = if algorithm == SHA1_ARCS {
            (sha1(&self.issuer_name_der), sha1(&self.issuer_key_bits))
        } else if algorithm == SHA256_ARCS {
            (sha256(&self.issuer_name_der), sha256(&self.issuer_key_bits))
        } else {
            return false;
        };

        *cert_id.issuer_name_hash == *name_hash && *cert_id.issuer_key_hash == *key_hash
    }
}

fn sha1_algorithm() -> Result<AlgorithmIdentifier> {
    let sha1_oid = Oid::new(SHA1_ARCS).ok_or_else(|| failed("invalid SHA-1 OID".into()))?;

    Ok(AlgorithmIdentifier {
        algorithm: ObjectIdentifier::from(sha1_oid),
        // Many OCSP responders expect this to be NULL not None.
        parameters: Some(Any::new(
            rasn::der::encode(&()).map_err(|err| failed(err.to_string()))?,
        )),
    })
}

/// The nonce extension value is itself a DER `OCTET STRING` (RFC 8954).
pub(crate) fn nonce_extension(nonce: &[u8]) -> Result<Extension> {
    let nonce_oid = Oid::new(OCSP_NONCE_ARCS).ok_or_else(|| failed("invalid nonce OID".into()))?;
    let value = rasn::der::encode(&OctetString::from(nonce.to_vec()))
        .map_err(|err| failed(format!("could not encode OCSP nonce: {err}")))?;

    Ok(Extension {
        extn_id: ObjectIdentifier::from(nonce_oid),
        critical: false,
        extn_value: OctetString::from(value),
    })
}

fn malformed(reason: String) -> ValidationError {
    ValidationError::MalformedChain(reason)
}

fn failed(reason: String) -> ValidationError {
    ValidationError::RevocationCheckFailed(reason)
}
