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

use asn1_rs::{Any as Asn1Any, Header};
use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use rasn::types::OctetString;
use rasn_ocsp::{BasicOcspResponse, CertStatus, OcspResponseStatus, SingleResponse};
use x509_parser::{
    prelude::{FromDer, X509Certificate},
    time::ASN1Time,
};

use crate::{
    ocsp::OcspRequest,
    raw_signature::{validate_signature, SignatureAlgorithm, OCSP_BASIC_ARCS, OCSP_NONCE_ARCS},
    Result, ValidationError,
};

/// A decoded basic OCSP response.
///
/// Decoding only checks that the response is well formed and successful.
/// Each of the acceptance checks is a separate method so callers can apply
/// them in the order they need.
#[derive(Debug)]
pub struct OcspResponse {
    basic: BasicOcspResponse,
    basic_der: OctetString,
}

/// Raw byte ranges of a `BasicOCSPResponse`, needed because signatures are
/// computed over the exact bytes the responder produced.
struct RawBasicResponse<'a> {
    tbs_response_data: &'a [u8],
    certs: Vec<&'a [u8]>,
}

impl OcspResponse {
    /// Decode a DER `OCSPResponse`.
    ///
    /// Fails with [`ValidationError::RevocationCheckFailed`] if the response
    /// is malformed, reports an unsuccessful status, or is not a basic
    /// response.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let response = rasn::der::decode::<rasn_ocsp::OcspResponse>(der)
            .map_err(|err| failed(format!("malformed OCSP response: {err}")))?;

        if response.status != OcspResponseStatus::Successful {
            return Err(failed(format!(
                "OCSP responder returned status {:?}",
                response.status
            )));
        }

        let response_bytes = response
            .bytes
            .ok_or_else(|| failed("OCSP response has no response bytes".into()))?;

        let response_type: &[u32] = &response_bytes.r#type;
        if response_type != OCSP_BASIC_ARCS {
            return Err(failed(format!(
                "unsupported OCSP response type {}",
                arcs_to_string(response_type)
            )));
        }

        let basic = rasn::der::decode::<BasicOcspResponse>(&response_bytes.response)
            .map_err(|err| failed(format!("malformed basic OCSP response: {err}")))?;

        Ok(Self {
            basic,
            basic_der: response_bytes.response,
        })
    }

    /// The decoded basic response.
    pub fn basic_response(&self) -> &BasicOcspResponse {
        &self.basic
    }

    /// Check that the response is signed by an authorized responder.
    ///
    /// If `responder_certificate` is given, only its key is accepted.
    /// Otherwise the response must be signed either by the issuer of the
    /// certificate in question or by a certificate embedded in the response
    /// which that issuer signed, which carries the OCSP signing extended key
    /// usage and which is valid at `now`.
    pub fn verify_signature(
        &self,
        responder_certificate: Option<&[u8]>,
        issuer_public_key: &[u8],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let raw = split_basic_response(&self.basic_der)
            .ok_or_else(|| failed("malformed basic OCSP response".into()))?;

        let algorithm = SignatureAlgorithm::from_arcs(&self.basic.signature_algorithm.algorithm)
            .ok_or_else(|| {
                unknown(format!(
                    "unsupported OCSP signature algorithm {}",
                    arcs_to_string(&self.basic.signature_algorithm.algorithm)
                ))
            })?;

        let signature = self.basic.signature.as_raw_slice();
        let signed_by = |public_key: &[u8]| {
            algorithm
                .validator()
                .validate(signature, raw.tbs_response_data, public_key)
                .is_ok()
        };

        if let Some(responder_der) = responder_certificate {
            let (_, responder) = X509Certificate::from_der(responder_der).map_err(|err| {
                ValidationError::InvalidConfiguration(format!(
                    "invalid OCSP responder certificate: {err}"
                ))
            })?;

            return if signed_by(responder.public_key().raw) {
                Ok(())
            } else {
                Err(unknown(
                    "OCSP response is not signed by the configured responder".into(),
                ))
            };
        }

        if signed_by(issuer_public_key) {
            debug!("OCSP response signed by the certificate issuer");
            return Ok(());
        }

        for cert_der in &raw.certs {
            let Ok((_, responder)) = X509Certificate::from_der(cert_der) else {
                continue;
            };

            if is_delegated_responder(&responder, issuer_public_key, now)
                && signed_by(responder.public_key().raw)
            {
                debug!("OCSP response signed by delegated responder \"{}\"", responder.subject());
                return Ok(());
            }
        }

        Err(unknown(
            "OCSP response is not signed by an authorized responder".into(),
        ))
    }

    /// Check that the response echoes `expected` in its nonce extension.
    ///
    /// Both the RFC 8954 form (an `OCTET STRING` wrapped in the extension
    /// value) and the bare form some older responders emit are accepted.
    pub fn check_nonce(&self, expected: &[u8]) -> Result<()> {
        let value = self
            .basic
            .tbs_response_data
            .response_extensions
            .iter()
            .flat_map(|exts| exts.iter())
            .find(|ext| {
                let id: &[u32] = &ext.extn_id;
                id == OCSP_NONCE_ARCS
            })
            .map(|ext| &ext.extn_value)
            .ok_or(ValidationError::NonceMismatch)?;

        if **value == *expected {
            return Ok(());
        }

        match rasn::der::decode::<OctetString>(value) {
            Ok(wrapped) if *wrapped == *expected => Ok(()),
            _ => Err(ValidationError::NonceMismatch),
        }
    }

    /// Find the single response that answers `request`.
    pub fn single_response_for(&self, request: &OcspRequest) -> Option<&SingleResponse> {
        self.basic
            .tbs_response_data
            .responses
            .iter()
            .find(|single| request.matches(&single.cert_id))
    }

    /// Map the status of the single response answering `request` to a
    /// validation outcome.
    ///
    /// The response must be current: `thisUpdate` no later than
    /// `now + skew` and `nextUpdate` (or `thisUpdate` when absent) no
    /// earlier than `now - skew`.
    pub fn certificate_status(
        &self,
        request: &OcspRequest,
        now: DateTime<Utc>,
        skew: TimeDelta,
    ) -> Result<()> {
        let single = self.single_response_for(request).ok_or_else(|| {
            unknown("OCSP response does not cover the certificate".into())
        })?;

        let this_update = single.this_update.with_timezone(&Utc);
        let next_update = single
            .next_update
            .map(|next_update| next_update.with_timezone(&Utc))
            .unwrap_or(this_update);

        let (Some(latest), Some(earliest)) =
            (now.checked_add_signed(skew), now.checked_sub_signed(skew))
        else {
            return Err(unknown(format!(
                "clock skew of {}s is out of range",
                skew.num_seconds()
            )));
        };

        if this_update > latest {
            return Err(unknown(format!(
                "OCSP response is not yet valid (thisUpdate {this_update})"
            )));
        }

        if next_update < earliest {
            return Err(unknown(format!(
                "OCSP response is stale (nextUpdate {next_update})"
            )));
        }

        match &single.cert_status {
            CertStatus::Good => Ok(()),
            CertStatus::Revoked(revoked_info) => Err(ValidationError::CertificateRevoked {
                revoked_at: revoked_info.revocation_time.with_timezone(&Utc),
                reason: revoked_info
                    .revocation_reason
                    .as_ref()
                    .map(|reason| format!("{reason:?}")),
            }),
            CertStatus::Unknown(_) => Err(unknown(
                "OCSP responder does not know the certificate".into(),
            )),
        }
    }
}

/// Evaluate `der` as the answer to `request`.
///
/// Checks are applied in order: response status, signature, nonce,
/// certificate identifier, freshness, then the certificate status itself.
pub(crate) fn evaluate(
    der: &[u8],
    request: &OcspRequest,
    responder_certificate: Option<&[u8]>,
    issuer_public_key: &[u8],
    now: DateTime<Utc>,
    skew: TimeDelta,
) -> Result<()> {
    let response = OcspResponse::from_der(der)?;

    response.verify_signature(responder_certificate, issuer_public_key, now)?;

    if let Some(nonce) = request.nonce() {
        response.check_nonce(nonce)?;
    }

    response.certificate_status(request, now, skew)
}

fn is_delegated_responder(
    responder: &X509Certificate<'_>,
    issuer_public_key: &[u8],
    now: DateTime<Utc>,
) -> bool {
    let issued_by_issuer = validate_signature(
        &responder.signature_algorithm.algorithm,
        responder.signature_value.as_ref(),
        responder.tbs_certificate.as_ref(),
        issuer_public_key,
    )
    .is_ok();

    let ocsp_signing = matches!(
        responder.extended_key_usage(),
        Ok(Some(eku)) if eku.value.ocsp_signing
    );

    let current = ASN1Time::from_timestamp(now.timestamp())
        .is_ok_and(|time| responder.validity().is_valid_at(time));

    issued_by_issuer && ocsp_signing && current
}

fn split_basic_response(der: &[u8]) -> Option<RawBasicResponse<'_>> {
    let (content, _, _) = next_element(der)?;

    let (_, tbs_response_data, rest) = next_element(content)?;

    // signatureAlgorithm, then signature
    let (_, _, rest) = next_element(rest)?;
    let (_, _, rest) = next_element(rest)?;

    let mut certs = Vec::new();
    if !rest.is_empty() {
        // certs [0] EXPLICIT SEQUENCE OF Certificate
        let (explicit, _, _) = next_element(rest)?;
        let (mut remaining, _, _) = next_element(explicit)?;

        while !remaining.is_empty() {
            let (_, cert, next) = next_element(remaining)?;
            certs.push(cert);
            remaining = next;
        }
    }

    Some(RawBasicResponse {
        tbs_response_data,
        certs,
    })
}

/// Split the first DER element off `input`.
///
/// Returns the element content, the complete element and the remaining
/// input.
fn next_element(input: &[u8]) -> Option<(&[u8], &[u8], &[u8])> {
    let (rest, _) = <Asn1Any as asn1_rs::FromDer>::from_der(input).ok()?;
    let element = &input[..input.len() - rest.len()];
    let (content, _) = <Header as asn1_rs::FromDer>::from_der(element).ok()?;
    Some((content, element, rest))
}

fn arcs_to_string(arcs: &[u32]) -> String {
    arcs.iter()
        .map(|arc| arc.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn unknown(reason: String) -> ValidationError {
    ValidationError::RevocationStatusUnknownOrUnavailable(reason)
}

fn failed(reason: String) -> ValidationError {
    ValidationError::RevocationCheckFailed(reason)
}
