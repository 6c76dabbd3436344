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

//! Certificates and OCSP responses generated at test time.

use std::{
    io::{Cursor, Read},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use asn1_rs::{Any, Class, Header, Length, Tag, ToDer};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use http::{header::CONTENT_TYPE, Request, Response};
use rasn::types::{BitString, Integer, ObjectIdentifier, OctetString, Oid};
use rasn_ocsp::{
    BasicOcspResponse, CertId, CertStatus, OcspResponseStatus, ResponderId, ResponseBytes,
    ResponseData, RevokedInfo, SingleResponse,
};
use rasn_pkix::{AlgorithmIdentifier, Certificate, CrlReason, Extension};
use rcgen::{
    date_time_ymd, BasicConstraints, CertificateParams, CertifiedIssuer, DistinguishedName,
    DnType, ExtendedKeyUsagePurpose, IsCa, KeyIdMethod, KeyPair, KeyUsagePurpose,
    PublicKeyData, SignatureAlgorithm, SigningKey,
};
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::{
    hash::sha1,
    http::{AsyncHttpResolver, HttpResolverError},
    ocsp::nonce_extension,
    raw_signature::{OCSP_BASIC_ARCS, OCSP_NONCE_ARCS},
    CertificateChain, TrustAnchor,
};

static DEFAULT_ALG: &SignatureAlgorithm = &rcgen::PKCS_ECDSA_P256_SHA256;

const ECDSA_WITH_SHA256_ARCS: &[u32] = &[1, 2, 840, 10045, 4, 3, 2];

/// A certification authority (or delegated OCSP responder) able to sign.
#[derive(Clone)]
pub(crate) struct TestCa {
    pub(crate) issuer: Arc<CertifiedIssuer<'static, KeyPair>>,
}

impl TestCa {
    pub(crate) fn new(name: &str) -> Self {
        Self::new_with_alg(name, DEFAULT_ALG)
    }

    pub(crate) fn new_with_alg(name: &str, alg: &'static SignatureAlgorithm) -> Self {
        let key = KeyPair::generate_for(alg).unwrap();
        let params = ca_params(name, &key);
        Self {
            issuer: Arc::new(CertifiedIssuer::self_signed(params, key).unwrap()),
        }
    }

    /// A second CA with exactly the same subject but its own key.
    pub(crate) fn impostor(&self) -> Self {
        let (_, cert) = X509Certificate::from_der(self.issuer.der()).unwrap();
        let cn = cert
            .subject()
            .iter_common_name()
            .next()
            .unwrap()
            .as_str()
            .unwrap()
            .to_string();

        Self::new(&cn)
    }

    pub(crate) fn intermediate(&self, name: &str) -> Self {
        let key = KeyPair::generate_for(DEFAULT_ALG).unwrap();
        let params = ca_params(name, &key);
        self.sub_issuer(params, key)
    }

    pub(crate) fn intermediate_with_path_len(&self, name: &str, path_len: u8) -> Self {
        let key = KeyPair::generate_for(DEFAULT_ALG).unwrap();
        let mut params = ca_params(name, &key);
        params.is_ca = IsCa::Ca(BasicConstraints::Constrained(path_len));
        self.sub_issuer(params, key)
    }

    /// An end-entity certificate whose key is nevertheless used to sign
    /// further certificates.
    pub(crate) fn non_ca_issuer(&self, name: &str) -> Self {
        let key = KeyPair::generate_for(DEFAULT_ALG).unwrap();
        let mut params = leaf_params(name);
        params.key_identifier_method = key_id_method(&key);
        self.sub_issuer(params, key)
    }

    /// A certificate carrying the OCSP signing EKU, issued by this CA.
    pub(crate) fn delegated_responder(&self, name: &str) -> Self {
        let key = KeyPair::generate_for(DEFAULT_ALG).unwrap();
        let mut params = leaf_params(name);
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::OcspSigning];
        self.sub_issuer(params, key)
    }

    fn sub_issuer(&self, params: CertificateParams, key: KeyPair) -> Self {
        Self {
            issuer: Arc::new(CertifiedIssuer::signed_by(params, key, &*self.issuer).unwrap()),
        }
    }

    pub(crate) fn der(&self) -> Vec<u8> {
        self.issuer.der().to_vec()
    }

    pub(crate) fn pem(&self) -> String {
        to_pem(&self.der())
    }

    pub(crate) fn anchor(&self) -> TrustAnchor {
        TrustAnchor::from_certificate_der(&self.der()).unwrap()
    }

    pub(crate) fn public_key_der(&self) -> Vec<u8> {
        let (_, cert) = X509Certificate::from_der(self.issuer.der()).unwrap();
        cert.public_key().raw.to_vec()
    }

    pub(crate) fn issue(&self, params: CertificateParams) -> Vec<u8> {
        let key = KeyPair::generate_for(DEFAULT_ALG).unwrap();
        params.signed_by(&key, &*self.issuer).unwrap().der().to_vec()
    }

    pub(crate) fn leaf(&self, name: &str) -> Vec<u8> {
        self.issue(leaf_params(name))
    }

    pub(crate) fn expired_leaf(&self, name: &str) -> Vec<u8> {
        let mut params = leaf_params(name);
        params.not_before = date_time_ymd(1999, 1, 1);
        params.not_after = date_time_ymd(2000, 1, 1);
        self.issue(params)
    }
}

pub(crate) fn ca_params(name: &str, key: &KeyPair) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, name);
    params.distinguished_name.push(DnType::OrganizationName, "Devcert Test");
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    params.key_identifier_method = key_id_method(key);
    params
}

pub(crate) fn leaf_params(name: &str) -> CertificateParams {
    let mut params = CertificateParams::new(vec![format!("{name}.devices.example.com")]).unwrap();
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, name);
    params.distinguished_name.push(DnType::OrganizationName, "Devcert Test");
    params.use_authority_key_identifier_extension = true;
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];
    params
}

/// Key identifiers are SHA-1 of the public key bits, as most CAs do.
fn key_id_method(key: &KeyPair) -> KeyIdMethod {
    KeyIdMethod::PreSpecified(sha1(key.der_bytes()))
}

/// A self-signed certificate unrelated to any test CA.
pub(crate) fn self_signed(name: &str) -> Vec<u8> {
    let key = KeyPair::generate_for(DEFAULT_ALG).unwrap();
    leaf_params(name).self_signed(&key).unwrap().der().to_vec()
}

pub(crate) fn chain(certs: &[&[u8]]) -> CertificateChain {
    CertificateChain::from_der(certs.iter().map(|der| der.to_vec()).collect()).unwrap()
}

pub(crate) fn to_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
    for line in encoded.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(line).unwrap());
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}

pub(crate) fn serial_of(der: &[u8]) -> Integer {
    rasn::der::decode::<Certificate>(der)
        .unwrap()
        .tbs_certificate
        .serial_number
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum FakeStatus {
    Good,
    Revoked,
    Unknown,
}

#[derive(Clone, Debug)]
pub(crate) enum NonceMode {
    Echo,
    Omit,
    Replace(Vec<u8>),
}

/// An in-process OCSP responder.
///
/// Requests are decoded and answered for every certificate they ask about.
/// Certificates not registered with [`FakeResponder::with_status`] are
/// reported as good.
pub(crate) struct FakeResponder {
    signer: Arc<CertifiedIssuer<'static, KeyPair>>,
    embedded: Vec<Vec<u8>>,
    statuses: Vec<(Integer, FakeStatus)>,
    nonce_mode: NonceMode,
    this_update_offset: TimeDelta,
    validity: Option<TimeDelta>,
    delay: Option<Duration>,
    http_status: u16,
    body: Option<Vec<u8>>,
    requests: AtomicUsize,
    answered: AtomicUsize,
    last_request: Mutex<Option<Vec<u8>>>,
}

impl FakeResponder {
    pub(crate) fn new(signer: &TestCa) -> Self {
        Self {
            signer: signer.issuer.clone(),
            embedded: Vec::new(),
            statuses: Vec::new(),
            nonce_mode: NonceMode::Echo,
            this_update_offset: TimeDelta::zero(),
            validity: Some(TimeDelta::hours(1)),
            delay: None,
            http_status: 200,
            body: None,
            requests: AtomicUsize::new(0),
            answered: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub(crate) fn with_status(mut self, cert_der: &[u8], status: FakeStatus) -> Self {
        self.statuses.push((serial_of(cert_der), status));
        self
    }

    /// Include the signer's certificate in the response.
    pub(crate) fn embedding_signer(mut self) -> Self {
        self.embedded.push(self.signer.der().to_vec());
        self
    }

    pub(crate) fn with_nonce_mode(mut self, nonce_mode: NonceMode) -> Self {
        self.nonce_mode = nonce_mode;
        self
    }

    /// Shift `thisUpdate` relative to now and set how long the response
    /// stays valid (`None` omits `nextUpdate`).
    pub(crate) fn with_window(mut self, this_update_offset: TimeDelta, validity: Option<TimeDelta>) -> Self {
        self.this_update_offset = this_update_offset;
        self.validity = validity;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_http_status(mut self, http_status: u16) -> Self {
        self.http_status = http_status;
        self
    }

    pub(crate) fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Number of requests received.
    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of requests that got a response.
    pub(crate) fn answered(&self) -> usize {
        self.answered.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<rasn_ocsp::OcspRequest> {
        self.last_request
            .lock()
            .unwrap()
            .as_ref()
            .map(|der| rasn::der::decode(der).unwrap())
    }

    pub(crate) fn respond(&self, request_der: &[u8]) -> Vec<u8> {
        let request: rasn_ocsp::OcspRequest = rasn::der::decode(request_der).unwrap();
        let tbs_request = request.tbs_request;

        let this_update = Utc::now().trunc_subsecs(0) + self.this_update_offset;
        let next_update = self.validity.map(|validity| this_update + validity);

        let responses = tbs_request
            .request_list
            .into_iter()
            .map(|request| {
                let status = self.status_of(&request.req_cert.serial_number);
                single_response(request.req_cert, status, this_update, next_update)
            })
            .collect();

        let request_nonce = tbs_request
            .request_extensions
            .map(|exts| exts.to_vec())
            .unwrap_or_default()
            .into_iter()
            .find(|ext| {
                let id: &[u32] = &ext.extn_id;
                id == OCSP_NONCE_ARCS
            });

        let response_extensions = match &self.nonce_mode {
            NonceMode::Echo => request_nonce.map(|ext| vec![ext]),
            NonceMode::Omit => None,
            NonceMode::Replace(nonce) => Some(vec![nonce_extension(nonce).unwrap()]),
        };

        signed_response(&self.signer, responses, response_extensions, &self.embedded)
    }

    fn status_of(&self, serial: &Integer) -> FakeStatus {
        self.statuses
            .iter()
            .find(|(known, _)| known == serial)
            .map(|(_, status)| *status)
            .unwrap_or(FakeStatus::Good)
    }
}

#[async_trait]
impl AsyncHttpResolver for FakeResponder {
    async fn http_resolve_async(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<Response<Box<dyn Read + Send>>, HttpResolverError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.body().clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let body = match &self.body {
            Some(body) => body.clone(),
            None => self.respond(request.body()),
        };

        self.answered.fetch_add(1, Ordering::SeqCst);

        Ok(Response::builder()
            .status(self.http_status)
            .header(CONTENT_TYPE, "application/ocsp-response")
            .body(Box::new(Cursor::new(body)) as Box<dyn Read + Send>)?)
    }
}

pub(crate) fn single_response(
    cert_id: CertId,
    status: FakeStatus,
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
) -> SingleResponse {
    let cert_status = match status {
        FakeStatus::Good => CertStatus::Good,
        FakeStatus::Revoked => CertStatus::Revoked(RevokedInfo {
            revocation_time: (this_update - TimeDelta::days(1)).fixed_offset(),
            revocation_reason: Some(CrlReason::KeyCompromise),
        }),
        FakeStatus::Unknown => CertStatus::Unknown(()),
    };

    SingleResponse {
        cert_id,
        cert_status,
        this_update: this_update.fixed_offset(),
        next_update: next_update.map(|next_update| next_update.fixed_offset()),
        single_extensions: None,
    }
}

/// Encode a successful response signed with `signer`'s key.
///
/// `embedded` certificates are spliced in as raw DER so their signatures
/// survive untouched.
pub(crate) fn signed_response(
    signer: &CertifiedIssuer<'static, KeyPair>,
    responses: Vec<SingleResponse>,
    response_extensions: Option<Vec<Extension>>,
    embedded: &[Vec<u8>],
) -> Vec<u8> {
    let (_, signer_cert) = X509Certificate::from_der(signer.der()).unwrap();
    let key_hash = sha1(&signer_cert.public_key().subject_public_key.data);

    let tbs_response_data = ResponseData {
        version: rasn_ocsp::Version::from(0u8),
        responder_id: ResponderId::ByKey(OctetString::from(key_hash)),
        produced_at: Utc::now().trunc_subsecs(0).fixed_offset(),
        responses,
        response_extensions: response_extensions.map(Into::into),
    };

    let tbs_der = rasn::der::encode(&tbs_response_data).unwrap();
    let signature = signer.key().sign(&tbs_der).unwrap();

    let basic = BasicOcspResponse {
        tbs_response_data,
        signature_algorithm: AlgorithmIdentifier {
            algorithm: ObjectIdentifier::from(Oid::new(ECDSA_WITH_SHA256_ARCS).unwrap()),
            parameters: None,
        },
        signature: BitString::from_vec(signature),
        certs: None,
    };

    let mut basic_der = rasn::der::encode(&basic).unwrap();
    if !embedded.is_empty() {
        basic_der = append_certs(&basic_der, embedded);
    }

    wrap_basic_response(basic_der)
}

pub(crate) fn wrap_basic_response(basic_der: Vec<u8>) -> Vec<u8> {
    let response = rasn_ocsp::OcspResponse {
        status: OcspResponseStatus::Successful,
        bytes: Some(ResponseBytes {
            r#type: ObjectIdentifier::from(Oid::new(OCSP_BASIC_ARCS).unwrap()),
            response: OctetString::from(basic_der),
        }),
    };

    rasn::der::encode(&response).unwrap()
}

pub(crate) fn error_response(status: OcspResponseStatus) -> Vec<u8> {
    rasn::der::encode(&rasn_ocsp::OcspResponse {
        status,
        bytes: None,
    })
    .unwrap()
}

fn append_certs(basic_der: &[u8], certs: &[Vec<u8>]) -> Vec<u8> {
    let (_, basic) = <Any as asn1_rs::FromDer>::from_der(basic_der).unwrap();

    let certs = certs.concat();
    let sequence = Any::from_tag_and_data(Tag::Sequence, &certs)
        .to_der_vec()
        .unwrap();
    let explicit = Any::new(
        Header::new(Class::ContextSpecific, true, Tag(0), Length::Definite(0)),
        &sequence,
    )
    .to_der_vec()
    .unwrap();

    let content = [basic.data, &explicit].concat();
    Any::from_tag_and_data(Tag::Sequence, &content)
        .to_der_vec()
        .unwrap()
}
