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

use url::Url;

use crate::{
    tests::fixtures::{self_signed, TestCa},
    AnchorSet, OcspConfig, TrustAnchor, ValidationError,
};

#[test]
fn from_certificate_der() {
    let ca = TestCa::new("Device CA");

    let anchor = ca.anchor();

    assert!(anchor.subject().contains("CN=Device CA"));
    assert_eq!(anchor.public_key_der(), ca.public_key_der().as_slice());
    assert!(!anchor.is_revocation_enabled());
}

#[test]
fn from_certificate_pem() {
    let ca = TestCa::new("Device CA");

    let anchor = TrustAnchor::from_certificate_pem(ca.pem().as_bytes()).unwrap();

    assert_eq!(anchor, ca.anchor());
}

#[test]
fn new_rejects_invalid_parts() {
    let ca = TestCa::new("Device CA");

    assert!(matches!(
        TrustAnchor::new(vec![1, 2, 3], ca.public_key_der()),
        Err(ValidationError::InvalidConfiguration(_))
    ));

    assert!(matches!(
        TrustAnchor::new(ca.anchor().subject_der(), vec![1, 2, 3]),
        Err(ValidationError::InvalidConfiguration(_))
    ));
}

#[test]
fn identity_ignores_ocsp_settings() {
    let ca = TestCa::new("Device CA");
    let ocsp = OcspConfig::new(Url::parse("http://ocsp.example.com/").unwrap());

    let with_ocsp = ca.anchor().with_ocsp(ocsp);

    assert!(with_ocsp.is_revocation_enabled());
    assert_eq!(with_ocsp, ca.anchor());
}

#[test]
fn anchor_set_dedups_by_identity() {
    let ca = TestCa::new("Device CA");
    let other = TestCa::new("Other CA");

    let mut anchors = AnchorSet::new();
    assert!(anchors.insert(ca.anchor()));
    assert!(anchors.insert(other.anchor()));
    assert!(!anchors.insert(ca.anchor()));

    let subjects: Vec<_> = anchors.iter().map(|anchor| anchor.subject()).collect();
    assert_eq!(subjects.len(), 2);
    assert!(subjects[0].contains("Device CA"));
    assert!(subjects[1].contains("Other CA"));
}

#[test]
fn ocsp_config() {
    let ca = TestCa::new("Device CA");
    let uri = Url::parse("http://ocsp.example.com/").unwrap();

    let config = OcspConfig::new(uri.clone())
        .with_nonce(true)
        .with_responder_certificate_der(ca.der())
        .unwrap();

    assert_eq!(config.responder_uri(), &uri);
    assert!(config.nonce_enabled());
    assert_eq!(config.responder_certificate_der(), Some(ca.der().as_slice()));

    assert!(OcspConfig::new(uri)
        .with_responder_certificate_der(self_signed("x")[..10].to_vec())
        .is_err());
}
