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

use std::fmt;

use x509_parser::oid_registry::Oid;

use crate::raw_signature::{
    oids::*,
    validators::{EcdsaValidator, Ed25519Validator, RsaPkcs1Validator},
    RawSignatureValidator,
};

/// Signature algorithms accepted on device certificates and OCSP responses.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-1.
    ///
    /// Accepted only because older device fleets were provisioned with it.
    RsaSha1,

    /// RSASSA-PKCS1-v1_5 using SHA-256.
    RsaSha256,

    /// RSASSA-PKCS1-v1_5 using SHA-384.
    RsaSha384,

    /// RSASSA-PKCS1-v1_5 using SHA-512.
    RsaSha512,

    /// ECDSA using SHA-256.
    EcdsaSha256,

    /// ECDSA using SHA-384.
    EcdsaSha384,

    /// ECDSA using SHA-512.
    EcdsaSha512,

    /// Edwards-curve signatures over Curve25519.
    Ed25519,
}

impl SignatureAlgorithm {
    /// Look up the algorithm named by an `AlgorithmIdentifier` OID.
    ///
    /// Returns `None` if the algorithm is not supported.
    pub fn from_oid(oid: &Oid) -> Option<Self> {
        if *oid == SHA1_WITH_RSAENCRYPTION_OID {
            Some(Self::RsaSha1)
        } else if *oid == SHA256_WITH_RSAENCRYPTION_OID {
            Some(Self::RsaSha256)
        } else if *oid == SHA384_WITH_RSAENCRYPTION_OID {
            Some(Self::RsaSha384)
        } else if *oid == SHA512_WITH_RSAENCRYPTION_OID {
            Some(Self::RsaSha512)
        } else if *oid == ECDSA_WITH_SHA256_OID {
            Some(Self::EcdsaSha256)
        } else if *oid == ECDSA_WITH_SHA384_OID {
            Some(Self::EcdsaSha384)
        } else if *oid == ECDSA_WITH_SHA512_OID {
            Some(Self::EcdsaSha512)
        } else if *oid == ED25519_OID {
            Some(Self::Ed25519)
        } else {
            None
        }
    }

    /// Look up the algorithm from raw OID arcs, as exposed by `rasn`.
    pub(crate) fn from_arcs(arcs: &[u32]) -> Option<Self> {
        let arcs: Vec<u64> = arcs.iter().map(|arc| u64::from(*arc)).collect();
        let oid = Oid::from(&arcs).ok()?;
        Self::from_oid(&oid)
    }

    /// Return a validator for this algorithm.
    pub fn validator(self) -> Box<dyn RawSignatureValidator> {
        match self {
            Self::RsaSha1 => Box::new(RsaPkcs1Validator::Sha1),
            Self::RsaSha256 => Box::new(RsaPkcs1Validator::Sha256),
            Self::RsaSha384 => Box::new(RsaPkcs1Validator::Sha384),
            Self::RsaSha512 => Box::new(RsaPkcs1Validator::Sha512),
            Self::EcdsaSha256 => Box::new(EcdsaValidator::Es256),
            Self::EcdsaSha384 => Box::new(EcdsaValidator::Es384),
            Self::EcdsaSha512 => Box::new(EcdsaValidator::Es512),
            Self::Ed25519 => Box::new(Ed25519Validator),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RsaSha1 => "sha1WithRSAEncryption",
            Self::RsaSha256 => "sha256WithRSAEncryption",
            Self::RsaSha384 => "sha384WithRSAEncryption",
            Self::RsaSha512 => "sha512WithRSAEncryption",
            Self::EcdsaSha256 => "ecdsa-with-SHA256",
            Self::EcdsaSha384 => "ecdsa-with-SHA384",
            Self::EcdsaSha512 => "ecdsa-with-SHA512",
            Self::Ed25519 => "Ed25519",
        };

        write!(f, "{name}")
    }
}
