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

use ecdsa::{signature::hazmat::PrehashVerifier, Signature as EcdsaSignature};
use p256::{ecdsa::VerifyingKey as P256VerifyingKey, NistP256};
use p384::{ecdsa::VerifyingKey as P384VerifyingKey, NistP384};
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_parser::{prelude::FromDer, x509::SubjectPublicKeyInfo};

use crate::raw_signature::{oids::*, RawSignatureValidationError, RawSignatureValidator};

/// An `EcdsaValidator` can validate raw signatures with one of the ECDSA
/// signature algorithms.
pub(crate) enum EcdsaValidator {
    /// ECDSA with SHA-256
    Es256,

    /// ECDSA with SHA-384
    Es384,

    /// ECDSA with SHA-512
    Es512,
}

enum EcdsaCurve {
    P256,
    P384,
}

impl RawSignatureValidator for EcdsaValidator {
    fn validate(
        &self,
        sig: &[u8],
        data: &[u8],
        public_key: &[u8],
    ) -> Result<(), RawSignatureValidationError> {
        let digest = match self {
            EcdsaValidator::Es256 => Sha256::digest(data).to_vec(),
            EcdsaValidator::Es384 => Sha384::digest(data).to_vec(),
            EcdsaValidator::Es512 => Sha512::digest(data).to_vec(),
        };

        let curve = ec_curve_from_public_key_der(public_key)
            .ok_or(RawSignatureValidationError::InvalidPublicKey)?;

        // X.509 and OCSP carry ECDSA signatures as DER `Ecdsa-Sig-Value`.
        let result = match curve {
            EcdsaCurve::P256 => {
                use p256::pkcs8::DecodePublicKey;
                let signature = EcdsaSignature::<NistP256>::from_der(sig)
                    .map_err(|_| RawSignatureValidationError::InvalidSignature)?;

                let vk = P256VerifyingKey::from_public_key_der(public_key)
                    .map_err(|_| RawSignatureValidationError::InvalidPublicKey)?;

                vk.verify_prehash(&digest, &signature)
            }
            EcdsaCurve::P384 => {
                use p384::pkcs8::DecodePublicKey;
                let signature = EcdsaSignature::<NistP384>::from_der(sig)
                    .map_err(|_| RawSignatureValidationError::InvalidSignature)?;

                let vk = P384VerifyingKey::from_public_key_der(public_key)
                    .map_err(|_| RawSignatureValidationError::InvalidPublicKey)?;

                vk.verify_prehash(&digest, &signature)
            }
        };

        result.map_err(|_| RawSignatureValidationError::SignatureMismatch)
    }
}

fn ec_curve_from_public_key_der(public_key: &[u8]) -> Option<EcdsaCurve> {
    let (_, pk) = SubjectPublicKeyInfo::from_der(public_key).ok()?;

    let public_key_alg = &pk.algorithm;
    if public_key_alg.algorithm != EC_PUBLICKEY_OID {
        return None;
    }

    let named_curve_oid = public_key_alg.parameters.as_ref()?.as_oid().ok()?;
    if named_curve_oid == PRIME256V1_OID {
        Some(EcdsaCurve::P256)
    } else if named_curve_oid == SECP384R1_OID {
        Some(EcdsaCurve::P384)
    } else {
        None
    }
}
