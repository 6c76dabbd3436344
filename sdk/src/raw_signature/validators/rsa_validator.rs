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

use rsa::{
    pkcs1v15::{Signature, VerifyingKey},
    pkcs8::DecodePublicKey,
    signature::Verifier,
    RsaPublicKey,
};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::raw_signature::{RawSignatureValidationError, RawSignatureValidator};

/// An `RsaPkcs1Validator` can validate raw signatures with one of the
/// RSASSA-PKCS1-v1_5 signature algorithms.
pub(crate) enum RsaPkcs1Validator {
    /// RSASSA-PKCS1-v1_5 using SHA-1
    Sha1,

    /// RSASSA-PKCS1-v1_5 using SHA-256
    Sha256,

    /// RSASSA-PKCS1-v1_5 using SHA-384
    Sha384,

    /// RSASSA-PKCS1-v1_5 using SHA-512
    Sha512,
}

impl RawSignatureValidator for RsaPkcs1Validator {
    fn validate(
        &self,
        sig: &[u8],
        data: &[u8],
        public_key: &[u8],
    ) -> Result<(), RawSignatureValidationError> {
        let public_key = RsaPublicKey::from_public_key_der(public_key)
            .map_err(|_| RawSignatureValidationError::InvalidPublicKey)?;

        let signature =
            Signature::try_from(sig).map_err(|_| RawSignatureValidationError::InvalidSignature)?;

        let result = match self {
            Self::Sha1 => VerifyingKey::<Sha1>::new(public_key).verify(data, &signature),
            Self::Sha256 => VerifyingKey::<Sha256>::new(public_key).verify(data, &signature),
            Self::Sha384 => VerifyingKey::<Sha384>::new(public_key).verify(data, &signature),
            Self::Sha512 => VerifyingKey::<Sha512>::new(public_key).verify(data, &signature),
        };

        result.map_err(|_| RawSignatureValidationError::SignatureMismatch)
    }
}
