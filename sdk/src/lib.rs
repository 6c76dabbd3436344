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

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Trust decisions for device certificates presented during a mutual-TLS
//! handshake.
//!
//! A device chain is checked against a set of [`TrustAnchor`]s. Each anchor
//! may require that the device certificate is also confirmed as not revoked
//! by an OCSP responder, optionally with a request nonce.
//!
//! # Example
//!
//! ```no_run
//! use devcert_auth::{AnchorSet, CertificateChain, DeviceCertificateValidator, TrustAnchor};
//!
//! # async fn example(ca_pem: &[u8], device_pem: &[u8]) -> devcert_auth::Result<()> {
//! let anchors = AnchorSet::from(TrustAnchor::from_certificate_pem(ca_pem)?);
//! let chain = CertificateChain::from_pem(device_pem)?;
//!
//! DeviceCertificateValidator::new()
//!     .validate(&chain, &anchors)
//!     .await
//! # }
//! ```

pub mod anchor_matcher;

mod chain;
pub use chain::CertificateChain;

mod error;
pub use error::{Result, ValidationError};

pub mod hash;
pub mod http;

pub(crate) mod internal;

mod name;

pub mod ocsp;
pub mod path_validator;
pub mod raw_signature;
pub mod settings;

mod trust_anchor;
pub use trust_anchor::{AnchorSet, OcspConfig, TrustAnchor};

mod validator;
pub use validator::DeviceCertificateValidator;

#[cfg(test)]
pub(crate) mod tests;
