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

//! Selection of the trust anchors that could have issued a chain.
//!
//! Matching is a cheap pre-filter: it never proves trust, it only decides
//! which anchors are worth a full path validation and in which order.

use log::debug;
use x509_parser::{extensions::ParsedExtension, prelude::X509Certificate};

use crate::{name::names_match, AnchorSet, CertificateChain, Result, TrustAnchor, ValidationError};

/// How well an anchor matches the top of a chain. Lower is better.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum MatchStrength {
    NameAndKey,
    Name,
    Key,
}

/// Return the anchors that may have issued `chain`, best match first.
///
/// An anchor matches when its subject equals the issuer of the top-most
/// certificate, or when its key identifier equals that certificate's
/// authority key identifier. Anchors matching both ways rank first, then
/// name-only matches, then key-only matches. Ties keep the insertion order
/// of `anchors`.
///
/// An empty result means no anchor can possibly validate the chain.
pub fn candidates<'a>(
    chain: &CertificateChain,
    anchors: &'a AnchorSet,
) -> Result<Vec<&'a TrustAnchor>> {
    let certs = chain.parse()?;
    let top = certs
        .last()
        .ok_or_else(|| ValidationError::MalformedChain("certificate chain is empty".into()))?;

    let issuer = top.issuer();
    let authority_key_id = authority_key_identifier(top);

    let mut ranked: Vec<(MatchStrength, &TrustAnchor)> = anchors
        .iter()
        .filter_map(|anchor| {
            let by_name = anchor
                .subject_name()
                .is_some_and(|subject| names_match(issuer, &subject));

            let by_key = match (&authority_key_id, anchor.key_identifier()) {
                (Some(aki), Some(key_id)) => *aki == key_id,
                _ => false,
            };

            let strength = match (by_name, by_key) {
                (true, true) => MatchStrength::NameAndKey,
                (true, false) => MatchStrength::Name,
                (false, true) => MatchStrength::Key,
                (false, false) => return None,
            };

            Some((strength, anchor))
        })
        .collect();

    // Stable, so equally ranked anchors stay in insertion order.
    ranked.sort_by_key(|(strength, _)| *strength);

    debug!(
        "{} of {} trust anchors match issuer \"{issuer}\"",
        ranked.len(),
        anchors.len()
    );

    Ok(ranked.into_iter().map(|(_, anchor)| anchor).collect())
}

fn authority_key_identifier(cert: &X509Certificate<'_>) -> Option<Vec<u8>> {
    cert.extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::AuthorityKeyIdentifier(aki) => {
                aki.key_identifier.as_ref().map(|id| id.0.to_vec())
            }
            _ => None,
        })
}
