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

//! Distinguished name comparison.
//!
//! Devices in the field were provisioned by several toolchains, which do not
//! agree on string encodings (`PrintableString` versus `UTF8String`) or on
//! letter case. Names are therefore compared attribute by attribute after
//! normalizing the string values, rather than byte for byte.

use x509_parser::{
    prelude::FromDer,
    x509::{AttributeTypeAndValue, RelativeDistinguishedName, X509Name},
};

/// Parse a DER-encoded `Name`.
pub(crate) fn parse_name(der: &[u8]) -> Option<X509Name<'_>> {
    match X509Name::from_der(der) {
        Ok((rem, name)) if rem.is_empty() => Some(name),
        _ => None,
    }
}

/// Returns `true` if the two names identify the same entity.
pub(crate) fn names_match(a: &X509Name<'_>, b: &X509Name<'_>) -> bool {
    if a.as_raw() == b.as_raw() {
        return true;
    }

    let a_rdns: Vec<_> = a.iter().collect();
    let b_rdns: Vec<_> = b.iter().collect();

    a_rdns.len() == b_rdns.len()
        && a_rdns
            .iter()
            .zip(b_rdns.iter())
            .all(|(a_rdn, b_rdn)| rdns_match(a_rdn, b_rdn))
}

fn rdns_match(a: &RelativeDistinguishedName<'_>, b: &RelativeDistinguishedName<'_>) -> bool {
    let a_attrs: Vec<_> = a.iter().collect();
    let b_attrs: Vec<_> = b.iter().collect();

    // Multi-valued RDNs are sets, so order does not matter.
    a_attrs.len() == b_attrs.len()
        && a_attrs
            .iter()
            .all(|a_attr| b_attrs.iter().any(|b_attr| attributes_match(a_attr, b_attr)))
}

fn attributes_match(a: &AttributeTypeAndValue<'_>, b: &AttributeTypeAndValue<'_>) -> bool {
    if a.attr_type() != b.attr_type() {
        return false;
    }

    match (a.as_str(), b.as_str()) {
        (Ok(a_value), Ok(b_value)) => normalize(a_value) == normalize(b_value),
        _ => a.attr_value().data == b.attr_value().data,
    }
}

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
