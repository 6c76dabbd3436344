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

//! Configuration of trust anchors and validator tunables.
//!
//! Settings can be read from TOML or JSON:
//!
//! ```toml
//! [validator]
//! ocsp_timeout_ms = 5000
//!
//! [[trust_anchors]]
//! certificate = """
//! -----BEGIN CERTIFICATE-----
//! ...
//! -----END CERTIFICATE-----
//! """
//! ocsp_enabled = true
//! ocsp_responder_uri = "http://ocsp.example.com"
//! ocsp_nonce_enabled = true
//! ```

use std::{path::Path, time::Duration};

use config::{
    builder::{ConfigBuilder, DefaultState},
    Config, Environment, File, FileFormat,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{trust_anchor::first_pem_certificate, AnchorSet, OcspConfig, TrustAnchor};

const ENV_PREFIX: &str = "DEVCERT";

/// One day. OCSP responses are typically refreshed far more often.
const MAX_OCSP_CLOCK_SKEW_SECS: u64 = 24 * 60 * 60;

// trait used to validate user input to make sure user supplied configurations are valid
pub(crate) trait SettingsValidate {
    // returns error if settings are invalid
    fn validate(&self) -> Result<(), SettingsError> {
        Ok(())
    }
}

/// Tunables for [`DeviceCertificateValidator`].
///
/// [`DeviceCertificateValidator`]: crate::DeviceCertificateValidator
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ValidatorSettings {
    /// Upper bound, in milliseconds, on a single OCSP exchange.
    pub ocsp_timeout_ms: u64,

    /// Clock skew, in seconds, tolerated when checking `thisUpdate` and
    /// `nextUpdate` of OCSP responses.
    pub ocsp_clock_skew_secs: u64,

    /// Largest OCSP response body accepted, in bytes.
    pub max_ocsp_response_size: usize,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            ocsp_timeout_ms: 5_000,
            ocsp_clock_skew_secs: 900,
            max_ocsp_response_size: 64 * 1024,
        }
    }
}

impl ValidatorSettings {
    /// [`ValidatorSettings::ocsp_timeout_ms`] as a [`Duration`].
    pub fn ocsp_timeout(&self) -> Duration {
        Duration::from_millis(self.ocsp_timeout_ms)
    }

    /// [`ValidatorSettings::ocsp_clock_skew_secs`] as a [`Duration`].
    pub fn ocsp_clock_skew(&self) -> Duration {
        Duration::from_secs(self.ocsp_clock_skew_secs)
    }
}

impl SettingsValidate for ValidatorSettings {
    fn validate(&self) -> Result<(), SettingsError> {
        if self.ocsp_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "ocsp_timeout_ms must be greater than zero".into(),
            ));
        }

        if self.ocsp_clock_skew_secs > MAX_OCSP_CLOCK_SKEW_SECS {
            return Err(SettingsError::InvalidValue(format!(
                "ocsp_clock_skew_secs must not exceed {MAX_OCSP_CLOCK_SKEW_SECS}"
            )));
        }

        if self.max_ocsp_response_size == 0 {
            return Err(SettingsError::InvalidValue(
                "max_ocsp_response_size must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// One configured trust anchor.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct TrustAnchorSettings {
    /// PEM certificate of the anchor. Only its subject and public key are
    /// used.
    pub certificate: String,

    /// Whether leaf certificates under this anchor are checked with OCSP.
    pub ocsp_enabled: bool,

    /// OCSP responder location. Required when `ocsp_enabled` is set.
    pub ocsp_responder_uri: Option<String>,

    /// PEM certificate that must have signed OCSP responses.
    pub ocsp_responder_cert: Option<String>,

    /// Whether OCSP requests carry a nonce.
    pub ocsp_nonce_enabled: bool,
}

impl TrustAnchorSettings {
    /// Build the [`TrustAnchor`] described by these settings.
    pub fn to_trust_anchor(&self) -> Result<TrustAnchor, SettingsError> {
        let certificate = load_pem_certificate(&self.certificate)
            .ok_or_else(|| SettingsError::InvalidCertificate("no PEM certificate found".into()))?;

        let anchor = TrustAnchor::from_certificate_der(&certificate)
            .map_err(|err| SettingsError::InvalidCertificate(err.to_string()))?;

        if !self.ocsp_enabled {
            return Ok(anchor);
        }

        let uri = self
            .ocsp_responder_uri
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| SettingsError::MissingResponderUri {
                anchor: anchor.subject().to_string(),
            })?;

        let uri = Url::parse(uri.trim()).map_err(|err| SettingsError::InvalidResponderUri {
            anchor: anchor.subject().to_string(),
            source: err,
        })?;

        let mut ocsp = OcspConfig::new(uri).with_nonce(self.ocsp_nonce_enabled);

        if let Some(responder_cert) = &self.ocsp_responder_cert {
            let der = load_pem_certificate(responder_cert).ok_or_else(|| {
                SettingsError::InvalidCertificate("no PEM OCSP responder certificate found".into())
            })?;

            ocsp = ocsp
                .with_responder_certificate_der(der)
                .map_err(|err| SettingsError::InvalidCertificate(err.to_string()))?;
        }

        Ok(anchor.with_ocsp(ocsp))
    }
}

/// Complete configuration: validator tunables and trust anchors.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Validator tunables.
    pub validator: ValidatorSettings,

    /// Trust anchors, in priority order.
    pub trust_anchors: Vec<TrustAnchorSettings>,
}

impl SettingsValidate for Settings {
    fn validate(&self) -> Result<(), SettingsError> {
        self.validator.validate()?;
        self.anchor_set().map(|_| ())
    }
}

impl Settings {
    /// Load settings from a string representation.
    ///
    /// # Arguments
    /// * `settings_str` - The configuration string
    /// * `format` - The format of the configuration ("json" or "toml")
    pub fn from_string(settings_str: &str, format: &str) -> Result<Self, SettingsError> {
        let f = match format.to_lowercase().as_str() {
            "json" => FileFormat::Json,
            "toml" => FileFormat::Toml,
            other => return Err(SettingsError::UnsupportedFormat(other.to_string())),
        };

        Self::build(Config::builder().add_source(File::from_str(settings_str, f)))
    }

    /// Load settings from a TOML string.
    pub fn from_toml(toml: &str) -> Result<Self, SettingsError> {
        Self::from_string(toml, "toml")
    }

    /// Load settings from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Self::from_string(json, "json")
    }

    /// Load settings from a `.toml` or `.json` file.
    ///
    /// Values may be overridden from the environment, for example
    /// `DEVCERT_VALIDATOR__OCSP_TIMEOUT_MS=2000`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();

        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("toml") => FileFormat::Toml,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or_default().to_string(),
                ))
            }
        };

        Self::build(
            Config::builder()
                .add_source(File::from(path).format(format))
                .add_source(
                    Environment::with_prefix(ENV_PREFIX)
                        .prefix_separator("_")
                        .separator("__"),
                ),
        )
    }

    /// Build the [`AnchorSet`] described by these settings, preserving the
    /// configured order.
    pub fn anchor_set(&self) -> Result<AnchorSet, SettingsError> {
        self.trust_anchors
            .iter()
            .enumerate()
            .map(|(index, anchor)| {
                anchor.to_trust_anchor().map_err(|err| SettingsError::Anchor {
                    index,
                    source: Box::new(err),
                })
            })
            .collect()
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Describes errors that can occur while loading settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    /// The settings could not be read or deserialized.
    #[error("could not parse configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// The settings format is not supported.
    #[error("unsupported settings format \"{0}\"")]
    UnsupportedFormat(String),

    /// A tunable has an unusable value.
    #[error("invalid setting: {0}")]
    InvalidValue(String),

    /// A certificate could not be loaded.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// OCSP is enabled for an anchor without a responder location.
    #[error("OCSP is enabled for \"{anchor}\" but no responder URI is configured")]
    MissingResponderUri {
        /// Subject of the anchor.
        anchor: String,
    },

    /// The responder location is not a valid URI.
    #[error("invalid OCSP responder URI for \"{anchor}\": {source}")]
    InvalidResponderUri {
        /// Subject of the anchor.
        anchor: String,

        /// Parse failure.
        source: url::ParseError,
    },

    /// A trust anchor entry is invalid.
    #[error("trust anchor {index}: {source}")]
    Anchor {
        /// Position of the entry in `trust_anchors`.
        index: usize,

        /// What is wrong with it.
        source: Box<SettingsError>,
    },
}

fn load_pem_certificate(pem: &str) -> Option<Vec<u8>> {
    // allow for JSON-encoded PEMs with \n
    let pem = pem.replace("\\n", "\n");
    first_pem_certificate(pem.as_bytes())
}
