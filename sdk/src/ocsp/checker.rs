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

use std::{io::Read, sync::Arc};

use chrono::TimeDelta;
use http::{
    header::{ACCEPT, CONTENT_TYPE},
    Request, StatusCode,
};
use log::{debug, warn};
use url::Url;

use crate::{
    http::{AsyncHttpResolver, HttpResolverError, ResponseSizeLimit},
    internal::time,
    ocsp::{response, OcspRequest, RevocationTarget},
    settings::ValidatorSettings,
    OcspConfig, Result, ValidationError,
};

const OCSP_REQUEST_MEDIA_TYPE: &str = "application/ocsp-request";
const OCSP_RESPONSE_MEDIA_TYPE: &str = "application/ocsp-response";

/// Queries an OCSP responder for the status of a certificate.
///
/// Each call to [`RevocationChecker::check`] performs exactly one request.
/// Nothing is cached between calls, so concurrent checks are independent.
#[derive(Clone)]
pub struct RevocationChecker {
    resolver: Arc<dyn AsyncHttpResolver>,
    settings: ValidatorSettings,
}

impl RevocationChecker {
    /// Create a checker that sends requests through `resolver`.
    pub fn new(resolver: Arc<dyn AsyncHttpResolver>, settings: ValidatorSettings) -> Self {
        Self { resolver, settings }
    }

    /// Ask the responder configured in `config` about `target`.
    ///
    /// Returns `Ok(())` only if a properly signed, current response reports
    /// the certificate as good (and echoes the nonce, when one was sent).
    /// The whole exchange is bounded by the configured timeout; dropping the
    /// returned future abandons the request.
    pub async fn check(&self, target: &RevocationTarget, config: &OcspConfig) -> Result<()> {
        let skew = TimeDelta::from_std(self.settings.ocsp_clock_skew()).map_err(|_| {
            ValidationError::RevocationStatusUnknownOrUnavailable(format!(
                "clock skew of {}s is out of range",
                self.settings.ocsp_clock_skew_secs
            ))
        })?;

        let request = OcspRequest::new(target, config.nonce_enabled())?;

        debug!(
            "querying OCSP responder {} (nonce {})",
            config.responder_uri(),
            if request.nonce().is_some() { "on" } else { "off" }
        );

        let body = self
            .fetch(config.responder_uri(), request.der().to_vec())
            .await?;

        let result = response::evaluate(
            &body,
            &request,
            config.responder_certificate_der(),
            target.issuer_public_key_der(),
            time::utc_now(),
            skew,
        );

        match &result {
            Ok(()) => debug!("OCSP responder {} reports good", config.responder_uri()),
            Err(err) => warn!("OCSP check against {} failed: {err}", config.responder_uri()),
        }

        result
    }

    async fn fetch(&self, uri: &Url, request_der: Vec<u8>) -> Result<Vec<u8>> {
        let limit = self.settings.max_ocsp_response_size;
        let request = Request::post(uri.as_str())
            .header(CONTENT_TYPE, OCSP_REQUEST_MEDIA_TYPE)
            .header(ACCEPT, OCSP_RESPONSE_MEDIA_TYPE)
            .extension(ResponseSizeLimit(limit))
            .body(request_der)
            .map_err(|err| failed(format!("could not build OCSP request: {err}")))?;

        let timeout = self.settings.ocsp_timeout();
        let response = tokio::time::timeout(timeout, self.resolver.http_resolve_async(request))
            .await
            .map_err(|_| {
                failed(format!(
                    "OCSP responder {uri} did not answer within {} ms",
                    timeout.as_millis()
                ))
            })?
            .map_err(|err| match err {
                HttpResolverError::ResponseTooLarge { .. } => {
                    failed(format!("OCSP response from {uri} exceeds {limit} bytes"))
                }
                err => failed(format!("OCSP responder {uri} unreachable: {err}")),
            })?;

        if response.status() != StatusCode::OK {
            return Err(failed(format!(
                "OCSP responder {uri} returned HTTP status {}",
                response.status()
            )));
        }

        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            if content_type != OCSP_RESPONSE_MEDIA_TYPE {
                warn!("OCSP responder {uri} sent unexpected content type {content_type:?}");
            }
        }

        let mut body = Vec::new();
        response
            .into_body()
            .take(limit as u64 + 1)
            .read_to_end(&mut body)
            .map_err(|err| failed(format!("could not read OCSP response: {err}")))?;

        if body.len() > limit {
            return Err(failed(format!(
                "OCSP response from {uri} exceeds {limit} bytes"
            )));
        }

        Ok(body)
    }
}

fn failed(reason: String) -> ValidationError {
    ValidationError::RevocationCheckFailed(reason)
}
