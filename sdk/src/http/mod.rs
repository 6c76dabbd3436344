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

//! Pluggable HTTP transport used to reach OCSP responders.
//!
//! The validator never talks to the network directly. Instead it hands a
//! fully formed [`http::Request`] to an [`AsyncHttpResolver`], which lets
//! callers supply their own client (or a fake one in tests).

use std::io::{self, Read};

use async_trait::async_trait;
use http::{Request, Response};

mod reqwest;

pub use http;

/// A resolver for non-blocking (async) HTTP requests.
#[async_trait]
pub trait AsyncHttpResolver: Send + Sync {
    /// Resolve a [`Request`] into a [`Response`] with a streaming body.
    ///
    /// [`Request`]: http::Request
    /// [`Response`]: http::Response
    async fn http_resolve_async(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<Response<Box<dyn Read + Send>>, HttpResolverError>;
}

/// A generic resolver for [`AsyncHttpResolver`].
///
/// This resolver will automatically pick the client enabled by crate features.
pub struct AsyncGenericResolver(async_resolver::Impl);

impl AsyncGenericResolver {
    /// Create a new [`AsyncGenericResolver`] with an auto-specified [`AsyncHttpResolver`].
    ///
    /// If the `http_reqwest` feature is disabled, every request fails with
    /// [`HttpResolverError::AsyncHttpResolverNotImplemented`].
    pub fn new() -> Self {
        Self(async_resolver::new())
    }
}

impl Default for AsyncGenericResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AsyncHttpResolver for AsyncGenericResolver {
    async fn http_resolve_async(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<Response<Box<dyn Read + Send>>, HttpResolverError> {
        self.0.http_resolve_async(request).await
    }
}

/// Upper bound in bytes on a response body, attached to a [`Request`] as an
/// extension.
///
/// Resolvers that honor it stop reading once the body would exceed the bound
/// and return [`HttpResolverError::ResponseTooLarge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseSizeLimit(pub usize);

/// An error that can occur while resolving an HTTP request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HttpResolverError {
    /// An error occured in the [`http`] crate.
    #[error(transparent)]
    Http(#[from] http::Error),

    /// An error occured in during I/O.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The async HTTP resolver is not implemented.
    ///
    /// Note this often occurs when the http-related features are improperly enabled.
    #[error("the async http resolver is not implemented")]
    AsyncHttpResolverNotImplemented,

    /// The response body is larger than the request's [`ResponseSizeLimit`].
    #[error("response body exceeds {limit} bytes")]
    ResponseTooLarge {
        /// The limit that was exceeded.
        limit: usize,
    },

    /// An error occured from the underlying HTTP resolver.
    #[error("an error occurred from the underlying http resolver: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "http_reqwest")]
mod async_resolver {
    pub type Impl = reqwest::Client;
    pub fn new() -> Impl {
        reqwest::Client::new()
    }
}

#[cfg(not(feature = "http_reqwest"))]
mod async_resolver {
    use super::*;

    pub type Impl = AsyncNoopResolver;
    pub fn new() -> Impl {
        AsyncNoopResolver
    }

    pub struct AsyncNoopResolver;

    #[async_trait]
    impl AsyncHttpResolver for AsyncNoopResolver {
        async fn http_resolve_async(
            &self,
            _request: Request<Vec<u8>>,
        ) -> Result<Response<Box<dyn Read + Send>>, HttpResolverError> {
            Err(HttpResolverError::AsyncHttpResolverNotImplemented)
        }
    }
}
