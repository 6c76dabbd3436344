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

#[cfg(feature = "http_reqwest")]
pub mod async_impl {
    use std::io::{Cursor, Read};

    use async_trait::async_trait;
    use http::{Request, Response};

    use crate::http::{AsyncHttpResolver, HttpResolverError, ResponseSizeLimit};

    #[async_trait]
    impl AsyncHttpResolver for reqwest::Client {
        async fn http_resolve_async(
            &self,
            request: Request<Vec<u8>>,
        ) -> Result<Response<Box<dyn Read + Send>>, HttpResolverError> {
            let limit = request
                .extensions()
                .get::<ResponseSizeLimit>()
                .map(|limit| limit.0);

            let mut response = self.execute(request.try_into()?).await?;

            if let (Some(limit), Some(len)) = (limit, response.content_length()) {
                if len > limit as u64 {
                    return Err(HttpResolverError::ResponseTooLarge { limit });
                }
            }

            let mut builder = Response::builder()
                .status(response.status())
                .version(response.version());

            for (name, value) in response.headers().iter() {
                builder = builder.header(name, value);
            }

            let mut body = Vec::new();
            while let Some(chunk) = response.chunk().await? {
                if let Some(limit) = limit {
                    if body.len() + chunk.len() > limit {
                        return Err(HttpResolverError::ResponseTooLarge { limit });
                    }
                }
                body.extend_from_slice(&chunk);
            }

            Ok(builder.body(Box::new(Cursor::new(body)) as Box<dyn Read + Send>)?)
        }
    }

    impl From<reqwest::Error> for HttpResolverError {
        fn from(value: reqwest::Error) -> Self {
            Self::Other(Box::new(value))
        }
    }

}
