//! The boundary between the retry loop and whatever performs the request.

use std::future::Future;

use serde::de::DeserializeOwned;

use crate::{FetchError, Result};

/// A response-shaped value returned by a [`Transport`].
pub trait Response: Send {
    /// Numeric status code.
    fn status(&self) -> u16;

    /// Reason phrase for the status.
    fn status_text(&self) -> &str;

    /// Whether the status is in the 2xx range.
    fn ok(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Decodes the payload as JSON.
    fn json<T>(self) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send,
        Self: Sized;
}

/// Performs one request for a URL.
///
/// Implemented by [`ReqwestTransport`] for real traffic and by
/// [`crate::MockFetch`] for tests. Any `&T` where `T: Transport` is a
/// transport too, so a caller can keep ownership of a double and inspect it
/// after the call.
pub trait Transport: Send + Sync {
    type Response: Response;

    fn fetch(&self, url: &str) -> impl Future<Output = Result<Self::Response>> + Send;
}

impl<T: Transport> Transport for &T {
    type Response = T::Response;

    fn fetch(&self, url: &str) -> impl Future<Output = Result<Self::Response>> + Send {
        (**self).fetch(url)
    }
}

/// `GET` transport backed by a shared `reqwest` client.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing client (connection pool, default headers, proxies).
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    type Response = HttpResponse;

    async fn fetch(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(FetchError::transport)?;
        Ok(HttpResponse(response))
    }
}

/// A live HTTP response from [`ReqwestTransport`].
#[derive(Debug)]
pub struct HttpResponse(reqwest::Response);

impl HttpResponse {
    /// The URL the response came from, after redirects.
    pub fn url(&self) -> &str {
        self.0.url().as_str()
    }
}

impl Response for HttpResponse {
    fn status(&self) -> u16 {
        self.0.status().as_u16()
    }

    fn status_text(&self) -> &str {
        self.0.status().canonical_reason().unwrap_or("")
    }

    async fn json<T>(self) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let body = self.0.text().await.map_err(FetchError::transport)?;
        serde_json::from_str::<T>(&body)
            .map_err(|err| FetchError::Decode(format!("invalid JSON payload: {err}; body: {body}")))
    }
}
