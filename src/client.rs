use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    transport::{ReqwestTransport, Response},
    FetchError, Result, RetryOptions, Transport,
};

/// Fetches a URL as JSON over `reqwest`, retrying up to `max_retries` times
/// with a fixed one second pause between attempts.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> fetch_retry::Result<()> {
/// let payload = fetch_retry::fetch_with_retry("https://api.example.com/data", 3).await?;
/// println!("{payload}");
/// # Ok(())
/// # }
/// ```
pub async fn fetch_with_retry(url: &str, max_retries: usize) -> Result<serde_json::Value> {
    RetryClient::new()
        .with_max_retries(max_retries)
        .fetch_json(url)
        .await
}

/// Same as [`fetch_with_retry`], over a caller-supplied transport.
pub async fn fetch_with_retry_using<T: Transport>(
    transport: &T,
    url: &str,
    max_retries: usize,
) -> Result<serde_json::Value> {
    RetryClient::with_transport(transport)
        .with_max_retries(max_retries)
        .fetch_json(url)
        .await
}

/// Issues requests through a [`Transport`] with a bounded, fixed-interval
/// retry loop.
#[derive(Clone, Debug)]
pub struct RetryClient<T = ReqwestTransport> {
    transport: T,
    options: RetryOptions,
}

impl RetryClient<ReqwestTransport> {
    /// Creates a client over a fresh `reqwest` client with default options.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }
}

impl Default for RetryClient<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> RetryClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            options: RetryOptions::default(),
        }
    }

    /// Applies retry options.
    pub fn with_options(mut self, opts: RetryOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.options.max_retries = max_retries;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Fetches `url` and decodes the payload as `P`.
    ///
    /// Transport errors, non-2xx responses and payloads that fail to decode
    /// are all retried until `max_retries + 1` attempts have been made, after
    /// which [`FetchError::Exhausted`] carries the last error.
    pub async fn fetch_json<P>(&self, url: &str) -> Result<P>
    where
        P: DeserializeOwned + Send,
    {
        let max_retries = self.options.max_retries;
        let mut attempt = 1usize;
        loop {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "attempt {} of {} to fetch {}",
                attempt,
                self.options.max_attempts(),
                url
            );

            let err = match self.attempt_once::<P>(url).await {
                Ok(payload) => {
                    #[cfg(feature = "tracing")]
                    tracing::info!("fetched {} on attempt {}", url, attempt);

                    return Ok(payload);
                }
                Err(err) => err,
            };

            #[cfg(feature = "tracing")]
            tracing::warn!("attempt {} failed: {}", attempt, err);

            if attempt > max_retries {
                #[cfg(feature = "tracing")]
                tracing::error!("giving up on {} after {} attempts", url, attempt);

                return Err(FetchError::exhausted(max_retries, err));
            }

            self.wait_before_retry().await;
            attempt += 1;
        }
    }

    /// One attempt: request, status check and payload decode. Any error
    /// here counts as a failed attempt.
    async fn attempt_once<P>(&self, url: &str) -> Result<P>
    where
        P: DeserializeOwned + Send,
    {
        let response = self.transport.fetch(url).await?;
        if !response.ok() {
            return Err(FetchError::Http {
                status: response.status(),
                status_text: response.status_text().to_owned(),
            });
        }
        response.json::<P>().await
    }

    /// Sleeps the fixed retry interval. The delay does not grow with the
    /// attempt number.
    async fn wait_before_retry(&self) {
        let delay_ms = self.options.retry_delay_ms;

        #[cfg(feature = "tracing")]
        tracing::debug!("waiting {} ms before retry", delay_ms);

        sleep(Duration::from_millis(delay_ms)).await;
    }
}
