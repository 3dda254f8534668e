//! Randomized test doubles.
//!
//! Both doubles take their randomness from an explicit [`Rng`] handed to the
//! constructor, so a seeded [`StdRng`] gives a reproducible sequence of
//! outcomes.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use rand::{distr::Alphanumeric, rngs::StdRng, Rng, SeedableRng};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tokio::time::sleep;

use crate::{transport::Response, FetchError, MockApiError, Result, Transport};

const MOCK_FETCH_DELAY: Duration = Duration::from_millis(50);

/// Failure statuses a [`MockFetch`] picks from, uniformly.
pub const MOCK_FAILURE_STATUSES: [(u16, &str); 4] = [
    (500, "Internal Server Error"),
    (503, "Service Unavailable"),
    (429, "Too Many Requests"),
    (404, "Not Found"),
];

/// Payload returned by a successful [`MockFetch`] response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockPayload {
    pub data: String,
    /// Value of the generator's attempt counter for this call.
    pub attempt: usize,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Simulated transport that succeeds with a fixed probability.
///
/// The attempt counter is shared by every call made through one instance
/// and is never reset.
#[derive(Debug)]
pub struct MockFetch<R = StdRng> {
    success_probability: f64,
    rng: Mutex<R>,
    attempts: AtomicUsize,
}

impl MockFetch<StdRng> {
    /// Creates a generator seeded from the operating system.
    pub fn new(success_probability: f64) -> Self {
        Self::with_rng(success_probability, StdRng::from_os_rng())
    }

    /// Creates a generator with a reproducible outcome sequence.
    pub fn seeded(success_probability: f64, seed: u64) -> Self {
        Self::with_rng(success_probability, StdRng::seed_from_u64(seed))
    }
}

impl Default for MockFetch<StdRng> {
    fn default() -> Self {
        Self::new(0.3)
    }
}

impl<R: Rng> MockFetch<R> {
    pub fn with_rng(success_probability: f64, rng: R) -> Self {
        Self {
            success_probability,
            rng: Mutex::new(rng),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of calls made through this instance so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }

    /// Draws the outcome for one call: `None` on success, otherwise the
    /// failure status and its reason phrase.
    pub fn sample(&self) -> Option<(u16, &'static str)> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if rng.random::<f64>() < self.success_probability {
            None
        } else {
            Some(MOCK_FAILURE_STATUSES[rng.random_range(0..MOCK_FAILURE_STATUSES.len())])
        }
    }
}

impl<R: Rng + Send> Transport for MockFetch<R> {
    type Response = MockResponse;

    async fn fetch(&self, url: &str) -> Result<MockResponse> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        sleep(MOCK_FETCH_DELAY).await;

        let response = match self.sample() {
            None => {
                let payload = MockPayload {
                    data: format!("Success from {url}"),
                    attempt,
                    timestamp: unix_millis(),
                };
                MockResponse {
                    status: 200,
                    status_text: "OK".to_owned(),
                    url: url.to_owned(),
                    body: serde_json::to_value(payload)
                        .map_err(|err| FetchError::Decode(err.to_string()))?,
                }
            }
            Some((status, status_text)) => MockResponse {
                status,
                status_text: status_text.to_owned(),
                url: url.to_owned(),
                body: json!({ "error": "Mock API failure" }),
            },
        };
        Ok(response)
    }
}

/// In-memory response with a JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct MockResponse {
    pub status: u16,
    pub status_text: String,
    pub url: String,
    pub body: serde_json::Value,
}

impl MockResponse {
    /// A 200 response carrying `body`.
    pub fn success(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_owned(),
            url: String::new(),
            body,
        }
    }

    /// A response with the given status and an empty JSON object body.
    pub fn failure(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            url: String::new(),
            body: json!({}),
        }
    }
}

impl Response for MockResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn status_text(&self) -> &str {
        &self.status_text
    }

    async fn json<T>(self) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        serde_json::from_value(self.body)
            .map_err(|err| FetchError::Decode(format!("invalid JSON payload: {err}")))
    }
}

/// Value resolved by a successful [`MockApi::call`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiCallSuccess {
    pub success: bool,
    pub message: String,
    pub data: ApiCallData,
    pub attempts: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCallData {
    pub id: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub value: String,
}

/// Standalone randomized operation, unrelated to the retry loop.
#[derive(Debug)]
pub struct MockApi<R = StdRng> {
    success_probability: f64,
    rng: Mutex<R>,
}

impl MockApi<StdRng> {
    pub fn new(success_probability: f64) -> Self {
        Self::with_rng(success_probability, StdRng::from_os_rng())
    }

    pub fn seeded(success_probability: f64, seed: u64) -> Self {
        Self::with_rng(success_probability, StdRng::seed_from_u64(seed))
    }
}

impl Default for MockApi<StdRng> {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl<R: Rng> MockApi<R> {
    pub fn with_rng(success_probability: f64, rng: R) -> Self {
        Self {
            success_probability,
            rng: Mutex::new(rng),
        }
    }

    /// Waits 100..300ms, then resolves if the draw is below the success
    /// probability.
    pub async fn call(&self) -> std::result::Result<ApiCallSuccess, MockApiError> {
        let (delay_ms, draw, success) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let delay_ms = rng.random_range(100..300u64);
            let draw = rng.random::<f64>();
            let success = (draw < self.success_probability).then(|| ApiCallData {
                id: rng.random_range(0..1000),
                timestamp: unix_millis(),
                value: format!("Random data {}", random_token(&mut *rng, 6)),
            });
            (delay_ms, draw, success)
        };

        sleep(Duration::from_millis(delay_ms)).await;

        match success {
            Some(data) => Ok(ApiCallSuccess {
                success: true,
                message: "Mock API call succeeded!".to_owned(),
                data,
                attempts: 1,
            }),
            None => Err(MockApiError {
                draw,
                threshold: self.success_probability,
            }),
        }
    }
}

/// One-shot [`MockApi::call`] with an OS-seeded generator.
pub async fn mock_api_call(
    success_probability: f64,
) -> std::result::Result<ApiCallSuccess, MockApiError> {
    MockApi::new(success_probability).call().await
}

fn random_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
