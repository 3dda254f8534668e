use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use fetch_retry::{
    fetch_with_retry_using, mock_api_call, FetchError, MockApi, MockFetch, MockPayload,
    MockResponse, RetryClient, RetryOptions, Transport,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tokio::time::Instant;

#[derive(Debug, Deserialize)]
struct Payload {
    data: String,
}

enum Step {
    Respond(MockResponse),
    Fail(&'static str),
}

/// Replays a fixed script and records when each call happened.
struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
        }
    }

    fn always_failing(status: u16) -> Self {
        let steps = (0..64)
            .map(|_| Step::Respond(MockResponse::failure(status, "Server Error")))
            .collect();
        Self::new(steps)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn gaps(&self) -> Vec<Duration> {
        let times = self.call_times.lock().unwrap();
        times.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }
}

impl Transport for ScriptedTransport {
    type Response = MockResponse;

    async fn fetch(&self, _url: &str) -> fetch_retry::Result<MockResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(Instant::now());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(message)) => Err(FetchError::transport(message)),
            None => Err(FetchError::transport("script exhausted")),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn always_failing_transport_is_called_bound_plus_one_times() {
    for max_retries in 0..5 {
        let transport = ScriptedTransport::always_failing(503);
        let err = fetch_with_retry_using(&transport, "https://api.test/data", max_retries)
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), max_retries + 1);
        assert!(matches!(err, FetchError::Exhausted { max_retries: n, .. } if n == max_retries));
    }
}

#[tokio::test(start_paused = true)]
async fn success_on_call_k_makes_exactly_k_calls() {
    let max_retries = 4;
    for k in 1..=max_retries + 1 {
        let mut steps: Vec<Step> = (1..k)
            .map(|_| Step::Respond(MockResponse::failure(500, "Internal Server Error")))
            .collect();
        steps.push(Step::Respond(MockResponse::success(json!({ "call": k }))));
        let transport = ScriptedTransport::new(steps);

        let payload = fetch_with_retry_using(&transport, "https://api.test/data", max_retries)
            .await
            .unwrap();

        assert_eq!(transport.calls(), k);
        assert_eq!(payload, json!({ "call": k }));
    }
}

#[tokio::test(start_paused = true)]
async fn delay_between_attempts_is_constant() {
    let transport = ScriptedTransport::always_failing(500);
    fetch_with_retry_using(&transport, "https://api.test/data", 4)
        .await
        .unwrap_err();

    let gaps = transport.gaps();
    assert_eq!(gaps.len(), 4);
    for gap in gaps {
        assert!(gap >= Duration::from_millis(1_000), "{gap:?}");
        assert!(gap < Duration::from_millis(1_001), "{gap:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn configured_delay_replaces_the_default() {
    let client = RetryClient::with_transport(ScriptedTransport::always_failing(500)).with_options(
        RetryOptions {
            max_retries: 2,
            retry_delay_ms: 250,
        },
    );
    client
        .fetch_json::<JsonValue>("https://api.test/data")
        .await
        .unwrap_err();

    let gaps = client.transport().gaps();
    assert_eq!(gaps.len(), 2);
    for gap in gaps {
        assert!(gap >= Duration::from_millis(250), "{gap:?}");
        assert!(gap < Duration::from_millis(251), "{gap:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn two_retries_against_status_500_exhaust_after_three_calls() {
    let transport = ScriptedTransport::always_failing(500);
    let err = fetch_with_retry_using(&transport, "https://api.test/data", 2)
        .await
        .unwrap_err();

    assert_eq!(transport.calls(), 3);
    let message = err.to_string();
    assert!(message.contains("All 2 retry attempts failed"), "{message}");
    assert!(message.contains("status: 500"), "{message}");
}

#[tokio::test(start_paused = true)]
async fn recovers_on_third_call() {
    let transport = ScriptedTransport::new(vec![
        Step::Respond(MockResponse::failure(500, "Server Error")),
        Step::Fail("network unreachable"),
        Step::Respond(MockResponse::success(json!({ "data": "ok" }))),
    ]);

    let payload = fetch_with_retry_using(&transport, "https://api.test/data", 3)
        .await
        .unwrap();

    assert_eq!(payload, json!({ "data": "ok" }));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn zero_retries_fail_immediately_without_delay() {
    let transport = ScriptedTransport::new(vec![Step::Fail("connection refused")]);
    let started = Instant::now();

    let err = fetch_with_retry_using(&transport, "https://api.test/data", 0)
        .await
        .unwrap_err();

    assert_eq!(transport.calls(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    let message = err.to_string();
    assert!(message.contains("All 0 retry attempts failed"), "{message}");
    assert!(message.contains("connection refused"), "{message}");
}

#[tokio::test(start_paused = true)]
async fn decode_error_is_retried_like_any_failure() {
    let transport = ScriptedTransport::new(vec![
        Step::Respond(MockResponse::success(json!("not an object"))),
        Step::Respond(MockResponse::success(json!({ "data": "ok" }))),
    ]);

    let payload = RetryClient::with_transport(&transport)
        .fetch_json::<Payload>("https://api.test/data")
        .await
        .unwrap();

    assert_eq!(payload.data, "ok");
    assert_eq!(transport.calls(), 2);
    let gaps = transport.gaps();
    assert_eq!(gaps.len(), 1);
    assert!(gaps[0] >= Duration::from_millis(1_000), "{:?}", gaps[0]);
}

#[tokio::test(start_paused = true)]
async fn payload_that_never_decodes_ends_in_exhaustion() {
    let steps = (0..3)
        .map(|_| Step::Respond(MockResponse::success(json!("not an object"))))
        .collect();
    let transport = ScriptedTransport::new(steps);

    let err = RetryClient::with_transport(&transport)
        .with_max_retries(2)
        .fetch_json::<Payload>("https://api.test/data")
        .await
        .unwrap_err();

    assert_eq!(transport.calls(), 3);
    match err {
        FetchError::Exhausted {
            max_retries,
            source,
        } => {
            assert_eq!(max_retries, 2);
            assert!(matches!(*source, FetchError::Decode(_)));
        }
        other => panic!("expected exhaustion error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn reliable_mock_fetch_succeeds_first_time() {
    let client = RetryClient::with_transport(MockFetch::seeded(1.0, 9));
    let payload: MockPayload = client.fetch_json("https://api.test/data").await.unwrap();

    assert_eq!(payload.data, "Success from https://api.test/data");
    assert_eq!(payload.attempt, 1);
    assert_eq!(client.transport().attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn seeded_mock_fetch_gives_reproducible_runs() {
    let first = MockFetch::seeded(0.3, 2024);
    let second = MockFetch::seeded(0.3, 2024);

    let a = fetch_with_retry_using(&first, "https://api.test/data", 3).await;
    let b = fetch_with_retry_using(&second, "https://api.test/data", 3).await;

    assert_eq!(first.attempts(), second.attempts());
    assert_eq!(a.is_ok(), b.is_ok());
    if let (Ok(a), Ok(b)) = (a, b) {
        assert_eq!(a["data"], b["data"]);
        assert_eq!(a["attempt"], b["attempt"]);
    }
}

#[tokio::test(start_paused = true)]
async fn mock_api_call_extremes_hold_across_samples() {
    for _ in 0..20 {
        assert!(mock_api_call(1.0).await.is_ok());
        assert!(mock_api_call(0.0).await.is_err());
    }

    let api = MockApi::seeded(0.5, 77);
    let mut successes = 0;
    for _ in 0..200 {
        if api.call().await.is_ok() {
            successes += 1;
        }
    }
    assert!((50..150).contains(&successes), "{successes} successes");
}
