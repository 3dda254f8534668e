use std::sync::atomic::{AtomicUsize, Ordering};

use fetch_retry::{fetch_with_retry_using, MockFetch, MockResponse, Transport};
use serde_json::json;

/// Fails twice, then succeeds.
#[derive(Default)]
struct RecoveringTransport {
    calls: AtomicUsize,
}

impl Transport for RecoveringTransport {
    type Response = MockResponse;

    async fn fetch(&self, _url: &str) -> fetch_retry::Result<MockResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        if call < 3 {
            Ok(MockResponse::failure(500, "Server Error"))
        } else {
            Ok(MockResponse::success(
                json!({ "data": "Success on last attempt!", "attempt": call }),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_target(false)
        .init();

    println!("all retries fail:");
    let unreliable = MockFetch::new(0.1);
    match fetch_with_retry_using(&unreliable, "https://api.unreliable.com/data", 2).await {
        Ok(payload) => println!("unexpected success: {payload}"),
        Err(err) => println!("handled complete failure: {err}"),
    }

    println!("success on last attempt:");
    let recovering = RecoveringTransport::default();
    let payload = fetch_with_retry_using(&recovering, "https://api.recovering.com/data", 3).await?;
    println!("success on retry: {}", payload["data"]);
    println!("attempts made: {}", payload["attempt"]);

    Ok(())
}
