use std::time::Instant;

use fetch_retry::{MockApi, MockFetch, RetryClient, RetryOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_target(false)
        .init();

    for (max_retries, description) in [(1, "quick retry"), (3, "standard retry"), (5, "persistent retry")] {
        println!("{description} (max_retries = {max_retries}):");
        let client = RetryClient::with_transport(MockFetch::new(0.2)).with_options(RetryOptions {
            max_retries,
            ..RetryOptions::default()
        });

        let started = Instant::now();
        let url = format!("https://api.test.com/data-{max_retries}");
        match client.fetch_json::<serde_json::Value>(&url).await {
            Ok(payload) => println!(
                "  success in {}ms: {}",
                started.elapsed().as_millis(),
                payload["data"]
            ),
            Err(err) => println!("  failed: {err}"),
        }
    }

    println!("direct mock API sampling:");
    for rate in [0.8, 0.5, 0.2] {
        let api = MockApi::new(rate);
        let total = 5;
        let mut successes = 0;
        for _ in 0..total {
            if api.call().await.is_ok() {
                successes += 1;
            }
        }
        println!("  {:.0}% success rate: {successes}/{total} successes", rate * 100.0);
    }

    Ok(())
}
