use fetch_retry::{MockFetch, RetryClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_target(false)
        .init();

    // 30% success rate per attempt.
    let client = RetryClient::with_transport(MockFetch::new(0.3)).with_max_retries(3);

    println!("fetching with a 30% per-attempt success rate");
    match client
        .fetch_json::<serde_json::Value>("https://api.example.com/data")
        .await
    {
        Ok(payload) => println!("final result: {payload}"),
        Err(err) => println!("all attempts failed: {err}"),
    }
    println!("attempts made: {}", client.transport().attempts());

    Ok(())
}
