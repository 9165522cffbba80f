//! Streams a greeting completion to stdout.
//!
//! Reads `URL_PREFIX` and `OPENAI_API_KEY` from `.env`, falling back to the
//! process environment.
//!
//! Run with: RUST_LOG=chat_stream=debug cargo run --example stream

use chat_stream::{Client, CompletionRequest, Config};
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env_file(".env") {
        Ok(config) => config,
        Err(_) => Config::from_env()?,
    };
    let client = Client::new(config)?;

    let mut session = client.stream(&CompletionRequest::greeting()).await?;

    println!();
    println!("MessageID = {}", session.message_id);
    println!("Model     = {}", session.model);
    print!("Content   = ");

    // Block on each token until the stream closes.
    let mut stdout = std::io::stdout();
    while let Some(token) = session.tokens.next().await {
        print!("{token}");
        stdout.flush()?;
    }

    println!();
    Ok(())
}
