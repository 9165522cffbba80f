//! Streaming chat-completion client with deadline racing and guaranteed
//! connection release.
//!
//! One call sends the request, waits a bounded time for the response headers,
//! decodes the metadata line, and hands back a live token stream. The
//! connection is released on every exit path, including the caller dropping
//! the stream early.
//!
//! # Example
//! ```no_run
//! use chat_stream::{Client, CompletionRequest, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chat_stream::Error> {
//!     let client = Client::new(Config::from_env()?)?;
//!
//!     let mut session = client.stream(&CompletionRequest::greeting()).await?;
//!     println!("MessageID = {}", session.message_id);
//!     println!("Model     = {}", session.model);
//!
//!     while let Some(token) = session.tokens.next().await {
//!         print!("{token}");
//!     }
//!     println!();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod lines;
pub mod protocol;
mod pump;
pub mod race;
pub mod request;
pub mod stream;
pub mod types;

pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use error::Error;
pub use stream::{Session, TokenStream};
pub use types::*;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
