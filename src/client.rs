//! HTTP client and session setup.

use crate::config::Config;
use crate::context::CallContext;
use crate::error::Error;
use crate::lines::BodyLines;
use crate::protocol;
use crate::pump::StreamPump;
use crate::race::race;
use crate::request;
use crate::stream::{Session, TokenStream};
use crate::types::{CompletionRequest, Metadata};
use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Client for a streaming chat-completion endpoint.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Arc<Config>,
}

/// Builder for Client.
pub struct ClientBuilder {
    config: Config,
    http_builder: reqwest::ClientBuilder,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http_builder: reqwest::Client::builder()
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_nodelay(true),
        }
    }

    /// Set the header wait window.
    pub fn header_timeout(mut self, timeout: Duration) -> Self {
        self.config.header_timeout = timeout;
        self
    }

    /// Set the total call lifetime.
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.config.lifetime = lifetime;
        self
    }

    /// Set how many sentinel lines follow the terminal marker.
    pub fn sentinel_lines(mut self, lines: usize) -> Self {
        self.config.sentinel_lines = lines;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client, Error> {
        self.config.validate()?;
        let http = self
            .http_builder
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Client {
            http,
            config: Arc::new(self.config),
        })
    }
}

impl Client {
    /// Create a client with the given configuration.
    pub fn new(config: Config) -> Result<Self, Error> {
        ClientBuilder::new(config).build()
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::new(Config::from_env()?)
    }

    /// Create a new client builder.
    pub fn builder(config: Config) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Issue one streaming completion.
    ///
    /// Returns once the metadata line has been read; tokens arrive on the
    /// returned session's stream. On error no stream exists and the request
    /// has been cancelled.
    pub async fn stream(&self, request: &CompletionRequest) -> Result<Session, Error> {
        let ctx = CallContext::with_lifetime(self.config.lifetime);
        // Cancels the call on every early return below.
        let guard = ctx.drop_guard();

        let slot = request::issue(&self.http, &self.config, request, ctx.clone());
        let response = race(slot, self.config.header_timeout, &ctx).await?;
        tracing::debug!(status = %response.status(), "got response");

        let response = ensure_success(response, &ctx).await?;
        let mut lines = BodyLines::new(response.bytes_stream().boxed());

        let (metadata, terminal) = read_header(&mut lines, &ctx).await?;
        tracing::debug!(id = %metadata.id, model = %metadata.model, "decoded metadata line");

        let (tx, rx) = mpsc::channel(1);
        let pump = StreamPump::new(lines, tx, ctx, self.config.sentinel_lines);
        let pump = if terminal { pump.after_terminal() } else { pump };
        // Detached; it stops on its own exit conditions.
        let _ = pump.spawn();

        Ok(Session {
            message_id: metadata.id,
            model: metadata.model,
            tokens: TokenStream::new(rx, guard),
        })
    }
}

/// Map non-2xx responses to errors.
async fn ensure_success(
    response: reqwest::Response,
    ctx: &CallContext,
) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        return Ok(response);
    }

    tokio::select! {
        () = ctx.cancelled() => Err(Error::Cancelled),
        error = handle_error_response(response) => Err(error),
    }
}

/// Convert error response to Error type.
async fn handle_error_response(resp: reqwest::Response) -> Error {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();

    match status {
        401 => Error::Unauthorized,
        _ => {
            // Try to extract error message from JSON
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(ToString::to_string))
                .unwrap_or(body);
            Error::api(status, message)
        }
    }
}

/// Read up to the first non-blank line and decode its metadata.
async fn read_header<S, E>(
    lines: &mut BodyLines<S>,
    ctx: &CallContext,
) -> Result<(Metadata, bool), Error>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<Error>,
{
    loop {
        let line = tokio::select! {
            () = ctx.cancelled() => return Err(Error::Cancelled),
            line = lines.next_line() => line,
        };
        match line {
            Some(Ok(raw)) if protocol::is_keep_alive(&raw) => continue,
            Some(Ok(raw)) => return Ok(protocol::decode_metadata(&raw)),
            Some(Err(e)) => return Err(e),
            None => return Err(Error::MissingHeader),
        }
    }
}
