//! Consumer side of a streamed completion.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::DropGuard;

/// Content tokens of one completion, in arrival order.
///
/// Finite and not restartable. Ends when the response finished, the
/// connection dropped, or the call's lifetime elapsed; these cases are not
/// distinguished. Dropping the stream cancels the call and releases the
/// connection.
pub struct TokenStream {
    rx: mpsc::Receiver<String>,
    guard: Option<DropGuard>,
    received: usize,
}

impl TokenStream {
    pub(crate) fn new(rx: mpsc::Receiver<String>, guard: DropGuard) -> Self {
        Self {
            rx,
            guard: Some(guard),
            received: 0,
        }
    }

    /// Wait for the next token. `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<String> {
        let token = self.rx.recv().await;
        if token.is_some() {
            self.received += 1;
        }
        token
    }

    /// Stop consuming and cancel the call.
    ///
    /// Tokens already buffered can still be drained with [`next`](Self::next).
    pub fn close(&mut self) {
        self.rx.close();
        drop(self.guard.take());
    }

    /// Drain the stream into a single string.
    pub async fn collect_text(mut self) -> String {
        let mut text = String::with_capacity(4096);
        while let Some(token) = self.next().await {
            text.push_str(&token);
        }
        text
    }

    /// Number of tokens handed out so far.
    pub fn tokens_received(&self) -> usize {
        self.received
    }
}

impl Stream for TokenStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        let poll = self.rx.poll_recv(cx);
        if let Poll::Ready(Some(_)) = &poll {
            self.received += 1;
        }
        poll
    }
}

impl std::fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream")
            .field("received", &self.received)
            .field("closed", &self.guard.is_none())
            .finish()
    }
}

/// An established streaming completion.
///
/// Metadata is available immediately; tokens follow on [`tokens`](Self::tokens).
#[derive(Debug)]
pub struct Session {
    /// Response identifier from the header line.
    pub message_id: String,
    /// Model name from the header line.
    pub model: String,
    /// Content tokens.
    pub tokens: TokenStream,
}

impl Session {
    pub fn into_parts(self) -> (String, String, TokenStream) {
        (self.message_id, self.model, self.tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CallContext;
    use std::time::Duration;

    fn stream() -> (mpsc::Sender<String>, TokenStream, CallContext) {
        let ctx = CallContext::with_lifetime(Duration::from_secs(60));
        let (tx, rx) = mpsc::channel(1);
        (tx, TokenStream::new(rx, ctx.drop_guard()), ctx)
    }

    #[tokio::test]
    async fn test_next_counts_tokens() {
        let (tx, mut tokens, _ctx) = stream();
        tokio::spawn(async move {
            for t in ["a", "", "b"] {
                tx.send(t.to_string()).await.unwrap();
            }
        });

        assert_eq!(tokens.next().await.as_deref(), Some("a"));
        assert_eq!(tokens.next().await.as_deref(), Some(""));
        assert_eq!(tokens.next().await.as_deref(), Some("b"));
        assert_eq!(tokens.next().await, None);
        assert_eq!(tokens.tokens_received(), 3);
    }

    #[tokio::test]
    async fn test_stream_impl() {
        use futures::StreamExt;

        let (tx, tokens, _ctx) = stream();
        tokio::spawn(async move {
            tx.send("x".into()).await.unwrap();
            tx.send("y".into()).await.unwrap();
        });

        let all: Vec<String> = StreamExt::collect(tokens).await;
        assert_eq!(all, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_drop_cancels_call() {
        let (_tx, tokens, ctx) = stream();
        drop(tokens);
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_close_cancels_call() {
        let (tx, mut tokens, ctx) = stream();
        tx.send("buffered".into()).await.unwrap();

        tokens.close();
        assert!(ctx.is_cancelled());
        assert!(tx.is_closed());
        assert_eq!(tokens.next().await.as_deref(), Some("buffered"));
        assert_eq!(tokens.next().await, None);
    }
}
