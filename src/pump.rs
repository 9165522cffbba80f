//! Background task feeding content tokens to the consumer.

use crate::context::CallContext;
use crate::error::Error;
use crate::lines::BodyLines;
use crate::protocol;
use crate::types::ProtocolEvent;
use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Why the pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exit {
    /// Terminal marker seen and sentinel lines consumed.
    Terminal,
    /// Body ended without a terminal marker.
    EndOfBody,
    /// Reading the body failed.
    ReadFailure,
    /// The consumer dropped or closed its end.
    Abandoned,
    /// The call was cancelled (lifetime deadline or explicit close).
    Cancelled,
}

/// Owns the response body after the header line has been decoded.
pub(crate) struct StreamPump<S> {
    lines: BodyLines<S>,
    tx: mpsc::Sender<String>,
    ctx: CallContext,
    sentinel_lines: usize,
    terminated: bool,
}

impl<S, E> StreamPump<S>
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Into<Error> + Send + 'static,
{
    pub(crate) fn new(
        lines: BodyLines<S>,
        tx: mpsc::Sender<String>,
        ctx: CallContext,
        sentinel_lines: usize,
    ) -> Self {
        Self {
            lines,
            tx,
            ctx,
            sentinel_lines,
            terminated: false,
        }
    }

    /// Start as if the terminal marker had already been read.
    ///
    /// Used when the header line itself carries `finish_reason: "stop"`.
    pub(crate) fn after_terminal(mut self) -> Self {
        self.terminated = true;
        self
    }

    pub(crate) fn spawn(self) -> JoinHandle<Exit> {
        tokio::spawn(self.run())
    }

    /// Pump until an exit condition, then release the body and close the channel.
    pub(crate) async fn run(mut self) -> Exit {
        let exit = if self.terminated {
            self.discard_sentinels().await;
            Exit::Terminal
        } else {
            self.pump().await
        };

        let Self { lines, tx, ctx, .. } = self;
        ctx.cancel();
        drop(lines);
        drop(tx);

        tracing::debug!(?exit, "token stream closed");
        exit
    }

    async fn pump(&mut self) -> Exit {
        loop {
            let line = tokio::select! {
                biased;
                () = self.ctx.cancelled() => return Exit::Cancelled,
                () = self.tx.closed() => return Exit::Abandoned,
                line = self.lines.next_line() => line,
            };

            let event = match line {
                Some(Ok(raw)) => protocol::classify(&raw),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "reading response body failed, ending stream");
                    return Exit::ReadFailure;
                }
                None => {
                    tracing::debug!("body ended without terminal marker");
                    return Exit::EndOfBody;
                }
            };

            let token = match event {
                ProtocolEvent::Skip => continue,
                ProtocolEvent::Terminal => {
                    self.discard_sentinels().await;
                    return Exit::Terminal;
                }
                ProtocolEvent::ContentDelta(text) => text,
                ProtocolEvent::Malformed => String::new(),
            };

            // Waits for the consumer: this is the only backpressure.
            tokio::select! {
                biased;
                () = self.ctx.cancelled() => return Exit::Cancelled,
                sent = self.tx.send(token) => {
                    if sent.is_err() {
                        return Exit::Abandoned;
                    }
                }
            }
        }
    }

    /// Read and drop the transport's end sentinel line(s).
    async fn discard_sentinels(&mut self) {
        for _ in 0..self.sentinel_lines {
            let line = tokio::select! {
                biased;
                () = self.ctx.cancelled() => return,
                line = self.lines.next_line() => line,
            };
            match line {
                Some(Ok(_sentinel)) => {}
                Some(Err(_)) | None => return,
            }
        }
    }
}
