//! Bounded wait for the request outcome.

use crate::context::CallContext;
use crate::error::Error;
use std::time::Duration;
use tokio::sync::oneshot;

/// Wait up to `wait` for the outcome in `slot`.
///
/// On timeout the call is cancelled and [`Error::Timeout`] returned without
/// waiting further for the request. A slot closed unwritten means the call
/// was cancelled elsewhere (lifetime deadline).
pub async fn race<T, E>(
    slot: oneshot::Receiver<Result<T, E>>,
    wait: Duration,
    ctx: &CallContext,
) -> Result<T, Error>
where
    E: Into<Error>,
{
    match tokio::time::timeout(wait, slot).await {
        Ok(Ok(Ok(response))) => Ok(response),
        Ok(Ok(Err(e))) => Err(classify(e.into())),
        Ok(Err(_closed)) => Err(Error::Cancelled),
        Err(_elapsed) => {
            tracing::warn!(?wait, "no response within header timeout, cancelling request");
            ctx.cancel();
            Err(Error::Timeout)
        }
    }
}

fn classify(error: Error) -> Error {
    match error {
        Error::Http(e) if e.is_timeout() => Error::Timeout,
        other => other,
    }
}
