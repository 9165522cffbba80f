//! Issues the completion request in the background.

use crate::config::Config;
use crate::context::CallContext;
use crate::types::CompletionRequest;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::oneshot;

/// Transport outcome of the request, as reported by the HTTP client.
pub type Outcome = Result<reqwest::Response, reqwest::Error>;

/// Send `request` on a background task.
///
/// The outcome is written exactly once to the returned slot whether or not
/// anyone is still waiting for it. Cancelling `ctx` drops the in-flight
/// request, which aborts the connection; the slot is then closed unwritten.
pub fn issue(
    http: &reqwest::Client,
    config: &Config,
    request: &CompletionRequest,
    ctx: CallContext,
) -> oneshot::Receiver<Outcome> {
    let (tx, rx) = oneshot::channel();

    let url = config.completions_url();
    tracing::debug!(%url, model = %request.model, "sending completion request");
    let pending = http
        .post(url)
        .headers(headers(&config.api_key))
        .json(request)
        .send();

    tokio::spawn(async move {
        tokio::select! {
            () = ctx.cancelled() => {
                tracing::debug!("completion request cancelled in flight");
            }
            outcome = pending => {
                // Receiver may be gone after a timeout; the response is dropped then.
                let _ = tx.send(outcome);
            }
        }
    });

    rx
}

/// Build request headers including auth.
fn headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    match HeaderValue::from_str(&format!("Bearer {api_key}")) {
        Ok(mut auth) => {
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }
        Err(_) => tracing::warn!("api key is not a valid header value; sending without auth"),
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_headers() {
        let headers = headers("test-key");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer test-key");
        assert!(auth.is_sensitive());
    }

    #[test]
    fn test_invalid_key_skips_auth() {
        let headers = headers("bad\nkey");
        assert!(!headers.contains_key(AUTHORIZATION));
    }

    #[tokio::test]
    async fn test_cancel_closes_slot() {
        // Unroutable address: the connect attempt hangs until cancelled.
        let config = Config::new("http://10.255.255.1:81", "k");
        let ctx = CallContext::with_lifetime(Duration::from_secs(60));
        let rx = issue(
            &reqwest::Client::new(),
            &config,
            &CompletionRequest::greeting(),
            ctx.clone(),
        );

        ctx.cancel();
        let received = tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("slot should settle after cancel");
        // Either closed unwritten, or a connect error that raced the cancel.
        assert!(received.map_or(true, |outcome| outcome.is_err()));
    }
}
