//! Delivers notifications as JSON to an HTTP webhook (e.g. a mail relay).
//!
//! Body: `{"event": "claimed" | "rewarded", ...notice fields}`.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Serialize;
use tracing::debug;

use crate::{ClaimNotice, Notifier, NotifyError, RewardNotice};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    event: &'static str,
    #[serde(flatten)]
    notice: &'a T,
}

pub struct WebhookNotifier {
    url: String,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            url: url.into(),
            http_client,
        }
    }

    async fn post<T: Serialize + Sync>(&self, event: &'static str, notice: &T) -> Result<(), NotifyError> {
        debug!(event, url = %self.url, "posting notification");
        let response = self
            .http_client
            .post(&self.url)
            .json(&Envelope { event, notice })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::TimedOut
                } else if e.is_connect() {
                    NotifyError::Unreachable(e.to_string())
                } else {
                    NotifyError::Other(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify_claimed<'a>(&'a self, notice: &'a ClaimNotice) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(self.post("claimed", notice))
    }

    fn notify_rewarded<'a>(&'a self, notice: &'a RewardNotice) -> BoxFuture<'a, Result<(), NotifyError>> {
        Box::pin(self.post("rewarded", notice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use cleanchain_types::TokenAmount;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/hook")
    }

    #[tokio::test]
    async fn rewarded_event_is_flattened() {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
        let sink = seen.clone();
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<Value>| async move {
                sink.lock().unwrap().push(body);
                StatusCode::NO_CONTENT
            }),
        );
        let notifier = WebhookNotifier::new(spawn(app).await);
        let notice = RewardNotice {
            email: "a@b.c".into(),
            name: "Ada".into(),
            location_name: "Beach".into(),
            amount: TokenAmount::new(25),
        };
        notifier.notify_rewarded(&notice).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["event"], "rewarded");
        assert_eq!(seen[0]["location_name"], "Beach");
        assert_eq!(seen[0]["amount"], 25);
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let app = Router::new().route("/hook", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let notifier = WebhookNotifier::new(spawn(app).await);
        let notice = ClaimNotice {
            email: "a@b.c".into(),
            name: "Ada".into(),
            location_name: "Beach".into(),
        };
        let err = notifier.notify_claimed(&notice).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected(_)));
    }
}
