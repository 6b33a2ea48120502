//! Adapter that forwards broadcasts to a remote gateway over HTTP.

use std::time::Duration;

use super::BroadcastAdapter;
use crate::error::CableError;
use crate::protocol::BroadcastPayload;

/// Default request timeout for broadcast POSTs.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// POSTs each payload as JSON to a `/_broadcast` URL.
///
/// [`BroadcastAdapter::broadcast_raw`] validates the payload and sends it
/// from a background task, so channel handlers never wait on the network.
/// Failed deliveries are logged. Use [`HttpBroadcastAdapter::post`] to
/// await the outcome.
#[derive(Debug, Clone)]
pub struct HttpBroadcastAdapter {
    url: String,
    http: reqwest::Client,
}

impl HttpBroadcastAdapter {
    /// Creates an adapter posting to `url`, e.g.
    /// `http://localhost:8090/_broadcast`.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::Broadcast`] if the HTTP client cannot be
    /// built.
    pub fn new(url: impl Into<String>) -> Result<Self, CableError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| CableError::Broadcast(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    /// Sends `payload` and waits for a 2xx answer.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::Broadcast`] if the request fails or the
    /// remote answers with a non-success status.
    pub async fn post(&self, payload: &BroadcastPayload) -> Result<(), CableError> {
        let response = self
            .http
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| CableError::Broadcast(format!("POST {}: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CableError::Broadcast(format!(
                "POST {} answered {status}",
                self.url
            )));
        }
        tracing::debug!(url = %self.url, %status, "broadcast forwarded");
        Ok(())
    }
}

impl BroadcastAdapter for HttpBroadcastAdapter {
    fn broadcast_raw(&self, payload: BroadcastPayload) -> Result<usize, CableError> {
        payload.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CableError::Broadcast(e.to_string()))?;

        let adapter = self.clone();
        runtime.spawn(async move {
            if let Err(err) = adapter.post(&payload).await {
                tracing::warn!(error = %err, "http broadcast failed");
            }
        });
        Ok(0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::app::build_app;
    use crate::app_state::AppState;
    use crate::broadcast::Broadcaster;
    use crate::chat;
    use crate::config::CableConfig;
    use crate::domain::{BusEvent, PubSub};
    use serde_json::json;
    use tokio::sync::broadcast;

    /// Serves a gateway on an ephemeral port and returns its broadcast URL
    /// plus a receiver on its bus.
    async fn remote_gateway(
        broadcast_endpoint_enabled: bool,
    ) -> (String, broadcast::Receiver<BusEvent>) {
        let config = CableConfig {
            broadcast_endpoint_enabled,
            ..CableConfig::default()
        };
        let pubsub = PubSub::new(8);
        let rx = pubsub.subscribe();
        let app = build_app(AppState::new(chat::build_server(pubsub), None), &config);

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("failed to bind");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local address");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}/_broadcast"), rx)
    }

    async fn next_event(rx: &mut broadcast::Receiver<BusEvent>) -> BusEvent {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Ok(event)) => event,
            _ => panic!("no event on the remote bus"),
        }
    }

    #[tokio::test]
    async fn post_delivers_stream_to_remote_bus() {
        let (url, mut rx) = remote_gateway(true).await;
        let Ok(adapter) = HttpBroadcastAdapter::new(url) else {
            panic!("client build failed");
        };

        let result = adapter
            .post(&BroadcastPayload::stream("chat", json!({"text": "hi"})))
            .await;
        assert!(result.is_ok());

        let BusEvent::Stream(message) = next_event(&mut rx).await else {
            panic!("expected stream message");
        };
        assert_eq!(message.stream, "chat");
        assert_eq!(message.data, json!({"text": "hi"}));
    }

    #[tokio::test]
    async fn post_reports_non_success_status() {
        let (url, _rx) = remote_gateway(false).await;
        let Ok(adapter) = HttpBroadcastAdapter::new(url) else {
            panic!("client build failed");
        };

        let result = adapter
            .post(&BroadcastPayload::stream("chat", json!("hi")))
            .await;
        assert!(matches!(result, Err(CableError::Broadcast(_))));
    }

    #[tokio::test]
    async fn broadcaster_forwards_disconnect_in_background() {
        let (url, mut rx) = remote_gateway(true).await;
        let Ok(adapter) = HttpBroadcastAdapter::new(url) else {
            panic!("client build failed");
        };
        let broadcaster = Broadcaster::new(adapter);

        let mut ids = crate::protocol::ConnectionIdentifiers::new();
        ids.insert("user", json!("alice"));
        assert!(matches!(broadcaster.disconnect(ids.clone(), false), Ok(0)));

        let BusEvent::Disconnect(cmd) = next_event(&mut rx).await else {
            panic!("expected disconnect");
        };
        assert_eq!(cmd.identifiers, ids);
        assert!(!cmd.reconnect);
    }

    #[test]
    fn invalid_payload_is_refused_before_sending() {
        let Ok(adapter) = HttpBroadcastAdapter::new("http://127.0.0.1:9/_broadcast") else {
            panic!("client build failed");
        };
        let result = adapter.broadcast_raw(BroadcastPayload::stream("", json!(1)));
        assert!(matches!(result, Err(CableError::InvalidRequest(_))));
    }
}
