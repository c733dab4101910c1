//! The websocket connection task.

use std::sync::Arc;

use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tracing::{debug, info, warn};
use url::Url;

use super::{ConnectionState, RealtimeError, RealtimeEvent, Shared};

/// Connect, pump frames into the registry, and reconnect on drops until the
/// attempt budget is spent.
pub(super) async fn run(shared: Arc<Shared>) {
    let config = &shared.config;
    let mut attempt = 0u32;

    loop {
        // Re-read the token each attempt so a refresh is picked up.
        let Some(token) = shared.session.access_token() else {
            warn!("Realtime session lost its token, stopping");
            break;
        };
        let request = match handshake_request(&config.url, &token) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Cannot build realtime handshake");
                break;
            }
        };

        shared.set_state(ConnectionState::Connecting);
        match tokio::time::timeout(config.connect_timeout, connect_async(request)).await {
            Ok(Ok((mut stream, _response))) => {
                shared.set_state(ConnectionState::Connected);
                info!(url = %config.url, "Realtime connected");
                attempt = 0;

                while let Some(frame) = stream.next().await {
                    match frame {
                        Ok(Message::Text(text)) => handle_text(&shared, text.as_str()),
                        Ok(Message::Close(reason)) => {
                            debug!(?reason, "Realtime server closed the connection");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "Realtime read failed");
                            break;
                        }
                    }
                }
                info!("Realtime disconnected");
            }
            Ok(Err(e)) => warn!(error = %e, attempt, "Realtime connect failed"),
            Err(_) => warn!(
                timeout_secs = config.connect_timeout.as_secs(),
                attempt,
                "Realtime connect timed out"
            ),
        }

        shared.set_state(ConnectionState::Disconnected);
        if attempt >= config.reconnect_attempts {
            warn!(attempts = attempt, "Realtime reconnect attempts exhausted");
            break;
        }
        attempt += 1;
        tokio::time::sleep(config.reconnect_delay).await;
    }

    shared.set_state(ConnectionState::Disconnected);
}

fn handle_text(shared: &Shared, text: &str) {
    match RealtimeEvent::from_text(text) {
        Ok(event) => {
            let delivered = shared.dispatch(&event);
            debug!(event = event.name(), delivered, "Realtime event");
        }
        Err(e) => warn!(error = %e, "Skipping realtime frame"),
    }
}

/// Handshake carrying the token both as a bearer header and as `?token=`.
fn handshake_request(url: &Url, token: &SecretString) -> Result<Request, RealtimeError> {
    let mut url = url.clone();
    url.query_pairs_mut()
        .append_pair("token", token.expose_secret());

    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| RealtimeError::InvalidRequest(e.to_string()))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
        .map_err(|e| RealtimeError::InvalidRequest(e.to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, bearer);
    Ok(request)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_carries_token_twice() {
        let url = Url::parse("ws://localhost:5000/ws").unwrap();
        let request = handshake_request(&url, &SecretString::from("abc".to_string())).unwrap();

        assert_eq!(request.uri().query(), Some("token=abc"));
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer abc"
        );
    }

    #[test]
    fn test_handshake_rejects_unprintable_token() {
        let url = Url::parse("ws://localhost:5000/ws").unwrap();
        let result = handshake_request(&url, &SecretString::from("a\nb".to_string()));
        assert!(matches!(result, Err(RealtimeError::InvalidRequest(_))));
    }
}
