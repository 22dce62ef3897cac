//! JSON-over-HTTP clients for the dump and lookup services.
//!
//! Binary fields (keys, content, signatures) travel as standard base64.
//!
//! | Call | Request | Success | Empty / missing |
//! |---|---|---|---|
//! | receive | `POST /v1/receive {identity_proof}` | `200 {message}` | `404` |
//! | send | `POST /v1/send {sender, receiver, content, signature}` | `2xx` | none |
//! | lookup | `GET /v1/lookup?name=..` | `200 {key}` | `404` |

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DumpService, LookupService};
use crate::crypto::{IdentityProof, PublicKey};
use crate::error::{LookupError, TransportError};
use crate::pipeline::types::{InboundMessage, SealedMessage};

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ProofWire {
    public_key: String,
    created_at: i64,
    signature: String,
}

impl From<&IdentityProof> for ProofWire {
    fn from(proof: &IdentityProof) -> Self {
        Self {
            public_key: proof.public_key.to_base64(),
            created_at: proof.created_at.timestamp(),
            signature: BASE64.encode(proof.signature),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReceiveRequest {
    identity_proof: ProofWire,
}

#[derive(Debug, Deserialize)]
struct ReceiveResponse {
    message: MessageWire,
}

#[derive(Debug, Deserialize)]
struct MessageWire {
    sender: String,
    content: String,
    signature: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    sender: &'a str,
    receiver: &'a str,
    content: String,
    signature: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    key: String,
}

fn decode_message(wire: MessageWire) -> Result<InboundMessage, String> {
    let content = BASE64
        .decode(&wire.content)
        .map_err(|e| format!("content is not base64: {e}"))?;
    let signature = BASE64
        .decode(&wire.signature)
        .map_err(|e| format!("signature is not base64: {e}"))?;
    Ok(InboundMessage::new(wire.sender, content, signature))
}

fn build_client(timeout: Duration, endpoint: &str) -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .connect_timeout(timeout)
        .build()
        .map_err(|e| TransportError::Request {
            endpoint: endpoint.to_string(),
            reason: format!("failed to build HTTP client: {e}"),
        })
}

// ── Dump service ────────────────────────────────────────────────────

/// Dump service client.
#[derive(Debug, Clone)]
pub struct HttpDumpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDumpClient {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(connect_timeout, base_url)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DumpService for HttpDumpClient {
    async fn receive(&self, proof: &IdentityProof) -> Result<Option<InboundMessage>, TransportError> {
        let endpoint = format!("{}/v1/receive", self.base_url);
        let body = ReceiveRequest {
            identity_proof: proof.into(),
        };

        let resp = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let parsed: ReceiveResponse =
                    resp.json().await.map_err(|e| TransportError::InvalidResponse {
                        endpoint: endpoint.clone(),
                        reason: e.to_string(),
                    })?;
                let message = decode_message(parsed.message).map_err(|reason| {
                    TransportError::InvalidResponse {
                        endpoint: endpoint.clone(),
                        reason,
                    }
                })?;
                debug!(id = %message.id, sender = %message.sender, "Received message");
                Ok(Some(message))
            }
            status => Err(TransportError::Status {
                endpoint,
                status: status.as_u16(),
            }),
        }
    }

    async fn send(&self, message: &SealedMessage) -> Result<(), TransportError> {
        let endpoint = format!("{}/v1/send", self.base_url);
        let body = SendRequest {
            sender: &message.sender,
            receiver: &message.receiver,
            content: BASE64.encode(&message.content),
            signature: BASE64.encode(&message.signature),
        };

        let resp = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(TransportError::Status {
                endpoint,
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

// ── Lookup service ──────────────────────────────────────────────────

/// Directory client. Used for both the legacy service and the registry
/// gateway, which expose the same lookup contract.
#[derive(Debug, Clone)]
pub struct HttpLookupClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLookupClient {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(connect_timeout, base_url)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LookupService for HttpLookupClient {
    async fn lookup_name(&self, name: &str) -> Result<PublicKey, LookupError> {
        let endpoint = format!("{}/v1/lookup", self.base_url);
        let request_failed = |reason: String| LookupError::Request {
            name: name.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(&endpoint)
            .query(&[("name", name)])
            .send()
            .await
            .map_err(|e| request_failed(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(LookupError::NotFound {
                name: name.to_string(),
            }),
            status if status.is_success() => {
                let parsed: LookupResponse = resp
                    .json()
                    .await
                    .map_err(|e| request_failed(format!("invalid response: {e}")))?;
                let raw = BASE64
                    .decode(&parsed.key)
                    .map_err(|e| LookupError::InvalidKey {
                        name: name.to_string(),
                        reason: format!("key is not base64: {e}"),
                    })?;
                PublicKey::from_bytes(&raw).map_err(|e| LookupError::InvalidKey {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            }
            status => Err(request_failed(format!("status {}", status.as_u16()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::crypto::PrivateKey;

    /// Serve a single canned HTTP response, returning the base URL and a
    /// handle resolving to the raw request.
    async fn serve_once(status: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{addr}"), handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..split]
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.eq_ignore_ascii_case("content-length")
                    .then(|| v.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= split + 4 + content_length
    }

    fn proof() -> IdentityProof {
        IdentityProof::generate(&PrivateKey::generate(), Utc::now())
    }

    #[test]
    fn proof_wire_encodes_fields() {
        let proof = proof();
        let wire = ProofWire::from(&proof);
        assert_eq!(wire.created_at, proof.created_at.timestamp());
        assert_eq!(BASE64.decode(&wire.signature).unwrap(), proof.signature.to_vec());
        assert_eq!(wire.public_key, proof.public_key.to_base64());
    }

    #[test]
    fn decode_message_rejects_bad_base64() {
        let err = decode_message(MessageWire {
            sender: "alice".into(),
            content: "%%%".into(),
            signature: BASE64.encode([1u8; 64]),
        })
        .unwrap_err();
        assert!(err.contains("content"));
    }

    #[tokio::test]
    async fn receive_not_found_is_empty_inbox() {
        let (url, server) = serve_once("404 Not Found", "").await;
        let client = HttpDumpClient::new(&url, Duration::from_secs(5)).unwrap();

        let result = client.receive(&proof()).await.unwrap();
        assert!(result.is_none());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/receive"));
        assert!(request.contains("identity_proof"));
    }

    #[tokio::test]
    async fn receive_decodes_message() {
        let body = format!(
            r#"{{"message":{{"sender":"alice","content":"{}","signature":"{}"}}}}"#,
            BASE64.encode(b"sealed"),
            BASE64.encode([9u8; 64]),
        );
        let (url, _server) = serve_once("200 OK", &body).await;
        let client = HttpDumpClient::new(&url, Duration::from_secs(5)).unwrap();

        let message = client.receive(&proof()).await.unwrap().unwrap();
        assert_eq!(message.sender, "alice");
        assert_eq!(message.content, b"sealed");
        assert_eq!(message.signature, vec![9u8; 64]);
    }

    #[tokio::test]
    async fn receive_server_error_is_transport_error() {
        let (url, _server) = serve_once("500 Internal Server Error", "").await;
        let client = HttpDumpClient::new(&url, Duration::from_secs(5)).unwrap();

        let err = client.receive(&proof()).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn send_posts_base64_payload() {
        let (url, server) = serve_once("200 OK", "{}").await;
        let client = HttpDumpClient::new(&url, Duration::from_secs(5)).unwrap();

        client
            .send(&SealedMessage {
                sender: "news".into(),
                receiver: "alice".into(),
                content: b"abc".to_vec(),
                signature: vec![1, 2, 3],
            })
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/send"));
        assert!(request.contains(r#""receiver":"alice""#));
        assert!(request.contains(&BASE64.encode(b"abc")));
    }

    #[tokio::test]
    async fn lookup_returns_public_key() {
        let key = PrivateKey::generate().public_key();
        let body = format!(r#"{{"key":"{}"}}"#, key.to_base64());
        let (url, server) = serve_once("200 OK", &body).await;
        let client = HttpLookupClient::new(&url, Duration::from_secs(5)).unwrap();

        assert_eq!(client.lookup_name("alice").await.unwrap(), key);
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /v1/lookup?name=alice"));
    }

    #[tokio::test]
    async fn lookup_not_found() {
        let (url, _server) = serve_once("404 Not Found", "").await;
        let client = HttpLookupClient::new(&url, Duration::from_secs(5)).unwrap();

        let err = client.lookup_name("nobody").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound { name } if name == "nobody"));
    }
}
