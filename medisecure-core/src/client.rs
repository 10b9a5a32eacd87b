//! Middleware REST API client
//!
//! The middleware fronts the registration center and the resource server;
//! the client only ever talks to it for registration and authentication.
//! The session-key derivation happens entirely server-side; responses are
//! stored as opaque strings.
//!
//! Error taxonomy (two-tier, surfaced verbatim to the user):
//! - [`ApiError::Rejected`]: the server answered with a non-success status;
//!   carries the server-supplied message when present
//! - [`ApiError::Unreachable`]: the request never produced a response

use reqwest::Client;
use thiserror::Error;

use crate::protocol::{
    AuthResponse, CredentialRequest, ErrorBody, RegisterResponse, ServerCreds, ServiceGreeting,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Rejected(String),

    #[error("Network error. Please ensure all services are running.")]
    Unreachable(#[from] reqwest::Error),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

/// HTTP client for the middleware API
#[derive(Debug, Clone)]
pub struct MiddlewareClient {
    http: Client,
    base_url: String,
}

impl MiddlewareClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_http(Client::new(), base_url)
    }

    /// Build from a shared reqwest client (the monitor reuses it)
    pub fn with_http(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Register a new account; on success the middleware issues a UID and
    /// the smartcard material
    pub async fn register(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        let resp = self
            .http
            .post(format!("{}/register_user", self.base_url))
            .json(&CredentialRequest { user_id, password })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(rejection(resp, "Registration failed").await);
        }

        resp.json::<RegisterResponse>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Run the mutual-authentication protocol; on success the middleware
    /// returns the established session key
    pub async fn authenticate(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let resp = self
            .http
            .post(format!("{}/authenticate_user", self.base_url))
            .json(&CredentialRequest { user_id, password })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(rejection(resp, "Authentication failed").await);
        }

        resp.json::<AuthResponse>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// Reachability probe against a service base URL
///
/// Any success status counts as up. The body is parsed leniently for the
/// embedded identity object (only the resource server carries one); a body
/// in any other shape still counts as up.
pub async fn probe(http: &Client, base_url: &str) -> Result<Option<ServerCreds>, ApiError> {
    let resp = http.get(base_url).send().await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Rejected(format!("HTTP {}", status.as_u16())));
    }

    let greeting = resp.json::<ServiceGreeting>().await.unwrap_or_default();
    Ok(greeting.creds)
}

/// Map a non-success response to `Rejected`, preferring the server message
async fn rejection(resp: reqwest::Response, fallback: &str) -> ApiError {
    let status = resp.status();
    let body = resp.json::<ErrorBody>().await.unwrap_or_default();
    let message = body
        .error
        .unwrap_or_else(|| format!("{} (HTTP {})", fallback, status.as_u16()));
    ApiError::Rejected(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a fresh local port
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // Consume the whole request (headers plus Content-Length body)
            // before answering, so the client never sees a reset
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);

                let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                    continue;
                };
                let head = String::from_utf8_lossy(&request[..header_end]);
                let content_length = head
                    .lines()
                    .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(str::trim).map(String::from))
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
        });

        format!("http://{addr}")
    }

    async fn refused_url() -> String {
        // Bind to grab a free port, then drop the listener so connects fail
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    #[test]
    fn test_base_url_normalization() {
        let client = MiddlewareClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_register_success() {
        let url = serve_once(
            "HTTP/1.1 201 Created",
            r#"{"message":"User registered successfully","UID_i":"uid1","E_i":"e5","SmartCard":{"W_i":"w1","X_i":"x2","Y_i":"y3","Z_i":"z4","E_i":"e5"}}"#,
        )
        .await;

        let client = MiddlewareClient::new(&url);
        let resp = client.register("alice123", "secretpw").await.unwrap();
        assert_eq!(resp.uid, "uid1");
        assert_eq!(resp.smartcard.e, "e5");
    }

    #[tokio::test]
    async fn test_register_rejected_with_server_message() {
        let url = serve_once(
            "HTTP/1.1 400 Bad Request",
            r#"{"error":"Missing user credentials"}"#,
        )
        .await;

        let client = MiddlewareClient::new(&url);
        let err = client.register("alice123", "secretpw").await.unwrap_err();
        match err {
            ApiError::Rejected(msg) => assert_eq!(msg, "Missing user credentials"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejection_without_message_uses_fallback() {
        let url = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;

        let client = MiddlewareClient::new(&url);
        let err = client.authenticate("alice123", "secretpw").await.unwrap_err();
        match err {
            ApiError::Rejected(msg) => assert_eq!(msg, "Authentication failed (HTTP 500)"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let url = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"message":"Mutual authentication successful","session_key":"sk-abc","timestamp":1}"#,
        )
        .await;

        let client = MiddlewareClient::new(&url);
        let resp = client.authenticate("alice123", "secretpw").await.unwrap();
        assert_eq!(resp.session_key, "sk-abc");
    }

    #[tokio::test]
    async fn test_transport_failure_is_unreachable() {
        let url = refused_url().await;

        let client = MiddlewareClient::new(&url);
        let err = client.register("alice123", "secretpw").await.unwrap_err();
        assert!(matches!(err, ApiError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_probe_extracts_identity() {
        let url = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"message":"Welcome to the server","creds":{"ID_j":"S1","PW_j":"x","Loc_j":"NYC"}}"#,
        )
        .await;

        let creds = probe(&Client::new(), &url).await.unwrap().unwrap();
        assert_eq!(creds.id, "S1");
        assert_eq!(creds.location, "NYC");
    }

    #[tokio::test]
    async fn test_probe_up_without_identity() {
        let url = serve_once("HTTP/1.1 200 OK", r#"{"message":"running"}"#).await;
        let creds = probe(&Client::new(), &url).await.unwrap();
        assert!(creds.is_none());
    }

    #[tokio::test]
    async fn test_probe_bad_status_is_failure() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable", "{}").await;
        let err = probe(&Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_probe_unreachable_is_failure() {
        let url = refused_url().await;
        let err = probe(&Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, ApiError::Unreachable(_)));
    }
}
