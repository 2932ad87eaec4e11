//! HTTP connection tester
//!
//! Probes the server's REST endpoint with basic auth and translates the
//! outcome into an [`ErrorCode`]. Only reachability and credentials are
//! checked; nothing is read from the response body.

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use sd_core::ServerSpec;

use crate::error_code::ErrorCode;
use crate::tester::{ConnectionFailure, ConnectionTester, TestRequest};

/// Endpoint probed below the server's base URL
pub const PROBE_PATH: &str = "/api/atelier/";

/// [`ConnectionTester`] backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct HttpConnectionTester {
    client: reqwest::Client,
}

impl HttpConnectionTester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, custom roots, ...)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// URL probed for a server
    pub fn probe_url(server: &ServerSpec) -> String {
        format!("{}{}", server.base_url(), PROBE_PATH)
    }
}

#[async_trait]
impl ConnectionTester for HttpConnectionTester {
    async fn test_connection(
        &self,
        request: TestRequest,
        cancel: CancellationToken,
    ) -> Result<(), ConnectionFailure> {
        let url = Self::probe_url(&request.server);
        tracing::debug!("Probing {}", url);

        let send = self
            .client
            .get(&url)
            .basic_auth(&request.username, Some(&request.password))
            .timeout(request.timeout)
            .send();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ConnectionFailure::cancelled().with_context("url", &url));
            }
            result = send => result,
        };

        match result {
            Ok(response) => classify_status(response.status(), &url),
            Err(e) => Err(classify_error(&e, &url)),
        }
    }
}

fn classify_status(status: StatusCode, url: &str) -> Result<(), ConnectionFailure> {
    if status.is_success() {
        return Ok(());
    }

    let failure = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ConnectionFailure::new(ErrorCode::AuthFailed, format!("server answered {}", status))
        }
        _ => ConnectionFailure::new(
            ErrorCode::ConnectionFailed,
            format!("unexpected status {}", status),
        )
        .with_recoverable(status.is_server_error()),
    };

    Err(failure
        .with_context("url", url)
        .with_context("status", status.as_u16().to_string()))
}

fn classify_error(error: &reqwest::Error, url: &str) -> ConnectionFailure {
    let code = if error.is_timeout() {
        ErrorCode::ConnectionTimeout
    } else if error.is_connect() {
        ErrorCode::ServerUnreachable
    } else {
        ErrorCode::ConnectionFailed
    };

    ConnectionFailure::new(code, error.to_string()).with_context("url", url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_core::Scheme;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn spec(host: &str, port: u16) -> ServerSpec {
        ServerSpec {
            host: host.into(),
            port,
            scheme: Scheme::Http,
            path_prefix: None,
            namespace: None,
        }
    }

    fn request(server: ServerSpec) -> TestRequest {
        TestRequest {
            server,
            username: "sys".into(),
            password: "Sys1".into(),
            timeout: Duration::from_secs(5),
        }
    }

    fn tester() -> HttpConnectionTester {
        HttpConnectionTester::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    /// Serve one canned HTTP response on a local port
    async fn one_shot_server(status_line: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status_line
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        port
    }

    #[test]
    fn test_probe_url() {
        let mut server = spec("localhost", 52773);
        assert_eq!(
            HttpConnectionTester::probe_url(&server),
            "http://localhost:52773/api/atelier/"
        );

        server.path_prefix = Some("iris".into());
        server.scheme = Scheme::Https;
        assert_eq!(
            HttpConnectionTester::probe_url(&server),
            "https://localhost:52773/iris/api/atelier/"
        );
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::OK, "u").is_ok());

        let failure = classify_status(StatusCode::UNAUTHORIZED, "u").unwrap_err();
        assert_eq!(failure.code, Some(ErrorCode::AuthFailed));
        assert_eq!(failure.context.get("status").map(String::as_str), Some("401"));

        let failure = classify_status(StatusCode::FORBIDDEN, "u").unwrap_err();
        assert_eq!(failure.code, Some(ErrorCode::AuthFailed));

        let failure = classify_status(StatusCode::NOT_FOUND, "u").unwrap_err();
        assert_eq!(failure.code, Some(ErrorCode::ConnectionFailed));
        assert!(!failure.recoverable);

        let failure = classify_status(StatusCode::SERVICE_UNAVAILABLE, "u").unwrap_err();
        assert!(failure.recoverable);
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let failure = tester()
            .test_connection(request(spec("127.0.0.1", 9)), cancel)
            .await
            .unwrap_err();
        assert_eq!(failure.code, Some(ErrorCode::ConnectionCancelled));
    }

    #[tokio::test]
    async fn test_success_status() {
        let port = one_shot_server("200 OK").await;
        let result = tester()
            .test_connection(request(spec("127.0.0.1", port)), CancellationToken::new())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let port = one_shot_server("401 Unauthorized").await;
        let failure = tester()
            .test_connection(request(spec("127.0.0.1", port)), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(failure.code, Some(ErrorCode::AuthFailed));
    }

    #[tokio::test]
    async fn test_refused_is_unreachable() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let failure = tester()
            .test_connection(request(spec("127.0.0.1", port)), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(failure.code, Some(ErrorCode::ServerUnreachable));
    }
}
