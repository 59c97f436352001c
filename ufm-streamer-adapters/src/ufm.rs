//! UFM adapter using the UFM REST API.
//!
//! The adapter works in one of two addressing modes:
//!
//! - **Remote**: `{protocol}://{host}/ufmRest/{path}` with HTTP basic auth.
//!   Certificate verification is disabled since UFM appliances usually
//!   ship self-signed certificates.
//! - **Local**: `http://127.0.0.1:{port}/{path}` against the UFM internal
//!   server, identifying the caller with an `X-Remote-User` header instead of
//!   credentials.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ufm_streamer_adapters::ufm::UfmClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Running next to UFM, go through the internal port
//!     let client = UfmClient::builder()
//!         .credentials("admin", "")
//!         .local_streaming(8000)
//!         .build()?;
//!
//!     let version = client.fetch("app/versioning").await?;
//!     println!("UFM version info: {}", version);
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use crate::AdapterError;

/// Path prefix of the REST API on a remote UFM.
pub const REMOTE_API_PREFIX: &str = "ufmRest";

/// Header carrying the caller identity in local mode.
pub const REMOTE_USER_HEADER: &str = "X-Remote-User";

/// Loopback address of the UFM internal server.
pub const LOCAL_HOST: &str = "127.0.0.1";

/// How requests reach the UFM server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addressing {
    /// Remote UFM over its public REST endpoint.
    Remote { protocol: String, host: String },
    /// Local UFM internal server on the loopback interface.
    Local { port: u16 },
}

/// The shape of one API request, independent of the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UfmRequest {
    /// Full request URL.
    pub url: String,
    /// Username and password for basic auth, if any.
    pub basic_auth: Option<(String, String)>,
    /// Extra headers sent with the request.
    pub headers: Vec<(String, String)>,
}

/// Client for the UFM REST API.
#[derive(Debug, Clone)]
pub struct UfmClient {
    client: Client,
    addressing: Addressing,
    username: String,
    password: String,
}

impl UfmClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> UfmClientBuilder {
        UfmClientBuilder::default()
    }

    /// The addressing mode in use.
    pub fn addressing(&self) -> &Addressing {
        &self.addressing
    }

    /// Whether requests go through the local internal server.
    pub fn is_local(&self) -> bool {
        matches!(self.addressing, Addressing::Local { .. })
    }

    /// Describe the request that `fetch(path)` would send.
    pub fn request(&self, path: &str) -> UfmRequest {
        let path = path.trim_start_matches('/');
        match &self.addressing {
            Addressing::Remote { protocol, host } => UfmRequest {
                url: format!("{}://{}/{}/{}", protocol, host, REMOTE_API_PREFIX, path),
                basic_auth: Some((self.username.clone(), self.password.clone())),
                headers: Vec::new(),
            },
            Addressing::Local { port } => UfmRequest {
                url: format!("http://{}:{}/{}", LOCAL_HOST, port, path),
                basic_auth: None,
                headers: vec![(REMOTE_USER_HEADER.to_string(), self.username.clone())],
            },
        }
    }

    /// GET an API path and parse the body as JSON.
    ///
    /// A non-success status is logged and returned as an error; nothing is
    /// retried or cached here.
    pub async fn fetch(&self, path: &str) -> Result<Value, AdapterError> {
        let request = self.request(path);

        let mut builder = self.client.get(&request.url);
        if let Some((username, password)) = &request.basic_auth {
            builder = builder.basic_auth(username, Some(password));
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(url = %request.url, "sending UFM request");
        let response = builder.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            error!(url = %request.url, %status, "UFM rejected credentials");
            return Err(AdapterError::Auth(format!(
                "Invalid credentials for user '{}'",
                self.username
            )));
        }

        if !status.is_success() {
            error!(url = %request.url, %status, "UFM request failed");
            return Err(AdapterError::Status {
                status: status.as_u16(),
                url: request.url,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| AdapterError::Parse(e.to_string()))?;

        Ok(value)
    }
}

/// Builder for UfmClient.
#[derive(Debug, Default)]
pub struct UfmClientBuilder {
    protocol: Option<String>,
    host: Option<String>,
    username: Option<String>,
    password: Option<String>,
    local_port: Option<u16>,
    timeout: Option<Duration>,
    no_proxy: bool,
}

impl UfmClientBuilder {
    /// Set the URL scheme for remote mode (default: "https").
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Set the UFM host for remote mode, optionally with a port.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the username and password.
    ///
    /// In local mode only the username is sent.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Switch to local mode against the internal server on `port`.
    pub fn local_streaming(mut self, port: u16) -> Self {
        self.local_port = Some(port);
        self
    }

    /// Set the request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Ignore proxy settings from the environment.
    ///
    /// Local mode never uses a proxy.
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<UfmClient, AdapterError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(30));

        let addressing = match self.local_port {
            Some(port) => Addressing::Local { port },
            None => Addressing::Remote {
                protocol: self.protocol.unwrap_or_else(|| "https".to_string()),
                host: self.host.unwrap_or_else(|| "localhost".to_string()),
            },
        };

        let mut client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true);
        if self.no_proxy || matches!(addressing, Addressing::Local { .. }) {
            client = client.no_proxy();
        }

        Ok(UfmClient {
            client: client.build()?,
            addressing,
            username: self.username.unwrap_or_else(|| "admin".to_string()),
            password: self.password.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve a single canned HTTP response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (u16, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request).to_lowercase()
        });

        (port, handle)
    }

    fn remote_client(host: &str) -> UfmClient {
        UfmClient::builder()
            .protocol("http")
            .host(host)
            .credentials("admin", "123456")
            .no_proxy()
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let client = UfmClient::builder().build().unwrap();
        assert_eq!(
            client.addressing(),
            &Addressing::Remote {
                protocol: "https".to_string(),
                host: "localhost".to_string()
            }
        );
        assert_eq!(client.username, "admin");
        assert_eq!(client.password, "");
        assert!(!client.is_local());
    }

    #[test]
    fn test_builder_local_mode() {
        let client = UfmClient::builder()
            .host("ignored")
            .credentials("admin", "secret")
            .local_streaming(8000)
            .build()
            .unwrap();

        assert!(client.is_local());
        assert_eq!(client.addressing(), &Addressing::Local { port: 8000 });
    }

    #[test]
    fn test_remote_request_shape() {
        let client = remote_client("ufm");
        let request = client.request("P");

        assert_eq!(request.url, "http://ufm/ufmRest/P");
        assert_eq!(
            request.basic_auth,
            Some(("admin".to_string(), "123456".to_string()))
        );
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_local_request_shape() {
        let client = UfmClient::builder()
            .credentials("admin", "123456")
            .local_streaming(80)
            .build()
            .unwrap();
        let request = client.request("P");

        assert_eq!(request.url, "http://127.0.0.1:80/P");
        assert_eq!(request.basic_auth, None);
        assert_eq!(
            request.headers,
            vec![("X-Remote-User".to_string(), "admin".to_string())]
        );
    }

    #[test]
    fn test_request_trims_leading_slash() {
        let client = remote_client("ufm");
        assert_eq!(
            client.request("/resources/ports").url,
            "http://ufm/ufmRest/resources/ports"
        );
    }

    #[tokio::test]
    async fn test_fetch_remote_sends_basic_auth() {
        let (port, server) = serve_once("200 OK", r#"{"ufm_release_version": "6.10"}"#).await;
        let client = remote_client(&format!("127.0.0.1:{}", port));

        let value = client.fetch("app/versioning").await.unwrap();
        assert_eq!(value["ufm_release_version"], "6.10");

        let request = server.await.unwrap();
        assert!(request.starts_with("get /ufmrest/app/versioning http/1.1"));
        // base64("admin:123456"), lowercased with the rest of the request
        assert!(request.contains("authorization: basic ywrtaw46mtizndu2"));
        assert!(!request.contains("x-remote-user"));
    }

    #[tokio::test]
    async fn test_fetch_local_sends_remote_user() {
        let (port, server) = serve_once("200 OK", r#"[{"name": "sw1"}]"#).await;
        let client = UfmClient::builder()
            .credentials("admin", "123456")
            .local_streaming(port)
            .build()
            .unwrap();

        let value = client.fetch("resources/systems").await.unwrap();
        assert_eq!(value[0]["name"], "sw1");

        let request = server.await.unwrap();
        assert!(request.starts_with("get /resources/systems http/1.1"));
        assert!(request.contains("x-remote-user: admin"));
        assert!(!request.contains("authorization"));
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let (port, server) = serve_once("500 Internal Server Error", "{}").await;
        let client = remote_client(&format!("127.0.0.1:{}", port));

        let err = client.fetch("resources/ports").await.unwrap_err();
        match err {
            AdapterError::Status { status, url } => {
                assert_eq!(status, 500);
                assert!(url.ends_with("/ufmRest/resources/ports"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_unauthorized() {
        let (port, server) = serve_once("401 Unauthorized", "{}").await;
        let client = remote_client(&format!("127.0.0.1:{}", port));

        let err = client.fetch("app/alarms").await.unwrap_err();
        assert!(matches!(err, AdapterError::Auth(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let (port, server) = serve_once("200 OK", "not json").await;
        let client = remote_client(&format!("127.0.0.1:{}", port));

        let err = client.fetch("resources/links").await.unwrap_err();
        assert!(matches!(err, AdapterError::Parse(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = remote_client(&format!("127.0.0.1:{}", port));
        let err = client.fetch("app/versioning").await.unwrap_err();
        assert!(matches!(err, AdapterError::Connection(_)));
    }
}
