//! HTTP fetch path to the site's origin.
//!
//! ### Failure model
//! - Any HTTP response, whatever its status, is a successful fetch.
//! - Only transport failures (connection refused, DNS, TLS, reset, timeout)
//!   are errors. These are what the worker's fallback rules react to.
//!
//! ### Bodies
//! - Responses are fully buffered before being returned, so the caller can
//!   hand one copy to the page and store another.

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::{Duration, Instant};

pub use url::{UrlError, resolve};

use sitecache_core::{Error, Request, Response};

/// The worker's view of the network.
///
/// This allows tests to script network behavior without a live origin.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform `request` and return the buffered response.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "sitecache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "sitecache/0.1".to_string(), timeout: Duration::from_millis(20000), max_redirects: 5 }
    }
}

/// reqwest-backed network client.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() { Error::FetchTimeout(err.to_string()) } else { Error::Network(err.to_string()) }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();

        let body = response.bytes().await.map_err(transport_error)?;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            request.url,
            status,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::url::Url;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP/1.1 response on a local port.
    async fn serve_once(raw: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(raw.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "sitecache/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_buffers_body_and_headers() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/css\r\nContent-Length: 2\r\nConnection: close\r\n\r\nB1",
        )
        .await;
        let client = FetchClient::new(FetchConfig::default()).unwrap();

        let response = client.fetch(&Request::get(base.join("styles.css").unwrap())).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "B1");
        assert_eq!(response.header("content-type"), Some("text/css"));
    }

    #[tokio::test]
    async fn test_http_error_status_is_not_a_failure() {
        let base = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 4\r\nConnection: close\r\n\r\ngone").await;
        let client = FetchClient::new(FetchConfig::default()).unwrap();

        let response = client.fetch(&Request::get(base.join("missing.png").unwrap())).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let url = Url::parse(&format!("http://{addr}/app.js")).unwrap();

        let err = client.fetch(&Request::get(url)).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_invalid_method() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let mut request = Request::get(Url::parse("http://localhost/").unwrap());
        request.method = "GE T".into();

        let err = client.fetch(&request).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
