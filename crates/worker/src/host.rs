//! Line-oriented host that stands in for the page side.
//!
//! Each stdin line is one JSON request; each stdout line is the JSON reply.
//! Requests the worker passes through are fetched by the host directly, the
//! way a browser does for uncontrolled requests. Logging goes to stderr.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sitecache_client::{Network, UrlError, resolve};
use sitecache_core::{Request, RequestMode, Response};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::worker::{FetchOutcome, OfflineWorker};

/// One request line.
#[derive(Debug, Clone, Deserialize)]
pub struct HostRequest {
    /// Absolute URL, or a path relative to the site origin.
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub mode: RequestMode,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// One reply line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `network`, `cache`, `passthrough` or `error`.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Errors for a single request line. None of them stop the host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("INVALID_INPUT: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("INVALID_URL: {0}")]
    Url(#[from] UrlError),

    #[error(transparent)]
    Fetch(#[from] sitecache_core::Error),
}

impl HostReply {
    fn served(url: &str, source: &str, response: Response) -> Self {
        Self {
            url: Some(url.to_string()),
            source: source.to_string(),
            status: Some(response.status),
            body: Some(response.text()),
            headers: response.headers,
            error: None,
        }
    }

    fn failed(url: Option<String>, err: &HostError) -> Self {
        Self { url, source: "error".to_string(), error: Some(err.to_string()), ..Self::default() }
    }
}

/// Serve request lines until `input` ends, then wait for pending cache writes.
///
/// Returns the number of requests answered.
pub async fn serve<R, W>(worker: &OfflineWorker, network: &dyn Network, input: R, mut output: W) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut answered = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = answer(worker, network, line).await;
        let mut encoded = serde_json::to_vec(&reply)?;
        encoded.push(b'\n');
        output.write_all(&encoded).await?;
        output.flush().await?;
        answered += 1;
    }

    let settled = worker.settle().await;
    tracing::info!(answered, settled, "input closed, host stopping");
    Ok(answered)
}

async fn answer(worker: &OfflineWorker, network: &dyn Network, line: &str) -> HostReply {
    let request = match parse_request(worker, line) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "rejected request line");
            return HostReply::failed(None, &e);
        }
    };
    let url = request.url.to_string();

    let outcome = match worker.handle_fetch(&request).await {
        Ok(FetchOutcome::PassThrough) => network.fetch(&request).await.map(|r| ("passthrough", r)),
        Ok(FetchOutcome::Network(response)) => Ok(("network", response)),
        Ok(FetchOutcome::Cache(response)) => Ok(("cache", response)),
        Err(e) => Err(e),
    };

    match outcome {
        Ok((source, response)) => {
            tracing::info!(%url, source, status = response.status, "served");
            HostReply::served(&url, source, response)
        }
        Err(e) => {
            tracing::warn!(%url, error = %e, "request failed");
            HostReply::failed(Some(url), &HostError::from(e))
        }
    }
}

fn parse_request(worker: &OfflineWorker, line: &str) -> Result<Request, HostError> {
    let parsed: HostRequest = serde_json::from_str(line)?;
    let url = resolve(&worker.config().origin, &parsed.url)?;

    let mut request = Request::get(url).with_mode(parsed.mode);
    request.method = parsed.method.to_ascii_uppercase();
    for (name, value) in parsed.headers {
        request = request.with_header(name, value);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{MockNetwork, ORIGIN};
    use sitecache_core::{CacheDb, WorkerConfig};
    use url::Url;

    async fn worker(network: &Arc<MockNetwork>) -> OfflineWorker {
        network.respond("/index.html", 200, "<html>home</html>");
        let config = WorkerConfig::new(Url::parse(ORIGIN).unwrap(), "baby", "v4", vec!["index.html".into()]);
        let db = CacheDb::open_in_memory().await.unwrap();
        let worker = OfflineWorker::new(config, db, network.clone());
        worker.start().await.unwrap();
        worker
    }

    fn replies(output: &[u8]) -> Vec<HostReply> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_serve_answers_each_line() {
        let network = Arc::new(MockNetwork::new());
        let worker = worker(&network).await;
        network.respond("/styles.css", 200, "body{}");

        let input = concat!(
            r#"{"url": "/styles.css"}"#,
            "\n\n",
            r#"{"url": "/index.html", "mode": "navigate"}"#,
            "\n",
        );
        network.fail("/index.html");

        let mut output = Vec::new();
        let answered = serve(&worker, network.as_ref(), input.as_bytes(), &mut output).await.unwrap();

        assert_eq!(answered, 2);
        let replies = replies(&output);
        assert_eq!(replies[0].source, "network");
        assert_eq!(replies[0].body.as_deref(), Some("body{}"));
        assert_eq!(replies[1].source, "cache");
        assert_eq!(replies[1].status, Some(200));
        assert_eq!(replies[1].body.as_deref(), Some("<html>home</html>"));
    }

    #[tokio::test]
    async fn test_serve_passthrough_is_fetched_by_host() {
        let network = Arc::new(MockNetwork::new());
        let worker = worker(&network).await;
        network.respond("https://cdn.example.com/lib.js", 200, "lib");

        let input = r#"{"url": "https://cdn.example.com/lib.js"}"#;
        let mut output = Vec::new();
        serve(&worker, network.as_ref(), input.as_bytes(), &mut output).await.unwrap();

        let replies = replies(&output);
        assert_eq!(replies[0].source, "passthrough");
        assert_eq!(replies[0].body.as_deref(), Some("lib"));
        let runtime = worker.db().open_store("baby-runtime-v4").await.unwrap();
        assert!(runtime.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_serve_reports_errors_and_keeps_going() {
        let network = Arc::new(MockNetwork::new());
        let worker = worker(&network).await;

        let input = "not json\n{\"url\": \"ftp://example.com/a\"}\n{\"url\": \"/about\", \"mode\": \"navigate\"}\n";
        let mut output = Vec::new();
        let answered = serve(&worker, network.as_ref(), input.as_bytes(), &mut output).await.unwrap();

        assert_eq!(answered, 3);
        let replies = replies(&output);
        assert!(replies.iter().all(|r| r.source == "error"));
        assert!(replies[0].error.as_deref().unwrap().starts_with("INVALID_INPUT"));
        assert!(replies[1].error.as_deref().unwrap().starts_with("INVALID_URL"));
        assert!(replies[2].error.as_deref().unwrap().starts_with("UNAVAILABLE"));
        assert_eq!(replies[2].url.as_deref(), Some("http://localhost:8080/about"));
    }
}
