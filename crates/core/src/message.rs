//! Request and response types exchanged between the host, the worker,
//! the network and the cache stores.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::hash::compute_request_key;

/// How the request was initiated by the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    /// Same-origin only.
    SameOrigin,
    /// No CORS (the default for subresources).
    #[default]
    NoCors,
    /// CORS.
    Cors,
}

/// An intercepted request descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A plain GET for `url` in `no-cors` mode with no headers.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, mode: RequestMode::default(), headers: Vec::new() }
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value with a case-insensitive name match.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Every value of a header that may repeat, in order.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Only GET requests are ever stored in or served from a cache store.
    pub fn is_cacheable(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Key under which this request is stored in every cache store.
    pub fn cache_key(&self) -> String {
        compute_request_key(&self.method, &self.url)
    }
}

/// A fully buffered response.
///
/// Clones share the body buffer, so cloning a response to store it while
/// returning the original is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status in the 200..=299 range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
