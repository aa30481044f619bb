//! Request key generation for cache entries.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the storage key for a request.
///
/// The fragment never reaches the server, so it is ignored; the method is
/// upper-cased so `get` and `GET` share an entry.
pub fn compute_request_key(method: &str, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_stability() {
        let key1 = compute_request_key("GET", &url("http://localhost:8080/styles.css"));
        let key2 = compute_request_key("GET", &url("http://localhost:8080/styles.css"));
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_method_case() {
        let lower = compute_request_key("get", &url("http://localhost:8080/app.js"));
        let upper = compute_request_key("GET", &url("http://localhost:8080/app.js"));
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_key_different_method() {
        let get = compute_request_key("GET", &url("http://localhost:8080/app.js"));
        let head = compute_request_key("HEAD", &url("http://localhost:8080/app.js"));
        assert_ne!(get, head);
    }

    #[test]
    fn test_key_ignores_fragment_not_query() {
        let plain = compute_request_key("GET", &url("http://localhost:8080/index.html"));
        let fragment = compute_request_key("GET", &url("http://localhost:8080/index.html#about"));
        let query = compute_request_key("GET", &url("http://localhost:8080/index.html?v=2"));
        assert_eq!(plain, fragment);
        assert_ne!(plain, query);
    }

    #[test]
    fn test_key_format() {
        let key = compute_request_key("GET", &url("http://localhost:8080/"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
