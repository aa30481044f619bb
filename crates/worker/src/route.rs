//! Request classification and the caching strategy each class gets.

use sitecache_core::{Request, RequestMode};
use url::Url;

/// Content class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Html,
    Stylesheet,
    Script,
    /// Anything else: images, fonts, icons.
    Asset,
}

/// How a request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fresh copy from the network; cache only when the network fails.
    NetworkFirst,
    /// Cached copy if there is one; network only on a miss.
    CacheFirst,
}

impl RequestClass {
    /// Classify a request. Checks run in order: HTML, CSS, JS, then asset.
    pub fn classify(request: &Request) -> Self {
        let wants_html = request
            .header_values("accept")
            .any(|accept| accept.contains("text/html"));

        if request.mode == RequestMode::Navigate || wants_html {
            return RequestClass::Html;
        }

        let path = request.url.path();
        if path.ends_with(".css") {
            RequestClass::Stylesheet
        } else if path.ends_with(".js") {
            RequestClass::Script
        } else {
            RequestClass::Asset
        }
    }

    pub fn strategy(self) -> Strategy {
        match self {
            RequestClass::Html | RequestClass::Stylesheet | RequestClass::Script => Strategy::NetworkFirst,
            RequestClass::Asset => Strategy::CacheFirst,
        }
    }
}

/// Whether `url` belongs to the worker's own origin.
pub fn is_same_origin(url: &Url, origin: &Url) -> bool {
    url.origin() == origin.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str) -> Request {
        Request::get(Url::parse("http://localhost:8080").unwrap().join(path).unwrap())
    }

    #[test]
    fn test_navigate_is_html() {
        let req = request("/about").with_mode(RequestMode::Navigate);
        assert_eq!(RequestClass::classify(&req), RequestClass::Html);
    }

    #[test]
    fn test_accept_header_is_html() {
        let req = request("/partials/footer").with_header("Accept", "text/html,application/xhtml+xml;q=0.9");
        assert_eq!(RequestClass::classify(&req), RequestClass::Html);
    }

    #[test]
    fn test_repeated_accept_header_is_html() {
        let req = request("/partials/footer")
            .with_header("Accept", "application/json")
            .with_header("Accept", "text/html");
        assert_eq!(RequestClass::classify(&req), RequestClass::Html);
    }

    #[test]
    fn test_html_wins_over_suffix() {
        let req = request("/theme.css").with_mode(RequestMode::Navigate);
        assert_eq!(RequestClass::classify(&req), RequestClass::Html);
    }

    #[test]
    fn test_css_and_js_suffix() {
        assert_eq!(RequestClass::classify(&request("/styles.css")), RequestClass::Stylesheet);
        assert_eq!(RequestClass::classify(&request("/js/app.js")), RequestClass::Script);
    }

    #[test]
    fn test_query_does_not_affect_suffix() {
        assert_eq!(RequestClass::classify(&request("/styles.css?v=3")), RequestClass::Stylesheet);
        assert_eq!(RequestClass::classify(&request("/photo.png?x=.js")), RequestClass::Asset);
    }

    #[test]
    fn test_everything_else_is_asset() {
        for path in ["/photo.png", "/fonts/inter.woff2", "/favicon.svg", "/data.json", "/"] {
            assert_eq!(RequestClass::classify(&request(path)), RequestClass::Asset, "{path}");
        }
    }

    #[test]
    fn test_accept_without_html_is_not_html() {
        let req = request("/styles.css").with_header("Accept", "text/css,*/*;q=0.1");
        assert_eq!(RequestClass::classify(&req), RequestClass::Stylesheet);
    }

    #[test]
    fn test_strategies() {
        assert_eq!(RequestClass::Html.strategy(), Strategy::NetworkFirst);
        assert_eq!(RequestClass::Stylesheet.strategy(), Strategy::NetworkFirst);
        assert_eq!(RequestClass::Script.strategy(), Strategy::NetworkFirst);
        assert_eq!(RequestClass::Asset.strategy(), Strategy::CacheFirst);
    }

    #[test]
    fn test_same_origin() {
        let origin = Url::parse("http://localhost:8080/").unwrap();
        assert!(is_same_origin(&Url::parse("http://localhost:8080/a/b.css").unwrap(), &origin));
        assert!(!is_same_origin(&Url::parse("http://localhost:9090/").unwrap(), &origin));
        assert!(!is_same_origin(&Url::parse("https://localhost:8080/").unwrap(), &origin));
        assert!(!is_same_origin(&Url::parse("http://cdn.example.com/lib.js").unwrap(), &origin));
    }
}
