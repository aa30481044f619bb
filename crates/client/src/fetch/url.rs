//! URL resolution against the site origin.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve `input` into an absolute URL.
///
/// Absolute inputs are taken as-is; anything else (`styles.css`,
/// `/photo.png`, `?page=2`) is joined onto `base`. Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative references against `base`
/// 3. Reject schemes other than http/https
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}
