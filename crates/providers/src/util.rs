//! Shared helpers for the HTTP-facing modules.

use crate::transport::TransportError;

/// Convert a [`reqwest::Error`] into a [`TransportError`].
///
/// Timeouts map to [`TransportError::Timeout`], refused or failed
/// connections to [`TransportError::Connect`], everything else to
/// [`TransportError::Other`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

/// Normalize a provider base URL: strip trailing `/` and append `/v1`
/// unless the URL already ends with it.
pub fn normalize_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

/// The model-listing URL for a provider base URL.
pub fn models_url(base_url: &str) -> String {
    format!("{}/models", normalize_endpoint(base_url))
}

/// Truncate a response body for log and error output.
pub(crate) fn snippet(body: &[u8]) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(body);
    if text.chars().count() <= MAX {
        text.into_owned()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_gets_v1_once() {
        assert_eq!(normalize_endpoint("https://api.x.com"), "https://api.x.com/v1");
        assert_eq!(normalize_endpoint("https://api.x.com/"), "https://api.x.com/v1");
        assert_eq!(normalize_endpoint("https://api.x.com/v1/"), "https://api.x.com/v1");
        assert_eq!(normalize_endpoint("https://api.x.com/v1"), "https://api.x.com/v1");
    }

    #[test]
    fn models_url_appends_path() {
        assert_eq!(models_url("http://h:1/"), "http://h:1/v1/models");
    }

    #[test]
    fn snippet_truncates_long_bodies() {
        let body = vec![b'a'; 500];
        let s = snippet(&body);
        assert_eq!(s.len(), 203);
        assert!(s.ends_with("..."));
        assert_eq!(snippet(b"short"), "short");
    }
}
