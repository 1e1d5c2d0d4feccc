use thiserror::Error;
use url::Url;

/// Reasons an API base URL is refused.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP to a non-local host would send the bearer token in clear text.
    #[error("Insecure base URL: HTTPS required (except localhost)")]
    Insecure,
    #[error("Base URL has no host")]
    MissingHost,
}

/// Validates the blog API base URL and normalises it to end with `/`, so
/// that `Url::join("posts")` appends rather than replaces the last segment.
///
/// HTTPS is required. Plain HTTP is accepted only for `localhost`,
/// `127.0.0.1` and `[::1]`, which is what local development and the
/// wiremock-backed tests use.
pub fn validate_base_url(raw: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(raw.trim())?;

    let host = url.host_str().ok_or(UrlValidationError::MissingHost)?;
    match url.scheme() {
        "https" => {}
        "http" => {
            if !matches!(host, "localhost" | "127.0.0.1" | "[::1]") {
                return Err(UrlValidationError::Insecure);
            }
            tracing::warn!(base_url = %url, "Using plain HTTP base URL (localhost only)");
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}
