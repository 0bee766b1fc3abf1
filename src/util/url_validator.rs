use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur while validating a configured endpoint.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP pointed at a non-loopback host.
    #[error("Insecure URL: HTTPS required for {0} (plain HTTP is allowed only for localhost)")]
    Insecure(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates an endpoint URL (feed source, webhook, API base) from configuration.
///
/// Secrets travel to most of these endpoints, so plain `http://` is rejected
/// unless the host is loopback. Loopback HTTP stays allowed so tests can point
/// every collaborator at a local mock server.
///
/// # Examples
///
/// ```
/// use tech_digest::util::validate_endpoint;
///
/// assert!(validate_endpoint("https://hooks.slack.com/services/T/B/X").is_ok());
/// assert!(validate_endpoint("http://127.0.0.1:8080/hook").is_ok());
/// assert!(validate_endpoint("http://example.com/hook").is_err());
/// assert!(validate_endpoint("file:///etc/passwd").is_err());
/// ```
pub fn validate_endpoint(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    let secure = match url.scheme() {
        "https" => true,
        "http" => false,
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    };

    let host = url.host_str().ok_or(UrlValidationError::MissingHost)?;
    if !secure && !is_loopback_host(host) {
        return Err(UrlValidationError::Insecure(host.to_owned()));
    }

    Ok(url)
}

fn is_loopback_host(host: &str) -> bool {
    if host == "localhost" {
        return true;
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    host_for_parse
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_accepted() {
        assert!(validate_endpoint("https://b.hatena.ne.jp/hotentry/it.rss").is_ok());
        assert!(validate_endpoint("https://slack.com/api").is_ok());
    }

    #[test]
    fn test_https_with_port_accepted() {
        let url = validate_endpoint("https://example.com:8443/hook").unwrap();
        assert_eq!(url.port(), Some(8443));
    }

    #[test]
    fn test_invalid_schemes() {
        assert!(matches!(
            validate_endpoint("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_endpoint("ftp://example.com"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_plain_http_rejected_for_public_host() {
        let result = validate_endpoint("http://hooks.slack.com/services/x");
        assert!(matches!(result, Err(UrlValidationError::Insecure(_))));
    }

    #[test]
    fn test_plain_http_allowed_for_loopback() {
        assert!(validate_endpoint("http://localhost/feed").is_ok());
        assert!(validate_endpoint("http://127.0.0.1:3000/feed").is_ok());
        assert!(validate_endpoint("http://[::1]/feed").is_ok());
    }

    #[test]
    fn test_unparseable_rejected() {
        assert!(matches!(
            validate_endpoint("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }
}
