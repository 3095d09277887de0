//! Target URL validation and normalization.

use url::Url;

use crate::error_handling::ConfigError;

/// Maximum URL length (2048 characters), matching common browser and server limits.
const MAX_URL_LENGTH: usize = 2048;

/// Validates and normalizes the target URL.
///
/// Adds an `https://` prefix if no scheme is given, then checks that the URL
/// parses, has a host, and uses the http or https scheme.
///
/// # Errors
///
/// Returns `ConfigError::InvalidUrl` when the URL is too long, unparseable, has
/// no host, or uses any other scheme.
pub fn normalize_target_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::InvalidUrl("URL is empty".to_string()));
    }

    let normalized = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    if normalized.len() > MAX_URL_LENGTH {
        return Err(ConfigError::InvalidUrl(format!(
            "URL exceeds maximum length ({} > {})",
            normalized.len(),
            MAX_URL_LENGTH
        )));
    }

    let parsed = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidUrl(format!("{raw}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::InvalidUrl(format!(
                "unsupported scheme {other:?} in {raw}"
            )))
        }
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!("{raw}: missing host")));
    }

    Ok(parsed)
}
