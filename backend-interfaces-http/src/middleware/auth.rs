use axum::http::{header, HeaderMap};

use backend_domain::RuntimeConfig;

use crate::error::HttpError;

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// [`authorize`] as a `?`-friendly guard for handlers.
pub fn require_auth(config: &RuntimeConfig, headers: &HeaderMap) -> Result<(), HttpError> {
    if authorize(config, headers) {
        Ok(())
    } else {
        Err(HttpError::Unauthorized)
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config_with_token(token: Option<&str>) -> RuntimeConfig {
        RuntimeConfig {
            api_token: token.map(str::to_string),
            ..RuntimeConfig::default()
        }
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("header value"),
        );
        headers
    }

    #[test]
    fn open_when_no_token_configured() {
        assert!(authorize(&config_with_token(None), &HeaderMap::new()));
    }

    #[test]
    fn token_must_match() {
        let config = config_with_token(Some("s3cret"));
        assert!(authorize(&config, &bearer("Bearer s3cret")));
        assert!(!authorize(&config, &bearer("Bearer wrong")));
        assert!(!authorize(&config, &bearer("Basic s3cret")));
        assert!(!authorize(&config, &bearer("Bearer ")));
        assert!(!authorize(&config, &HeaderMap::new()));
    }
}
