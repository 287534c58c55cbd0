//! Credential injection and redaction for transfer URLs

use url::Url;

use crate::{Error, Result};

/// Username GitLab expects alongside an access token
pub const OAUTH2_USER: &str = "oauth2";

/// Put `token` in the URL's userinfo as the username (`https://{token}@host/...`)
///
/// This is the scheme Gogs accepts for token authentication over HTTP.
pub fn with_token_user(raw: &str, token: &str) -> Result<String> {
    let mut url = parse_http(raw)?;
    url.set_password(None)
        .and_then(|_| url.set_username(token))
        .map_err(|_| Error::Config(format!("Cannot embed credentials in URL: {}", raw)))?;
    Ok(url.into())
}

/// Put `oauth2:{token}` in the URL's userinfo
pub fn with_oauth2_token(raw: &str, token: &str) -> Result<String> {
    let mut url = parse_http(raw)?;
    url.set_username(OAUTH2_USER)
        .and_then(|_| url.set_password(Some(token)))
        .map_err(|_| Error::Config(format!("Cannot embed credentials in URL: {}", raw)))?;
    Ok(url.into())
}

/// Strip userinfo from a URL for display
pub fn strip_credentials(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            let _ = url.set_username("");
            let _ = url.set_password(None);
            url.into()
        }
        Err(_) => raw.to_string(),
    }
}

/// Replace every occurrence of each non-empty secret in `text`
///
/// Both the raw secret and the percent-encoded form it takes inside URL
/// userinfo are replaced.
pub fn redact(text: &str, secrets: &[&str]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(text.to_string(), |acc, secret| {
            let acc = match userinfo_encoded(secret) {
                Some(encoded) if encoded != *secret => acc.replace(&encoded, "***"),
                _ => acc,
            };
            acc.replace(secret, "***")
        })
}

/// `secret` as [`Url`] encodes it in the userinfo component
fn userinfo_encoded(secret: &str) -> Option<String> {
    let mut url = Url::parse("http://redact.invalid").ok()?;
    url.set_username(secret).ok()?;
    Some(url.username().to_string())
}

fn parse_http(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::Config(format!("Invalid repository URL {}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "Unsupported URL scheme '{}' in {}. Only http(s) transfer URLs can carry tokens",
            other, raw
        ))),
    }
}
