//! Shared request plumbing for the forge clients

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::{Error, Result};

/// Build the reqwest client both forges use
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("ferry/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Normalize an instance URL and return `(instance_root, api_root)`
///
/// Accepts the instance root with or without a trailing `api_suffix`.
pub(crate) fn api_roots(base_url: &str, api_suffix: &str) -> Result<(Url, Url)> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let root = trimmed.strip_suffix(api_suffix).unwrap_or(trimmed);
    let root = root.trim_end_matches('/');

    let instance = Url::parse(&format!("{}/", root))
        .map_err(|e| Error::Url(format!("{}: {}", base_url, e)))?;
    if instance.cannot_be_a_base() {
        return Err(Error::Url(format!("{} cannot be used as a base URL", base_url)));
    }
    let api = instance
        .join(&format!("{}/", api_suffix.trim_start_matches('/')))
        .map_err(|e| Error::Url(format!("{}: {}", base_url, e)))?;

    Ok((instance, api))
}

/// Append percent-encoded path segments to `base`
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Url(format!("{} cannot be used as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Send a request and decode a JSON success body
pub(crate) async fn send_json<T: DeserializeOwned>(
    forge: &'static str,
    request: RequestBuilder,
) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    debug!(forge, status = status.as_u16(), url = %response.url(), "API response");

    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(Error::Api {
            forge,
            status: status.as_u16(),
            message: String::from_utf8_lossy(&body).trim().to_string(),
        });
    }

    Ok(serde_json::from_slice(&body)?)
}
