//! Shared HTTP plumbing for the upstream provider clients.

use crate::domain::QuoteError;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Connection establishment timeout
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default user agent sent to upstream providers
pub const DEFAULT_USER_AGENT: &str = "metals-quote-gateway/0.1";

/// Build the client shared by every upstream provider.
///
/// No overall request timeout is set here: each attempt is bounded by the
/// `RetryPolicy` instead.
pub fn build_http_client(user_agent: &str) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent(user_agent)
        .build()
}

/// GET `url` and return the body text, treating non-2xx as a failure.
pub(crate) async fn get_text(
    client: &Client,
    provider: &'static str,
    url: &str,
    query: &[(&str, &str)],
) -> Result<String, QuoteError> {
    debug!("Fetching from {}: {}", provider, url);

    let response = match client.get(url).query(query).send().await {
        Ok(response) => response,
        Err(e) => {
            metrics::counter!("upstream_requests_total", "provider" => provider, "outcome" => "error")
                .increment(1);
            return Err(e.into());
        }
    };

    let status = response.status();
    if !status.is_success() {
        metrics::counter!("upstream_requests_total", "provider" => provider, "outcome" => "status")
            .increment(1);
        return Err(QuoteError::Network(format!(
            "{} responded with status {}",
            provider, status
        )));
    }

    let body = response.text().await?;
    metrics::counter!("upstream_requests_total", "provider" => provider, "outcome" => "ok")
        .increment(1);
    Ok(body)
}
