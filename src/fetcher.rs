use std::time::Duration;

use tracing::{info, warn};

use crate::config::{OddsEndpoints, HTTP_TIMEOUT_SECS};
use crate::error::Result;
use crate::odds::feed::{has_events, parse_body, FeedGroup};

pub fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

/// Fetch the odds feed, falling back to the playoff endpoint when the
/// primary has no events.
///
/// Returns `Ok(None)` when neither endpoint produced events. Transport
/// failures only make an endpoint count as empty; a body that is not feed
/// JSON is an error.
pub async fn fetch_odds_feed(
    client: &reqwest::Client,
    endpoints: &OddsEndpoints,
) -> Result<Option<Vec<FeedGroup>>> {
    for url in [&endpoints.primary, &endpoints.fallback] {
        let Some(body) = fetch_body(client, url).await else {
            continue;
        };
        let groups = parse_body(&body)?;
        if has_events(&groups) {
            info!(url = %url, events = groups[0].events.len(), "Odds feed fetched");
            return Ok(Some(groups));
        }
        info!(url = %url, "Odds feed returned no events");
    }
    Ok(None)
}

async fn fetch_body(client: &reqwest::Client, url: &str) -> Option<String> {
    let resp = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(url, "Odds feed request failed: {e}");
            return None;
        }
    };
    let status = resp.status();
    if !status.is_success() {
        warn!(url, %status, "Odds feed returned non-success status");
        return None;
    }
    match resp.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            warn!(url, "Odds feed body read failed: {e}");
            None
        }
    }
}
