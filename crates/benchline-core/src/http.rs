//! Blocking HTML page fetches.
//!
//! Uses async reqwest internally but presents a sync interface: the
//! pipeline is strictly sequential (one page fetched and parsed before the
//! next is requested), so callers simply block on each fetch.

use std::sync::LazyLock;

use crate::error::FetchError;

/// Desktop browser User-Agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36";

/// Shared async HTTP client.
///
/// No explicit timeouts: requests rely on the transport defaults.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(1)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime driving [`SHARED_CLIENT`].
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// HTTP GET `url` with query parameters, returning the response body as text.
///
/// Non-2xx statuses are reported as [`FetchError::Status`]. No retry.
pub fn fetch_html(
    url: &str,
    query: &[(&str, &str)],
    user_agent: &str,
) -> Result<String, FetchError> {
    log::trace!("GET {url} {query:?}");
    SHARED_RUNTIME.block_on(async {
        let response = SHARED_CLIENT
            .get(url)
            .query(query)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(&e))?;

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))
    })
}
