use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("JavaGuard/", env!("CARGO_PKG_VERSION"));

/// Client used for distribution lookups. Every request is bounded by
/// `timeout`, so a stalled service surfaces as an error instead of a hang.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
}
