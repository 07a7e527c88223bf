//! HTTP client construction and request helpers.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use tracing::warn;

use crate::client::ClientError;
use crate::options::TransportOptions;

const USER_AGENT: &str = concat!("studykit/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client from transport options.
///
/// Applies the timeout and proxy. A proxy URL that does not parse is a
/// configuration error rather than being ignored.
pub fn build_http_client(options: &TransportOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder().user_agent(USER_AGENT);

    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("invalid proxy {proxy_url}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Attach the configured extra headers to a request.
///
/// Headers whose name or value is not valid HTTP are skipped with a warning.
pub fn add_extra_headers(request: RequestBuilder, options: &TransportOptions) -> RequestBuilder {
    match &options.extra_headers {
        Some(headers) => request.headers(header_map(headers.iter())),
        None => request,
    }
}

fn header_map<'a>(headers: impl Iterator<Item = (&'a String, &'a String)>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!("Skipping invalid header {:?}", key),
        }
    }
    map
}
