//! Blocking HTTP GET shared by the scanner, verifier and delivery
//!
//! Status codes are checked here rather than by the agent so that a
//! non-2xx response carries the URL and code in the error message.

use crate::error::{VsdbgError, VsdbgResult};
use std::io::Read;
use tracing::debug;

/// Build the agent used for every upstream request.
fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}

/// Send a GET to `url` and return the body as a streaming reader.
///
/// Any status outside 200..=299 is a terminal `UpstreamStatus` error.
pub(crate) fn get(url: &str) -> VsdbgResult<impl Read + Send + 'static> {
    debug!("GET {}", url);
    let response = agent()
        .get(url)
        .call()
        .map_err(|e| VsdbgError::transport(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(VsdbgError::UpstreamStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response.into_body().into_reader())
}
