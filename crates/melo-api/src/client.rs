// HTTP client for the discovery API.
//
// Two endpoints: `GET /device/list` and `DELETE /device/{serial}`.
// The list endpoint accepts any 2xx; delete succeeds only on exactly 200.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::DeviceResponse;

/// Longest body excerpt carried into error messages.
const BODY_PREVIEW: usize = 200;

/// Async client for the device discovery service.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DeviceClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `base_url` (e.g. `https://api.melo.re`).
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Infallible: base URLs are validated in the constructors.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fetch every device known to the service.
    pub async fn list_devices(&self) -> Result<Vec<DeviceResponse>, Error> {
        let url = self.endpoint(&["device", "list"]);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        handle_response(resp).await
    }

    /// Delete a device by serial. Anything but HTTP 200 is a failure.
    pub async fn delete_device(&self, serial: &str) -> Result<(), Error> {
        let url = self.endpoint(&["device", serial]);
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::OK {
            Ok(())
        } else {
            Err(parse_error(status, resp).await)
        }
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(parse_error(status, resp).await);
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let preview = preview(&body);
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();
    Error::Api {
        status: status.as_u16(),
        message: if raw.is_empty() {
            status.to_string()
        } else {
            preview(&raw).to_owned()
        },
    }
}

/// Truncate to at most `BODY_PREVIEW` bytes on a char boundary.
fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW {
        return body;
    }
    let mut end = BODY_PREVIEW;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
