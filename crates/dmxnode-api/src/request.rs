//! One-shot device requests.
//!
//! Form submissions and system commands travel outside the live channel as
//! single `POST` exchanges. A 2xx answer is success; everything else is an
//! [`Error`]. No retries, no timeout beyond the transport's own.

use std::future::Future;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Endpoint ─────────────────────────────────────────────────────────

/// Every one-shot endpoint the firmware exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Network,
    Artnet,
    Pixel,
    Ap,
    Reboot,
    FactoryReset,
}

impl Endpoint {
    /// Absolute path on the device origin.
    pub fn path(self) -> &'static str {
        match self {
            Self::Network => "/api/network",
            Self::Artnet => "/api/artnet",
            Self::Pixel => "/api/pixel",
            Self::Ap => "/api/ap",
            Self::Reboot => "/api/reboot",
            Self::FactoryReset => "/api/factory-reset",
        }
    }
}

// ── DeviceRequests ───────────────────────────────────────────────────

/// The request collaborator: perform one `POST` and report success or
/// failure. Implemented by [`RequestClient`]; tests substitute fakes.
pub trait DeviceRequests: Send + Sync {
    fn post(
        &self,
        endpoint: Endpoint,
        body: Option<&Value>,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

// ── RequestClient ────────────────────────────────────────────────────

/// HTTP implementation of [`DeviceRequests`] against the device origin.
#[derive(Debug, Clone)]
pub struct RequestClient {
    http: reqwest::Client,
    origin: Url,
}

impl RequestClient {
    /// Build a client for `origin` using the shared transport settings.
    pub fn new(origin: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            origin,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(origin: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            origin: Url::parse(origin)?,
        })
    }

    /// Resolve an endpoint against the device origin.
    pub fn url_for(&self, endpoint: Endpoint) -> Result<Url, Error> {
        Ok(self.origin.join(endpoint.path())?)
    }
}

impl DeviceRequests for RequestClient {
    async fn post(&self, endpoint: Endpoint, body: Option<&Value>) -> Result<(), Error> {
        let url = self.url_for(endpoint)?;
        debug!(%url, has_body = body.is_some(), "POST");

        let mut request = self.http.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "request accepted");
            Ok(())
        } else {
            Err(Error::Status {
                endpoint: endpoint.path().into(),
                status: status.as_u16(),
            })
        }
    }
}
