use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, trace};

use crate::client::retry::{parse_retry_after, with_retry, RetryConfig};
use crate::client::transport::{Request, Transport};
use crate::error::{TraderError, TransportError};
use crate::shutdown::Shutdown;

/// REST backend for the v1 game API. The token travels as a query parameter.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    ship_id: String,
    token: String,
    retry: RetryConfig,
    shutdown: Shutdown,
}

impl HttpTransport {
    pub fn new(
        base_url: &str,
        ship_id: &str,
        token: &str,
        request_timeout: Duration,
        retry: RetryConfig,
        shutdown: Shutdown,
    ) -> Result<Self, TraderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(|e| TraderError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            ship_id: ship_id.to_string(),
            token: token.to_string(),
            retry,
            shutdown,
        })
    }

    fn build(&self, request: &Request) -> reqwest::RequestBuilder {
        let auth = [("token", self.token.as_str())];
        match request {
            Request::ShipDetails => self
                .client
                .get(format!("{}/my/ships/{}", self.base_url, self.ship_id))
                .query(&auth),
            Request::Marketplace { location } => self
                .client
                .get(format!("{}/locations/{}/marketplace", self.base_url, location))
                .query(&auth),
            Request::NewFlightPlan { destination } => self
                .client
                .post(format!("{}/my/flight-plans", self.base_url))
                .query(&auth)
                .json(&json!({ "shipId": self.ship_id, "destination": destination })),
            Request::FlightPlan { plan_id } => self
                .client
                .get(format!("{}/my/flight-plans/{}", self.base_url, plan_id))
                .query(&auth),
            Request::Buy { good, quantity } => self
                .client
                .post(format!("{}/my/purchase-orders", self.base_url))
                .query(&auth)
                .json(&json!({ "shipId": self.ship_id, "good": good, "quantity": quantity })),
            Request::Sell { good, quantity } => self
                .client
                .post(format!("{}/my/sell-orders", self.base_url))
                .query(&auth)
                .json(&json!({ "shipId": self.ship_id, "good": good, "quantity": quantity })),
        }
    }

    async fn send_once(&self, request: &Request) -> Result<String, TransportError> {
        let response = self.build(request).send().await?;
        let status = response.status();
        let retry_hint = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        trace!(request = %request, status = status.as_u16(), body = %body, "HTTP response");
        triage(status, retry_hint.as_deref(), body)
    }
}

/// Maps an HTTP status to either a usable payload or a retry classification.
pub fn triage(
    status: StatusCode,
    retry_hint: Option<&str>,
    body: String,
) -> Result<String, TransportError> {
    match status {
        StatusCode::OK | StatusCode::CREATED => Ok(body),
        StatusCode::TOO_MANY_REQUESTS => Err(TransportError::RateLimited {
            retry_after: parse_retry_after(retry_hint),
        }),
        other if other.is_client_error() && carries_error_envelope(&body) => Ok(body),
        StatusCode::BAD_REQUEST => Err(TransportError::RateLimited {
            retry_after: parse_retry_after(retry_hint),
        }),
        other => Err(TransportError::Status {
            status: other.as_u16(),
            body,
        }),
    }
}

fn carries_error_envelope(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .map(|v| v.get("error").is_some_and(|e| e.is_object()))
        .unwrap_or(false)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(&self, request: Request) -> Result<String, TransportError> {
        debug!(ship = %self.ship_id, request = %request, "HTTP exchange");
        let label = request.to_string();
        with_retry(&self.retry, &self.shutdown, &label, || self.send_once(&request)).await
    }
}
