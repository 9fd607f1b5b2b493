//! crates/agro_shop_client/src/http.rs
//!
//! The `OrderGateway` that talks to the storefront API over HTTP.

use agro_shop_core::{OrderGateway, PlaceOrderRequest, PlacedOrder, PortError, PortResult};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

/// Header carrying the per-attempt checkout key.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct HttpOrderGateway {
    client: reqwest::Client,
    orders_url: Url,
    token: String,
}

impl HttpOrderGateway {
    /// `api_base` is the API root, e.g. `http://localhost:5000/api/`.
    pub fn new(api_base: &Url, token: impl Into<String>) -> PortResult<Self> {
        let orders_url = api_base
            .join("orders")
            .map_err(|e| PortError::Unexpected(format!("Invalid API base URL: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            orders_url,
            token: token.into(),
        })
    }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    async fn place_order(
        &self,
        request: &PlaceOrderRequest,
        idempotency_key: &str,
    ) -> PortResult<PlacedOrder> {
        let response = self
            .client
            .post(self.orders_url.clone())
            .bearer_auth(&self.token)
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Order request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            let placed: PlacedOrder = response
                .json()
                .await
                .map_err(|e| PortError::Unexpected(format!("Malformed order response: {e}")))?;
            debug!(order_id = %placed.order.id, "Order accepted by API");
            return Ok(placed);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());
        error!(status = %status, message = %message, "Order rejected by API");
        Err(match status {
            StatusCode::BAD_REQUEST => PortError::Validation(message),
            StatusCode::UNAUTHORIZED => PortError::Unauthorized,
            StatusCode::FORBIDDEN => PortError::Forbidden(message),
            StatusCode::NOT_FOUND => PortError::NotFound(message),
            StatusCode::CONFLICT => PortError::Conflict(message),
            _ => PortError::Unexpected(message),
        })
    }
}
