use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sentinel the gateway uses for a successfully collected payment.
pub const PAYMENT_STATUS_SUCCESS: &str = "SUCCESS";

/// Request body for the checkout-form initialize endpoint.
///
/// Narrowed to the fields the platform sends; the gateway schema is treated
/// as opaque beyond these.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub locale: String,
    pub conversation_id: String,
    pub price: Decimal,
    pub paid_price: Decimal,
    pub currency: String,
    /// The exam period being purchased.
    pub basket_id: String,
    pub callback_url: String,
    pub buyer: Buyer,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// Payload of a successful initialize response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub token: String,
    pub checkout_form_content: String,
    #[serde(default)]
    pub token_expire_time: Option<i64>,
}

/// Request body for the checkout-form detail (verification) endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetailRequest {
    pub locale: String,
    pub conversation_id: String,
    pub token: String,
}

/// Payload of a detail response: the gateway's verdict on a checkout
/// session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutVerification {
    pub token: String,
    /// `"SUCCESS"` when the payment was collected; anything else is a
    /// non-success verdict.
    pub payment_status: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl CheckoutVerification {
    pub fn is_success(&self) -> bool {
        self.payment_status == PAYMENT_STATUS_SUCCESS
    }
}

/// Outbound boundary to the payment provider.
///
/// Injected into the application services so callback and checkout logic
/// are testable without a live gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;

    async fn retrieve_checkout(
        &self,
        token: &str,
        conversation_id: &str,
    ) -> Result<CheckoutVerification>;
}

pub type GatewayBox = Box<dyn PaymentGateway>;
