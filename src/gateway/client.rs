use super::signer::{NONCE_HEADER, RequestSigner, random_nonce};
use super::types::{
    CheckoutRequest, CheckoutSession, CheckoutVerification, DetailRequest, PaymentGateway,
};
use crate::config::GatewayConfig;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::header;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

pub const CHECKOUT_INITIALIZE_PATH: &str = "/payment/iyzipos/checkoutform/initialize/auth/ecom";
pub const CHECKOUT_DETAIL_PATH: &str = "/payment/iyzipos/checkoutform/auth/ecom/detail";

const ENVELOPE_SUCCESS: &str = "success";
/// Connect failures are retried once. Timeouts are never retried: the
/// gateway may have processed the request, so those payments go to the
/// reconciliation path instead.
const MAX_ATTEMPTS: u32 = 2;

/// HTTP dispatcher for the payment gateway.
///
/// The request body is serialized exactly once; the signature covers those
/// bytes and the same bytes are transmitted. Re-serializing after signing
/// would risk a signature mismatch from key ordering or whitespace.
pub struct IyzicoClient {
    http: reqwest::Client,
    base_url: String,
    signer: RequestSigner,
}

impl IyzicoClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let signer = RequestSigner::new(&config.api_key, &config.secret_key)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    async fn dispatch<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T> {
        let body_bytes = serde_json::to_vec(body)?;

        let mut attempt = 1;
        let envelope = loop {
            match self.send(path, body_bytes.clone()).await {
                Ok(envelope) => break envelope,
                Err(PaymentError::TransportError(message)) if attempt < MAX_ATTEMPTS => {
                    warn!(path, attempt, %message, "gateway transport failure, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        interpret_envelope(envelope)
    }

    async fn send(&self, path: &str, body_bytes: Vec<u8>) -> Result<Value> {
        // Fresh nonce per attempt; the gateway requires nonce uniqueness.
        let nonce = random_nonce();
        let signed = self.signer.sign(&nonce, path, &body_bytes);

        debug!(path, "dispatching gateway request");
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header(header::AUTHORIZATION, signed.authorization)
            .header(NONCE_HEADER, signed.random_key)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body_bytes)
            .send()
            .await?;

        Ok(response.json().await?)
    }
}

/// Interprets the gateway's response envelope: a flat JSON object whose
/// `status` field decides between payload and error.
fn interpret_envelope<T: DeserializeOwned>(envelope: Value) -> Result<T> {
    let status = envelope
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if status != ENVELOPE_SUCCESS {
        let code = envelope
            .get("errorCode")
            .and_then(Value::as_str)
            .map(str::to_string);
        let message = envelope
            .get("errorMessage")
            .and_then(Value::as_str)
            .unwrap_or("gateway returned a non-success envelope")
            .to_string();
        return Err(PaymentError::GatewayError { code, message });
    }

    Ok(serde_json::from_value(envelope)?)
}

#[async_trait]
impl PaymentGateway for IyzicoClient {
    async fn initialize_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        self.dispatch(CHECKOUT_INITIALIZE_PATH, request).await
    }

    async fn retrieve_checkout(
        &self,
        token: &str,
        conversation_id: &str,
    ) -> Result<CheckoutVerification> {
        let request = DetailRequest {
            locale: "tr".to_string(),
            conversation_id: conversation_id.to_string(),
            token: token.to_string(),
        };
        self.dispatch(CHECKOUT_DETAIL_PATH, &request).await
    }
}
