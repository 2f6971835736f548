use crate::domain::payment::{ClientMeta, PaymentRecord};
use crate::domain::ports::{PaymentStoreBox, UserStoreBox};
use crate::domain::user::AccountStatus;
use crate::error::{PaymentError, Result};
use crate::gateway::types::{Buyer, CheckoutRequest, CheckoutSession, GatewayBox};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

/// Starts a checkout session with the gateway and records the `pending`
/// payment attempt.
///
/// Enforces at most one non-terminal record per (user, period): a second
/// initialize while one is pending, or after the period is already paid,
/// is rejected.
pub struct CheckoutService {
    payments: PaymentStoreBox,
    users: UserStoreBox,
    gateway: GatewayBox,
    callback_url: String,
}

impl CheckoutService {
    pub fn new(
        payments: PaymentStoreBox,
        users: UserStoreBox,
        gateway: GatewayBox,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            payments,
            users,
            gateway,
            callback_url: callback_url.into(),
        }
    }

    pub async fn initialize(
        &self,
        user_id: Uuid,
        period_id: &str,
        amount: Decimal,
        client: ClientMeta,
    ) -> Result<CheckoutSession> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| PaymentError::NotFoundError(format!("user {user_id} not found")))?;

        if user.status == AccountStatus::Suspended {
            return Err(PaymentError::StateConflictError(format!(
                "account {user_id} is suspended"
            )));
        }
        if user.has_paid(period_id) {
            return Err(PaymentError::StateConflictError(format!(
                "period {period_id} is already paid"
            )));
        }
        if let Some(existing) = self.payments.find_pending(user_id, period_id).await? {
            return Err(PaymentError::StateConflictError(format!(
                "checkout {} already in progress for period {period_id}",
                existing.id
            )));
        }

        let conversation_id = Uuid::new_v4().to_string();
        let request = CheckoutRequest {
            locale: "tr".to_string(),
            conversation_id: conversation_id.clone(),
            price: amount,
            paid_price: amount,
            currency: "TRY".to_string(),
            basket_id: period_id.to_string(),
            callback_url: self.callback_url.clone(),
            buyer: Buyer {
                id: user_id.to_string(),
                email: user.email.clone(),
                ip: client.ip.clone(),
            },
        };

        let session = self.gateway.initialize_checkout(&request).await?;

        let record = PaymentRecord::new(
            user_id,
            period_id,
            amount,
            &session.token,
            &conversation_id,
            client,
        )?;
        self.payments.store(record).await?;

        info!(%user_id, period_id, token = %session.token, "checkout initialized");
        Ok(session)
    }
}
