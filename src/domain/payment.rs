use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a payment attempt.
///
/// `Pending` is the only non-terminal state. `Refunded` is modeled for
/// completeness; no handler in this crate transitions into it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        self != PaymentStatus::Pending
    }

    /// Transition table for payment records. Everything not listed here is
    /// rejected, including re-entering a terminal state.
    pub fn can_transition(self, to: PaymentStatus) -> bool {
        matches!(
            (self, to),
            (PaymentStatus::Pending, PaymentStatus::Completed)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Completed, PaymentStatus::Refunded)
        )
    }
}

/// The platform charges in a single currency.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum Currency {
    #[default]
    #[serde(rename = "TRY")]
    Try,
}

/// Origin metadata captured from the client that started the checkout.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct ClientMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// One attempt to pay the platform access fee.
///
/// Records are never deleted; terminal records remain as an audit trail.
/// Mutation after creation happens only through the callback handler, via
/// the store's conditional-update methods.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// The exam period this payment unlocks, e.g. `"2026-dus-1"`.
    pub period_id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: PaymentStatus,
    /// Provider-side payment id, set when the payment completes.
    pub provider_transaction_id: Option<String>,
    /// Opaque token correlating the gateway checkout session to this record.
    pub token: String,
    pub conversation_id: String,
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub client: ClientMeta,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new(
        user_id: Uuid,
        period_id: impl Into<String>,
        amount: Decimal,
        token: impl Into<String>,
        conversation_id: impl Into<String>,
        client: ClientMeta,
    ) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::ValidationError(
                "payment amount must be positive".to_string(),
            ));
        }
        let token = token.into();
        if token.is_empty() {
            return Err(PaymentError::ValidationError(
                "payment token must not be empty".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            period_id: period_id.into(),
            amount,
            currency: Currency::Try,
            status: PaymentStatus::Pending,
            provider_transaction_id: None,
            token,
            conversation_id: conversation_id.into(),
            paid_at: None,
            client,
            created_at: now,
            updated_at: now,
        })
    }
}
