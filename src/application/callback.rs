use crate::domain::payment::PaymentStatus;
use crate::domain::ports::{PaymentStoreBox, UserStoreBox};
use crate::error::{PaymentError, Result};
use crate::gateway::types::GatewayBox;
use chrono::Utc;
use tracing::{info, warn};

/// What a callback invocation did to the payment record.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CallbackOutcome {
    /// Payment verified and completed; the user is now active for the
    /// period.
    Completed { provider_transaction_id: String },
    /// The gateway reported a non-success verdict; the record is `failed`.
    Failed { payment_status: String },
    /// The record was already settled (duplicate gateway callback). Benign;
    /// no side effects were re-applied.
    AlreadyFinal(PaymentStatus),
}

/// Handles the gateway's inbound payment callback.
///
/// Order is fixed: verify with the gateway, then update the payment, then
/// the user. The payment update is a compare-and-swap on `pending`, so
/// duplicate callbacks apply the completion side effects at most once. The
/// payment/user dual write runs as a saga: if the user update fails, the
/// payment is reverted to `pending` for a later retry.
pub struct CallbackHandler {
    payments: PaymentStoreBox,
    users: UserStoreBox,
    gateway: GatewayBox,
}

impl CallbackHandler {
    pub fn new(payments: PaymentStoreBox, users: UserStoreBox, gateway: GatewayBox) -> Self {
        Self {
            payments,
            users,
            gateway,
        }
    }

    pub async fn handle(&self, token: &str) -> Result<CallbackOutcome> {
        let record = self
            .payments
            .get_by_token(token)
            .await?
            .ok_or_else(|| {
                PaymentError::NotFoundError(format!("no payment record for token {token}"))
            })?;

        if record.status.is_terminal() {
            warn!(token, status = ?record.status, "duplicate callback for settled payment");
            return Ok(CallbackOutcome::AlreadyFinal(record.status));
        }

        // Resolve the owning user before mutating anything: a missing user
        // must surface as not-found with the payment untouched, never as a
        // completed payment without the user-side update.
        self.users.get(record.user_id).await?.ok_or_else(|| {
            PaymentError::NotFoundError(format!("payment {} references missing user", record.id))
        })?;

        let verification = match self
            .gateway
            .retrieve_checkout(token, &record.conversation_id)
            .await
        {
            Ok(verification) => verification,
            Err(e @ PaymentError::GatewayError { .. }) => {
                // The gateway rejected the lookup outright.
                self.payments.fail_if_pending(token).await?;
                return Err(e);
            }
            Err(e @ (PaymentError::TimeoutError(_) | PaymentError::TransportError(_))) => {
                // No verdict received. The gateway may still have collected
                // the payment, so the record stays pending for
                // reconciliation.
                warn!(token, "verification inconclusive, payment left pending");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if !verification.is_success() {
            self.payments.fail_if_pending(token).await?;
            info!(token, payment_status = %verification.payment_status, "payment failed");
            return Ok(CallbackOutcome::Failed {
                payment_status: verification.payment_status,
            });
        }

        let provider_transaction_id =
            verification
                .payment_id
                .ok_or_else(|| PaymentError::GatewayError {
                    code: None,
                    message: "success verdict carried no paymentId".to_string(),
                })?;

        let applied = self
            .payments
            .complete_if_pending(token, &provider_transaction_id, Utc::now())
            .await?;
        if !applied {
            // A concurrent callback settled the record first; the user
            // update was already applied (or is being applied) by that
            // invocation.
            let status = self
                .payments
                .get_by_token(token)
                .await?
                .map(|r| r.status)
                .unwrap_or(PaymentStatus::Pending);
            warn!(token, "lost callback race, skipping user update");
            return Ok(CallbackOutcome::AlreadyFinal(status));
        }

        if let Err(e) = self
            .users
            .mark_period_paid(record.user_id, &record.period_id)
            .await
        {
            // Compensate so the completion can be retried; leaving the
            // payment completed without the user update would strand the
            // account.
            warn!(token, "user update failed, reverting payment to pending");
            self.payments.revert_to_pending(token).await?;
            return Err(e);
        }

        info!(token, %provider_transaction_id, "payment completed");
        Ok(CallbackOutcome::Completed {
            provider_transaction_id,
        })
    }
}
