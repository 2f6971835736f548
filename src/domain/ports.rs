use super::payment::PaymentRecord;
use super::user::UserAccount;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Store for payment records.
///
/// Status changes go through the conditional methods, which must apply
/// atomically with respect to concurrent calls for the same token: a record
/// transitions out of `pending` at most once, no matter how many duplicate
/// callbacks race.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn store(&self, record: PaymentRecord) -> Result<()>;

    async fn get_by_token(&self, token: &str) -> Result<Option<PaymentRecord>>;

    /// The non-terminal record for (user, period), if one exists.
    async fn find_pending(&self, user_id: Uuid, period_id: &str)
    -> Result<Option<PaymentRecord>>;

    /// `pending -> completed`, recording the provider payment id and paid-at
    /// timestamp. Returns `false` without mutating if the record is no
    /// longer `pending`.
    async fn complete_if_pending(
        &self,
        token: &str,
        provider_transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// `pending -> failed`. Returns `false` without mutating if the record
    /// is no longer `pending`.
    async fn fail_if_pending(&self, token: &str) -> Result<bool>;

    /// Compensation for a failed dual-write: puts a `completed` record back
    /// to `pending` and clears the completion fields so a later callback or
    /// reconciliation pass can retry. This is the one payment transition
    /// intentionally outside `PaymentStatus::can_transition`; the
    /// conditional methods above go through the table.
    async fn revert_to_pending(&self, token: &str) -> Result<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn store(&self, user: UserAccount) -> Result<()>;

    async fn get(&self, user_id: Uuid) -> Result<Option<UserAccount>>;

    /// Adds `period_id` to the user's paid periods and activates the
    /// account. Fails with `NotFoundError` if the user is missing and
    /// `StateConflictError` if the account cannot become active.
    async fn mark_period_paid(&self, user_id: Uuid, period_id: &str) -> Result<()>;
}

pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type UserStoreBox = Box<dyn UserStore>;
