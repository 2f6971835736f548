use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::domain::ports::{PaymentStore, UserStore};
use crate::domain::user::UserAccount;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store for payment records, keyed by token.
///
/// The conditional transitions run under one write-lock acquisition, so
/// concurrent callbacks for the same token serialize and at most one of
/// them observes `pending`.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    records: Arc<RwLock<HashMap<String, PaymentRecord>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn store(&self, record: PaymentRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.token.clone(), record);
        Ok(())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<PaymentRecord>> {
        let records = self.records.read().await;
        Ok(records.get(token).cloned())
    }

    async fn find_pending(
        &self,
        user_id: Uuid,
        period_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| {
                r.user_id == user_id
                    && r.period_id == period_id
                    && r.status == PaymentStatus::Pending
            })
            .cloned())
    }

    async fn complete_if_pending(
        &self,
        token: &str,
        provider_transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(token)
            .ok_or_else(|| PaymentError::NotFoundError(format!("no payment for token {token}")))?;

        if !record.status.can_transition(PaymentStatus::Completed) {
            return Ok(false);
        }
        record.status = PaymentStatus::Completed;
        record.provider_transaction_id = Some(provider_transaction_id.to_string());
        record.paid_at = Some(paid_at);
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn fail_if_pending(&self, token: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(token)
            .ok_or_else(|| PaymentError::NotFoundError(format!("no payment for token {token}")))?;

        if !record.status.can_transition(PaymentStatus::Failed) {
            return Ok(false);
        }
        record.status = PaymentStatus::Failed;
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn revert_to_pending(&self, token: &str) -> Result<()> {
        // Compensation path: undoing a committed completion sits outside
        // the PaymentStatus::can_transition table on purpose.
        let mut records = self.records.write().await;
        let record = records
            .get_mut(token)
            .ok_or_else(|| PaymentError::NotFoundError(format!("no payment for token {token}")))?;

        record.status = PaymentStatus::Pending;
        record.provider_transaction_id = None;
        record.paid_at = None;
        record.updated_at = Utc::now();
        Ok(())
    }
}

/// A thread-safe in-memory store for user accounts.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, UserAccount>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn store(&self, user: UserAccount) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<UserAccount>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn mark_period_paid(&self, user_id: Uuid, period_id: &str) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| PaymentError::NotFoundError(format!("user {user_id} not found")))?;
        user.activate_for_period(period_id)
    }
}
