use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Progression gate for a platform account.
///
/// Replaces the implicit array-index ordering of the original status values
/// with an explicit transition table; assignments that skip the table are
/// rejected instead of silently permitted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Registered,
    Verified,
    Active,
    Expired,
    Suspended,
}

impl AccountStatus {
    pub fn can_transition(self, to: AccountStatus) -> bool {
        use AccountStatus::*;
        match (self, to) {
            (Registered, Verified) => true,
            (Verified, Active) => true,
            // Re-activation: a second callback in the same period, or paying
            // for a new period after the previous one lapsed.
            (Active, Active) | (Expired, Active) => true,
            (Active, Expired) => true,
            (Suspended, _) => false,
            (_, Suspended) => true,
            _ => false,
        }
    }
}

/// A platform user, reduced to what the payment core needs: identity,
/// account gate, and the set of exam periods already paid for.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub status: AccountStatus,
    pub paid_periods: BTreeSet<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(id: Uuid, email: impl Into<String>, status: AccountStatus) -> Self {
        Self {
            id,
            email: email.into(),
            status,
            paid_periods: BTreeSet::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn has_paid(&self, period_id: &str) -> bool {
        self.paid_periods.contains(period_id)
    }

    /// Marks `period_id` as paid and moves the account to `Active`.
    ///
    /// Rejects accounts that cannot become active: `Registered` (exam result
    /// not yet verified) and `Suspended`.
    pub fn activate_for_period(&mut self, period_id: &str) -> Result<()> {
        if !self.status.can_transition(AccountStatus::Active) {
            return Err(PaymentError::StateConflictError(format!(
                "account {} cannot become active from status {:?}",
                self.id, self.status
            )));
        }
        self.status = AccountStatus::Active;
        self.paid_periods.insert(period_id.to_string());
        self.updated_at = Utc::now();
        Ok(())
    }
}
