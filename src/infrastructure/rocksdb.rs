use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::domain::ports::{PaymentStore, UserStore};
use crate::domain::user::UserAccount;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Column Family for payment records, keyed by token.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for user accounts, keyed by uuid bytes.
pub const CF_USERS: &str = "users";

/// A persistent store implementation using RocksDB.
///
/// Values are JSON. The conditional status transitions are read-modify-write
/// sequences guarded by a store-wide mutex, which gives the same at-most-once
/// guarantee as the in-memory store's write lock.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_guard: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_users = ColumnFamilyDescriptor::new(CF_USERS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_users])?;

        Ok(Self {
            db: Arc::new(db),
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaymentError::StorageError(Box::new(std::io::Error::other(format!(
                "column family {name} not found"
            ))))
        })
    }

    fn get_payment(&self, token: &str) -> Result<Option<PaymentRecord>> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self.db.get_cf(cf, token.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_payment(&self, record: &PaymentRecord) -> Result<()> {
        let cf = self.cf(CF_PAYMENTS)?;
        let value = serde_json::to_vec(record)?;
        self.db.put_cf(cf, record.token.as_bytes(), value)?;
        Ok(())
    }

    /// Moves the record to `to` if the transition table permits it from the
    /// current status; reports whether the transition was written.
    fn transition_payment<F>(&self, token: &str, to: PaymentStatus, mutate: F) -> Result<bool>
    where
        F: FnOnce(&mut PaymentRecord),
    {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| PaymentError::StorageError(Box::new(std::io::Error::other(
                "payment store lock poisoned",
            ))))?;

        let mut record = self
            .get_payment(token)?
            .ok_or_else(|| PaymentError::NotFoundError(format!("no payment for token {token}")))?;

        if !record.status.can_transition(to) {
            return Ok(false);
        }
        record.status = to;
        mutate(&mut record);
        record.updated_at = Utc::now();
        self.put_payment(&record)?;
        Ok(true)
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn store(&self, record: PaymentRecord) -> Result<()> {
        self.put_payment(&record)
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<PaymentRecord>> {
        self.get_payment(token)
    }

    async fn find_pending(
        &self,
        user_id: Uuid,
        period_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        let cf = self.cf(CF_PAYMENTS)?;
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let record: PaymentRecord = serde_json::from_slice(&value)?;
            if record.user_id == user_id
                && record.period_id == period_id
                && record.status == PaymentStatus::Pending
            {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    async fn complete_if_pending(
        &self,
        token: &str,
        provider_transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.transition_payment(token, PaymentStatus::Completed, |record| {
            record.provider_transaction_id = Some(provider_transaction_id.to_string());
            record.paid_at = Some(paid_at);
        })
    }

    async fn fail_if_pending(&self, token: &str) -> Result<bool> {
        self.transition_payment(token, PaymentStatus::Failed, |_| {})
    }

    async fn revert_to_pending(&self, token: &str) -> Result<()> {
        // Compensation path: undoing a committed completion sits outside
        // the PaymentStatus::can_transition table on purpose.
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| PaymentError::StorageError(Box::new(std::io::Error::other(
                "payment store lock poisoned",
            ))))?;

        let mut record = self
            .get_payment(token)?
            .ok_or_else(|| PaymentError::NotFoundError(format!("no payment for token {token}")))?;
        record.status = PaymentStatus::Pending;
        record.provider_transaction_id = None;
        record.paid_at = None;
        record.updated_at = Utc::now();
        self.put_payment(&record)
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn store(&self, user: UserAccount) -> Result<()> {
        let cf = self.cf(CF_USERS)?;
        let value = serde_json::to_vec(&user)?;
        self.db.put_cf(cf, user.id.as_bytes(), value)?;
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<UserAccount>> {
        let cf = self.cf(CF_USERS)?;
        match self.db.get_cf(cf, user_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn mark_period_paid(&self, user_id: Uuid, period_id: &str) -> Result<()> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| PaymentError::StorageError(Box::new(std::io::Error::other(
                "user store lock poisoned",
            ))))?;

        let cf = self.cf(CF_USERS)?;
        let bytes = self
            .db
            .get_cf(cf, user_id.as_bytes())?
            .ok_or_else(|| PaymentError::NotFoundError(format!("user {user_id} not found")))?;
        let mut user: UserAccount = serde_json::from_slice(&bytes)?;
        user.activate_for_period(period_id)?;
        self.db
            .put_cf(cf, user_id.as_bytes(), serde_json::to_vec(&user)?)?;
        Ok(())
    }
}
