use async_trait::async_trait;
use duspay::application::callback::{CallbackHandler, CallbackOutcome};
use duspay::domain::payment::{ClientMeta, PaymentRecord, PaymentStatus};
use duspay::domain::ports::{PaymentStore, UserStore};
use duspay::domain::user::{AccountStatus, UserAccount};
use duspay::error::{PaymentError, Result};
use duspay::gateway::types::{
    CheckoutRequest, CheckoutSession, CheckoutVerification, PaymentGateway,
};
use duspay::infrastructure::in_memory::{InMemoryPaymentStore, InMemoryUserStore};
use rust_decimal_macros::dec;
use uuid::Uuid;

struct SuccessGateway {
    payment_id: String,
}

#[async_trait]
impl PaymentGateway for SuccessGateway {
    async fn initialize_checkout(&self, _: &CheckoutRequest) -> Result<CheckoutSession> {
        unimplemented!()
    }

    async fn retrieve_checkout(&self, token: &str, _: &str) -> Result<CheckoutVerification> {
        Ok(CheckoutVerification {
            token: token.to_string(),
            payment_status: "SUCCESS".to_string(),
            payment_id: Some(self.payment_id.clone()),
            conversation_id: None,
        })
    }
}

/// User store whose activation write always fails, simulating a persistence
/// failure between the two halves of the dual write.
#[derive(Clone)]
struct BrokenUserStore {
    inner: InMemoryUserStore,
}

#[async_trait]
impl UserStore for BrokenUserStore {
    async fn store(&self, user: UserAccount) -> Result<()> {
        self.inner.store(user).await
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<UserAccount>> {
        self.inner.get(user_id).await
    }

    async fn mark_period_paid(&self, _: Uuid, _: &str) -> Result<()> {
        Err(PaymentError::StorageError(Box::new(std::io::Error::other(
            "write failed",
        ))))
    }
}

async fn seed(payments: &InMemoryPaymentStore, users: &impl UserStore) -> (Uuid, String) {
    let user = UserAccount::new(Uuid::new_v4(), "student@example.com", AccountStatus::Verified);
    let user_id = user.id;
    users.store(user).await.unwrap();

    let record = PaymentRecord::new(
        user_id,
        "2026-dus-1",
        dec!(499.90),
        "iyz-1700000000000",
        "conv-1",
        ClientMeta {
            ip: Some("10.0.0.7".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        },
    )
    .unwrap();
    let token = record.token.clone();
    payments.store(record).await.unwrap();
    (user_id, token)
}

#[tokio::test]
async fn test_worked_example_from_gateway_docs() {
    // token iyz-1700000000000, verification success with paymentId
    // iyz-abc123: record completes, user activates with the period paid.
    let payments = InMemoryPaymentStore::new();
    let users = InMemoryUserStore::new();
    let (user_id, token) = seed(&payments, &users).await;

    let handler = CallbackHandler::new(
        Box::new(payments.clone()),
        Box::new(users.clone()),
        Box::new(SuccessGateway {
            payment_id: "iyz-abc123".to_string(),
        }),
    );

    let outcome = handler.handle(&token).await.unwrap();
    assert_eq!(
        outcome,
        CallbackOutcome::Completed {
            provider_transaction_id: "iyz-abc123".to_string()
        }
    );

    let record = payments.get_by_token(&token).await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Completed);
    assert_eq!(record.provider_transaction_id.as_deref(), Some("iyz-abc123"));
    assert!(record.paid_at.is_some());

    let user = users.get(user_id).await.unwrap().unwrap();
    assert_eq!(user.status, AccountStatus::Active);
    assert!(user.paid_periods.contains("2026-dus-1"));
}

#[tokio::test]
async fn test_user_write_failure_reverts_payment() {
    // If the user-side update fails after the payment was completed, the
    // compensation puts the record back to pending: no partial state.
    let payments = InMemoryPaymentStore::new();
    let users = BrokenUserStore {
        inner: InMemoryUserStore::new(),
    };
    let (user_id, token) = seed(&payments, &users).await;

    let handler = CallbackHandler::new(
        Box::new(payments.clone()),
        Box::new(users.clone()),
        Box::new(SuccessGateway {
            payment_id: "iyz-abc123".to_string(),
        }),
    );

    let result = handler.handle(&token).await;
    assert!(matches!(result, Err(PaymentError::StorageError(_))));

    let record = payments.get_by_token(&token).await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Pending);
    assert!(record.provider_transaction_id.is_none());
    assert!(record.paid_at.is_none());

    let user = users.get(user_id).await.unwrap().unwrap();
    assert_eq!(user.status, AccountStatus::Verified);
    assert!(user.paid_periods.is_empty());
}

#[tokio::test]
async fn test_retry_after_compensation_succeeds() {
    // A reverted payment stays retryable: once the user store recovers, a
    // later callback completes the same record.
    let payments = InMemoryPaymentStore::new();
    let broken = BrokenUserStore {
        inner: InMemoryUserStore::new(),
    };
    let (user_id, token) = seed(&payments, &broken).await;

    let gateway = || {
        Box::new(SuccessGateway {
            payment_id: "iyz-abc123".to_string(),
        })
    };

    let failing = CallbackHandler::new(
        Box::new(payments.clone()),
        Box::new(broken.clone()),
        gateway(),
    );
    assert!(failing.handle(&token).await.is_err());

    let recovered = CallbackHandler::new(
        Box::new(payments.clone()),
        Box::new(broken.inner.clone()),
        gateway(),
    );
    let outcome = recovered.handle(&token).await.unwrap();
    assert!(matches!(outcome, CallbackOutcome::Completed { .. }));

    let record = payments.get_by_token(&token).await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Completed);
    let user = broken.inner.get(user_id).await.unwrap().unwrap();
    assert_eq!(user.status, AccountStatus::Active);
}

#[tokio::test]
async fn test_concurrent_callbacks_apply_once() {
    // Two handlers over the same stores, racing on one token: exactly one
    // completes, the other observes the settled record.
    let payments = InMemoryPaymentStore::new();
    let users = InMemoryUserStore::new();
    let (_, token) = seed(&payments, &users).await;

    let make_handler = || {
        CallbackHandler::new(
            Box::new(payments.clone()),
            Box::new(users.clone()),
            Box::new(SuccessGateway {
                payment_id: "iyz-abc123".to_string(),
            }),
        )
    };

    let (a, b) = tokio::join!(
        async { make_handler().handle(&token).await.unwrap() },
        async { make_handler().handle(&token).await.unwrap() },
    );

    let completed = [&a, &b]
        .iter()
        .filter(|o| matches!(o, CallbackOutcome::Completed { .. }))
        .count();
    let settled = [&a, &b]
        .iter()
        .filter(|o| matches!(o, CallbackOutcome::AlreadyFinal(_)))
        .count();
    assert_eq!(completed, 1);
    assert_eq!(settled, 1);
}
