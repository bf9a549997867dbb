//! Amount matches but no candidate's phone contains the suffix key: the
//! conservative outcome leaves every candidate pending.

use pesa_reconcile::{normalize, reconcile, EngineConfig, ReconcileOutcome};
use pesa_schemas::PaymentStatus;
use pesa_testkit::{success_callback, InMemoryOrderStore};
use rust_decimal::Decimal;

#[tokio::test]
async fn phone_mismatch_reports_without_mutation() {
    let store = InMemoryOrderStore::new();
    let amount: Decimal = "5.00".parse().unwrap();
    let a = store.seed_pending(amount, "0701111111").await;
    let b = store.seed_pending(amount, "0703333333").await;

    let raw = success_callback(amount, "254702322277", "QBH1234567");
    let notification = normalize(&raw).unwrap();

    let outcome = reconcile(&store, &notification, &EngineConfig::default()).await;
    assert_eq!(
        outcome,
        ReconcileOutcome::MatchedButPhoneMismatch { candidates: 2 }
    );

    for id in [a, b] {
        let order = store.get(id).await.unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.mpesa_receipt.is_none());
    }
}

#[tokio::test]
async fn sentinel_phone_never_matches() {
    let store = InMemoryOrderStore::new();
    let amount: Decimal = "5.00".parse().unwrap();
    let id = store.seed_pending(amount, "0702322277").await;

    // Success callback whose metadata omitted the phone item entirely.
    let raw = serde_json::json!({
        "Body": {
            "stkCallback": {
                "ResultCode": 0,
                "ResultDesc": "ok",
                "CallbackMetadata": {
                    "Item": [{ "Name": "Amount", "Value": 5.00 }]
                }
            }
        }
    });
    let notification = normalize(&raw).unwrap();

    let outcome = reconcile(&store, &notification, &EngineConfig::default()).await;
    assert_eq!(
        outcome,
        ReconcileOutcome::MatchedButPhoneMismatch { candidates: 1 }
    );
    assert_eq!(
        store.get(id).await.unwrap().payment_status,
        PaymentStatus::Pending
    );
}
