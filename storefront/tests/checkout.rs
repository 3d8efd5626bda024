//! Integration tests for cart and checkout through the `Storefront` facade
//!
//! Settlement runs against `ScriptedSettlement`, so each test decides whether
//! payments approve, decline, or wait until released.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use scipub_core::environment::{SettlementError, SettlementGateway};
use scipub_core::{Money, PublicationId};
use scipub_storefront::{
    Catalog, CheckoutState, NoticeKind, PURCHASE_SUCCESS_MESSAGE, Rejection, Storefront,
    StorefrontConfig, StorefrontEnvironment, StorefrontError, View,
};
use scipub_testing::{ScriptedInsights, ScriptedSettlement, test_clock};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

fn id(raw: &str) -> PublicationId {
    PublicationId::new(raw)
}

fn config() -> StorefrontConfig {
    StorefrontConfig::default()
        .with_settlement_timeout(Duration::from_millis(300))
        .with_insights_timeout(Duration::from_millis(300))
}

fn storefront_with(settlement: Arc<ScriptedSettlement>, config: StorefrontConfig) -> Storefront {
    let settlement: Arc<dyn SettlementGateway> = settlement;
    let env = StorefrontEnvironment::new(
        Arc::new(test_clock()),
        settlement,
        Arc::new(ScriptedInsights::new()),
        config,
    );
    Storefront::new(Catalog::scipub().unwrap(), env)
}

fn storefront(settlement: Arc<ScriptedSettlement>) -> Storefront {
    storefront_with(settlement, config())
}

async fn wait_for_processing(storefront: &Storefront) {
    for _ in 0..100 {
        if storefront.checkout_state().await.is_processing() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("checkout never reached Processing");
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn adding_twice_keeps_one_entry() {
    let storefront = storefront(Arc::new(ScriptedSettlement::approving()));

    storefront.add_to_cart(&id("1")).await.unwrap();
    storefront.add_to_cart(&id("1")).await.unwrap();

    let cart = storefront.cart().await;
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity, 1);
    assert_eq!(storefront.cart_total().await, Money::from_cents(2999));
    assert!(storefront.snapshot().await.cart_open);
}

#[tokio::test]
async fn removing_absent_entry_is_a_no_op() {
    let storefront = storefront(Arc::new(ScriptedSettlement::approving()));
    storefront.add_to_cart(&id("1")).await.unwrap();
    storefront.add_to_cart(&id("2")).await.unwrap();

    storefront.remove_from_cart(&id("3")).await.unwrap();

    let ids: Vec<_> = storefront
        .cart()
        .await
        .iter()
        .map(|entry| entry.id().clone())
        .collect();
    assert_eq!(ids, vec![id("1"), id("2")]);
}

#[tokio::test]
async fn cart_total_sums_prices() {
    let storefront = storefront(Arc::new(ScriptedSettlement::approving()));
    for raw in ["1", "2", "7"] {
        storefront.add_to_cart(&id(raw)).await.unwrap();
    }

    assert_eq!(
        storefront.cart_total().await,
        Money::from_cents(2999 + 1850 + 12_500)
    );
    assert_eq!(storefront.cart_total().await.to_string(), "$173.49");

    storefront.remove_from_cart(&id("7")).await.unwrap();
    assert_eq!(storefront.cart_total().await, Money::from_cents(4849));
}

#[tokio::test]
async fn unknown_publication_is_rejected() {
    let storefront = storefront(Arc::new(ScriptedSettlement::approving()));

    let error = storefront.add_to_cart(&id("99")).await.unwrap_err();

    assert_eq!(
        error,
        StorefrontError::Rejected(Rejection::UnknownPublication(id("99")))
    );
    assert!(storefront.cart().await.is_empty());
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn physics_purchase_moves_book_to_library() {
    let settlement = Arc::new(ScriptedSettlement::approving());
    let storefront = storefront(Arc::clone(&settlement));

    storefront.set_category("Physics").await.unwrap();
    let visible: Vec<_> = storefront
        .filtered_catalog()
        .await
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(visible, vec![id("1"), id("4")]);

    storefront.add_to_cart(&id("1")).await.unwrap();
    let receipt = storefront.checkout().await.unwrap();

    assert_eq!(receipt.total, Money::from_cents(2999));
    assert_eq!(receipt.publications, vec![id("1")]);
    assert_eq!(receipt.confirmation, "TEST-0001");

    assert!(storefront.is_owned(&id("1")).await);
    assert!(!storefront.is_in_cart(&id("1")).await);
    assert!(storefront.cart().await.is_empty());
    assert_eq!(storefront.cart_total().await, Money::ZERO);
    assert_eq!(storefront.checkout_state().await, CheckoutState::Idle);

    let snapshot = storefront.snapshot().await;
    assert_eq!(snapshot.view, View::Library);
    assert!(!snapshot.cart_open);
    let notice = snapshot.notice.expect("success notice");
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.message, PURCHASE_SUCCESS_MESSAGE);

    let library = storefront.library().await;
    assert_eq!(library.len(), 1);
    assert_eq!(library[0].publication.id, id("1"));
    assert_eq!(library[0].purchased_at, receipt.purchased_at);

    // The gateway was charged for exactly the snapshot
    let requests = settlement.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].items, vec![id("1")]);
    assert_eq!(requests[0].amount, Money::from_cents(2999));
    assert_eq!(requests[0].reference, receipt.checkout_id.to_string());
}

#[tokio::test]
async fn multi_item_checkout_keeps_cart_order() {
    let storefront = storefront(Arc::new(ScriptedSettlement::approving()));
    for raw in ["5", "2", "6"] {
        storefront.add_to_cart(&id(raw)).await.unwrap();
    }

    let receipt = storefront.checkout().await.unwrap();

    assert_eq!(receipt.publications, vec![id("5"), id("2"), id("6")]);
    let owned: Vec<_> = storefront
        .library()
        .await
        .into_iter()
        .map(|entry| entry.publication.id)
        .collect();
    assert_eq!(owned, receipt.publications);
}

#[tokio::test]
async fn empty_cart_checkout_is_rejected() {
    let settlement = Arc::new(ScriptedSettlement::approving());
    let storefront = storefront(Arc::clone(&settlement));

    let error = storefront.checkout().await.unwrap_err();

    assert_eq!(error, StorefrontError::Rejected(Rejection::EmptyCart));
    assert_eq!(storefront.checkout_state().await, CheckoutState::Idle);
    assert!(settlement.requests().is_empty());
}

#[tokio::test]
async fn declined_payment_leaves_cart_and_library() {
    let storefront = storefront(Arc::new(ScriptedSettlement::declining("card declined")));
    storefront.add_to_cart(&id("1")).await.unwrap();
    storefront.add_to_cart(&id("2")).await.unwrap();

    let error = storefront.checkout().await.unwrap_err();

    let declined = SettlementError::Declined("card declined".to_string());
    assert_eq!(error, StorefrontError::Settlement(declined.clone()));
    assert_eq!(storefront.cart().await.len(), 2);
    assert!(storefront.library().await.is_empty());
    assert_eq!(
        storefront.checkout_state().await,
        CheckoutState::Failed { reason: declined }
    );

    let snapshot = storefront.snapshot().await;
    assert_eq!(snapshot.view, View::Store);
    assert_eq!(snapshot.notice.map(|n| n.kind), Some(NoticeKind::Error));
}

#[tokio::test]
async fn retry_after_failure_succeeds() {
    let settlement = Arc::new(ScriptedSettlement::approving());
    settlement.push_outcome(Err(SettlementError::Unavailable("maintenance".to_string())));
    let storefront = storefront(Arc::clone(&settlement));
    storefront.add_to_cart(&id("3")).await.unwrap();

    assert!(matches!(
        storefront.checkout().await,
        Err(StorefrontError::Settlement(SettlementError::Unavailable(_)))
    ));
    let receipt = storefront.checkout().await.unwrap();

    assert_eq!(receipt.publications, vec![id("3")]);
    assert_eq!(storefront.checkout_state().await, CheckoutState::Idle);
    assert_eq!(settlement.requests().len(), 2);
}

#[tokio::test]
async fn dismissing_failure_notice_returns_to_idle() {
    let storefront = storefront(Arc::new(ScriptedSettlement::declining("no funds")));
    storefront.add_to_cart(&id("1")).await.unwrap();
    assert!(storefront.checkout().await.is_err());

    storefront.dismiss_notice().await.unwrap();

    assert_eq!(storefront.checkout_state().await, CheckoutState::Idle);
    assert!(storefront.snapshot().await.notice.is_none());
}

#[tokio::test]
async fn settlement_timeout_fails_checkout() {
    let settlement = Arc::new(ScriptedSettlement::held());
    let storefront = storefront_with(
        Arc::clone(&settlement),
        config().with_settlement_timeout(Duration::from_millis(50)),
    );
    storefront.add_to_cart(&id("1")).await.unwrap();

    let error = storefront.checkout().await.unwrap_err();

    assert_eq!(
        error,
        StorefrontError::Settlement(SettlementError::TimedOut(Duration::from_millis(50)))
    );
    assert!(matches!(
        storefront.checkout_state().await,
        CheckoutState::Failed { .. }
    ));
    assert_eq!(storefront.cart().await.len(), 1);
    assert!(!storefront.is_owned(&id("1")).await);
    assert_eq!(settlement.settled(), 0);
}

#[tokio::test]
async fn concurrent_checkout_is_rejected_while_processing() {
    let settlement = Arc::new(ScriptedSettlement::held());
    let storefront = Arc::new(storefront(Arc::clone(&settlement)));
    storefront.add_to_cart(&id("1")).await.unwrap();

    let first = tokio::spawn({
        let storefront = Arc::clone(&storefront);
        async move { storefront.checkout().await }
    });
    wait_for_processing(&storefront).await;

    // Second checkout and cart edits are refused while the first is in flight
    assert_eq!(
        storefront.checkout().await.unwrap_err(),
        StorefrontError::Rejected(Rejection::CheckoutInProgress)
    );
    assert_eq!(
        storefront.add_to_cart(&id("2")).await.unwrap_err(),
        StorefrontError::Rejected(Rejection::CartLocked)
    );
    assert_eq!(
        storefront.remove_from_cart(&id("1")).await.unwrap_err(),
        StorefrontError::Rejected(Rejection::CartLocked)
    );

    settlement.release(1);
    let receipt = first.await.unwrap().unwrap();

    assert_eq!(receipt.publications, vec![id("1")]);
    assert_eq!(settlement.requests().len(), 1);
    assert_eq!(storefront.library().await.len(), 1);
}

#[tokio::test]
async fn locked_cart_rejects_edits_that_would_change_nothing() {
    let settlement = Arc::new(ScriptedSettlement::held());
    let storefront = Arc::new(storefront(Arc::clone(&settlement)));
    storefront.add_to_cart(&id("1")).await.unwrap();

    let first = tokio::spawn({
        let storefront = Arc::clone(&storefront);
        async move { storefront.checkout().await }
    });
    wait_for_processing(&storefront).await;

    // Already in the cart, and absent from it: both still refused
    assert_eq!(
        storefront.add_to_cart(&id("1")).await.unwrap_err(),
        StorefrontError::Rejected(Rejection::CartLocked)
    );
    assert_eq!(
        storefront.remove_from_cart(&id("3")).await.unwrap_err(),
        StorefrontError::Rejected(Rejection::CartLocked)
    );

    settlement.release(1);
    first.await.unwrap().unwrap();
    assert!(storefront.is_owned(&id("1")).await);
}

#[tokio::test]
async fn concurrent_callers_get_their_own_verdict() {
    let storefront = Arc::new(storefront(Arc::new(ScriptedSettlement::approving())));

    let calls: Vec<_> = ["1", "404", "2", "405", "3", "406"]
        .into_iter()
        .map(|raw| {
            let storefront = Arc::clone(&storefront);
            tokio::spawn(async move { (raw, storefront.add_to_cart(&id(raw)).await) })
        })
        .collect();

    for call in calls {
        let (raw, result) = call.await.unwrap();
        if raw.starts_with("40") {
            assert_eq!(
                result.unwrap_err(),
                StorefrontError::Rejected(Rejection::UnknownPublication(id(raw)))
            );
        } else {
            result.unwrap();
        }
    }
    assert_eq!(storefront.cart().await.len(), 3);
}

#[tokio::test]
async fn empty_cart_rejection_is_recorded_before_checkout_returns() {
    let storefront = storefront(Arc::new(ScriptedSettlement::approving()));

    assert!(storefront.checkout().await.is_err());

    assert_eq!(
        storefront.snapshot().await.last_error,
        Some(Rejection::EmptyCart)
    );
}

#[tokio::test]
async fn owned_publication_cannot_be_added_again() {
    let storefront = storefront(Arc::new(ScriptedSettlement::approving()));
    storefront.add_to_cart(&id("4")).await.unwrap();
    storefront.checkout().await.unwrap();

    let error = storefront.add_to_cart(&id("4")).await.unwrap_err();

    assert_eq!(error, StorefrontError::Rejected(Rejection::AlreadyOwned(id("4"))));
    assert!(storefront.is_owned(&id("4")).await);
    assert!(!storefront.is_in_cart(&id("4")).await);
}

#[tokio::test]
async fn purchase_timestamp_comes_from_clock() {
    use scipub_core::environment::Clock;

    let storefront = storefront(Arc::new(ScriptedSettlement::approving()));
    storefront.add_to_cart(&id("8")).await.unwrap();
    storefront.checkout().await.unwrap();

    let library = storefront.library().await;
    assert_eq!(library[0].purchased_at, test_clock().now());
}
