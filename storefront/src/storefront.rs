//! Typed facade over the storefront store.
//!
//! [`Storefront`] turns the action protocol into async methods: commands
//! return the reducer's verdict as a `Result`, checkout resolves once the
//! settlement outcome has been reduced, and queries read consistent copies
//! of the state.

use crate::cart::CartEntry;
use crate::catalog::Catalog;
use crate::environment::StorefrontEnvironment;
use crate::error::{Rejection, StorefrontError};
use crate::library::OwnedPublication;
use crate::reducer::StorefrontReducer;
use crate::types::{
    CheckoutId, CheckoutReceipt, CheckoutState, DetailAction, DetailTab, InsightsStatus,
    StorefrontAction, StorefrontSnapshot, StorefrontState, View,
};
use scipub_core::{CategoryFilter, Money, Publication, PublicationId};
use scipub_runtime::Store;
use std::time::Duration;
use tokio::sync::broadcast;

/// Extra time allowed on top of an effect's own timeout before the facade
/// gives up waiting for its result action.
const RESULT_GRACE: Duration = Duration::from_secs(1);

type StorefrontStore =
    Store<StorefrontState, StorefrontAction, StorefrontEnvironment, StorefrontReducer>;

/// The storefront: catalog browsing, cart, checkout, library and details
pub struct Storefront {
    store: StorefrontStore,
    settlement_timeout: Duration,
    insights_timeout: Duration,
}

impl Storefront {
    /// Storefront over `catalog` with the given ports
    #[must_use]
    pub fn new(catalog: Catalog, env: StorefrontEnvironment) -> Self {
        let settlement_timeout = env.config.settlement_timeout;
        let insights_timeout = env.config.insights_timeout;
        Self {
            store: Store::new(StorefrontState::new(catalog), StorefrontReducer::new(), env),
            settlement_timeout,
            insights_timeout,
        }
    }

    // ========================================================================
    // Browsing
    // ========================================================================

    /// Select a category by its token (`"All"`, `"Physics"`, ...)
    ///
    /// # Errors
    ///
    /// [`StorefrontError::UnknownCategory`] for a token outside the category
    /// list; the current category is kept.
    pub async fn set_category(&self, token: &str) -> Result<(), StorefrontError> {
        let category: CategoryFilter = token.parse()?;
        self.dispatch(StorefrontAction::SetCategory(category)).await
    }

    /// Replace the search query
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Store`] if the store is shutting down.
    pub async fn set_search_query(&self, query: impl Into<String>) -> Result<(), StorefrontError> {
        self.dispatch(StorefrontAction::SetSearchQuery(query.into()))
            .await
    }

    /// Switch between the store and library pages
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Store`] if the store is shutting down.
    pub async fn change_view(&self, view: View) -> Result<(), StorefrontError> {
        self.dispatch(StorefrontAction::ChangeView(view)).await
    }

    /// Dismiss the current notice
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Store`] if the store is shutting down.
    pub async fn dismiss_notice(&self) -> Result<(), StorefrontError> {
        self.dispatch(StorefrontAction::DismissNotice).await
    }

    // ========================================================================
    // Cart
    // ========================================================================

    /// Add a publication to the cart; adding it twice changes nothing
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Rejected`] when the publication is unknown or owned,
    /// or a checkout is processing.
    pub async fn add_to_cart(&self, id: &PublicationId) -> Result<(), StorefrontError> {
        self.command(StorefrontAction::AddToCart { id: id.clone() })
            .await
    }

    /// Remove a publication from the cart; absent entries are ignored
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Rejected`] while a checkout is processing.
    pub async fn remove_from_cart(&self, id: &PublicationId) -> Result<(), StorefrontError> {
        self.command(StorefrontAction::RemoveFromCart { id: id.clone() })
            .await
    }

    /// Show the cart drawer
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Store`] if the store is shutting down.
    pub async fn open_cart(&self) -> Result<(), StorefrontError> {
        self.dispatch(StorefrontAction::OpenCart).await
    }

    /// Hide the cart drawer
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Store`] if the store is shutting down.
    pub async fn close_cart(&self) -> Result<(), StorefrontError> {
        self.dispatch(StorefrontAction::CloseCart).await
    }

    // ========================================================================
    // Checkout
    // ========================================================================

    /// Pay for the cart and wait for the outcome
    ///
    /// On success every cart entry is in the library and the receipt lists
    /// them in cart order. On failure the cart and library are unchanged.
    ///
    /// # Errors
    ///
    /// - [`StorefrontError::Rejected`]: the cart is empty or a checkout is
    ///   already processing
    /// - [`StorefrontError::Settlement`]: payment was declined, unavailable
    ///   or timed out
    /// - [`StorefrontError::Store`]: the store is shutting down
    #[tracing::instrument(skip(self))]
    pub async fn checkout(&self) -> Result<CheckoutReceipt, StorefrontError> {
        let checkout_id = CheckoutId::new();
        let outcome = self
            .store
            .send_and_wait_for(
                StorefrontAction::Checkout { checkout_id },
                |action| action.checkout_outcome() == Some(checkout_id),
                self.settlement_timeout + RESULT_GRACE,
            )
            .await?;

        checkout_result(outcome)
    }

    // ========================================================================
    // Detail view
    // ========================================================================

    /// Open the detail view of a publication
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Rejected`] when the publication is unknown.
    pub async fn open_details(&self, id: &PublicationId) -> Result<(), StorefrontError> {
        self.command(StorefrontAction::OpenDetails { id: id.clone() })
            .await
    }

    /// Close the detail view, abandoning any insights request
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Store`] if the store is shutting down.
    pub async fn close_details(&self) -> Result<(), StorefrontError> {
        self.dispatch(StorefrontAction::CloseDetails).await
    }

    /// Switch the detail tab
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Rejected`] when no detail view is open.
    pub async fn select_tab(&self, tab: DetailTab) -> Result<(), StorefrontError> {
        self.command(StorefrontAction::SelectTab(tab)).await
    }

    /// Fetch insights for the open publication and wait for the panel to settle
    ///
    /// Returns the panel status once the result has been applied. A failed
    /// fetch is reported as [`InsightsStatus::Failed`], not as an error.
    ///
    /// # Errors
    ///
    /// - [`StorefrontError::Rejected`]: no detail view is open, or it was
    ///   closed before the result arrived
    /// - [`StorefrontError::Store`]: the store is shutting down
    pub async fn request_insights(&self) -> Result<InsightsStatus, StorefrontError> {
        let mut results = self.store.subscribe_actions();
        let (_, started) = self
            .store
            .send_and_inspect(StorefrontAction::RequestInsights, |s| {
                if let Some(rejection) = &s.last_error {
                    return Err(rejection.clone());
                }
                s.detail
                    .as_ref()
                    .and_then(|detail| detail.insights.pending_request())
                    .ok_or(Rejection::NoDetailOpen)
            })
            .await?;
        let request = started?;

        let wait = async {
            loop {
                match results.recv().await {
                    Ok(action) if action.insights_outcome() == Some(request) => return,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Insights observer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        };
        if tokio::time::timeout(self.insights_timeout + RESULT_GRACE, wait)
            .await
            .is_err()
        {
            tracing::debug!(generation = request.generation(), "No insights result observed");
        }

        self.store
            .state(|s| s.detail.as_ref().map(|detail| detail.insights.clone()))
            .await
            .ok_or_else(|| Rejection::NoDetailOpen.into())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Catalog publications passing the current category and query
    pub async fn filtered_catalog(&self) -> Vec<Publication> {
        self.store
            .state(|s| s.filtered_catalog().into_iter().cloned().collect())
            .await
    }

    /// Cart entries in insertion order
    pub async fn cart(&self) -> Vec<CartEntry> {
        self.store.state(|s| s.cart.take_snapshot()).await
    }

    /// Sum of cart prices
    pub async fn cart_total(&self) -> Money {
        self.store.state(|s| s.cart.total()).await
    }

    /// Owned publications in purchase order
    pub async fn library(&self) -> Vec<OwnedPublication> {
        self.store.state(|s| s.library.entries().to_vec()).await
    }

    /// Whether `id` is in the cart
    pub async fn is_in_cart(&self, id: &PublicationId) -> bool {
        self.store.state(|s| s.is_in_cart(id)).await
    }

    /// Whether `id` is owned
    pub async fn is_owned(&self, id: &PublicationId) -> bool {
        self.store.state(|s| s.is_owned(id)).await
    }

    /// Current checkout state
    pub async fn checkout_state(&self) -> CheckoutState {
        self.store.state(|s| s.checkout.clone()).await
    }

    /// Primary action of the open detail view
    pub async fn detail_action(&self) -> Option<DetailAction> {
        self.store.state(StorefrontState::detail_action).await
    }

    /// Presentation-facing copy of the whole state
    pub async fn snapshot(&self) -> StorefrontSnapshot {
        self.store.state(StorefrontState::snapshot).await
    }

    /// Stop accepting commands and wait for in-flight effects
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Store`] if effects are still running after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StorefrontError> {
        self.store.shutdown(timeout).await.map_err(Into::into)
    }

    async fn dispatch(&self, action: StorefrontAction) -> Result<(), StorefrontError> {
        self.store
            .send(action)
            .await
            .map(drop)
            .map_err(StorefrontError::from)
    }

    /// Send a command and return the verdict recorded when it was reduced
    async fn command(&self, action: StorefrontAction) -> Result<(), StorefrontError> {
        let (_, verdict) = self
            .store
            .send_and_inspect(action, |s| s.last_error.clone())
            .await?;
        verdict.map_or(Ok(()), |rejection| Err(rejection.into()))
    }
}

fn checkout_result(outcome: StorefrontAction) -> Result<CheckoutReceipt, StorefrontError> {
    match outcome {
        StorefrontAction::CheckoutCompleted { receipt, .. } => Ok(receipt),
        StorefrontAction::CheckoutFailed { error, .. } => Err(error.into()),
        StorefrontAction::CheckoutRejected { reason, .. } => Err(reason.into()),
        other => {
            tracing::error!(?other, "Checkout resolved by a non-terminal action");
            Err(StorefrontError::UnexpectedOutcome)
        }
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("settlement_timeout", &self.settlement_timeout)
            .field("insights_timeout", &self.insights_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use scipub_core::environment::SettlementError;

    #[test]
    fn terminal_checkout_actions_map_to_results() {
        let checkout_id = CheckoutId::new();
        assert_eq!(
            checkout_result(StorefrontAction::CheckoutRejected {
                checkout_id,
                reason: Rejection::EmptyCart,
            }),
            Err(StorefrontError::Rejected(Rejection::EmptyCart))
        );
        assert_eq!(
            checkout_result(StorefrontAction::CheckoutFailed {
                checkout_id,
                error: SettlementError::Declined("no".to_string()),
            }),
            Err(StorefrontError::Settlement(SettlementError::Declined(
                "no".to_string()
            )))
        );
    }

    #[test]
    fn non_terminal_action_is_an_error_not_a_panic() {
        assert_eq!(
            checkout_result(StorefrontAction::DismissNotice),
            Err(StorefrontError::UnexpectedOutcome)
        );
    }
}
