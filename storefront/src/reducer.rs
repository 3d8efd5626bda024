//! Storefront reducer.
//!
//! Every state change of the storefront happens here. The reducer is
//! synchronous; the two slow operations, settlement and insights, are
//! returned as cancellable effects whose results come back as actions.
//!
//! # Checkout
//!
//! ```text
//! Idle / Failed --Checkout--> Processing --SettlementSucceeded--> Idle
//!                                        --SettlementFailed-----> Failed
//! ```
//!
//! A settlement result is applied only if its checkout id matches the
//! session in `Processing`. Each result is followed by a terminal
//! `CheckoutCompleted` or `CheckoutFailed` action, reduced after the state
//! change so that observers of the terminal action see the final state.

use crate::environment::StorefrontEnvironment;
use crate::error::Rejection;
use crate::types::{
    CheckoutId, CheckoutReceipt, CheckoutSession, CheckoutState, DetailTab, DetailView,
    InsightsRequestId, InsightsStatus, Notice, PURCHASE_SUCCESS_MESSAGE, StorefrontAction,
    StorefrontState, View,
};
use scipub_core::effect::{Effect, EffectId};
use scipub_core::environment::{
    InsightsError, InsightsRequest, SettlementError, SettlementReceipt, SettlementRequest,
};
use scipub_core::reducer::Reducer;
use scipub_core::{PublicationId, async_effect, cancellable};
use smallvec::{SmallVec, smallvec};
use std::sync::Arc;

/// Effect id of the in-flight settlement
pub const SETTLEMENT_EFFECT: EffectId = EffectId::new("storefront.settlement");

/// Effect id of the in-flight insights request
pub const INSIGHTS_EFFECT: EffectId = EffectId::new("storefront.insights");

type Effects = SmallVec<[Effect<StorefrontAction>; 4]>;

/// Reducer for [`StorefrontState`]
#[derive(Clone, Copy, Debug, Default)]
pub struct StorefrontReducer;

impl StorefrontReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn reject(state: &mut StorefrontState, reason: Rejection) -> Effects {
        tracing::warn!(%reason, "Command rejected");
        state.last_error = Some(reason);
        SmallVec::new()
    }

    // ========================================================================
    // Cart
    // ========================================================================

    fn add_to_cart(state: &mut StorefrontState, id: &PublicationId) -> Effects {
        if state.checkout.is_processing() {
            return Self::reject(state, Rejection::CartLocked);
        }
        let Some(publication) = state.catalog.get(id).cloned() else {
            return Self::reject(state, Rejection::UnknownPublication(id.clone()));
        };
        if state.library.is_owned(id) {
            return Self::reject(state, Rejection::AlreadyOwned(id.clone()));
        }

        if state.cart.add(publication) {
            tracing::debug!(%id, "Added to cart");
        }
        state.cart_open = true;

        // Adding from the detail view dismisses it
        if state
            .detail
            .as_ref()
            .is_some_and(|detail| &detail.publication.id == id)
        {
            return Self::close_details(state);
        }
        SmallVec::new()
    }

    fn remove_from_cart(state: &mut StorefrontState, id: &PublicationId) -> Effects {
        if state.checkout.is_processing() {
            return Self::reject(state, Rejection::CartLocked);
        }
        if state.cart.remove(id) {
            tracing::debug!(%id, "Removed from cart");
        }
        SmallVec::new()
    }

    // ========================================================================
    // Checkout
    // ========================================================================

    fn checkout(
        state: &mut StorefrontState,
        checkout_id: CheckoutId,
        env: &StorefrontEnvironment,
    ) -> Effects {
        let rejection = if state.checkout.is_processing() {
            Some(Rejection::CheckoutInProgress)
        } else if state.cart.is_empty() {
            Some(Rejection::EmptyCart)
        } else {
            None
        };
        if let Some(reason) = rejection {
            let mut effects = Self::reject(state, reason.clone());
            effects.push(async_effect! {
                Some(StorefrontAction::CheckoutRejected { checkout_id, reason })
            });
            return effects;
        }

        let session = CheckoutSession {
            id: checkout_id,
            entries: state.cart.take_snapshot(),
            total: state.cart.total(),
            started_at: env.clock.now(),
        };
        let request = SettlementRequest {
            reference: checkout_id.to_string(),
            items: session.publication_ids(),
            amount: session.total,
        };
        tracing::info!(
            %checkout_id,
            items = session.entries.len(),
            total = %session.total,
            "Checkout started"
        );
        state.checkout = CheckoutState::Processing { session };

        let settlement = Arc::clone(&env.settlement);
        let timeout = env.config.settlement_timeout;
        smallvec![cancellable! {
            id: SETTLEMENT_EFFECT,
            let outcome = tokio::time::timeout(timeout, settlement.settle(request))
                .await
                .unwrap_or(Err(SettlementError::TimedOut(timeout)));
            Some(match outcome {
                Ok(receipt) => StorefrontAction::SettlementSucceeded { checkout_id, receipt },
                Err(error) => StorefrontAction::SettlementFailed { checkout_id, error },
            })
        }]
    }

    fn is_active(state: &StorefrontState, checkout_id: CheckoutId) -> bool {
        let active = state.checkout.session().map(|session| session.id);
        if active == Some(checkout_id) {
            return true;
        }
        tracing::debug!(%checkout_id, "Ignoring settlement result for inactive checkout");
        false
    }

    fn settlement_succeeded(
        state: &mut StorefrontState,
        checkout_id: CheckoutId,
        receipt: SettlementReceipt,
        env: &StorefrontEnvironment,
    ) -> Effects {
        if !Self::is_active(state, checkout_id) {
            return SmallVec::new();
        }
        let CheckoutState::Processing { session } = std::mem::take(&mut state.checkout) else {
            return SmallVec::new();
        };

        let purchased_at = env.clock.now();
        let publications = session.publication_ids();
        state.cart.remove_all(&publications);
        state.library.purchase(
            session.entries.into_iter().map(|entry| entry.publication),
            purchased_at,
        );
        state.view = View::Library;
        state.cart_open = false;
        state.notice = Some(Notice::success(PURCHASE_SUCCESS_MESSAGE));

        tracing::info!(
            %checkout_id,
            confirmation = %receipt.confirmation,
            items = publications.len(),
            "Checkout settled"
        );

        let receipt = CheckoutReceipt {
            checkout_id,
            confirmation: receipt.confirmation,
            total: session.total,
            publications,
            purchased_at,
        };
        smallvec![async_effect! {
            Some(StorefrontAction::CheckoutCompleted { checkout_id, receipt })
        }]
    }

    fn settlement_failed(
        state: &mut StorefrontState,
        checkout_id: CheckoutId,
        error: SettlementError,
    ) -> Effects {
        if !Self::is_active(state, checkout_id) {
            return SmallVec::new();
        }

        tracing::warn!(%checkout_id, %error, "Checkout failed");
        state.notice = Some(Notice::error(format!("Payment failed: {error}")));
        state.checkout = CheckoutState::Failed {
            reason: error.clone(),
        };
        smallvec![async_effect! {
            Some(StorefrontAction::CheckoutFailed { checkout_id, error })
        }]
    }

    // ========================================================================
    // Detail view
    // ========================================================================

    fn cancel_pending_insights(state: &StorefrontState) -> Effects {
        let pending = state
            .detail
            .as_ref()
            .and_then(|detail| detail.insights.pending_request());
        match pending {
            Some(request) => {
                tracing::debug!(generation = request.generation(), "Cancelling insights request");
                smallvec![Effect::Cancel(INSIGHTS_EFFECT)]
            }
            None => SmallVec::new(),
        }
    }

    fn open_details(state: &mut StorefrontState, id: &PublicationId) -> Effects {
        let Some(publication) = state.catalog.get(id).cloned() else {
            return Self::reject(state, Rejection::UnknownPublication(id.clone()));
        };
        if state
            .detail
            .as_ref()
            .is_some_and(|detail| &detail.publication.id == id)
        {
            return SmallVec::new();
        }

        let effects = Self::cancel_pending_insights(state);
        state.detail = Some(DetailView::new(publication));
        effects
    }

    fn close_details(state: &mut StorefrontState) -> Effects {
        let effects = Self::cancel_pending_insights(state);
        state.detail = None;
        effects
    }

    fn select_tab(state: &mut StorefrontState, tab: DetailTab) -> Effects {
        match state.detail.as_mut() {
            Some(detail) => {
                detail.tab = tab;
                SmallVec::new()
            }
            None => Self::reject(state, Rejection::NoDetailOpen),
        }
    }

    fn request_insights(state: &mut StorefrontState, env: &StorefrontEnvironment) -> Effects {
        let Some(detail) = state.detail.as_mut() else {
            return Self::reject(state, Rejection::NoDetailOpen);
        };

        state.insights_generation += 1;
        let request = InsightsRequestId::new(state.insights_generation);
        detail.tab = DetailTab::Insights;
        detail.insights = InsightsStatus::Loading { request };
        let query = InsightsRequest {
            title: detail.publication.title.clone(),
            author: detail.publication.author.clone(),
        };
        tracing::debug!(generation = request.generation(), title = %query.title, "Requesting insights");

        let gateway = Arc::clone(&env.insights);
        let timeout = env.config.insights_timeout;
        smallvec![cancellable! {
            id: INSIGHTS_EFFECT,
            let result = tokio::time::timeout(timeout, gateway.generate(query))
                .await
                .unwrap_or_else(|_| {
                    Err(InsightsError::RequestFailed(format!("timed out after {timeout:?}")))
                });
            Some(match result {
                Ok(insights) => StorefrontAction::InsightsLoaded { request, insights },
                Err(error) => StorefrontAction::InsightsFailed { request, error },
            })
        }]
    }

    fn apply_insights(
        state: &mut StorefrontState,
        request: InsightsRequestId,
        status: InsightsStatus,
    ) -> Effects {
        match state.detail.as_mut() {
            Some(detail) if detail.insights.pending_request() == Some(request) => {
                detail.insights = status;
            }
            _ => {
                tracing::debug!(generation = request.generation(), "Discarding stale insights result");
            }
        }
        SmallVec::new()
    }
}

impl Reducer for StorefrontReducer {
    type State = StorefrontState;
    type Action = StorefrontAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        // `last_error` answers for the latest command only
        if action.is_command() {
            state.last_error = None;
        }
        match action {
            StorefrontAction::SetCategory(category) => {
                state.filter.category = category;
                SmallVec::new()
            }
            StorefrontAction::SetSearchQuery(query) => {
                state.filter.query = query;
                SmallVec::new()
            }
            StorefrontAction::ChangeView(view) => {
                state.view = view;
                SmallVec::new()
            }

            StorefrontAction::AddToCart { id } => Self::add_to_cart(state, &id),
            StorefrontAction::RemoveFromCart { id } => Self::remove_from_cart(state, &id),
            StorefrontAction::OpenCart => {
                state.cart_open = true;
                SmallVec::new()
            }
            StorefrontAction::CloseCart => {
                state.cart_open = false;
                SmallVec::new()
            }

            StorefrontAction::Checkout { checkout_id } => Self::checkout(state, checkout_id, env),
            StorefrontAction::CheckoutRejected {
                checkout_id,
                reason,
            } => {
                tracing::debug!(%checkout_id, %reason, "Checkout rejection reported");
                SmallVec::new()
            }
            StorefrontAction::SettlementSucceeded {
                checkout_id,
                receipt,
            } => Self::settlement_succeeded(state, checkout_id, receipt, env),
            StorefrontAction::SettlementFailed { checkout_id, error } => {
                Self::settlement_failed(state, checkout_id, error)
            }
            StorefrontAction::CheckoutCompleted {
                checkout_id,
                receipt,
            } => {
                tracing::info!(%checkout_id, total = %receipt.total, "Checkout completed");
                SmallVec::new()
            }
            StorefrontAction::CheckoutFailed { checkout_id, error } => {
                tracing::debug!(%checkout_id, %error, "Checkout finished without purchase");
                SmallVec::new()
            }

            StorefrontAction::OpenDetails { id } => Self::open_details(state, &id),
            StorefrontAction::CloseDetails => Self::close_details(state),
            StorefrontAction::SelectTab(tab) => Self::select_tab(state, tab),
            StorefrontAction::RequestInsights => Self::request_insights(state, env),
            StorefrontAction::InsightsLoaded { request, insights } => {
                Self::apply_insights(state, request, InsightsStatus::Ready(insights))
            }
            StorefrontAction::InsightsFailed { request, error } => {
                tracing::debug!(generation = request.generation(), %error, "Insights request failed");
                Self::apply_insights(state, request, InsightsStatus::Failed(error))
            }

            StorefrontAction::DismissNotice => {
                state.notice = None;
                if matches!(state.checkout, CheckoutState::Failed { .. }) {
                    state.checkout = CheckoutState::Idle;
                }
                SmallVec::new()
            }
        }
    }
}
