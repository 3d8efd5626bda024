//! Storefront error types.

use scipub_core::PublicationId;
use scipub_core::environment::SettlementError;
use scipub_core::publication::UnknownCategory;
use scipub_runtime::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A command the reducer refused to apply.
///
/// Rejections never change cart, library or checkout state. The most recent
/// one is kept in `StorefrontState::last_error`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// No publication with this identifier exists in the catalog.
    #[error("unknown publication: {0}")]
    UnknownPublication(PublicationId),

    /// The publication is already in the library.
    #[error("publication {0} is already owned")]
    AlreadyOwned(PublicationId),

    /// The cart cannot change while a checkout is processing.
    #[error("cart is locked while checkout is processing")]
    CartLocked,

    /// Checkout needs at least one cart entry.
    #[error("cart is empty")]
    EmptyCart,

    /// A checkout is already processing.
    #[error("checkout already in progress")]
    CheckoutInProgress,

    /// The command needs an open detail view.
    #[error("no publication details are open")]
    NoDetailOpen,
}

/// Errors returned by the [`Storefront`](crate::Storefront) facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorefrontError {
    /// The reducer rejected the command.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Payment did not settle; cart and library are unchanged.
    #[error("checkout failed: {0}")]
    Settlement(#[from] SettlementError),

    /// The category token is not one of the catalog's tokens.
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),

    /// The store refused the action or stopped answering.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A checkout wait ended on an action that is not a checkout outcome.
    #[error("checkout ended without an outcome")]
    UnexpectedOutcome,
}
