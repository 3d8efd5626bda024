//! Storefront state and actions.

use crate::cart::{Cart, CartEntry};
use crate::catalog::Catalog;
use crate::error::Rejection;
use crate::filter::Filter;
use crate::library::{Library, OwnedPublication};
use chrono::{DateTime, Utc};
use scipub_core::environment::{Insights, InsightsError, SettlementError, SettlementReceipt};
use scipub_core::{CategoryFilter, Money, Publication, PublicationId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Success notice shown after a checkout settles.
pub const PURCHASE_SUCCESS_MESSAGE: &str = "Purchase successful! Books added to your library.";

// ============================================================================
// Identifiers
// ============================================================================

/// Identity of one checkout attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckoutId(Uuid);

impl CheckoutId {
    /// Fresh random identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CheckoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CheckoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Generation token of one insights request.
///
/// Each request gets a larger token than the last; a result is applied only
/// while the panel still waits on the same token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InsightsRequestId(u64);

impl InsightsRequestId {
    /// Token with the given generation number
    #[must_use]
    pub const fn new(generation: u64) -> Self {
        Self(generation)
    }

    /// Generation number
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.0
    }
}

// ============================================================================
// Checkout
// ============================================================================

/// Snapshot of the cart being paid for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Checkout identity
    pub id: CheckoutId,
    /// Cart entries at the moment checkout started
    pub entries: Vec<CartEntry>,
    /// Amount being charged
    pub total: Money,
    /// When checkout started
    pub started_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Identifiers of the snapshot entries, in cart order
    #[must_use]
    pub fn publication_ids(&self) -> Vec<PublicationId> {
        self.entries.iter().map(|entry| entry.id().clone()).collect()
    }
}

/// Checkout state machine
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutState {
    /// Ready for a checkout
    #[default]
    Idle,
    /// Waiting for the settlement of `session`
    Processing {
        /// The checkout in flight
        session: CheckoutSession,
    },
    /// The last settlement failed; a new checkout may start
    Failed {
        /// Why settlement failed
        reason: SettlementError,
    },
}

impl CheckoutState {
    /// Whether a settlement is in flight
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    /// The session in flight, if any
    #[must_use]
    pub const fn session(&self) -> Option<&CheckoutSession> {
        match self {
            Self::Processing { session } => Some(session),
            Self::Idle | Self::Failed { .. } => None,
        }
    }
}

/// Result of a settled checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    /// Checkout identity
    pub checkout_id: CheckoutId,
    /// Gateway confirmation code
    pub confirmation: String,
    /// Amount charged
    pub total: Money,
    /// Publications now owned, in cart order
    pub publications: Vec<PublicationId>,
    /// When the purchase was recorded
    pub purchased_at: DateTime<Utc>,
}

// ============================================================================
// Views
// ============================================================================

/// Top-level page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    /// Catalog browsing
    #[default]
    Store,
    /// Owned publications
    Library,
}

/// Kind of user-visible notice
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// Confirmation
    Success,
    /// Failure the user can act on
    Error,
}

/// User-visible notice, kept until dismissed or replaced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Kind
    pub kind: NoticeKind,
    /// Message text
    pub message: String,
}

impl Notice {
    /// Success notice
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    /// Error notice
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Tab of the detail view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailTab {
    /// Description and metadata
    #[default]
    Description,
    /// AI insights panel
    Insights,
}

/// State of the AI insights panel
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightsStatus {
    /// Nothing requested for this view yet
    #[default]
    NotRequested,
    /// Waiting for the result of `request`
    Loading {
        /// Generation token of the request in flight
        request: InsightsRequestId,
    },
    /// Insights arrived
    Ready(Insights),
    /// The request failed; it may be retried
    Failed(InsightsError),
}

impl InsightsStatus {
    /// Token of the request in flight, if loading
    #[must_use]
    pub const fn pending_request(&self) -> Option<InsightsRequestId> {
        match self {
            Self::Loading { request } => Some(*request),
            Self::NotRequested | Self::Ready(_) | Self::Failed(_) => None,
        }
    }
}

/// Primary action offered for a publication
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailAction {
    /// Owned: offer the download
    Download,
    /// Already in the cart
    InCart,
    /// Purchasable at `price`
    Buy {
        /// Price
        price: Money,
    },
}

impl fmt::Display for DetailAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => f.write_str("Download"),
            Self::InCart => f.write_str("In Cart"),
            Self::Buy { price } => write!(f, "Buy for {price}"),
        }
    }
}

/// An open detail view
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailView {
    /// Publication shown
    pub publication: Publication,
    /// Selected tab
    pub tab: DetailTab,
    /// Insights panel
    pub insights: InsightsStatus,
}

impl DetailView {
    /// Fresh view of `publication` on the description tab
    #[must_use]
    pub fn new(publication: Publication) -> Self {
        Self {
            publication,
            tab: DetailTab::Description,
            insights: InsightsStatus::NotRequested,
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Everything the storefront knows, owned by a single store
#[derive(Clone, Debug)]
pub struct StorefrontState {
    /// Read-only catalog
    pub catalog: Arc<Catalog>,
    /// Category and search query
    pub filter: Filter,
    /// Cart contents
    pub cart: Cart,
    /// Whether the cart drawer is shown
    pub cart_open: bool,
    /// Owned publications
    pub library: Library,
    /// Checkout state machine
    pub checkout: CheckoutState,
    /// Current page
    pub view: View,
    /// Open detail view
    pub detail: Option<DetailView>,
    /// Notice awaiting dismissal
    pub notice: Option<Notice>,
    /// Rejection of the most recent command, `None` if it was applied
    pub last_error: Option<Rejection>,
    /// Generation of the last insights request
    pub insights_generation: u64,
}

impl StorefrontState {
    /// Initial state over `catalog`
    #[must_use]
    pub fn new(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            filter: Filter::default(),
            cart: Cart::new(),
            cart_open: false,
            library: Library::new(),
            checkout: CheckoutState::Idle,
            view: View::Store,
            detail: None,
            notice: None,
            last_error: None,
            insights_generation: 0,
        }
    }

    /// Catalog publications passing the current filter
    #[must_use]
    pub fn filtered_catalog(&self) -> Vec<&Publication> {
        self.filter.apply(&self.catalog)
    }

    /// Whether `id` is in the cart
    #[must_use]
    pub fn is_in_cart(&self, id: &PublicationId) -> bool {
        self.cart.contains(id)
    }

    /// Whether `id` is owned
    #[must_use]
    pub fn is_owned(&self, id: &PublicationId) -> bool {
        self.library.is_owned(id)
    }

    /// Primary action for `publication`
    #[must_use]
    pub fn action_for(&self, publication: &Publication) -> DetailAction {
        if self.is_owned(&publication.id) {
            DetailAction::Download
        } else if self.is_in_cart(&publication.id) {
            DetailAction::InCart
        } else {
            DetailAction::Buy {
                price: publication.price,
            }
        }
    }

    /// Primary action of the open detail view
    #[must_use]
    pub fn detail_action(&self) -> Option<DetailAction> {
        self.detail
            .as_ref()
            .map(|detail| self.action_for(&detail.publication))
    }

    /// Owned copy of the presentation-facing state
    #[must_use]
    pub fn snapshot(&self) -> StorefrontSnapshot {
        StorefrontSnapshot {
            category: self.filter.category,
            query: self.filter.query.clone(),
            visible: self.filtered_catalog().into_iter().cloned().collect(),
            cart: self.cart.take_snapshot(),
            cart_total: self.cart.total(),
            cart_open: self.cart_open,
            library: self.library.entries().to_vec(),
            checkout: self.checkout.clone(),
            view: self.view,
            detail: self.detail.clone(),
            notice: self.notice.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Presentation-facing copy of [`StorefrontState`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontSnapshot {
    /// Selected category
    pub category: CategoryFilter,
    /// Search query
    pub query: String,
    /// Publications passing the filter
    pub visible: Vec<Publication>,
    /// Cart entries
    pub cart: Vec<CartEntry>,
    /// Cart total
    pub cart_total: Money,
    /// Whether the cart drawer is shown
    pub cart_open: bool,
    /// Owned publications
    pub library: Vec<OwnedPublication>,
    /// Checkout state
    pub checkout: CheckoutState,
    /// Current page
    pub view: View,
    /// Open detail view
    pub detail: Option<DetailView>,
    /// Notice awaiting dismissal
    pub notice: Option<Notice>,
    /// Rejection of the most recent command, `None` if it was applied
    pub last_error: Option<Rejection>,
}

// ============================================================================
// Actions
// ============================================================================

/// Inputs to the storefront reducer: user commands and effect results
#[derive(Clone, Debug, PartialEq)]
pub enum StorefrontAction {
    // Browsing
    /// Select a category
    SetCategory(CategoryFilter),
    /// Replace the search query
    SetSearchQuery(String),
    /// Switch page
    ChangeView(View),

    // Cart
    /// Add a catalog publication to the cart
    AddToCart {
        /// Publication to add
        id: PublicationId,
    },
    /// Remove a publication from the cart
    RemoveFromCart {
        /// Publication to remove
        id: PublicationId,
    },
    /// Show the cart drawer
    OpenCart,
    /// Hide the cart drawer
    CloseCart,

    // Checkout
    /// Pay for the cart
    Checkout {
        /// Caller-chosen identity of this attempt
        checkout_id: CheckoutId,
    },
    /// Checkout could not start; reported after the rejection is recorded
    CheckoutRejected {
        /// The rejected attempt
        checkout_id: CheckoutId,
        /// Why
        reason: Rejection,
    },
    /// Settlement returned a receipt
    SettlementSucceeded {
        /// Settled attempt
        checkout_id: CheckoutId,
        /// Gateway receipt
        receipt: SettlementReceipt,
    },
    /// Settlement failed or timed out
    SettlementFailed {
        /// Failed attempt
        checkout_id: CheckoutId,
        /// Why
        error: SettlementError,
    },
    /// Terminal: the cart is now in the library
    CheckoutCompleted {
        /// Completed attempt
        checkout_id: CheckoutId,
        /// Purchase summary
        receipt: CheckoutReceipt,
    },
    /// Terminal: nothing was bought
    CheckoutFailed {
        /// Failed attempt
        checkout_id: CheckoutId,
        /// Why
        error: SettlementError,
    },

    // Detail view
    /// Show a publication's details
    OpenDetails {
        /// Publication to show
        id: PublicationId,
    },
    /// Close the detail view
    CloseDetails,
    /// Switch the detail tab
    SelectTab(DetailTab),
    /// Fetch AI insights for the open publication
    RequestInsights,
    /// Insights arrived
    InsightsLoaded {
        /// Token of the request
        request: InsightsRequestId,
        /// The insights
        insights: Insights,
    },
    /// Insights request failed
    InsightsFailed {
        /// Token of the request
        request: InsightsRequestId,
        /// Why
        error: InsightsError,
    },

    // Notices
    /// Dismiss the notice; also clears a failed checkout
    DismissNotice,
}

impl StorefrontAction {
    /// Whether this is a user command rather than an effect result
    #[must_use]
    pub const fn is_command(&self) -> bool {
        !matches!(
            self,
            Self::CheckoutRejected { .. }
                | Self::SettlementSucceeded { .. }
                | Self::SettlementFailed { .. }
                | Self::CheckoutCompleted { .. }
                | Self::CheckoutFailed { .. }
                | Self::InsightsLoaded { .. }
                | Self::InsightsFailed { .. }
        )
    }

    /// Checkout identity of a terminal checkout action
    #[must_use]
    pub const fn checkout_outcome(&self) -> Option<CheckoutId> {
        match self {
            Self::CheckoutCompleted { checkout_id, .. }
            | Self::CheckoutFailed { checkout_id, .. }
            | Self::CheckoutRejected { checkout_id, .. } => Some(*checkout_id),
            _ => None,
        }
    }

    /// Request token of an insights result action
    #[must_use]
    pub const fn insights_outcome(&self) -> Option<InsightsRequestId> {
        match self {
            Self::InsightsLoaded { request, .. } | Self::InsightsFailed { request, .. } => {
                Some(*request)
            }
            _ => None,
        }
    }
}
