//! # SciPub Storefront
//!
//! Cart, checkout and ownership state manager for the SciPub publication
//! storefront.
//!
//! All state lives in one [`StorefrontState`] driven by the
//! [`StorefrontReducer`] inside a `scipub_runtime::Store`. Settlement and AI
//! insights run as cancellable effects against the ports of
//! [`StorefrontEnvironment`]; their results come back as actions.
//!
//! The [`Storefront`] facade is the intended entry point:
//!
//! ```no_run
//! use scipub_storefront::{Catalog, Storefront, StorefrontConfig, StorefrontEnvironment};
//! use scipub_core::PublicationId;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorefrontConfig::from_env()?;
//! let storefront = Storefront::new(Catalog::scipub()?, StorefrontEnvironment::live(config));
//!
//! storefront.set_category("Physics").await?;
//! storefront.add_to_cart(&PublicationId::new("1")).await?;
//! let receipt = storefront.checkout().await?;
//! println!("Paid {} ({})", receipt.total, receipt.confirmation);
//! # Ok(())
//! # }
//! ```

pub mod cart;
pub mod catalog;
pub mod config;
pub mod environment;
pub mod error;
pub mod filter;
pub mod library;
pub mod reducer;
pub mod storefront;
pub mod types;

pub use cart::{Cart, CartEntry};
pub use catalog::{CATEGORY_FILTERS, Catalog, CatalogError};
pub use config::{ConfigError, StorefrontConfig};
pub use environment::{SimulatedSettlement, StorefrontEnvironment};
pub use error::{Rejection, StorefrontError};
pub use filter::{Filter, filter_publications};
pub use library::{Library, OwnedPublication};
pub use reducer::{INSIGHTS_EFFECT, SETTLEMENT_EFFECT, StorefrontReducer};
pub use storefront::Storefront;
pub use types::{
    CheckoutId, CheckoutReceipt, CheckoutSession, CheckoutState, DetailAction, DetailTab,
    DetailView, InsightsRequestId, InsightsStatus, Notice, NoticeKind,
    PURCHASE_SUCCESS_MESSAGE, StorefrontAction, StorefrontSnapshot, StorefrontState, View,
};
