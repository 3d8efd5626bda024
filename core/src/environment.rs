//! Environment module - Dependency injection traits
//!
//! All external dependencies of the storefront are abstracted behind traits
//! and injected via the reducer's Environment parameter:
//!
//! - [`Clock`]: Current time (purchase timestamps)
//! - [`SettlementGateway`]: Payment round-trip for a checkout
//! - [`InsightsGateway`]: AI-generated summary and takeaways for a title
//!
//! # Dyn Compatibility
//!
//! The async ports return explicit `BoxFuture`s instead of using `async fn`
//! so they can be held as `Arc<dyn SettlementGateway>` and captured by the
//! effects a reducer returns.

use crate::money::Money;
use crate::publication::PublicationId;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```ignore
/// // Production - uses system clock
/// let clock = SystemClock;
///
/// // Test - fixed time for deterministic tests
/// let clock = FixedClock::new(time);
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A payment to settle for one checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    /// Caller-chosen reference, echoed back in the receipt
    pub reference: String,
    /// Publications being paid for, in cart order
    pub items: Vec<PublicationId>,
    /// Amount to charge
    pub amount: Money,
}

/// Proof of a successful settlement
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Reference of the settled request
    pub reference: String,
    /// Confirmation code issued by the gateway
    pub confirmation: String,
    /// Amount charged
    pub amount: Money,
}

/// Reasons a settlement did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementError {
    /// The gateway refused the payment
    #[error("payment declined: {0}")]
    Declined(String),

    /// The gateway could not be reached
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),

    /// No answer arrived within the settlement timeout
    #[error("payment timed out after {0:?}")]
    TimedOut(Duration),
}

/// Payment port used by checkout
///
/// Implementations may take arbitrarily long; the caller bounds the wait.
pub trait SettlementGateway: Send + Sync {
    /// Settle a payment
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError`] when the payment is declined or the
    /// gateway cannot be reached.
    fn settle(
        &self,
        request: SettlementRequest,
    ) -> BoxFuture<'_, Result<SettlementReceipt, SettlementError>>;
}

/// Title and author of the publication to summarize
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsRequest {
    /// Publication title
    pub title: String,
    /// Publication author
    pub author: String,
}

/// AI-generated summary of a publication
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    /// Short summary paragraph
    pub summary: String,
    /// Key takeaways, in presentation order
    #[serde(rename = "keyTakeaways", alias = "key_takeaways")]
    pub key_takeaways: Vec<String>,
}

/// Reasons an insights fetch did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightsError {
    /// No insights provider is configured
    #[error("insights unavailable: {0}")]
    Unavailable(String),

    /// The provider request failed
    #[error("insights request failed: {0}")]
    RequestFailed(String),

    /// The provider answered with something that is not an insights payload
    #[error("malformed insights response: {0}")]
    Malformed(String),
}

/// AI insights port used by the detail view
pub trait InsightsGateway: Send + Sync {
    /// Generate insights for a title
    ///
    /// # Errors
    ///
    /// Returns [`InsightsError`] when the provider is unavailable, fails,
    /// or returns an unusable payload.
    fn generate(&self, request: InsightsRequest) -> BoxFuture<'_, Result<Insights, InsightsError>>;
}
