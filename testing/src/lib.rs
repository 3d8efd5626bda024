//! # SciPub Testing
//!
//! Testing utilities and helpers for the SciPub storefront.
//!
//! This crate provides:
//! - Deterministic implementations of the environment ports
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Assertion helpers for effects
//! - Publication fixtures
//!
//! ## Example
//!
//! ```ignore
//! use scipub_testing::{ScriptedSettlement, test_clock};
//!
//! #[tokio::test]
//! async fn declined_payment_keeps_cart() {
//!     let settlement = ScriptedSettlement::declining("card expired");
//!     let env = StorefrontEnvironment::new(test_clock(), settlement, insights, config);
//!     // ...
//! }
//! ```

use chrono::{DateTime, Utc};
use scipub_core::environment::Clock;

pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Test doubles for the environment ports
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use futures::future::BoxFuture;
    use scipub_core::environment::{
        Insights, InsightsError, InsightsGateway, InsightsRequest, SettlementError,
        SettlementGateway, SettlementReceipt, SettlementRequest,
    };
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use tokio::sync::Semaphore;

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use scipub_testing::mocks::FixedClock;
    /// use scipub_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }

    /// Pause point shared by the scripted gateways
    ///
    /// A held gate makes every call wait until [`Gate::release`] hands out
    /// a permit; an open gate lets calls through immediately.
    #[derive(Debug, Default)]
    struct Gate {
        permits: Option<Arc<Semaphore>>,
    }

    impl Gate {
        fn held() -> Self {
            Self {
                permits: Some(Arc::new(Semaphore::new(0))),
            }
        }

        async fn pass(&self) {
            if let Some(permits) = &self.permits {
                if let Ok(permit) = permits.acquire().await {
                    permit.forget();
                }
            }
        }

        fn release(&self, calls: usize) {
            if let Some(permits) = &self.permits {
                permits.add_permits(calls);
            }
        }
    }

    /// Settlement gateway answering from a script
    ///
    /// Outcomes pushed with [`ScriptedSettlement::push_outcome`] are used in
    /// order; once the script is exhausted the default outcome applies.
    /// Every request is recorded.
    #[derive(Debug)]
    pub struct ScriptedSettlement {
        script: Mutex<VecDeque<Result<(), SettlementError>>>,
        default: Result<(), SettlementError>,
        requests: Mutex<Vec<SettlementRequest>>,
        settled: AtomicUsize,
        gate: Gate,
    }

    impl ScriptedSettlement {
        fn with_default(default: Result<(), SettlementError>, gate: Gate) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                default,
                requests: Mutex::new(Vec::new()),
                settled: AtomicUsize::new(0),
                gate,
            }
        }

        /// Approves every payment immediately
        #[must_use]
        pub fn approving() -> Self {
            Self::with_default(Ok(()), Gate::default())
        }

        /// Declines every payment with `reason`
        #[must_use]
        pub fn declining(reason: impl Into<String>) -> Self {
            Self::with_default(Err(SettlementError::Declined(reason.into())), Gate::default())
        }

        /// Approves payments, but each one waits for [`ScriptedSettlement::release`]
        #[must_use]
        pub fn held() -> Self {
            Self::with_default(Ok(()), Gate::held())
        }

        /// Queue the outcome of the next unscripted call
        pub fn push_outcome(&self, outcome: Result<(), SettlementError>) {
            lock(&self.script).push_back(outcome);
        }

        /// Let `calls` held payments proceed
        pub fn release(&self, calls: usize) {
            self.gate.release(calls);
        }

        /// Requests received so far, in arrival order
        #[must_use]
        pub fn requests(&self) -> Vec<SettlementRequest> {
            lock(&self.requests).clone()
        }

        /// Number of payments that returned a receipt
        #[must_use]
        pub fn settled(&self) -> usize {
            self.settled.load(Ordering::SeqCst)
        }
    }

    impl SettlementGateway for ScriptedSettlement {
        fn settle(
            &self,
            request: SettlementRequest,
        ) -> BoxFuture<'_, Result<SettlementReceipt, SettlementError>> {
            Box::pin(async move {
                lock(&self.requests).push(request.clone());
                self.gate.pass().await;

                let outcome = lock(&self.script)
                    .pop_front()
                    .unwrap_or_else(|| self.default.clone());
                outcome.map(|()| {
                    let n = self.settled.fetch_add(1, Ordering::SeqCst) + 1;
                    SettlementReceipt {
                        confirmation: format!("TEST-{n:04}"),
                        reference: request.reference,
                        amount: request.amount,
                    }
                })
            })
        }
    }

    /// Insights gateway answering from a table keyed by title
    #[derive(Debug)]
    pub struct ScriptedInsights {
        answers: Mutex<HashMap<String, Result<Insights, InsightsError>>>,
        requests: Mutex<Vec<InsightsRequest>>,
        gate: Gate,
    }

    impl ScriptedInsights {
        fn with_gate(gate: Gate) -> Self {
            Self {
                answers: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
                gate,
            }
        }

        /// Answers immediately; unknown titles get a generic summary
        #[must_use]
        pub fn new() -> Self {
            Self::with_gate(Gate::default())
        }

        /// Each call waits for [`ScriptedInsights::release`]
        #[must_use]
        pub fn held() -> Self {
            Self::with_gate(Gate::held())
        }

        /// Set the answer for a title
        #[must_use]
        pub fn answer(self, title: impl Into<String>, answer: Result<Insights, InsightsError>) -> Self {
            lock(&self.answers).insert(title.into(), answer);
            self
        }

        /// Let `calls` held requests proceed
        pub fn release(&self, calls: usize) {
            self.gate.release(calls);
        }

        /// Requests received so far, in arrival order
        #[must_use]
        pub fn requests(&self) -> Vec<InsightsRequest> {
            lock(&self.requests).clone()
        }
    }

    impl Default for ScriptedInsights {
        fn default() -> Self {
            Self::new()
        }
    }

    impl InsightsGateway for ScriptedInsights {
        fn generate(
            &self,
            request: InsightsRequest,
        ) -> BoxFuture<'_, Result<Insights, InsightsError>> {
            Box::pin(async move {
                lock(&self.requests).push(request.clone());
                self.gate.pass().await;

                lock(&self.answers)
                    .get(&request.title)
                    .cloned()
                    .unwrap_or_else(|| Ok(sample_insights(&request.title)))
            })
        }
    }

    /// Generic insights for a title
    #[must_use]
    pub fn sample_insights(title: &str) -> Insights {
        Insights {
            summary: format!("An overview of {title}."),
            key_takeaways: vec![
                "First takeaway".to_string(),
                "Second takeaway".to_string(),
                "Third takeaway".to_string(),
            ],
        }
    }
}

/// Publication fixtures
pub mod fixtures {
    use chrono::NaiveDate;
    use scipub_core::{Category, Money, Publication, PublicationId};

    /// Build a publication with the given identity, category and price in cents
    ///
    /// Title and author are derived from the identifier.
    #[must_use]
    pub fn publication(id: &str, category: Category, price_cents: u64) -> Publication {
        Publication {
            id: PublicationId::new(id),
            title: format!("Title {id}"),
            author: format!("Author {id}"),
            price: Money::from_cents(price_cents),
            category,
            cover_url: format!("https://covers.example/{id}.jpg"),
            description: format!("Description of {id}"),
            published: NaiveDate::default(),
            pages: 100,
        }
    }

    /// Same as [`publication`] with an explicit title and author
    #[must_use]
    pub fn titled(id: &str, title: &str, author: &str, category: Category) -> Publication {
        Publication {
            title: title.to_string(),
            author: author.to_string(),
            ..publication(id, category, 1000)
        }
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ScriptedInsights, ScriptedSettlement, sample_insights, test_clock};
