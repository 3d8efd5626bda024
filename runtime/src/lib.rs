//! # SciPub Runtime
//!
//! Runtime implementation for the SciPub storefront.
//!
//! This crate provides the Store runtime that owns state, runs the reducer
//! for every action and executes the effects it returns.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to the reducer
//! - **Cancellation Registry**: Tracks in-flight cancellable effects by [`EffectId`]
//!
//! ## Example
//!
//! ```ignore
//! use scipub_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action and wait for everything it triggered
//! let mut handle = store.send(Action::DoSomething).await?;
//! handle.wait().await;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use scipub_core::effect::{Effect, EffectId};
use scipub_core::reducer::Reducer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::AbortHandle;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for effects or for a terminal action
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for effects to complete.
/// Tracking cascades: an effect only counts as finished once the action it
/// produced has been reduced and that action's own effects have finished.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, so the counter can no longer change.
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: Effect counter shared between a handle and running effects
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }

    fn handle(&self) -> EffectHandle {
        EffectHandle {
            effects: Arc::clone(&self.counter),
            completion: self.notifier.subscribe(),
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Runs when a task completes, panics or is aborted.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Internal: in-flight cancellable effects keyed by identifier
///
/// Every registration carries a token so that a finishing task only
/// removes its own entry, never one that replaced it.
#[derive(Default)]
struct CancellationRegistry {
    next_token: AtomicU64,
    tasks: Mutex<HashMap<EffectId, (u64, AbortHandle)>>,
}

impl CancellationRegistry {
    fn token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EffectId, (u64, AbortHandle)>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, id: EffectId, token: u64) {
        let mut tasks = self.lock();
        if tasks.get(&id).is_some_and(|(current, _)| *current == token) {
            tasks.remove(&id);
        }
    }

    fn cancel(&self, id: EffectId) -> bool {
        self.lock().remove(&id).is_some_and(|(_, task)| {
            task.abort();
            true
        })
    }

    fn is_running(&self, id: EffectId) -> bool {
        self.lock().contains_key(&id)
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, CancellationRegistry, DecrementGuard, Duration, Effect, EffectHandle,
        EffectId, EffectTracking, Ordering, Reducer, RwLock, StoreError,
    };
    use futures::future::BoxFuture;
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Actions are reduced one at a time under the write lock, so every
    /// reducer call sees the result of the previous one.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        pending: EffectTracking,
        cancellations: Arc<CancellationRegistry>,
        /// Action broadcast channel for observing actions produced by effects.
        ///
        /// Each action is broadcast after the reducer has applied it.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Sync + Clone + std::fmt::Debug + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast channel holds 64 actions per subscriber; use
        /// [`Store::with_broadcast_capacity`] to change it.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 64)
        }

        /// Create a new store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));
            let (_, pending) = EffectHandle::new();

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending,
                cancellations: Arc::new(CancellationRegistry::default()),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Starts the returned effects
        ///
        /// Returns once the effects have been started, not completed. Await
        /// the returned [`EffectHandle`] to wait for them.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.ensure_accepting()?;
            Ok(self.dispatch(action).await)
        }

        /// Send an action and read the state it produced
        ///
        /// `inspect` runs under the same write lock as the reducer, before the
        /// lock is released and before any effect starts, so it sees exactly
        /// the result of this action.
        ///
        /// ```ignore
        /// let (_, rejected) = store
        ///     .send_and_inspect(CartAction::Add(id), |s| s.last_error.clone())
        ///     .await?;
        /// ```
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip_all, name = "store_send")]
        pub async fn send_and_inspect<F, T>(
            &self,
            action: A,
            inspect: F,
        ) -> Result<(EffectHandle, T), StoreError>
        where
            F: FnOnce(&S) -> T,
        {
            self.ensure_accepting()?;
            Ok(self.dispatch_with(action, inspect).await)
        }

        fn ensure_accepting(&self) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }
            Ok(())
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, then returns the
        /// first action produced by an effect that satisfies `predicate`.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending to avoid race condition
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let cart_size = store.state(|s| s.cart.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Whether a cancellable effect with this identifier is in flight
        #[must_use]
        pub fn is_running(&self, id: EffectId) -> bool {
            self.cancellations.is_running(id)
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending.counter.load(Ordering::SeqCst)
        }

        /// Stop accepting actions and wait for running effects to finish
        ///
        /// Actions produced by effects that are already running are still
        /// reduced while draining.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still
        /// running when the timeout expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let mut all = self.pending.handle();
            if all.wait_with_timeout(timeout).await.is_err() {
                let pending = self.pending_effects();
                tracing::error!(pending_effects = pending, "Shutdown timed out");
                return Err(StoreError::ShutdownTimeout(pending));
            }
            tracing::info!("All effects completed, shutdown successful");
            Ok(())
        }

        /// Reduce an action and start its effects, bypassing the shutdown gate
        async fn dispatch(&self, action: A) -> EffectHandle {
            self.dispatch_with(action, |_| ()).await.0
        }

        #[tracing::instrument(skip_all, name = "store_dispatch")]
        async fn dispatch_with<F, T>(&self, action: A, inspect: F) -> (EffectHandle, T)
        where
            F: FnOnce(&S) -> T,
        {
            tracing::debug!(?action, "Processing action");
            metrics::counter!("store.actions.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let (effects, inspected) = {
                let mut state = self.state.write().await;
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                (effects, inspect(&*state))
            };

            tracing::trace!("Executing {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect, &tracking);
            }

            (handle, inspected)
        }

        /// Execute one effect
        ///
        /// - `None`: No-op
        /// - `Future`: Spawns the computation and feeds its action back
        /// - `Cancellable`: Like `Future`, registered under its id; a running
        ///   effect with the same id is aborted first
        /// - `Cancel`: Aborts the running effect with that id, if any
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Future(future) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    self.spawn_effect(future, tracking, None);
                },
                Effect::Cancellable { id, future } => {
                    tracing::trace!(%id, "Executing Effect::Cancellable");
                    metrics::counter!("store.effects.executed", "type" => "cancellable")
                        .increment(1);

                    let token = self.cancellations.token();
                    // Held across spawn so the task cannot release before it is registered.
                    let mut tasks = self.cancellations.lock();
                    if let Some((_, previous)) = tasks.remove(&id) {
                        tracing::debug!(%id, "Aborting in-flight effect replaced by a new one");
                        metrics::counter!("store.effects.cancelled").increment(1);
                        previous.abort();
                    }
                    let task = self.spawn_effect(future, tracking, Some((id, token)));
                    tasks.insert(id, (token, task));
                },
                Effect::Cancel(id) => {
                    if self.cancellations.cancel(id) {
                        tracing::debug!(%id, "Cancelled in-flight effect");
                        metrics::counter!("store.effects.cancelled").increment(1);
                    } else {
                        tracing::trace!(%id, "Nothing to cancel");
                    }
                },
            }
        }

        fn spawn_effect(
            &self,
            future: BoxFuture<'static, Option<A>>,
            tracking: &EffectTracking,
            registration: Option<(EffectId, u64)>,
        ) -> tokio::task::AbortHandle {
            tracking.increment();
            self.pending.increment();
            let guard = DecrementGuard(tracking.clone());
            let pending_guard = DecrementGuard(self.pending.clone());
            let store = self.clone();

            let task = tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;

                let produced = future.await;
                if let Some((id, token)) = registration {
                    store.cancellations.release(id, token);
                }

                match produced {
                    Some(action) => {
                        tracing::trace!("Effect produced an action, sending to store");
                        let mut child = store.dispatch(action.clone()).await;
                        // Broadcast after reducing so observers see the resulting state
                        let _ = store.action_broadcast.send(action);
                        child.wait().await;
                    },
                    None => tracing::trace!("Effect completed with no action"),
                }
            });

            task.abort_handle()
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                pending: self.pending.clone(),
                cancellations: Arc::clone(&self.cancellations),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
