//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants from
//! async blocks inside reducers.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use scipub_core::async_effect;
///
/// async_effect! {
///     let receipt = gateway.settle(request).await;
///     Some(StorefrontAction::SettlementSucceeded { checkout_id, receipt })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Cancellable` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use scipub_core::cancellable;
///
/// cancellable! {
///     id: INSIGHTS,
///     let result = gateway.generate(request).await;
///     Some(StorefrontAction::InsightsLoaded { request: token, insights: result? })
/// }
/// ```
#[macro_export]
macro_rules! cancellable {
    (id: $id:expr, $($body:tt)*) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            future: ::std::boxed::Box::pin(async move { $($body)* }),
        }
    };
}
