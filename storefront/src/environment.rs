//! Storefront environment: the injected ports.

use crate::config::StorefrontConfig;
use futures::future::BoxFuture;
use scipub_core::environment::{
    Clock, InsightsGateway, SettlementError, SettlementGateway, SettlementReceipt,
    SettlementRequest, SystemClock,
};
use scipub_insights::{AnthropicClient, ClaudeInsightsGateway, OfflineInsights};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Dependencies of the storefront reducer
#[derive(Clone)]
pub struct StorefrontEnvironment {
    /// Time source for checkout and purchase timestamps
    pub clock: Arc<dyn Clock>,
    /// Payment port
    pub settlement: Arc<dyn SettlementGateway>,
    /// AI insights port
    pub insights: Arc<dyn InsightsGateway>,
    /// Timeouts and provider settings
    pub config: StorefrontConfig,
}

impl StorefrontEnvironment {
    /// Assemble an environment from explicit ports
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        settlement: Arc<dyn SettlementGateway>,
        insights: Arc<dyn InsightsGateway>,
        config: StorefrontConfig,
    ) -> Self {
        Self {
            clock,
            settlement,
            insights,
            config,
        }
    }

    /// Environment for running the storefront locally
    ///
    /// Uses the system clock and [`SimulatedSettlement`]. Insights come from
    /// Claude when `ANTHROPIC_API_KEY` is set and are unavailable otherwise.
    #[must_use]
    pub fn live(config: StorefrontConfig) -> Self {
        let insights: Arc<dyn InsightsGateway> = match AnthropicClient::from_env() {
            Ok(client) => {
                tracing::info!(model = %config.insights_model, "AI insights enabled");
                Arc::new(
                    ClaudeInsightsGateway::new(client)
                        .with_model(config.insights_model.clone())
                        .with_max_tokens(config.insights_max_tokens),
                )
            }
            Err(error) => {
                tracing::info!(%error, "AI insights disabled");
                Arc::new(OfflineInsights)
            }
        };

        Self::new(
            Arc::new(SystemClock),
            Arc::new(SimulatedSettlement::new(config.settlement_latency)),
            insights,
            config,
        )
    }
}

impl std::fmt::Debug for StorefrontEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontEnvironment")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Payment gateway that approves every payment after a fixed latency.
#[derive(Debug)]
pub struct SimulatedSettlement {
    latency: Duration,
    issued: AtomicU64,
}

impl SimulatedSettlement {
    /// Gateway that answers after `latency`
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self {
            latency,
            issued: AtomicU64::new(0),
        }
    }
}

impl SettlementGateway for SimulatedSettlement {
    fn settle(
        &self,
        request: SettlementRequest,
    ) -> BoxFuture<'_, Result<SettlementReceipt, SettlementError>> {
        Box::pin(async move {
            tokio::time::sleep(self.latency).await;
            let number = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(reference = %request.reference, amount = %request.amount, "simulated payment approved");
            Ok(SettlementReceipt {
                confirmation: format!("SIM-{number:06}"),
                reference: request.reference,
                amount: request.amount,
            })
        })
    }
}
