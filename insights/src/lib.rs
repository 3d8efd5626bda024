//! # SciPub Insights
//!
//! AI-generated publication insights for the storefront detail view.
//!
//! The crate has two layers:
//!
//! - A small client for the Anthropic Messages API ([`AnthropicClient`])
//! - [`ClaudeInsightsGateway`], which implements the
//!   [`InsightsGateway`](scipub_core::environment::InsightsGateway) port on
//!   top of that client
//!
//! [`OfflineInsights`] stands in when no API key is configured.
//!
//! ## Example
//!
//! ```no_run
//! use scipub_insights::{AnthropicClient, ClaudeInsightsGateway};
//! use scipub_core::environment::{InsightsGateway, InsightsRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create client from ANTHROPIC_API_KEY environment variable
//!     let client = AnthropicClient::from_env()?;
//!     let gateway = ClaudeInsightsGateway::new(client);
//!
//!     let insights = gateway
//!         .generate(InsightsRequest {
//!             title: "Deep Learning".to_string(),
//!             author: "Ian Goodfellow".to_string(),
//!         })
//!         .await?;
//!
//!     println!("{}", insights.summary);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod gateway;
pub mod messages;
pub mod types;

// Re-export main types for convenience
pub use client::AnthropicClient;
pub use error::ClaudeError;
pub use gateway::{ClaudeInsightsGateway, OfflineInsights, parse_insights};
pub use messages::{MessagesRequest, MessagesResponse};
pub use types::{ContentBlock, Message, Role, StopReason, Usage};
