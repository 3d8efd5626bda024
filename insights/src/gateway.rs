//! [`InsightsGateway`] implementations
//!
//! [`ClaudeInsightsGateway`] asks Claude for a JSON object with a summary
//! and key takeaways, then validates the answer into [`Insights`].

use crate::client::AnthropicClient;
use crate::messages::{DEFAULT_MODEL, MessagesRequest};
use crate::types::Message;
use futures::future::BoxFuture;
use scipub_core::environment::{Insights, InsightsError, InsightsGateway, InsightsRequest};

const SYSTEM_PROMPT: &str = "You are a science librarian writing short briefings about \
books for readers of a scientific bookstore. Answer with a single JSON object and nothing \
else. The object has exactly two fields: \"summary\", a scientific summary of the book in \
at most three sentences, and \"keyTakeaways\", an array of three to five short strings.";

/// Insights gateway backed by the Anthropic Messages API
#[derive(Clone, Debug)]
pub struct ClaudeInsightsGateway {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl ClaudeInsightsGateway {
    /// Create a gateway with the default model and token budget
    #[must_use]
    pub fn new(client: AnthropicClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1024,
        }
    }

    /// Builder: Set model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder: Set max tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn request_for(&self, request: &InsightsRequest) -> MessagesRequest {
        MessagesRequest::new(vec![Message::user(format!(
            "Book: \"{}\" by {}.",
            request.title, request.author
        ))])
        .with_model(self.model.clone())
        .with_max_tokens(self.max_tokens)
        .with_system(SYSTEM_PROMPT)
    }
}

impl InsightsGateway for ClaudeInsightsGateway {
    fn generate(&self, request: InsightsRequest) -> BoxFuture<'_, Result<Insights, InsightsError>> {
        Box::pin(async move {
            tracing::debug!(title = %request.title, "requesting insights");
            let response = self.client.messages(self.request_for(&request)).await?;
            parse_insights(&response.text())
        })
    }
}

/// Parse and validate the model's answer
///
/// Accepts the bare JSON object or one wrapped in a Markdown code fence.
///
/// # Errors
///
/// Returns [`InsightsError::Malformed`] when the text is not an insights
/// object or its summary is blank.
pub fn parse_insights(text: &str) -> Result<Insights, InsightsError> {
    let body = strip_code_fence(text.trim());
    let mut insights: Insights =
        serde_json::from_str(body).map_err(|e| InsightsError::Malformed(e.to_string()))?;

    insights.summary = insights.summary.trim().to_string();
    if insights.summary.is_empty() {
        return Err(InsightsError::Malformed("summary is empty".to_string()));
    }
    insights.key_takeaways = insights
        .key_takeaways
        .into_iter()
        .map(|takeaway| takeaway.trim().to_string())
        .filter(|takeaway| !takeaway.is_empty())
        .collect();

    Ok(insights)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the first newline
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Gateway used when no provider is configured
///
/// Every request fails with [`InsightsError::Unavailable`], which the detail
/// view shows as an error panel.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineInsights;

impl InsightsGateway for OfflineInsights {
    fn generate(&self, _request: InsightsRequest) -> BoxFuture<'_, Result<Insights, InsightsError>> {
        Box::pin(async {
            Err(InsightsError::Unavailable(
                "set ANTHROPIC_API_KEY to enable AI insights".to_string(),
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn parses_plain_object() {
        let insights =
            parse_insights(r#"{"summary": " A primer. ", "keyTakeaways": ["One", " ", "Two "]}"#)
                .unwrap();
        assert_eq!(insights.summary, "A primer.");
        assert_eq!(insights.key_takeaways, vec!["One", "Two"]);
    }

    #[test]
    fn parses_fenced_object() {
        let text = "```json\n{\"summary\": \"Genes.\", \"keyTakeaways\": [\"DNA\"]}\n```\n";
        let insights = parse_insights(text).unwrap();
        assert_eq!(insights.summary, "Genes.");
        assert_eq!(insights.key_takeaways, vec!["DNA"]);
    }

    #[test]
    fn rejects_prose_and_blank_summaries() {
        assert!(matches!(
            parse_insights("Here are some thoughts about the book."),
            Err(InsightsError::Malformed(_))
        ));
        assert_eq!(
            parse_insights(r#"{"summary": "  ", "keyTakeaways": []}"#),
            Err(InsightsError::Malformed("summary is empty".to_string()))
        );
    }

    #[test]
    fn request_names_title_and_author() {
        let gateway = ClaudeInsightsGateway::new(AnthropicClient::new("key"))
            .with_model("claude-test")
            .with_max_tokens(256);
        let request = gateway.request_for(&InsightsRequest {
            title: "Deep Learning".to_string(),
            author: "Ian Goodfellow".to_string(),
        });

        assert_eq!(request.model, "claude-test");
        assert_eq!(request.max_tokens, 256);
        assert_eq!(
            request.messages,
            vec![Message::user("Book: \"Deep Learning\" by Ian Goodfellow.")]
        );
        assert!(request.system.is_some());
    }

    #[test]
    fn offline_gateway_is_unavailable() {
        let result = tokio_test::block_on(OfflineInsights.generate(InsightsRequest {
            title: "t".to_string(),
            author: "a".to_string(),
        }));
        assert!(matches!(result, Err(InsightsError::Unavailable(_))));
    }
}
