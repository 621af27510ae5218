//! OpenAI chat-completion query expander.

use super::{parse_expansion, QueryExpander};
use crate::error::{FinnaError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based query expander.
pub struct OpenAIQueryExpander {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIQueryExpander {
    /// Create an expander using the given chat model.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl QueryExpander for OpenAIQueryExpander {
    #[instrument(skip(self), fields(query = %query))]
    async fn expand(&self, query: &str, n: usize) -> Result<Vec<String>> {
        let prompt = format!(
            "Generate {} search query variations for: \"{}\". \
             Return ONLY a JSON array without any formatting: [\"query1\", \"query2\", ...]",
            n, query
        );

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| FinnaError::OpenAI(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(|e| FinnaError::OpenAI(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| FinnaError::OpenAI(format!("Expansion API error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| FinnaError::MalformedExpansion("Empty response".to_string()))?;

        let mut queries = parse_expansion(content)?;
        queries.truncate(n);

        debug!("Expanded into {} variations", queries.len());
        Ok(queries)
    }
}
