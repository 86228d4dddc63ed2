use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatgpt::{client::ChatGPT, config::ChatGPTEngine};
use log::{debug, info};

use crate::quiz::error::GenerationError;

/// A single request/response exchange with a hosted text model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// `CompletionClient` backed by the OpenAI chat API.
///
/// Built without a key, it starts fine and fails every request with
/// `GenerationError::MissingApiKey`.
pub struct ChatGptClient {
    chat_gpt: Option<ChatGPT>,
}

impl ChatGptClient {
    pub fn new(
        api_key: Option<&str>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let chat_gpt = match api_key {
            Some(key) => {
                let mut gpt = ChatGPT::new(key)?;

                gpt.config.engine = engine(model);
                gpt.config.timeout = timeout;

                Some(gpt)
            }
            None => None,
        };
        Ok(Self { chat_gpt })
    }
}

fn engine(model: &str) -> ChatGPTEngine {
    match model {
        "gpt-3.5-turbo" => ChatGPTEngine::Gpt35Turbo,
        "gpt-4" => ChatGPTEngine::Gpt4,
        // Read once at startup, so leaking the name is bounded.
        other => ChatGPTEngine::Custom(Box::leak(other.to_owned().into_boxed_str())),
    }
}

#[async_trait]
impl CompletionClient for ChatGptClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let chat_gpt = self
            .chat_gpt
            .as_ref()
            .ok_or(GenerationError::MissingApiKey)?;

        let response = chat_gpt.send_message(prompt).await?;
        let content = response
            .message_choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(content)
    }
}

pub struct QuestionGenerator {
    client: Arc<dyn CompletionClient>,
}

impl QuestionGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Builds the instruction sent to the model, including worked examples
    /// of the block grammar the parser expects.
    pub fn build_prompt(topic: &str, count: usize) -> String {
        format!(
            "Create {count} multiple-choice questions about {topic}. \
            Each question should have exactly four options, and after each question, specify the correct answer. \
            For example: \n\
            Q1. What is the capital of Jordan?\n\
            Amman\nBaghdad\nJerusalem\nDamascus\n\nThe correct answer is Amman\n\n\
            Q2. What country is to the west of Jordan?\n\
            Syria\nEgypt\nPalestine\nSaudi Arabia\n\nThe correct answer is Palestine"
        )
    }

    /// Sends one completion request and returns the raw reply text.
    pub async fn generate(&self, topic: &str, count: usize) -> Result<String, GenerationError> {
        info!("Generating {} questions about {:?}", count, topic);
        let prompt = Self::build_prompt(topic, count);

        let content = self.client.complete(&prompt).await?;
        debug!("Completion ({} bytes): {:?}", content.len(), content);

        Ok(content)
    }
}
