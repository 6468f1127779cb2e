//! Classification through an external chat-completion service.
//!
//! [`ClassificationService`] is the only network seam; [`TweetClassifier`] builds the prompt,
//! applies the retry policy and hands the reply to a [`ReplyParser`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{Result, TriageError};
use crate::models::{ParsedReply, RawModelReply, Sentiment};
use crate::reply_parser::{LineReplyParser, ReplyParser, CATEGORY_LABELS, SCORE_MARKER};

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instruction message
    System,
    /// Tweet content
    User,
    /// Model reply
    Assistant,
}

/// One message of a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System instruction message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// User message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// A text-generation backend answering chat requests with free text
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Send `messages` and return the reply text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Build the system instruction sent before every tweet
#[must_use]
pub fn system_prompt() -> String {
    let sentiments = Sentiment::LABELS.map(|s| s.as_str()).join(", ");
    let categories = CATEGORY_LABELS.join(", ");
    format!(
        "Tu vas recevoir des tweets de plainte adressés à ENGIE et répondre toujours dans le format suivant :\n\
         1. Une ligne \"{SCORE_MARKER} : <nombre>\" notant la gravité de 0 à 100, 100 étant la situation la plus grave et 0 la moins grave.\n\
         2. Une ligne \"Sentiment : <sentiment>\" indiquant si le sentiment de l'utilisateur envers ENGIE est {sentiments}. Réponds juste par un de ces mots.\n\
         3. Une ligne \"Catégorie : <catégorie>\" choisie parmi : {categories}.\n\
         4. Si aucune catégorie ne convient, crée une nouvelle catégorie basée sur le contenu du tweet et écris-la seule sur la dernière ligne."
    )
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for a Mistral-compatible `/v1/chat/completions` endpoint
pub struct MistralClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl MistralClient {
    /// Create a client from configuration. Requires an API key.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let api_key = config
            .resolve_api_key()
            .ok_or_else(|| TriageError::InvalidConfig("no API key: set service.api_key or MISTRAL_API_KEY".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriageError::InvalidConfig(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Model identifier sent with each request
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ClassificationService for MistralClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TriageError::ClassificationService(format!("API error {status}: {error_text}")));
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TriageError::ClassificationService("reply contained no message content".to_string()))
    }
}

/// Retry policy around service calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retry
    pub const NONE: Self = Self {
        max_retries: 0,
        backoff: Duration::ZERO,
    };
}

impl From<&ServiceConfig> for RetryPolicy {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// Prompt → service → parser for one tweet at a time
pub struct TweetClassifier<S> {
    service: S,
    parser: Box<dyn ReplyParser>,
    retry: RetryPolicy,
    prompt: String,
}

impl<S: ClassificationService> TweetClassifier<S> {
    /// Classifier with the default line parser and no retries
    pub fn new(service: S) -> Self {
        Self {
            service,
            parser: Box::new(LineReplyParser::default()),
            retry: RetryPolicy::NONE,
            prompt: system_prompt(),
        }
    }

    /// Replace the reply parser
    #[must_use]
    pub fn with_parser(mut self, parser: Box<dyn ReplyParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Messages sent for `tweet_content`
    #[must_use]
    pub fn messages(&self, tweet_content: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.prompt.clone()), ChatMessage::user(tweet_content)]
    }

    /// Ask the service about one tweet and return its unparsed reply
    pub async fn classify(&self, tweet_content: &str) -> Result<RawModelReply> {
        let messages = self.messages(tweet_content);
        let mut attempt = 0u32;
        let mut delay = self.retry.backoff;

        loop {
            match self.service.complete(&messages).await {
                Ok(text) => {
                    debug!(attempt, reply_len = text.len(), "Received model reply");
                    return Ok(RawModelReply { text });
                },
                Err(e @ TriageError::ClassificationService(_)) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, delay_ms = delay.as_millis(), "Classification call failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                },
                Err(e) => return Err(e),
            }
        }
    }

    /// Parse a reply with the configured parser
    #[must_use]
    pub fn parse(&self, reply: &RawModelReply) -> ParsedReply {
        self.parser.parse(&reply.text)
    }

    /// Classify and parse in one step
    pub async fn classify_and_parse(&self, tweet_content: &str) -> Result<ParsedReply> {
        let reply = self.classify(tweet_content).await?;
        Ok(self.parse(&reply))
    }
}
