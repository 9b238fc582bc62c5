use std::{thread, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
   config::GptConfig,
   error::{GptError, Result},
   types::ModelTier,
};

/// Something that can answer a goal about a piece of content.
pub trait GoalCompletion {
   /// Complete `goal` for `content`. `fast` asks for the cheaper model tier,
   /// `large` for the large-context one.
   fn complete_goal(&self, content: &str, goal: &str, fast: bool, large: bool) -> Result<String>;
}

/// Lay out the goal ahead of the content it applies to.
pub fn build_goal_prompt(goal: &str, content: &str) -> String {
   format!("\n{goal}\n\n{content}\n")
}

#[derive(Debug, Serialize)]
struct Message<'a> {
   role:    &'a str,
   content: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
   model:             &'a str,
   messages:          Vec<Message<'a>>,
   max_tokens:        u32,
   temperature:       f32,
   top_p:             f32,
   frequency_penalty: f32,
   presence_penalty:  f32,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
   #[serde(default)]
   content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
   message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
   #[serde(default)]
   choices: Vec<Choice>,
}

/// Delay before retry number `attempt` (1-based): doubles each time, capped at
/// `u64::MAX`.
fn backoff_ms(initial_ms: u64, attempt: u32) -> u64 {
   1u64
      .checked_shl(attempt - 1)
      .map_or(u64::MAX, |factor| initial_ms.saturating_mul(factor))
}

/// Retry an API call with exponential backoff while its error is retryable
pub fn retry_api_call<F, T>(config: &GptConfig, mut f: F) -> Result<T>
where
   F: FnMut() -> Result<T>,
{
   let mut attempt = 0;

   loop {
      attempt += 1;

      match f() {
         Ok(result) => return Ok(result),
         Err(e) if e.is_retryable() && attempt < config.max_retries => {
            let delay_ms = backoff_ms(config.initial_backoff_ms, attempt);
            warn!("{e} - retry {attempt}/{} after {delay_ms}ms", config.max_retries);
            thread::sleep(Duration::from_millis(delay_ms));
         },
         Err(e) if e.is_retryable() => {
            return Err(GptError::ApiRetryExhausted {
               retries: config.max_retries,
               source:  Box::new(e),
            });
         },
         Err(e) => return Err(e),
      }
   }
}

/// [`GoalCompletion`] over an OpenAI-compatible `/chat/completions` API.
#[derive(Debug)]
pub struct CompletionClient {
   client: reqwest::blocking::Client,
   config: GptConfig,
}

impl CompletionClient {
   /// Build HTTP client with timeouts from config
   pub fn new(config: GptConfig) -> Result<Self> {
      let client = reqwest::blocking::Client::builder()
         .timeout(Duration::from_secs(config.request_timeout_secs))
         .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
         .build()?;
      Ok(Self { client, config })
   }

   fn request_once(&self, model: &str, prompt: &str) -> Result<String> {
      let config = &self.config;
      let request = ApiRequest {
         model,
         messages: vec![Message { role: "user", content: prompt }],
         max_tokens: config.max_tokens,
         temperature: config.temperature,
         top_p: config.top_p,
         frequency_penalty: config.frequency_penalty,
         presence_penalty: config.presence_penalty,
      };

      let mut request_builder = self
         .client
         .post(format!("{}/chat/completions", config.api_base_url.trim_end_matches('/')))
         .header("content-type", "application/json");

      // OpenAI reads the bearer token, Azure OpenAI reads `api-key`
      if let Some(ref api_key) = config.api_key {
         request_builder = request_builder
            .header("Authorization", format!("Bearer {api_key}"))
            .header("api-key", api_key);
      }

      let response = request_builder.json(&request).send()?;
      let status = response.status();

      if !status.is_success() {
         let body = response
            .text()
            .unwrap_or_else(|_| "Unknown error".to_string());
         return Err(GptError::ApiError { status: status.as_u16(), body });
      }

      let api_response: ApiResponse = response.json()?;
      api_response
         .choices
         .into_iter()
         .next()
         .and_then(|choice| choice.message.content)
         .map(|content| content.trim().to_string())
         .filter(|content| !content.is_empty())
         .ok_or(GptError::EmptyResponse)
   }
}

impl GoalCompletion for CompletionClient {
   fn complete_goal(&self, content: &str, goal: &str, fast: bool, large: bool) -> Result<String> {
      let prompt = build_goal_prompt(goal, content);
      let tier = ModelTier::select(fast, large, &prompt, &self.config);
      let model = tier.model(&self.config);
      debug!(%tier, model, "requesting completion");

      retry_api_call(&self.config, || self.request_once(model, &prompt))
   }
}
