//! Model-backed generation: guaranteed action parsing with exponential
//! backoff, plus best-effort filler and topic helpers.

use std::time::Duration;

use {
    async_trait::async_trait,
    threadline_config::RetryConfig,
    tracing::{debug, error, info},
};

use crate::{
    error::{Error, Result},
    intent::{ActionFlags, parse_action_response},
};

const DEFAULT_TOPICS: [&str; 2] = ["Random Tech Chat", "AI Thoughts"];

/// A text model. Implementations decide which model and settings to use.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Backoff schedule for [`generate_with_retry`]. The delay before retry `n`
/// (zero-based) is `base_delay * multiplier^n`, saturating at the maximum
/// duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub multiplier: u32,
    /// `None` retries until the model answers.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1_000),
            multiplier: 2,
            max_attempts: None,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.base_delay_ms),
            multiplier: config.multiplier,
            max_attempts: config.max_attempts,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(self.multiplier.saturating_pow(retry))
    }
}

/// Ask the model for engagement actions until it answers.
///
/// Any answer counts as success since parsing cannot fail; only invocation
/// errors trigger a retry. Under a bounded policy the last failure is
/// reported as [`Error::RetriesExhausted`].
pub async fn generate_with_retry(
    generator: &dyn TextGenerator,
    prompt: &str,
    policy: &RetryPolicy,
) -> Result<ActionFlags> {
    let mut attempts: u32 = 0;
    loop {
        let failure = match generator.generate(prompt).await {
            Ok(response) => {
                let actions = parse_action_response(response.trim());
                debug!(?actions, attempts = attempts + 1, "parsed action response");
                return Ok(actions);
            },
            Err(source) => Error::ModelInvocation { source },
        };
        let retry = attempts;
        attempts = attempts.saturating_add(1);
        error!(attempt = attempts, error = %failure, "action generation failed");

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(Error::RetriesExhausted {
                attempts,
                last_error: failure.to_string(),
            });
        }

        let delay = policy.delay_for(retry);
        info!(
            attempt = attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "retrying action generation"
        );
        tokio::time::sleep(delay).await;
    }
}

/// One or two friendly sentences to fill a pause in a live conversation.
/// Returns an empty string when the model fails.
pub async fn generate_filler(generator: &dyn TextGenerator, filler_type: &str) -> String {
    let prompt = format!(
        "# INSTRUCTIONS:\n\
         Write a short filler message for a live audio conversation. \
         The filler type is \"{filler_type}\".\n\
         Keep it brief, friendly and on topic, at most two sentences.\n\
         Return only the text with no formatting.\n"
    );
    match generator.generate(&prompt).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            error!(filler_type, error = %e, "filler generation failed");
            String::new()
        },
    }
}

/// Topic ideas for a conversation with no configured topics. Falls back to
/// a fixed pair when the model fails or returns nothing usable.
pub async fn generate_topics_if_empty(generator: &dyn TextGenerator) -> Vec<String> {
    let prompt = "# INSTRUCTIONS:\n\
                  Suggest 5 short topic ideas for a live conversation about technology \
                  or other interesting subjects.\n\
                  Return them as one comma-separated list without numbering.\n";
    let topics: Vec<String> = match generator.generate(prompt).await {
        Ok(response) => response
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        Err(e) => {
            error!(error = %e, "topic generation failed");
            Vec::new()
        },
    };
    if topics.is_empty() {
        DEFAULT_TOPICS.iter().map(|t| (*t).to_string()).collect()
    } else {
        topics
    }
}
