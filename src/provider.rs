//! Translation provider seam and the OpenAI implementation.
//!
//! The pipeline only ever talks to `TranslationProvider`; the OpenAI
//! client below is the production implementation, and tests swap in
//! scripted stubs. Providers must be thread-safe: the worker pool calls
//! them from many tasks at once with no ordering guarantees.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::Language;
use crate::config::Config;
use crate::error::TranslateError;

/// Verdict returned by quality evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationQuality {
    Good,
    Poor,
}

#[derive(Debug, Clone)]
pub struct QualityVerdict {
    pub quality: TranslationQuality,
    pub explanation: String,
}

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate one string. The comment, when present, is developer
    /// guidance passed through verbatim.
    async fn translate(
        &self,
        text: &str,
        source_language: &Language,
        target_language: &Language,
        comment: Option<&str>,
    ) -> Result<String>;

    /// Whether `evaluate_quality` is implemented.
    fn supports_evaluation(&self) -> bool {
        false
    }

    /// Judge an existing translation. Providers without this capability
    /// keep the default, which fails with `EvaluationNotSupported`.
    async fn evaluate_quality(
        &self,
        source: &str,
        translation: &str,
        language: &Language,
        comment: Option<&str>,
    ) -> Result<QualityVerdict> {
        let _ = (source, translation, language, comment);
        Err(TranslateError::EvaluationNotSupported.into())
    }
}

// ==================== OpenAI implementation ====================

/// OpenAI Chat Completion request structure
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_completion_tokens: u32,
    temperature: f32,
}

/// A message in the OpenAI chat format
#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Translation and evaluation over the OpenAI chat-completions endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.openai_api_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        }
    }

    async fn chat(&self, system_prompt: String, user_prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt,
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ],
            max_completion_tokens: 4096,
            temperature: 0.3,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("OpenAI API error ({}): {}", status, body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| TranslateError::NoTranslationReturned.into())
    }
}

/// Build the system prompt for translation
fn build_translation_system_prompt(source_language: &Language, target_language: &Language) -> String {
    format!(
        r#"You are a professional software localizer. Translate user-interface strings from {} to {}.

## Rules

- Preserve every format specifier exactly (%@, %d, %lld, %f, %s, %1$@, ...)
- Preserve every {{placeholder}} token exactly
- Preserve leading and trailing whitespace and newlines
- Do not translate product names, URLs, or technical identifiers
- Keep the register appropriate for a user interface: short and natural

Reply with the translated string only, no quotes and no commentary."#,
        source_language.code(),
        target_language.code()
    )
}

/// Build the user prompt for translation
fn build_translation_user_prompt(text: &str, comment: Option<&str>) -> String {
    match comment {
        Some(comment) => format!("Context from the developer: {}\n\n{}", comment, text),
        None => text.to_string(),
    }
}

/// Build the system prompt for quality evaluation
fn build_evaluation_system_prompt(language: &Language) -> String {
    format!(
        r#"You review translations of user-interface strings into {}.

Judge whether the translation is faithful, natural, and preserves every format specifier and placeholder.

Reply with a first line that is exactly "good" or "poor", followed by a short explanation on the next line."#,
        language.code()
    )
}

fn build_evaluation_user_prompt(source: &str, translation: &str, comment: Option<&str>) -> String {
    let mut prompt = String::new();
    if let Some(comment) = comment {
        prompt.push_str(&format!("Context from the developer: {}\n\n", comment));
    }
    prompt.push_str(&format!("Source: {}\nTranslation: {}", source, translation));
    prompt
}

/// Parse a `good`/`poor` verdict with trailing explanation.
fn parse_verdict(content: &str) -> Result<QualityVerdict> {
    let mut lines = content.trim().lines();
    let first = lines.next().unwrap_or_default().trim().to_lowercase();
    let explanation = lines.collect::<Vec<_>>().join("\n").trim().to_string();

    let quality = match first.trim_matches(|c: char| !c.is_alphanumeric()) {
        "good" => TranslationQuality::Good,
        "poor" => TranslationQuality::Poor,
        other => anyhow::bail!("Unexpected evaluation verdict: {:?}", other),
    };

    Ok(QualityVerdict {
        quality,
        explanation,
    })
}

#[async_trait]
impl TranslationProvider for OpenAiProvider {
    async fn translate(
        &self,
        text: &str,
        source_language: &Language,
        target_language: &Language,
        comment: Option<&str>,
    ) -> Result<String> {
        let system = build_translation_system_prompt(source_language, target_language);
        let user = build_translation_user_prompt(text, comment);
        self.chat(system, user).await
    }

    fn supports_evaluation(&self) -> bool {
        true
    }

    async fn evaluate_quality(
        &self,
        source: &str,
        translation: &str,
        language: &Language,
        comment: Option<&str>,
    ) -> Result<QualityVerdict> {
        let system = build_evaluation_system_prompt(language);
        let user = build_evaluation_user_prompt(source, translation, comment);
        let content = self.chat(system, user).await?;
        parse_verdict(&content)
    }
}
