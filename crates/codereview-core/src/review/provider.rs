//! Review-provider capability and provider selection from configuration.

use std::fmt;

use crate::config::{AiConfig, ProviderKind};
use crate::errors::{ReviewError, ReviewResult};

/// A backing service that turns a prompt into raw response text.
///
/// Implementations live outside this crate; the core only needs the
/// producer identity (`name`, `model`) for cache keys and the single
/// `analyze_code` call.
pub trait ReviewProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;
    fn analyze_code(&self, prompt: &str) -> ReviewResult<String>;
}

impl<P: ReviewProvider + ?Sized> ReviewProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    fn analyze_code(&self, prompt: &str) -> ReviewResult<String> {
        (**self).analyze_code(prompt)
    }
}

/// Connection settings of the configured provider, resolved once.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderSettings {
    Ollama { host: String, model: String },
    Claude { api_key: String, model: String },
    Gemini { api_key: String, model: String },
}

impl ProviderSettings {
    /// Fails when the selected hosted provider has no API key.
    pub fn from_config(ai: &AiConfig) -> ReviewResult<Self> {
        match ai.provider {
            ProviderKind::Ollama => Ok(ProviderSettings::Ollama {
                host: ai.ollama.host.clone(),
                model: ai.ollama.model.clone(),
            }),
            ProviderKind::Claude => {
                let api_key = required_key(
                    ai.claude.api_key.as_deref(),
                    "Claude",
                    "ANTHROPIC_API_KEY",
                    "claude",
                )?;
                Ok(ProviderSettings::Claude {
                    api_key,
                    model: ai.claude.model.clone(),
                })
            }
            ProviderKind::Gemini => {
                let api_key = required_key(
                    ai.gemini.api_key.as_deref(),
                    "Gemini",
                    "GEMINI_API_KEY",
                    "gemini",
                )?;
                Ok(ProviderSettings::Gemini {
                    api_key,
                    model: ai.gemini.model.clone(),
                })
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderSettings::Ollama { .. } => ProviderKind::Ollama,
            ProviderSettings::Claude { .. } => ProviderKind::Claude,
            ProviderSettings::Gemini { .. } => ProviderKind::Gemini,
        }
    }

    /// Producer id recorded in cache entries.
    pub fn producer_id(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderSettings::Ollama { model, .. }
            | ProviderSettings::Claude { model, .. }
            | ProviderSettings::Gemini { model, .. } => model,
        }
    }
}

// Keys never reach logs.
impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderSettings::Ollama { host, model } => f
                .debug_struct("Ollama")
                .field("host", host)
                .field("model", model)
                .finish(),
            ProviderSettings::Claude { model, .. } => f
                .debug_struct("Claude")
                .field("api_key", &"***")
                .field("model", model)
                .finish(),
            ProviderSettings::Gemini { model, .. } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("model", model)
                .finish(),
        }
    }
}

fn required_key(key: Option<&str>, label: &str, env: &str, section: &str) -> ReviewResult<String> {
    match key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => Ok(key.to_string()),
        None => Err(ReviewError::Config(format!(
            "{label} requires {env} or config.ai.{section}.apiKey"
        ))),
    }
}
