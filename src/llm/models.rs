//! Centralized model definitions for all LLM providers

use super::gemini::{GeminiModel, GeminiService};
use super::openai::{OpenAIModel, OpenAIService};
use super::{LlmError, LlmService};
use std::sync::Arc;

/// LLM provider enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAI,
    Gemini,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Gemini => "Google",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Gemini => "GOOGLE_API_KEY",
        }
    }
}

/// Model definition with metadata
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// Model ID, also the provider's API name
    pub id: &'static str,
    pub provider: Provider,
    pub description: &'static str,
    /// Context window size in tokens
    pub context_window: usize,
    /// Factory taking the API key and optional gateway URL
    pub factory: fn(&str, Option<&str>) -> Result<Arc<dyn LlmService>, LlmError>,
}

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "gpt-4o-mini",
            provider: Provider::OpenAI,
            description: "GPT-4o mini (fast, inexpensive)",
            context_window: 128_000,
            factory: |api_key, gateway| {
                let svc = OpenAIService::new(api_key.to_string(), OpenAIModel::GPT4oMini, gateway)?;
                Ok(Arc::new(svc))
            },
        },
        ModelDef {
            id: "gpt-4o",
            provider: Provider::OpenAI,
            description: "GPT-4o",
            context_window: 128_000,
            factory: |api_key, gateway| {
                let svc = OpenAIService::new(api_key.to_string(), OpenAIModel::GPT4o, gateway)?;
                Ok(Arc::new(svc))
            },
        },
        ModelDef {
            id: "gemini-2.5-flash",
            provider: Provider::Gemini,
            description: "Gemini 2.5 Flash (fast)",
            context_window: 1_048_576,
            factory: |api_key, gateway| {
                let svc =
                    GeminiService::new(api_key.to_string(), GeminiModel::Gemini25Flash, gateway)?;
                Ok(Arc::new(svc))
            },
        },
        ModelDef {
            id: "gemini-2.5-pro",
            provider: Provider::Gemini,
            description: "Gemini 2.5 Pro (most capable)",
            context_window: 1_048_576,
            factory: |api_key, gateway| {
                let svc =
                    GeminiService::new(api_key.to_string(), GeminiModel::Gemini25Pro, gateway)?;
                Ok(Arc::new(svc))
            },
        },
    ]
}
