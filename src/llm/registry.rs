//! Model registry for managing available LLM providers

use super::{all_models, LlmService, LoggingService, ModelDef, Provider};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_STRICT_TEMPERATURE: f32 = 0.0;

/// Configuration for LLM providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    /// Gateway URL that authenticates on our behalf
    pub gateway: Option<String>,
    pub default_model: Option<String>,
    /// Sampling temperature for conversational replies
    pub temperature: f32,
    /// Sampling temperature for extraction and scoring
    pub strict_temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            google_api_key: None,
            gateway: None,
            default_model: None,
            temperature: DEFAULT_TEMPERATURE,
            strict_temperature: DEFAULT_STRICT_TEMPERATURE,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let float = |name: &str, default: f32| {
            non_empty(name)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        Self {
            openai_api_key: non_empty(Provider::OpenAI.api_key_env_var()),
            google_api_key: non_empty(Provider::Gemini.api_key_env_var()),
            gateway: non_empty("LLM_GATEWAY"),
            default_model: non_empty("DEFAULT_MODEL"),
            temperature: float("LLM_TEMPERATURE", DEFAULT_TEMPERATURE),
            strict_temperature: float("LLM_STRICT_TEMPERATURE", DEFAULT_STRICT_TEMPERATURE),
        }
    }

    fn api_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Gemini => self.google_api_key.as_deref(),
        }
    }
}

/// Registry of available LLM models
pub struct ModelRegistry {
    services: HashMap<String, Arc<dyn LlmService>>,
    default_model: String,
}

impl ModelRegistry {
    pub fn new(config: &LlmConfig) -> Self {
        let mut services: HashMap<String, Arc<dyn LlmService>> = HashMap::new();

        for model_def in all_models() {
            if let Some(service) = Self::try_create_model(model_def, config) {
                services.insert(model_def.id.to_string(), service);
            }
        }

        let default_model = config
            .default_model
            .clone()
            .or_else(|| {
                if services.contains_key(DEFAULT_MODEL) {
                    Some(DEFAULT_MODEL.to_string())
                } else {
                    let mut ids: Vec<_> = services.keys().cloned().collect();
                    ids.sort();
                    ids.into_iter().next()
                }
            })
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            services,
            default_model,
        }
    }

    fn try_create_model(model_def: &ModelDef, config: &LlmConfig) -> Option<Arc<dyn LlmService>> {
        let api_key = if config.gateway.is_some() {
            "implicit"
        } else {
            config.api_key(model_def.provider)?
        };

        match (model_def.factory)(api_key, config.gateway.as_deref()) {
            Ok(service) => Some(Arc::new(LoggingService::new(service))),
            Err(e) => {
                tracing::warn!(model = model_def.id, error = %e, "Failed to create model service");
                None
            }
        }
    }

    /// Get the default model
    pub fn default_service(&self) -> Option<Arc<dyn LlmService>> {
        self.services.get(&self.default_model).cloned()
    }

    pub fn default_model_id(&self) -> &str {
        &self.default_model
    }

    /// List all available model IDs
    pub fn available_models(&self) -> Vec<String> {
        let mut models: Vec<_> = self.services.keys().cloned().collect();
        models.sort();
        models
    }
}
