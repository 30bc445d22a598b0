// src/config/mod.rs
// Central configuration for Vega, loaded from the environment once at startup

mod helpers;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VegaError};

/// Main configuration structure, built in main() and injected into the
/// components that need it. Not a global: tests construct their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VegaConfig {
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    pub server: ServerConfig,
}

impl VegaConfig {
    pub fn from_env() -> Self {
        // Don't panic if .env doesn't exist (for production)
        dotenvy::dotenv().ok();

        Self {
            llm: LlmConfig::from_env(),
            memory: MemoryConfig::from_env(),
            server: ServerConfig::from_env(),
        }
    }

    /// Validate config on startup
    pub fn validate(&self) -> Result<()> {
        self.llm.validate()
    }
}

/// Completion service configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: helpers::env_or("VEGA_API_KEY", ""),
            base_url: helpers::env_or("VEGA_BASE_URL", "https://api.openai.com/v1"),
            model: helpers::env_or("VEGA_MODEL", "gpt-4.1-mini"),
            temperature: helpers::env_parsed("VEGA_TEMPERATURE", 0.3),
            max_tokens: helpers::env_parsed("VEGA_MAX_TOKENS", 2000),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(VegaError::Config("VEGA_API_KEY is not set".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(VegaError::Config(format!(
                "VEGA_TEMPERATURE {} must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Session memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Retained window per session, counted in messages (not turns)
    pub window_size: usize,
}

impl MemoryConfig {
    pub fn from_env() -> Self {
        Self {
            window_size: helpers::env_usize("VEGA_MEMORY_WINDOW", DEFAULT_MEMORY_WINDOW),
        }
    }
}

/// Default retained window per session
pub const DEFAULT_MEMORY_WINDOW: usize = 25;

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: helpers::env_or("VEGA_HOST", "127.0.0.1"),
            port: helpers::env_parsed("VEGA_PORT", 8080),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
