use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ColloquyError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            endpoint: None,
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_model() -> String {
    "claude-3-5-sonnet-latest".into()
}

fn default_max_tokens() -> u32 {
    1024
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_max_iterations() -> u32 {
    crate::agent::DEFAULT_MAX_ITERATIONS
}

fn default_system_prompt() -> String {
    "You are a helpful assistant with access to tools. Use them when they help answer the user's question.".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|err| ColloquyError::Config(format!("failed to parse configuration: {err}")))
    }

    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Load from `path` when it exists, otherwise start from defaults;
    /// environment variables override either way.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = if path.as_ref().exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(host) = env::var("COLLOQUY_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("COLLOQUY_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                self.server.port = parsed;
            }
        }
        if let Ok(key) = env::var("COLLOQUY_API_KEY") {
            self.model.api_key = Some(key);
        } else if let Ok(key) = env::var("ANTHROPIC_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Ok(endpoint) = env::var("COLLOQUY_ENDPOINT") {
            self.model.endpoint = Some(endpoint);
        }
        if let Ok(model) = env::var("COLLOQUY_MODEL") {
            self.model.model = model;
        }
        if let Ok(max_tokens) = env::var("COLLOQUY_MAX_TOKENS") {
            if let Ok(parsed) = max_tokens.parse::<u32>() {
                self.model.max_tokens = parsed;
            }
        }
        if let Ok(max_iterations) = env::var("COLLOQUY_MAX_ITERATIONS") {
            if let Ok(parsed) = max_iterations.parse::<u32>() {
                self.agent.max_iterations = parsed;
            }
        }
        if let Ok(prompt) = env::var("COLLOQUY_SYSTEM_PROMPT") {
            self.agent.system_prompt = prompt;
        }
    }
}
