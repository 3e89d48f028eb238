//! config/llm_config.rs
//! Variables de entorno del proveedor LLM (OpenAI o Azure OpenAI).

use serde::{Deserialize, Serialize};
use std::env;

pub const OPENAI_API_TYPE: &str = "OPENAI_API_TYPE";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const OPENAI_DEPLOYMENT_NAME: &str = "OPENAI_DEPLOYMENT_NAME";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const OPENAI_API_VERSION: &str = "OPENAI_API_VERSION";
pub const OPENAI_EMBEDDING_MODEL: &str = "OPENAI_EMBEDDING_MODEL";
pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_OPENAI_EMBEDDING_DEPLOYMENT: &str = "AZURE_OPENAI_EMBEDDING_DEPLOYMENT";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Datos para hablar con Azure OpenAI (la key es del servidor, no del cliente).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    pub endpoint: String,
    pub deployment_name: String,
    pub model: String,
    pub api_version: String,
    pub api_key: String,
    pub embedding_deployment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "azure" activa AzureConfig; cualquier otro valor usa la API compatible con OpenAI
    pub api_type: Option<String>,
    pub api_key: Option<String>,
    pub base_url: String,
    pub embedding_model: String,
    pub deployment_name: Option<String>,
    pub model: Option<String>,
    pub api_version: Option<String>,
    pub azure_endpoint: Option<String>,
    pub azure_embedding_deployment: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            api_type: None,
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            deployment_name: None,
            model: None,
            api_version: None,
            azure_endpoint: None,
            azure_embedding_deployment: None,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        LlmConfig {
            api_type: non_empty_var(OPENAI_API_TYPE),
            api_key: non_empty_var(OPENAI_API_KEY),
            base_url: non_empty_var(OPENAI_BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            embedding_model: non_empty_var(OPENAI_EMBEDDING_MODEL)
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            deployment_name: non_empty_var(OPENAI_DEPLOYMENT_NAME),
            model: non_empty_var(OPENAI_MODEL),
            api_version: non_empty_var(OPENAI_API_VERSION),
            azure_endpoint: non_empty_var(AZURE_OPENAI_ENDPOINT),
            azure_embedding_deployment: non_empty_var(AZURE_OPENAI_EMBEDDING_DEPLOYMENT),
        }
    }

    pub fn is_azure(&self) -> bool {
        self.api_type
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case("azure"))
            .unwrap_or(false)
    }

    /// Construye la config de Azure; falla si falta alguna variable obligatoria.
    pub fn azure(&self) -> anyhow::Result<AzureConfig> {
        fn required(value: &Option<String>, name: &str) -> anyhow::Result<String> {
            value
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Falta la variable de entorno {}", name))
        }

        Ok(AzureConfig {
            endpoint: required(&self.azure_endpoint, AZURE_OPENAI_ENDPOINT)?
                .trim_end_matches('/')
                .to_string(),
            deployment_name: required(&self.deployment_name, OPENAI_DEPLOYMENT_NAME)?,
            model: required(&self.model, OPENAI_MODEL)?,
            api_version: required(&self.api_version, OPENAI_API_VERSION)?,
            api_key: required(&self.api_key, OPENAI_API_KEY)?,
            embedding_deployment: self.azure_embedding_deployment.clone(),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
