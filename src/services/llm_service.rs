//! services/llm_service.rs
//! Cliente HTTP para el proveedor LLM (API compatible con OpenAI o Azure OpenAI):
//! chat completions y embeddings.

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

use crate::config::llm_config::{AzureConfig, LlmConfig};
use crate::models::chat_model::{Message, ModelConfig, Usage};

/// Cantidad máxima de textos por request de embeddings
const EMBEDDING_BATCH_SIZE: usize = 64;

/// A dónde y con qué credenciales se manda un chat completion
#[derive(Debug, Clone)]
pub enum LlmEndpoint {
    OpenAi { api_key: String },
    Azure(AzureConfig),
}

#[derive(Clone)]
pub struct LlmService {
    client: Client,
    config: Arc<LlmConfig>,
}

#[derive(Debug, Serialize)]
struct ProviderChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProviderChatResponse {
    choices: Vec<ProviderChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ProviderChoice {
    message: ProviderMessage,
}

#[derive(Debug, Deserialize)]
struct ProviderMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl LlmService {
    pub fn new(config: LlmConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("No se pudo crear el cliente HTTP del LLM")?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Manda la conversación completa y devuelve el texto del asistente.
    pub async fn chat_completion(
        &self,
        endpoint: &LlmEndpoint,
        model_config: &ModelConfig,
        messages: &[Message],
    ) -> Result<(String, Option<Usage>)> {
        let (builder, model) = match endpoint {
            LlmEndpoint::OpenAi { api_key } => (
                self.client
                    .post(format!("{}/chat/completions", self.config.base_url))
                    .bearer_auth(api_key),
                model_config.model.as_str(),
            ),
            LlmEndpoint::Azure(azure) => (
                self.azure_request(azure, &azure.deployment_name, "chat/completions"),
                azure.model.as_str(),
            ),
        };

        let request = ProviderChatRequest {
            model,
            messages,
            temperature: model_config.temperature,
            presence_penalty: model_config.presence_penalty,
            frequency_penalty: model_config.frequency_penalty,
            top_p: model_config.top_p,
            max_tokens: model_config.max_tokens,
        };

        log::debug!(
            "(chat_completion) modelo={} mensajes={}",
            model,
            messages.len()
        );

        let response = builder
            .json(&request)
            .send()
            .await
            .context("Fallo enviando request de chat completions")?;
        let response = check_status(response, "chat completions").await?;

        let parsed: ProviderChatResponse = response
            .json()
            .await
            .context("No se pudo parsear la respuesta de chat completions")?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("La respuesta del LLM no trae choices"))?;

        Ok((choice.message.content.unwrap_or_default(), parsed.usage))
    }

    /// Calcula embeddings en lotes, preservando el orden de `texts`.
    pub async fn embed(&self, api_key: Option<&str>, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBEDDING_BATCH_SIZE) {
            vectors.extend(self.embed_batch(api_key, batch).await?);
        }
        Ok(vectors)
    }

    async fn embed_batch(&self, api_key: Option<&str>, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let azure = if self.config.is_azure() {
            match self.config.azure_embedding_deployment.as_deref() {
                Some(deployment) => Some((self.config.azure()?, deployment)),
                None => None,
            }
        } else {
            None
        };

        let (builder, model) = match &azure {
            Some((azure_cfg, deployment)) => {
                (self.azure_request(azure_cfg, deployment, "embeddings"), None)
            }
            None => {
                let key = api_key
                    .or(self.config.api_key.as_deref())
                    .ok_or_else(|| anyhow!("Falta la API key para calcular embeddings"))?;
                (
                    self.client
                        .post(format!("{}/embeddings", self.config.base_url))
                        .bearer_auth(key),
                    Some(self.config.embedding_model.as_str()),
                )
            }
        };

        let response = builder
            .json(&EmbeddingRequest {
                model,
                input: texts,
            })
            .send()
            .await
            .context("Fallo enviando request de embeddings")?;
        let response = check_status(response, "embeddings").await?;

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .context("No se pudo parsear la respuesta de embeddings")?;

        if parsed.data.len() != texts.len() {
            return Err(anyhow!(
                "Se esperaban {} embeddings y llegaron {}",
                texts.len(),
                parsed.data.len()
            ));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn azure_request(&self, azure: &AzureConfig, deployment: &str, path: &str) -> RequestBuilder {
        self.client
            .post(format!(
                "{}/openai/deployments/{}/{}",
                azure.endpoint, deployment, path
            ))
            .query(&[("api-version", azure.api_version.as_str())])
            .header("api-key", &azure.api_key)
    }
}

async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(anyhow!("Error de la API de {} ({}): {}", what, status, body))
}
