//! models/chat_model.rs
//! Request/response de /v1/chat/completions (formato compatible con OpenAI).

use serde::{Deserialize, Serialize};

use crate::models::rag_model::{KgConfig, OncoKbConfig, RagConfig};

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Message {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Todos los campos son opcionales: los que falten toman el valor por defecto.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatCompletionsRequest {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub model: String,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub top_p: f32,
    #[serde(rename = "useRAG")]
    pub use_rag: bool,
    #[serde(rename = "ragConfig")]
    pub rag_config: Option<RagConfig>,
    #[serde(rename = "useKG")]
    pub use_kg: bool,
    #[serde(rename = "kgConfig")]
    pub kg_config: Option<KgConfig>,
    pub stream: Option<bool>,
    #[serde(rename = "oncokbConfig")]
    pub oncokb_config: Option<OncoKbConfig>,
    #[serde(rename = "useAutoAgent")]
    pub use_auto_agent: Option<bool>,
}

impl Default for ChatCompletionsRequest {
    fn default() -> Self {
        ChatCompletionsRequest {
            session_id: String::new(),
            messages: vec![],
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            top_p: 1.0,
            use_rag: false,
            rag_config: None,
            use_kg: false,
            kg_config: None,
            stream: None,
            oncokb_config: None,
            use_auto_agent: None,
        }
    }
}

impl ChatCompletionsRequest {
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            presence_penalty: self.presence_penalty,
            frequency_penalty: self.frequency_penalty,
            top_p: self.top_p,
            ..ModelConfig::default()
        }
    }
}

/// Parámetros de generación asociados a una sesión
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub top_p: f32,
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            top_p: 1.0,
            max_tokens: Some(2000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Contexto inyectado en el prompt (p.e. los chunks del vector store)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InjectedContext {
    pub mode: String,
    pub context: Vec<String>,
}

/// Resultado de una consulta al conversation manager
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub usage: Option<Usage>,
    pub contexts: Vec<InjectedContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub index: u32,
    pub message: Message,
    pub finish_reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionsResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
    pub contexts: Vec<InjectedContext>,
    pub code: i32,
}

impl From<ChatReply> for ChatCompletionsResponse {
    fn from(reply: ChatReply) -> Self {
        ChatCompletionsResponse {
            choices: vec![Choice {
                index: 0,
                message: Message::new(ROLE_ASSISTANT, reply.content),
                finish_reason: "stop".to_string(),
            }],
            usage: reply.usage,
            contexts: reply.contexts,
            code: crate::models::error_model::ERROR_OK,
        }
    }
}
