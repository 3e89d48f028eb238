//! services/conversation_service.rs
//! Conversation manager: una sesión por `session_id`, con su configuración de
//! modelo y el backend LLM asociado. Las sesiones inactivas se reciclan.

use anyhow::{anyhow, Result};
use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use crate::config::llm_config::AzureConfig;
use crate::models::chat_model::{
    ChatCompletionsRequest, ChatReply, InjectedContext, Message, ModelConfig, ROLE_ASSISTANT,
    ROLE_SYSTEM, ROLE_USER,
};
use crate::services::document_service::DocumentService;
use crate::services::llm_service::{LlmEndpoint, LlmService};

pub const MISTRAL_WASM_MODEL: &str = "mistral-wasm";
pub const CONTEXT_MODE_VECTORSTORE: &str = "vectorstore";

const RAG_PROMPT: &str = "The following section contains information retrieved from the \
user's documents that may be relevant to the question. Use it only if it helps to answer; \
otherwise ignore it.";

/// Backend LLM de una sesión
#[derive(Debug, Clone)]
pub enum ChatterKind {
    /// API compatible con OpenAI, con la key del cliente
    OpenAi,
    /// Azure OpenAI con la key del servidor
    Azure(AzureConfig),
    /// El modelo corre en el navegador: devolvemos el prompt armado
    Wasm,
}

#[derive(Debug, Clone)]
pub struct SessionData {
    pub session_id: String,
    pub model_config: ModelConfig,
    pub chatter: ChatterKind,
    /// en milisegundos
    pub created_at: i64,
    pub refreshed_at: i64,
    pub max_age: i64,
}

impl SessionData {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.refreshed_at.saturating_add(self.max_age) < now_ms
    }
}

#[derive(Clone)]
pub struct ConversationService {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
    llm: LlmService,
    documents: DocumentService,
    max_age_ms: i64,
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl ConversationService {
    pub fn new(llm: LlmService, documents: DocumentService, max_age_ms: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            llm,
            documents,
            max_age_ms,
        }
    }

    /// OPENAI_API_KEY del servidor, usada cuando el cliente no manda Authorization
    pub fn server_api_key(&self) -> Option<&str> {
        self.llm.config().api_key.as_deref()
    }

    fn new_session(&self, session_id: &str, model_config: ModelConfig) -> Result<SessionData> {
        let chatter = if self.llm.config().is_azure() {
            log::info!("Creando sesión Azure para {}", session_id);
            ChatterKind::Azure(self.llm.config().azure()?)
        } else if model_config.model == MISTRAL_WASM_MODEL {
            log::info!("Creando sesión wasm para {}", session_id);
            ChatterKind::Wasm
        } else {
            log::info!("Creando sesión OpenAI para {}", session_id);
            ChatterKind::OpenAi
        };

        let now = now_ms();
        Ok(SessionData {
            session_id: session_id.to_string(),
            model_config,
            chatter,
            created_at: now,
            refreshed_at: now,
            max_age: self.max_age_ms,
        })
    }

    /// Crea (o reemplaza) la sesión.
    pub async fn initialize_conversation(
        &self,
        session_id: &str,
        model_config: ModelConfig,
    ) -> Result<()> {
        let session = self.new_session(session_id, model_config)?;
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), session);
        Ok(())
    }

    pub async fn has_conversation(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Devuelve una copia de la sesión; si no existe la crea con la config por defecto.
    pub async fn get_conversation(&self, session_id: &str) -> Result<SessionData> {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(session_id) {
            return Ok(session.clone());
        }
        let session = self.new_session(session_id, ModelConfig::default())?;
        sessions.insert(session_id.to_string(), session.clone());
        Ok(session)
    }

    pub async fn remove_conversation(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Marca actividad y devuelve la sesión (creándola si hace falta).
    async fn touch(&self, session_id: &str) -> Result<SessionData> {
        let mut session = self.get_conversation(session_id).await?;
        session.refreshed_at = now_ms();
        if let Some(stored) = self.sessions.write().await.get_mut(session_id) {
            stored.refreshed_at = session.refreshed_at;
        }
        Ok(session)
    }

    /// Responde al último mensaje de `request.messages`; los anteriores son el historial.
    /// El lock de sesiones no se mantiene durante las llamadas de red.
    pub async fn chat(
        &self,
        session_id: &str,
        request: &ChatCompletionsRequest,
        auth: Option<&str>,
    ) -> Result<ChatReply> {
        let (query, history) = request
            .messages
            .split_last()
            .ok_or_else(|| anyhow!("No se recibieron mensajes"))?;

        let session = self.touch(session_id).await?;
        log::info!(
            "Chat en sesión {} (modelo={}, useRAG={}, historial={})",
            session_id,
            session.model_config.model,
            request.use_rag,
            history.len()
        );

        if request.use_kg || request.use_auto_agent.unwrap_or(false) {
            log::info!("useKG/useAutoAgent no están soportados; se ignoran");
        }
        if request.oncokb_config.as_ref().map(|c| c.use_oncokb).unwrap_or(false) {
            log::info!("OncoKB no está soportado; se ignora");
        }

        let endpoint = match &session.chatter {
            ChatterKind::OpenAi => {
                let api_key = auth.ok_or_else(|| anyhow!("Falta la API key de OpenAI"))?;
                Some(LlmEndpoint::OpenAi {
                    api_key: api_key.to_string(),
                })
            }
            ChatterKind::Azure(azure) => Some(LlmEndpoint::Azure(azure.clone())),
            ChatterKind::Wasm => None,
        };

        let mut messages = setup_messages(history);
        let mut contexts = vec![];

        if request.use_rag {
            if let Some(rag_config) = &request.rag_config {
                let retrieved = self
                    .documents
                    .similarity_search(auth, &query.content, rag_config)
                    .await?;
                if !retrieved.is_empty() {
                    messages.push(Message::new(ROLE_SYSTEM, rag_system_prompt(&retrieved)));
                    contexts.push(InjectedContext {
                        mode: CONTEXT_MODE_VECTORSTORE.to_string(),
                        context: retrieved,
                    });
                }
            }
        }

        messages.push(Message::new(ROLE_USER, query.content.clone()));

        let Some(endpoint) = endpoint else {
            // wasm: el cliente ejecuta el modelo con este prompt
            let prompt = messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(ChatReply {
                content: prompt,
                usage: None,
                contexts,
            });
        };

        match self
            .llm
            .chat_completion(&endpoint, &session.model_config, &messages)
            .await
        {
            Ok((content, usage)) => Ok(ChatReply {
                content,
                usage,
                contexts,
            }),
            Err(e) => {
                log::error!("Error en chat de la sesión {}: {:?}", session_id, e);
                Err(e)
            }
        }
    }

    /// Elimina las sesiones vencidas y devuelve sus ids.
    pub async fn recycle_conversations(&self, now_ms: i64) -> Vec<String> {
        let expired: Vec<SessionData> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.is_expired(now_ms))
            .cloned()
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for session in expired {
            if self.remove_conversation(&session.session_id).await {
                log::info!(
                    "[recycle] sesión {} eliminada (creada={}, último uso={}, maxAge={})",
                    session.session_id,
                    session.created_at,
                    session.refreshed_at,
                    session.max_age
                );
                removed.push(session.session_id);
            }
        }
        removed
    }
}

/// Reconstruye el historial; roles desconocidos se descartan.
fn setup_messages(history: &[Message]) -> Vec<Message> {
    history
        .iter()
        .filter(|m| {
            let known = matches!(m.role.as_str(), ROLE_SYSTEM | ROLE_USER | ROLE_ASSISTANT);
            if !known {
                log::debug!("Mensaje con rol desconocido '{}' descartado", m.role);
            }
            known
        })
        .cloned()
        .collect()
}

fn rag_system_prompt(statements: &[String]) -> String {
    format!("{}\n\n{}", RAG_PROMPT, statements.join("\n\n"))
}
