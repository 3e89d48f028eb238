//! tests/mod.rs
//! Helpers compartidos por las pruebas.

mod auth_tests;
mod connection_tests;
mod conversation_tests;
mod splitter_tests;

use std::time::Duration;

use crate::config::llm_config::LlmConfig;
use crate::models::rag_model::ConnectionArgs;
use crate::services::conversation_service::ConversationService;
use crate::services::document_service::DocumentService;
use crate::services::kg_service::KgService;
use crate::services::llm_service::LlmService;

pub(crate) const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn llm_service_for(base_url: &str) -> LlmService {
    let config = LlmConfig {
        base_url: base_url.to_string(),
        ..LlmConfig::default()
    };
    LlmService::new(config, TEST_TIMEOUT).expect("cliente LLM")
}

pub(crate) fn services_for(
    base_url: &str,
    max_age_ms: i64,
) -> (ConversationService, DocumentService, KgService) {
    let llm = llm_service_for(base_url);
    let documents = DocumentService::new(llm.clone(), TEST_TIMEOUT).expect("cliente Milvus");
    let conversations = ConversationService::new(llm, documents.clone(), max_age_ms);
    (conversations, documents, KgService::new(Duration::from_secs(1)))
}

/// Puerto donde no escucha nadie (el listener se cierra al salir).
pub(crate) fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr").port()
}

pub(crate) fn connection_args(host: &str, port: u16) -> ConnectionArgs {
    ConnectionArgs {
        host: host.to_string(),
        port: Some(port.to_string()),
        user: None,
        password: None,
    }
}
