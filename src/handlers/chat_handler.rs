//! handlers/chat_handler.rs
//! Endpoint de chat compatible con OpenAI.

use actix_web::{http::header::AUTHORIZATION, web, HttpRequest, HttpResponse};

use crate::models::chat_model::{ChatCompletionsRequest, ChatCompletionsResponse};
use crate::models::error_model::ErrorResponse;
use crate::services::auth_service::resolve_auth;
use crate::services::connection_service::{process_connection_args, RagTarget};
use crate::services::conversation_service::ConversationService;

/// Header Authorization como &str, si viene y es válido.
pub fn authorization_header(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// POST /v1/chat/completions
pub async fn chat_completions_endpoint(
    req: HttpRequest,
    conversation_service: web::Data<ConversationService>,
    body: web::Json<ChatCompletionsRequest>,
) -> HttpResponse {
    let auth = resolve_auth(
        authorization_header(&req),
        conversation_service.server_api_key(),
    );
    let mut chat_req = body.into_inner();

    if let Some(rag_config) = chat_req.rag_config.as_mut() {
        rag_config.connection_args = process_connection_args(
            RagTarget::VectorStore,
            std::mem::take(&mut rag_config.connection_args),
        );
    }
    if let Some(kg_config) = chat_req.kg_config.as_mut() {
        kg_config.connection_args = process_connection_args(
            RagTarget::KnowledgeGraph,
            std::mem::take(&mut kg_config.connection_args),
        );
    }
    if chat_req.stream.unwrap_or(false) {
        log::warn!("stream=true no está soportado, se responde completo");
    }

    if !conversation_service
        .has_conversation(&chat_req.session_id)
        .await
    {
        if let Err(e) = conversation_service
            .initialize_conversation(&chat_req.session_id, chat_req.model_config())
            .await
        {
            log::error!("No se pudo inicializar la sesión {}: {:?}", chat_req.session_id, e);
            return HttpResponse::Ok().json(ErrorResponse::from_error(&e));
        }
    }

    match conversation_service
        .chat(&chat_req.session_id, &chat_req, auth.as_deref())
        .await
    {
        Ok(reply) => HttpResponse::Ok().json(ChatCompletionsResponse::from(reply)),
        Err(e) => HttpResponse::Ok().json(ErrorResponse::from_error(&e)),
    }
}
