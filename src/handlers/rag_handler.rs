//! handlers/rag_handler.rs
//! Endpoints de documentos RAG (vector store).

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use std::path::Path;

use crate::handlers::chat_handler::authorization_header;
use crate::models::error_model::{ErrorResponse, ERROR_OK};
use crate::models::rag_model::{
    AllDocumentsResponse, ConnectionStatusRequest, ConnectionStatusResponse,
    NewDocumentResponse, RagAllDocumentsRequest, RagDocumentDeleteRequest,
    RagNewDocumentRequest,
};
use crate::services::auth_service::resolve_auth;
use crate::services::connection_service::{process_connection_args, RagTarget};
use crate::services::conversation_service::ConversationService;
use crate::services::document_service::DocumentService;

/// POST /v1/rag/newdocument
pub async fn new_document_endpoint(
    req: HttpRequest,
    document_service: web::Data<DocumentService>,
    conversation_service: web::Data<ConversationService>,
    body: web::Json<RagNewDocumentRequest>,
) -> HttpResponse {
    let auth = resolve_auth(
        authorization_header(&req),
        conversation_service.server_api_key(),
    );
    let RagNewDocumentRequest {
        tmp_file,
        filename,
        rag_config,
    } = body.into_inner();

    let mut rag_config = match rag_config.into_config() {
        Ok(cfg) => cfg,
        Err(e) => return HttpResponse::Ok().json(ErrorResponse::from_error(&e)),
    };
    rag_config.connection_args = process_connection_args(
        RagTarget::VectorStore,
        std::mem::take(&mut rag_config.connection_args),
    );

    match document_service
        .new_document(auth.as_deref(), Path::new(&tmp_file), &filename, &rag_config)
        .await
    {
        Ok(id) => HttpResponse::Ok().json(NewDocumentResponse { id, code: ERROR_OK }),
        Err(e) => {
            log::error!("Error guardando documento '{}': {:?}", filename, e);
            HttpResponse::Ok().json(ErrorResponse::from_error(&e))
        }
    }
}

/// POST /v1/rag/alldocuments
pub async fn all_documents_endpoint(
    document_service: web::Data<DocumentService>,
    body: web::Json<RagAllDocumentsRequest>,
) -> HttpResponse {
    let req_data = body.into_inner();
    let connection_args =
        process_connection_args(RagTarget::VectorStore, req_data.connection_args);

    match document_service
        .get_all_documents(&connection_args, req_data.doc_ids.as_deref())
        .await
    {
        Ok(documents) => HttpResponse::Ok().json(AllDocumentsResponse {
            documents,
            code: ERROR_OK,
        }),
        Err(e) => {
            log::error!("Error listando documentos: {:?}", e);
            HttpResponse::Ok().json(ErrorResponse::from_error(&e))
        }
    }
}

/// DELETE /v1/rag/document
pub async fn remove_document_endpoint(
    document_service: web::Data<DocumentService>,
    body: web::Json<RagDocumentDeleteRequest>,
) -> HttpResponse {
    let req_data = body.into_inner();
    if req_data.doc_id.trim().is_empty() {
        return HttpResponse::Ok().json(json!({ "error": "Failed to find document" }));
    }
    let connection_args =
        process_connection_args(RagTarget::VectorStore, req_data.connection_args);

    match document_service
        .remove_document(
            &req_data.doc_id,
            &connection_args,
            req_data.doc_ids.as_deref(),
        )
        .await
    {
        Ok(_) => HttpResponse::Ok().json(NewDocumentResponse {
            id: req_data.doc_id,
            code: ERROR_OK,
        }),
        Err(e) => {
            log::error!("Error eliminando documento {}: {:?}", req_data.doc_id, e);
            HttpResponse::Ok().json(ErrorResponse::from_error(&e))
        }
    }
}

/// POST /v1/rag/connectionstatus
pub async fn connection_status_endpoint(
    document_service: web::Data<DocumentService>,
    body: web::Json<ConnectionStatusRequest>,
) -> HttpResponse {
    let connection_args =
        process_connection_args(RagTarget::VectorStore, body.into_inner().connection_args);

    match document_service.get_connection_status(&connection_args).await {
        Ok(connected) => HttpResponse::Ok().json(ConnectionStatusResponse::from_connected(connected)),
        Err(e) => HttpResponse::Ok().json(ErrorResponse::from_status_error(&e)),
    }
}
