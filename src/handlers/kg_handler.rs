//! handlers/kg_handler.rs
use actix_web::{web, HttpResponse};

use crate::models::error_model::{ErrorResponse, ERROR_UNKNOWN};
use crate::models::rag_model::{ConnectionStatusRequest, ConnectionStatusResponse};
use crate::services::connection_service::{process_connection_args, RagTarget};
use crate::services::kg_service::KgService;

/// POST /v1/kg/connectionstatus
pub async fn kg_connection_status_endpoint(
    kg_service: web::Data<KgService>,
    body: web::Json<ConnectionStatusRequest>,
) -> HttpResponse {
    let connection_args =
        process_connection_args(RagTarget::KnowledgeGraph, body.into_inner().connection_args);

    match kg_service.get_connection_status(&connection_args).await {
        Ok(connected) => HttpResponse::Ok().json(ConnectionStatusResponse::from_connected(connected)),
        Err(e) => HttpResponse::Ok().json(ErrorResponse::new(format!("{:#}", e), ERROR_UNKNOWN)),
    }
}
