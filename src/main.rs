use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;

use crate::config::llm_config::LlmConfig;
use crate::config::server_config::ServerConfig;
use crate::logger::init_logger;
use crate::services::conversation_service::ConversationService;
use crate::services::document_service::DocumentService;
use crate::services::kg_service::KgService;
use crate::services::llm_service::LlmService;
use crate::services::recycle_job::run_scheduled_job_continuously;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    let server_config = ServerConfig::from_env();
    init_logger(server_config.log_file.as_deref());
    for warning in &server_config.env_warnings {
        log::warn!("{}", warning);
    }

    let llm_config = LlmConfig::from_env();
    if llm_config.is_azure() {
        // Validar temprano: sin esto cada sesión fallaría al crearse
        if let Err(e) = llm_config.azure() {
            log::error!("Configuración de Azure incompleta: {:#}", e);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
        }
    }

    let llm_service = LlmService::new(llm_config, server_config.request_timeout())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let document_service = DocumentService::new(llm_service.clone(), server_config.request_timeout())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let kg_service = KgService::new(server_config.kg_connect_timeout());
    let conversation_service = ConversationService::new(
        llm_service,
        document_service.clone(),
        server_config.session_max_age_ms(),
    );

    // Job de reciclado de sesiones inactivas
    let recycle_job =
        run_scheduled_job_continuously(conversation_service.clone(), server_config.recycle_interval());

    // Levantar servidor
    log::info!(
        "Levantando servidor en {}:{} (workers={}, timeout={}s)",
        server_config.host,
        server_config.port,
        server_config.workers,
        server_config.request_timeout_secs
    );
    let json_limit = server_config.json_limit_bytes;
    let request_timeout = server_config.request_timeout();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(app::RequestTimeout::new(request_timeout))
            .wrap(app::cors())
            .wrap(Logger::default())
            .app_data(app::json_config(json_limit))
            .app_data(web::Data::new(conversation_service.clone()))
            .app_data(web::Data::new(document_service.clone()))
            .app_data(web::Data::new(kg_service.clone()))
            .configure(app::init_app)
    })
    .workers(server_config.workers)
    .bind((server_config.host.as_str(), server_config.port))?
    .run()
    .await;

    recycle_job.cease().await;
    server
}
