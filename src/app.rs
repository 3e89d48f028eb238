//! app.rs
use crate::handlers::{chat_handler, kg_handler, rag_handler};
use crate::models::error_model::{ErrorResponse, ERROR_UNKNOWN};
use actix_cors::Cors;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    web, Error, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::time::Duration;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .route(
                "/chat/completions",
                web::post().to(chat_handler::chat_completions_endpoint),
            )
            .service(
                web::scope("/rag")
                    .route(
                        "/newdocument",
                        web::post().to(rag_handler::new_document_endpoint),
                    )
                    .route(
                        "/alldocuments",
                        web::post().to(rag_handler::all_documents_endpoint),
                    )
                    .route(
                        "/document",
                        web::delete().to(rag_handler::remove_document_endpoint),
                    )
                    .route(
                        "/connectionstatus",
                        web::post().to(rag_handler::connection_status_endpoint),
                    ),
            )
            .route(
                "/kg/connectionstatus",
                web::post().to(kg_handler::kg_connection_status_endpoint),
            ),
    );
}

/// Cualquier origen, método y header.
pub fn cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _| true)
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}

/// Límite de tamaño del JSON y errores de parseo con el mismo formato que el resto.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let body = ErrorResponse::new(err.to_string(), ERROR_UNKNOWN);
            InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        })
}

/// Tiempo máximo para atender una request completa (handler + llamadas salientes).
/// Al vencer se corta el handler y se responde el JSON de error habitual.
#[derive(Clone, Copy)]
pub struct RequestTimeout {
    limit: Duration,
}

impl RequestTimeout {
    pub fn new(limit: Duration) -> Self {
        RequestTimeout { limit }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestTimeout
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequestTimeoutMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTimeoutMiddleware {
            service,
            limit: self.limit,
        }))
    }
}

pub struct RequestTimeoutMiddleware<S> {
    service: S,
    limit: Duration,
}

impl<S, B> Service<ServiceRequest> for RequestTimeoutMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let http_req = req.request().clone();
        let limit = self.limit;
        let fut = self.service.call(req);

        Box::pin(async move {
            match tokio::time::timeout(limit, fut).await {
                Ok(res) => res.map(|res| res.map_into_left_body()),
                Err(_) => {
                    log::error!(
                        "Timeout de {:?} atendiendo {} {}",
                        limit,
                        http_req.method(),
                        http_req.path()
                    );
                    let body = ErrorResponse::new(
                        format!("La solicitud superó el timeout de {:?}", limit),
                        ERROR_UNKNOWN,
                    );
                    let response = HttpResponse::Ok().json(body);
                    Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                }
            }
        })
    }
}
