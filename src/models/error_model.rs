//! models/error_model.rs
//! Códigos de error de la API y errores clasificados del vector store.

use serde::Serialize;
use thiserror::Error;

pub const ERROR_OK: i32 = 0;
pub const ERROR_UNKNOWN: i32 = 5000;
pub const ERROR_MILVUS_UNKNOWN: i32 = 5100;
pub const ERROR_MILVUS_CONNECT_FAILED: i32 = 5101;

pub const ERRSTR_MILVUS_CONNECT_FAILED: &str = "Failed to connect to Milvus server";

/// Errores de Milvus que los handlers traducen a códigos propios
#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("{}", ERRSTR_MILVUS_CONNECT_FAILED)]
    ConnectFailed(#[source] reqwest::Error),

    #[error("{message}")]
    Api { code: i64, message: String },
}

/// Respuesta de error genérica. Se devuelve con HTTP 200: el frontend
/// inspecciona `code`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: i32,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: i32) -> Self {
        ErrorResponse {
            error: error.into(),
            code,
        }
    }

    /// Clasifica un error de servicio buscando un `VectorStoreError` en la cadena.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let store_err = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<VectorStoreError>());

        match store_err {
            Some(VectorStoreError::ConnectFailed(_)) => {
                ErrorResponse::new(ERRSTR_MILVUS_CONNECT_FAILED, ERROR_MILVUS_CONNECT_FAILED)
            }
            Some(VectorStoreError::Api { message, .. }) => {
                ErrorResponse::new(message.clone(), ERROR_MILVUS_UNKNOWN)
            }
            None => ErrorResponse::new(format!("{:#}", err), ERROR_UNKNOWN),
        }
    }

    /// Igual que `from_error` pero sin distinguir fallos de conexión
    /// (los endpoints de estado ya reportan "disconnected" en ese caso).
    pub fn from_status_error(err: &anyhow::Error) -> Self {
        let mut resp = Self::from_error(err);
        if resp.code == ERROR_MILVUS_CONNECT_FAILED {
            resp.code = ERROR_MILVUS_UNKNOWN;
        }
        resp
    }
}
