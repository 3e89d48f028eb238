//! services/kg_service.rs
//! Estado de conexión del knowledge graph (Neo4j, puerto bolt).

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::{net::TcpStream, time::timeout};

use crate::models::rag_model::ConnectionArgs;
use crate::services::connection_service::DEFAULT_KG_PORT;

#[derive(Clone, Debug)]
pub struct KgService {
    connect_timeout: Duration,
}

impl KgService {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Intenta abrir una conexión TCP al puerto bolt dentro del timeout.
    pub async fn get_connection_status(&self, connection_args: &ConnectionArgs) -> Result<bool> {
        let host = connection_args.host.trim();
        let port: u16 = connection_args
            .port
            .as_deref()
            .unwrap_or(DEFAULT_KG_PORT)
            .trim()
            .parse()
            .with_context(|| format!("Puerto inválido: {:?}", connection_args.port))?;

        match timeout(self.connect_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(e)) => {
                log::warn!("Knowledge graph en {}:{} no responde: {}", host, port, e);
                Ok(false)
            }
            Err(_) => {
                log::warn!("Timeout conectando al knowledge graph en {}:{}", host, port);
                Ok(false)
            }
        }
    }
}
