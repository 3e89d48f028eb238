//! models/rag_model.rs
//! Estructuras de requests/responses para RAG (vector store) y knowledge graph.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConnectionArgs {
    #[serde(default)]
    pub host: String,
    /// Los clientes lo mandan como string o como número
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

// El password nunca debe aparecer en los logs
impl fmt::Debug for ConnectionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionArgs")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortRepr {
        Text(String),
        Number(u64),
    }

    Ok(Option::<PortRepr>::deserialize(deserializer)?.map(|p| match p {
        PortRepr::Text(s) => s,
        PortRepr::Number(n) => n.to_string(),
    }))
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    1000
}

fn default_result_num() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagConfig {
    #[serde(default = "default_true")]
    pub split_by_char: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub overlap_size: usize,
    #[serde(default = "default_result_num")]
    pub result_num: usize,
    #[serde(default)]
    pub connection_args: ConnectionArgs,
    #[serde(default)]
    pub doc_ids_workspace: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        RagConfig {
            split_by_char: true,
            chunk_size: default_chunk_size(),
            overlap_size: 0,
            result_num: default_result_num(),
            connection_args: ConnectionArgs::default(),
            doc_ids_workspace: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KgConfig {
    #[serde(default = "default_result_num")]
    pub result_num: usize,
    #[serde(default)]
    pub connection_args: ConnectionArgs,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OncoKbConfig {
    #[serde(rename = "useOncoKB", default)]
    pub use_oncokb: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// `ragConfig` llega como JSON serializado en un string (form del frontend)
/// o como objeto.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RagConfigField {
    Encoded(String),
    Inline(RagConfig),
}

impl RagConfigField {
    pub fn into_config(self) -> Result<RagConfig> {
        match self {
            RagConfigField::Inline(cfg) => Ok(cfg),
            RagConfigField::Encoded(raw) => {
                serde_json::from_str(&raw).context("ragConfig no es un JSON válido")
            }
        }
    }
}

/// POST /v1/rag/newdocument
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagNewDocumentRequest {
    /// Ruta del archivo temporal ya subido al servidor
    pub tmp_file: String,
    pub filename: String,
    pub rag_config: RagConfigField,
}

/// POST /v1/rag/alldocuments
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagAllDocumentsRequest {
    pub connection_args: ConnectionArgs,
    #[serde(default)]
    pub doc_ids: Option<Vec<String>>,
}

/// DELETE /v1/rag/document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagDocumentDeleteRequest {
    pub connection_args: ConnectionArgs,
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub doc_ids: Option<Vec<String>>,
}

/// POST /v1/rag/connectionstatus y /v1/kg/connectionstatus
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusRequest {
    pub connection_args: ConnectionArgs,
}

/// Metadata de un documento guardado en el vector store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub id: String,
    pub name: String,
    pub format: String,
    pub size: u64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDocumentResponse {
    pub id: String,
    pub code: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllDocumentsResponse {
    pub documents: Vec<DocumentRecord>,
    pub code: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatusResponse {
    pub status: String,
    pub code: i32,
}

impl ConnectionStatusResponse {
    pub fn from_connected(connected: bool) -> Self {
        ConnectionStatusResponse {
            status: if connected { "connected" } else { "disconnected" }.to_string(),
            code: crate::models::error_model::ERROR_OK,
        }
    }
}
