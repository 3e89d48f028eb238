//! services/document_service.rs
//! Document embedder: guarda documentos (metadata + chunks con embeddings) en
//! Milvus, los lista, los borra y hace búsquedas por similitud para RAG.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde_json::{json, Value};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

use crate::models::error_model::VectorStoreError;
use crate::models::rag_model::{ConnectionArgs, DocumentRecord, RagConfig};
use crate::services::llm_service::LlmService;
use crate::services::milvus_service::{
    id_filter, value_to_i64, value_to_id, MilvusClient, MAX_QUERY_LIMIT,
};
use crate::services::text_splitter::split_text;

pub const METADATA_COLLECTION: &str = "DocumentMetadata";
pub const EMBEDDINGS_COLLECTION: &str = "DocumentEmbeddings";
/// La colección de metadata no se busca por similitud; el vector es de relleno
const METADATA_DIMENSION: usize = 2;

/// Formatos de texto plano que sabemos leer
const SUPPORTED_FORMATS: &[&str] = &[
    "txt", "md", "markdown", "csv", "tsv", "json", "html", "htm", "xml", "rst", "log",
];

const METADATA_FIELDS: &[&str] = &["id", "name", "format", "size", "created_at"];

#[derive(Clone)]
pub struct DocumentService {
    llm: LlmService,
    /// Cliente HTTP compartido por todas las conexiones a Milvus
    client: Client,
}

impl DocumentService {
    pub fn new(llm: LlmService, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("No se pudo crear el cliente HTTP de Milvus")?;
        Ok(Self { llm, client })
    }

    fn connect(&self, args: &ConnectionArgs) -> Result<MilvusClient> {
        MilvusClient::new(args, self.client.clone())
    }

    /// Lee el archivo temporal, lo divide, calcula embeddings y lo guarda.
    /// Devuelve el id del documento.
    pub async fn new_document(
        &self,
        auth: Option<&str>,
        tmp_file: &Path,
        filename: &str,
        rag_config: &RagConfig,
    ) -> Result<String> {
        let format = document_format(filename)?;
        let text = tokio::fs::read_to_string(tmp_file)
            .await
            .with_context(|| format!("No se pudo leer el archivo {:?} como texto", tmp_file))?;

        let chunks = split_text(
            &text,
            rag_config.chunk_size,
            rag_config.overlap_size,
            rag_config.split_by_char,
        )?;
        if chunks.is_empty() {
            return Err(anyhow!("El documento '{}' está vacío", filename));
        }
        log::info!(
            "(new_document) '{}' dividido en {} chunks (chunkSize={}, overlap={})",
            filename,
            chunks.len(),
            rag_config.chunk_size,
            rag_config.overlap_size
        );

        let vectors = self.llm.embed(auth, &chunks).await?;
        let dimension = vectors
            .first()
            .map(Vec::len)
            .filter(|d| *d > 0)
            .ok_or_else(|| anyhow!("El modelo de embeddings devolvió vectores vacíos"))?;

        let milvus = self.connect(&rag_config.connection_args)?;
        milvus
            .ensure_collection(METADATA_COLLECTION, METADATA_DIMENSION)
            .await?;
        milvus.ensure_collection(EMBEDDINGS_COLLECTION, dimension).await?;

        let metadata = json!({
            "vector": vec![0.0f32; METADATA_DIMENSION],
            "name": filename,
            "format": format,
            "size": text.len(),
            "created_at": Utc::now().to_rfc3339(),
        });
        let meta_ids = milvus.insert(METADATA_COLLECTION, vec![metadata]).await?;
        let raw_id = meta_ids
            .first()
            .ok_or_else(|| anyhow!("Milvus no devolvió el id del documento"))?;
        // meta_id se guarda siempre como Int64: los filtros usan literales numéricos
        let meta_id = value_to_i64(raw_id)
            .ok_or_else(|| anyhow!("Id de documento inesperado: {}", raw_id))?;
        let doc_id = meta_id.to_string();

        let rows = chunks
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| json!({ "vector": vector, "text": text, "meta_id": meta_id }))
            .collect::<Vec<_>>();

        if let Err(e) = milvus.insert(EMBEDDINGS_COLLECTION, rows).await {
            // no dejamos metadata huérfana
            let filter = format!("id in [{}]", meta_id);
            if let Err(cleanup) = milvus.delete(METADATA_COLLECTION, &filter).await {
                log::error!("(new_document) No se pudo limpiar metadata {}: {:?}", doc_id, cleanup);
            }
            return Err(e.context(format!("Fallo guardando los chunks de '{}'", filename)));
        }

        log::info!("(new_document) Documento '{}' guardado con id={}", filename, doc_id);
        Ok(doc_id)
    }

    /// Lista la metadata de los documentos (opcionalmente sólo los de `doc_ids`).
    pub async fn get_all_documents(
        &self,
        connection_args: &ConnectionArgs,
        doc_ids: Option<&[String]>,
    ) -> Result<Vec<DocumentRecord>> {
        let milvus = self.connect(connection_args)?;
        if !milvus.has_collection(METADATA_COLLECTION).await? {
            return Ok(vec![]);
        }

        let filter = match doc_ids {
            Some([]) => return Ok(vec![]),
            Some(ids) => id_filter("id", ids)?,
            None => String::new(),
        };

        let rows = milvus
            .query(METADATA_COLLECTION, &filter, METADATA_FIELDS, MAX_QUERY_LIMIT)
            .await?;
        Ok(rows.iter().filter_map(document_from_row).collect())
    }

    /// Borra metadata y chunks. Si `doc_ids` viene y no contiene `doc_id`,
    /// no se borra nada y devuelve false.
    pub async fn remove_document(
        &self,
        doc_id: &str,
        connection_args: &ConnectionArgs,
        doc_ids: Option<&[String]>,
    ) -> Result<bool> {
        if let Some(ids) = doc_ids {
            if !ids.iter().any(|id| id == doc_id) {
                log::info!("(remove_document) {} no pertenece al workspace", doc_id);
                return Ok(false);
            }
        }

        let target = [doc_id.to_string()];
        let meta_filter = id_filter("id", &target)?;
        let chunk_filter = id_filter("meta_id", &target)?;

        let milvus = self.connect(connection_args)?;
        if milvus.has_collection(EMBEDDINGS_COLLECTION).await? {
            milvus.delete(EMBEDDINGS_COLLECTION, &chunk_filter).await?;
        }
        if milvus.has_collection(METADATA_COLLECTION).await? {
            milvus.delete(METADATA_COLLECTION, &meta_filter).await?;
        }
        log::info!("(remove_document) Documento {} eliminado", doc_id);
        Ok(true)
    }

    /// true si Milvus responde; false si no se pudo conectar.
    pub async fn get_connection_status(&self, connection_args: &ConnectionArgs) -> Result<bool> {
        let milvus = self.connect(connection_args)?;
        match milvus.list_collections().await {
            Ok(_) => Ok(true),
            Err(e) => match e.downcast_ref::<VectorStoreError>() {
                Some(VectorStoreError::ConnectFailed(_)) => {
                    log::warn!("Milvus en {} no responde", milvus.base_url());
                    Ok(false)
                }
                _ => Err(e),
            },
        }
    }

    /// Chunks más parecidos a `query`, restringidos al workspace si aplica.
    pub async fn similarity_search(
        &self,
        auth: Option<&str>,
        query: &str,
        rag_config: &RagConfig,
    ) -> Result<Vec<String>> {
        if rag_config.result_num == 0 {
            return Ok(vec![]);
        }

        let milvus = self.connect(&rag_config.connection_args)?;
        if !milvus.has_collection(EMBEDDINGS_COLLECTION).await? {
            log::info!("(similarity_search) Todavía no hay documentos embebidos");
            return Ok(vec![]);
        }

        let filter = match rag_config.doc_ids_workspace.as_deref() {
            Some(ids) if !ids.is_empty() => Some(id_filter("meta_id", ids)?),
            _ => None,
        };

        let vectors = self.llm.embed(auth, &[query.to_string()]).await?;
        let vector = vectors
            .first()
            .ok_or_else(|| anyhow!("No se obtuvo embedding para la consulta"))?;

        let hits = milvus
            .search(
                EMBEDDINGS_COLLECTION,
                vector,
                rag_config.result_num,
                filter.as_deref(),
                &["text", "meta_id"],
            )
            .await?;

        Ok(hits
            .iter()
            .filter_map(|hit| hit.get("text").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}

fn document_format(filename: &str) -> Result<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "txt".to_string());

    if SUPPORTED_FORMATS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(anyhow!("Formato de documento no soportado: {}", ext))
    }
}

fn document_from_row(row: &Value) -> Option<DocumentRecord> {
    let id = row.get("id").and_then(value_to_id)?;
    let text = |field: &str| {
        row.get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(DocumentRecord {
        id,
        name: text("name"),
        format: text("format"),
        size: row.get("size").and_then(Value::as_u64).unwrap_or(0),
        created_at: text("created_at"),
    })
}
