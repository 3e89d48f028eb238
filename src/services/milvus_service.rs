//! services/milvus_service.rs
//! Cliente mínimo para la API REST v2 de Milvus (`/v2/vectordb/...`).

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::error_model::VectorStoreError;
use crate::models::rag_model::ConnectionArgs;

/// Límite de filas por query en Milvus
pub const MAX_QUERY_LIMIT: usize = 16384;

/// Sin este header la API REST devuelve los Int64 como strings
const ALLOW_INT64_HEADER: &str = "Accept-Type-Allow-Int64";

#[derive(Debug, Deserialize)]
struct MilvusResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

#[derive(Clone, Debug)]
pub struct MilvusClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl MilvusClient {
    /// `args` ya debe venir normalizado (host y puerto resueltos).
    /// `client` se comparte entre llamadas (un solo pool de conexiones).
    pub fn new(args: &ConnectionArgs, client: Client) -> Result<Self> {
        let host = args.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(anyhow!("connectionArgs.host está vacío"));
        }
        let port = args.port.as_deref().unwrap_or("19530");

        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, port)
        } else {
            format!("http://{}:{}", host, port)
        };

        let token = match (&args.user, &args.password) {
            (Some(user), password) if !user.is_empty() => Some(format!(
                "{}:{}",
                user,
                password.as_deref().unwrap_or_default()
            )),
            _ => None,
        };

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let mut builder = self
            .client
            .post(format!("{}/v2/vectordb/{}", self.base_url, path))
            .header(ALLOW_INT64_HEADER, "true")
            .json(&body);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                anyhow::Error::new(VectorStoreError::ConnectFailed(e))
            } else {
                anyhow::Error::new(e).context(format!("Fallo llamando a Milvus ({})", path))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(VectorStoreError::Api {
                code: i64::from(status.as_u16()),
                message: format!("Milvus respondió {}: {}", status, text),
            }
            .into());
        }

        let parsed: MilvusResponse = response
            .json()
            .await
            .with_context(|| format!("Respuesta inválida de Milvus ({})", path))?;

        // Algunas versiones responden 200 en lugar de 0
        if parsed.code != 0 && parsed.code != 200 {
            return Err(VectorStoreError::Api {
                code: parsed.code,
                message: parsed
                    .message
                    .unwrap_or_else(|| format!("Milvus error {}", parsed.code)),
            }
            .into());
        }

        Ok(parsed.data)
    }

    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let data = self.post("collections/list", json!({})).await?;
        Ok(serde_json::from_value(data).unwrap_or_default())
    }

    pub async fn has_collection(&self, name: &str) -> Result<bool> {
        let data = self
            .post("collections/has", json!({ "collectionName": name }))
            .await?;
        Ok(data.get("has").and_then(Value::as_bool).unwrap_or(false))
    }

    /// Crea la colección en modo "quick setup": id Int64 autogenerado,
    /// campo `vector` y campos dinámicos para el resto.
    pub async fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        self.post(
            "collections/create",
            json!({
                "collectionName": name,
                "dimension": dimension,
                "metricType": "COSINE",
                "primaryFieldName": "id",
                "idType": "Int64",
                "autoId": true,
                "vectorFieldName": "vector",
            }),
        )
        .await?;
        log::info!("Colección '{}' creada (dim={})", name, dimension);
        Ok(())
    }

    pub async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<()> {
        if !self.has_collection(name).await? {
            self.create_collection(name, dimension).await?;
        }
        Ok(())
    }

    /// Inserta filas y devuelve los ids generados.
    pub async fn insert(&self, collection: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        let data = self
            .post(
                "entities/insert",
                json!({ "collectionName": collection, "data": rows }),
            )
            .await?;
        Ok(data
            .get("insertIds")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    pub async fn query(
        &self,
        collection: &str,
        filter: &str,
        output_fields: &[&str],
        limit: usize,
    ) -> Result<Vec<Value>> {
        let data = self
            .post(
                "entities/query",
                json!({
                    "collectionName": collection,
                    "filter": filter,
                    "outputFields": output_fields,
                    "limit": limit.min(MAX_QUERY_LIMIT),
                }),
            )
            .await?;
        Ok(serde_json::from_value(data).unwrap_or_default())
    }

    pub async fn delete(&self, collection: &str, filter: &str) -> Result<()> {
        self.post(
            "entities/delete",
            json!({ "collectionName": collection, "filter": filter }),
        )
        .await?;
        Ok(())
    }

    pub async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&str>,
        output_fields: &[&str],
    ) -> Result<Vec<Value>> {
        let mut body = json!({
            "collectionName": collection,
            "data": [vector],
            "annsField": "vector",
            "limit": limit,
            "outputFields": output_fields,
        });
        if let Some(filter) = filter {
            body["filter"] = Value::String(filter.to_string());
        }
        let data = self.post("entities/search", body).await?;
        Ok(serde_json::from_value(data).unwrap_or_default())
    }
}

/// Arma un filtro `campo in [1, 2, ...]` a partir de ids en string.
pub fn id_filter(field: &str, ids: &[String]) -> Result<String> {
    let parsed = ids
        .iter()
        .map(|id| {
            id.trim()
                .parse::<i64>()
                .with_context(|| format!("Id de documento inválido: {:?}", id))
        })
        .collect::<Result<Vec<_>>>()?;
    let joined = parsed
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("{} in [{}]", field, joined))
}

/// Los ids Int64 llegan como número (o como string en algunos clientes).
pub fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Id Int64 de Milvus, venga como número o como string.
pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
