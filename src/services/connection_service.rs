//! services/connection_service.rs
//! Normaliza los connectionArgs que manda el frontend.

use crate::models::rag_model::ConnectionArgs;

pub const DEFAULT_VECTORSTORE_PORT: &str = "19530";
pub const DEFAULT_KG_PORT: &str = "7687";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RagTarget {
    /// Milvus
    VectorStore,
    /// Neo4j
    KnowledgeGraph,
}

impl RagTarget {
    fn host_env_var(self) -> &'static str {
        match self {
            RagTarget::VectorStore => "HOST",
            RagTarget::KnowledgeGraph => "KGHOST",
        }
    }

    fn default_port(self) -> &'static str {
        match self {
            RagTarget::VectorStore => DEFAULT_VECTORSTORE_PORT,
            RagTarget::KnowledgeGraph => DEFAULT_KG_PORT,
        }
    }
}

/// Host "local" se resuelve con HOST/KGHOST (útil dentro de docker) y el
/// puerto faltante toma el default del servicio.
pub fn process_connection_args(target: RagTarget, args: ConnectionArgs) -> ConnectionArgs {
    let env_host = std::env::var(target.host_env_var()).ok();
    process_connection_args_with(target, args, env_host)
}

pub fn process_connection_args_with(
    target: RagTarget,
    mut args: ConnectionArgs,
    env_host: Option<String>,
) -> ConnectionArgs {
    if args.host.trim().eq_ignore_ascii_case("local") {
        args.host = env_host
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| "127.0.0.1".to_string());
    }

    let port = args
        .port
        .take()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| target.default_port().to_string());
    args.port = Some(port);

    args
}
