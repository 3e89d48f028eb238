#[cfg(test)]
mod tests {
    use crate::config::server_config::env_or;
    use crate::models::rag_model::{ConnectionArgs, RagConfig, RagConfigField};
    use crate::services::connection_service::{process_connection_args_with, RagTarget};

    fn args(host: &str, port: Option<&str>) -> ConnectionArgs {
        ConnectionArgs {
            host: host.to_string(),
            port: port.map(str::to_string),
            user: None,
            password: None,
        }
    }

    #[test]
    fn test_local_host_uses_env_host() {
        let out = process_connection_args_with(
            RagTarget::VectorStore,
            args("LOCAL", None),
            Some("milvus-standalone".to_string()),
        );
        assert_eq!(out.host, "milvus-standalone");
        assert_eq!(out.port.as_deref(), Some("19530"));
    }

    #[test]
    fn test_local_host_without_env() {
        let out = process_connection_args_with(RagTarget::KnowledgeGraph, args("local", None), None);
        assert_eq!(out.host, "127.0.0.1");
        assert_eq!(out.port.as_deref(), Some("7687"));
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let out = process_connection_args_with(
            RagTarget::VectorStore,
            args("10.0.0.5", Some("19531")),
            Some("ignored".to_string()),
        );
        assert_eq!(out.host, "10.0.0.5");
        assert_eq!(out.port.as_deref(), Some("19531"));
    }

    #[test]
    fn test_port_accepts_numbers() {
        let parsed: ConnectionArgs =
            serde_json::from_str(r#"{"host": "local", "port": 19530}"#).expect("json");
        assert_eq!(parsed.port.as_deref(), Some("19530"));
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let mut a = args("h", None);
        a.password = Some("secreto".to_string());
        let dbg = format!("{:?}", a);
        assert!(!dbg.contains("secreto"));
    }

    #[test]
    fn test_rag_config_as_encoded_string() {
        let field: RagConfigField = serde_json::from_str(
            r#""{\"splitByChar\":false,\"chunkSize\":200,\"overlapSize\":20,\"resultNum\":5,\"connectionArgs\":{\"host\":\"local\",\"port\":\"19530\"}}""#,
        )
        .expect("json");
        let cfg: RagConfig = field.into_config().expect("config");
        assert!(!cfg.split_by_char);
        assert_eq!(cfg.chunk_size, 200);
        assert_eq!(cfg.overlap_size, 20);
        assert_eq!(cfg.result_num, 5);
    }

    #[test]
    fn test_rag_config_defaults() {
        let cfg: RagConfig = serde_json::from_str(r#"{"connectionArgs": {"host": "x"}}"#).expect("json");
        assert!(cfg.split_by_char);
        assert_eq!(cfg.chunk_size, 1000);
        assert_eq!(cfg.overlap_size, 0);
        assert_eq!(cfg.result_num, 3);
    }

    #[test]
    fn test_invalid_env_value_is_reported() {
        std::env::set_var("BIOCHATTER_TEST_BAD_NUMBER", "abc");
        let mut warnings = vec![];
        let value: u16 = env_or("BIOCHATTER_TEST_BAD_NUMBER", 5001, &mut warnings);

        assert_eq!(value, 5001);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("BIOCHATTER_TEST_BAD_NUMBER"));

        let missing: u64 = env_or("BIOCHATTER_TEST_MISSING", 180, &mut warnings);
        assert_eq!(missing, 180);
        assert_eq!(warnings.len(), 1);
    }
}
