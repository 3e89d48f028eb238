//! tests/conversation_tests.rs
//! Pruebas del conversation manager.

#[cfg(test)]
mod tests {
    use actix_rt::test;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::models::chat_model::{ChatCompletionsRequest, Message, ModelConfig};
    use crate::models::rag_model::RagConfig;
    use crate::services::conversation_service::{now_ms, ChatterKind};
    use crate::tests::{closed_port, connection_args, services_for};

    const MAX_AGE: i64 = 3 * 24 * 3600 * 1000;

    fn request_with(messages: Vec<Message>) -> ChatCompletionsRequest {
        ChatCompletionsRequest {
            messages,
            ..ChatCompletionsRequest::default()
        }
    }

    #[test]
    async fn test_get_conversation_creates_default_session() {
        let (service, _, _) = services_for("http://127.0.0.1:1", MAX_AGE);

        let conversation = service
            .get_conversation("balahbalah")
            .await
            .expect("sesión");
        assert_eq!(conversation.session_id, "balahbalah");
        assert_eq!(conversation.model_config, ModelConfig::default());
        assert!(matches!(conversation.chatter, ChatterKind::OpenAi));
        assert!(service.has_conversation("balahbalah").await);
    }

    #[test]
    async fn test_remove_conversation() {
        let (service, _, _) = services_for("http://127.0.0.1:1", MAX_AGE);
        let session_id = "test";

        assert!(!service.has_conversation(session_id).await);
        service
            .initialize_conversation(
                session_id,
                ModelConfig {
                    model: "gpt-3.5-turbo".to_string(),
                    ..ModelConfig::default()
                },
            )
            .await
            .expect("init");
        assert!(service.has_conversation(session_id).await);

        assert!(service.remove_conversation(session_id).await);
        assert!(!service.has_conversation(session_id).await);
        // borrar algo que no existe no falla
        assert!(!service.remove_conversation(session_id).await);
    }

    #[test]
    async fn test_chat_refreshes_session_and_keeps_config() {
        let (service, _, _) = services_for("http://127.0.0.1:1", MAX_AGE);
        let config = ModelConfig {
            model: "mistral-wasm".to_string(),
            temperature: 0.1,
            ..ModelConfig::default()
        };
        service
            .initialize_conversation("s", config.clone())
            .await
            .expect("init");
        let before = service.get_conversation("s").await.expect("sesión");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        service
            .chat("s", &request_with(vec![Message::new("user", "hola")]), None)
            .await
            .expect("chat");

        let after = service.get_conversation("s").await.expect("sesión");
        assert_eq!(after.model_config, config);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.refreshed_at > before.refreshed_at);
    }

    #[test]
    async fn test_mistral_wasm_session() {
        let (service, _, _) = services_for("http://127.0.0.1:1", MAX_AGE);
        service
            .initialize_conversation(
                "wasm",
                ModelConfig {
                    model: "mistral-wasm".to_string(),
                    ..ModelConfig::default()
                },
            )
            .await
            .expect("init");

        let request = request_with(vec![
            Message::new("system", "Eres un asistente"),
            Message::new("tool", "se descarta"),
            Message::new("user", "¿Qué es TP53?"),
        ]);
        let reply = service.chat("wasm", &request, None).await.expect("chat");

        assert_eq!(reply.content, "Eres un asistente\n¿Qué es TP53?");
        assert!(reply.usage.is_none());
        assert!(reply.contexts.is_empty());
    }

    #[test]
    async fn test_chat_without_messages_fails() {
        let (service, _, _) = services_for("http://127.0.0.1:1", MAX_AGE);
        let err = service
            .chat("s", &request_with(vec![]), Some("sk-test"))
            .await
            .expect_err("debería fallar");
        assert!(err.to_string().contains("mensajes"));
    }

    #[test]
    async fn test_chat_without_api_key_fails() {
        let (service, _, _) = services_for("http://127.0.0.1:1", MAX_AGE);
        let request = request_with(vec![Message::new("user", "hola")]);
        let err = service.chat("s", &request, None).await.expect_err("sin key");
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    async fn test_chat_calls_llm_with_history() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .body_contains("\"model\":\"gpt-4\"")
                    .body_contains("respuesta previa")
                    .body_contains("¿y ahora?");
                then.status(200).json_body(json!({
                    "id": "chatcmpl-1",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "Hola!"},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
                }));
            })
            .await;

        let (service, _, _) = services_for(&server.base_url(), MAX_AGE);
        let request = request_with(vec![
            Message::new("user", "hola"),
            Message::new("assistant", "respuesta previa"),
            Message::new("user", "¿y ahora?"),
        ]);

        let reply = service
            .chat("s", &request, Some("sk-test"))
            .await
            .expect("chat");

        mock.assert_async().await;
        assert_eq!(reply.content, "Hola!");
        assert_eq!(reply.usage.map(|u| u.total_tokens), Some(15));
    }

    #[test]
    async fn test_chat_propagates_llm_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(401).body("invalid api key");
            })
            .await;

        let (service, _, _) = services_for(&server.base_url(), MAX_AGE);
        let request = request_with(vec![Message::new("user", "hola")]);
        let err = service
            .chat("s", &request, Some("sk-bad"))
            .await
            .expect_err("401");
        assert!(err.to_string().contains("invalid api key"));
    }

    #[test]
    async fn test_rag_with_milvus_down_reports_connect_failure() {
        // Milvus caído: la búsqueda falla y el chat también
        let (service, _, _) = services_for("http://127.0.0.1:1", MAX_AGE);
        let mut request = request_with(vec![Message::new("user", "hola")]);
        request.use_rag = true;
        request.rag_config = Some(RagConfig {
            connection_args: connection_args("127.0.0.1", closed_port()),
            ..Default::default()
        });

        let err = service
            .chat("s", &request, Some("sk-test"))
            .await
            .expect_err("milvus caído");
        let resp = crate::models::error_model::ErrorResponse::from_error(&err);
        assert_eq!(resp.code, crate::models::error_model::ERROR_MILVUS_CONNECT_FAILED);
    }

    #[test]
    async fn test_rag_injects_retrieved_chunks() {
        let llm = MockServer::start_async().await;
        let embeddings = llm
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embeddings")
                    .body_contains("What does TP53 do?");
                then.status(200).json_body(json!({
                    "data": [{"index": 0, "embedding": [0.1, 0.9]}]
                }));
            })
            .await;
        let completion = llm
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .body_contains("\"role\":\"system\"")
                    .body_contains("TP53 regulates the cell cycle")
                    .body_contains("TP53 is a tumor suppressor");
                then.status(200).json_body(json!({
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "It regulates the cell cycle."}
                    }]
                }));
            })
            .await;

        let milvus = MockServer::start_async().await;
        milvus
            .mock_async(|when, then| {
                when.method(POST).path("/v2/vectordb/collections/has");
                then.status(200).json_body(json!({"code": 0, "data": {"has": true}}));
            })
            .await;
        let search = milvus
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/vectordb/entities/search")
                    .body_contains("DocumentEmbeddings")
                    .body_contains("meta_id in [7, 8]");
                then.status(200).json_body(json!({
                    "code": 0,
                    "data": [
                        {"id": 1, "distance": 0.93, "meta_id": 7,
                         "text": "TP53 regulates the cell cycle"},
                        {"id": 2, "distance": 0.81, "meta_id": 8,
                         "text": "TP53 is a tumor suppressor"}
                    ]
                }));
            })
            .await;

        let (service, _, _) = services_for(&llm.base_url(), MAX_AGE);
        let mut request = request_with(vec![Message::new("user", "What does TP53 do?")]);
        request.use_rag = true;
        request.rag_config = Some(RagConfig {
            connection_args: connection_args(&milvus.host(), milvus.port()),
            result_num: 2,
            doc_ids_workspace: Some(vec!["7".to_string(), "8".to_string()]),
            ..RagConfig::default()
        });

        let reply = service
            .chat("rag", &request, Some("sk-test"))
            .await
            .expect("chat con RAG");

        embeddings.assert_async().await;
        search.assert_async().await;
        completion.assert_async().await;
        assert_eq!(reply.content, "It regulates the cell cycle.");
        assert_eq!(
            serde_json::to_value(&reply.contexts).expect("contexts"),
            json!([{
                "mode": "vectorstore",
                "context": ["TP53 regulates the cell cycle", "TP53 is a tumor suppressor"]
            }])
        );
    }

    #[test]
    async fn test_recycle_removes_expired_sessions() {
        let (service, _, _) = services_for("http://127.0.0.1:1", 1_000);
        service
            .initialize_conversation("vieja", ModelConfig::default())
            .await
            .expect("init");
        service
            .initialize_conversation("nueva", ModelConfig::default())
            .await
            .expect("init");

        // todavía no vencen
        assert!(service.recycle_conversations(now_ms()).await.is_empty());
        assert_eq!(service.session_count().await, 2);

        let removed = service.recycle_conversations(now_ms() + 5_000).await;
        assert_eq!(removed.len(), 2);
        assert_eq!(service.session_count().await, 0);
    }

    #[test]
    async fn test_session_expiry_boundary() {
        let (service, _, _) = services_for("http://127.0.0.1:1", 1_000);
        let mut session = service.get_conversation("s").await.expect("sesión");
        session.refreshed_at = 10_000;

        assert!(!session.is_expired(10_500));
        assert!(!session.is_expired(11_000));
        assert!(session.is_expired(11_001));
    }

    #[test]
    async fn test_recycle_job_stops_on_cease() {
        let (service, _, _) = services_for("http://127.0.0.1:1", 0);
        service
            .initialize_conversation("s", ModelConfig::default())
            .await
            .expect("init");

        let job = crate::services::recycle_job::run_scheduled_job_continuously(
            service.clone(),
            std::time::Duration::from_millis(20),
        );
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        job.cease().await;

        assert!(!service.has_conversation("s").await);
    }
}
