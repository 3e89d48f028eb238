//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod auth_service;
pub mod connection_service;
pub mod conversation_service;
pub mod document_service;
pub mod kg_service;
pub mod llm_service;
pub mod milvus_service;
pub mod recycle_job;
pub mod text_splitter;
