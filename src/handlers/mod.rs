//! handlers/mod.rs
//! Módulo que agrupa los distintos handlers (chat, RAG, knowledge graph).
pub mod chat_handler;
pub mod kg_handler;
pub mod rag_handler;
