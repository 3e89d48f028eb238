//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod chat_model;
pub mod error_model;
pub mod rag_model;
