//! config/mod.rs
//! Configuración leída del entorno (.env incluido).

pub mod llm_config;
pub mod server_config;
