//! config/server_config.rs
//! Configuración global del servidor (puerto, timeouts, reciclado de sesiones, etc.)

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Configuración del proceso HTTP, con valores por defecto
/// (se sobreescribe con variables de entorno / .env)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Timeout por request, en segundos (aplica también a las llamadas al LLM)
    pub request_timeout_secs: u64,
    /// Cada cuánto corre el job de reciclado de sesiones
    pub recycle_interval_secs: u64,
    /// Edad máxima de una sesión sin actividad
    pub session_max_age_secs: u64,
    pub kg_connect_timeout_secs: u64,
    pub json_limit_bytes: usize,
    /// Archivo de log adicional; `None` desactiva la salida a archivo
    pub log_file: Option<String>,
    /// Variables con valor inválido; se reportan cuando el logger ya está listo
    #[serde(skip)]
    pub env_warnings: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5001,
            workers: 1,
            request_timeout_secs: 180,
            recycle_interval_secs: 600,
            session_max_age_secs: 3 * 24 * 3600,
            kg_connect_timeout_secs: 5,
            json_limit_bytes: 10 * 1024 * 1024,
            log_file: Some("./logs/app.log".to_string()),
            env_warnings: vec![],
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = ServerConfig::default();
        let mut warnings = vec![];
        let log_file = match env::var("LOG_FILE") {
            Ok(path) if path.trim().is_empty() => None,
            Ok(path) => Some(path),
            Err(_) => defaults.log_file.clone(),
        };

        ServerConfig {
            host: env::var("BIND_HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port, &mut warnings),
            workers: env_or("WORKERS", defaults.workers, &mut warnings).max(1),
            request_timeout_secs: env_or(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
                &mut warnings,
            ),
            recycle_interval_secs: env_or(
                "RECYCLE_INTERVAL_SECS",
                defaults.recycle_interval_secs,
                &mut warnings,
            )
            .max(1),
            session_max_age_secs: env_or(
                "SESSION_MAX_AGE_SECS",
                defaults.session_max_age_secs,
                &mut warnings,
            ),
            kg_connect_timeout_secs: env_or(
                "KG_CONNECT_TIMEOUT_SECS",
                defaults.kg_connect_timeout_secs,
                &mut warnings,
            ),
            json_limit_bytes: env_or("JSON_LIMIT_BYTES", defaults.json_limit_bytes, &mut warnings),
            log_file,
            env_warnings: warnings,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn recycle_interval(&self) -> Duration {
        Duration::from_secs(self.recycle_interval_secs)
    }

    pub fn session_max_age_ms(&self) -> i64 {
        (self.session_max_age_secs as i64).saturating_mul(1000)
    }

    pub fn kg_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.kg_connect_timeout_secs)
    }
}

/// Lee una variable de entorno y la parsea; si no existe o es inválida usa el default.
/// Los valores inválidos se anotan en `warnings` (el logger todavía no existe).
pub(crate) fn env_or<T: FromStr>(key: &str, default: T, warnings: &mut Vec<String>) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warnings.push(format!(
                    "Valor inválido para {}: {:?}, usando el default",
                    key, raw
                ));
                default
            }
        },
        Err(_) => default,
    }
}
