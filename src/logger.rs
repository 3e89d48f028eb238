//! logger.rs
//! Configuración del logger usando env_logger.
//! Si hay archivo de log, cada línea va a stderr y al archivo.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _ = io::stderr().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stderr().flush();
        self.file.flush()
    }
}

fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

pub fn init_logger(log_file: Option<&str>) {
    // RUST_LOG manda; si no está, "info"
    let log_env = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_env));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} - {} - {} - {}",
            buf.timestamp_seconds(),
            record.target(),
            record.level(),
            record.args()
        )
    });

    let file_error = match log_file.map(open_log_file) {
        Some(Ok(file)) => {
            builder.target(env_logger::Target::Pipe(Box::new(TeeWriter { file })));
            None
        }
        Some(Err(e)) => Some(e),
        None => None,
    };

    builder.init();

    if let (Some(path), Some(e)) = (log_file, file_error) {
        log::warn!("No se pudo abrir el archivo de log {}: {}", path, e);
    }
}
