//! # Logger compartido
//! src/logger.rs
//!
//! Serializa la salida de todos los workers: cada llamada a [`Logger::log`]
//! escribe una línea completa con el lock tomado, así dos threads nunca
//! mezclan caracteres dentro de la misma línea.
//!
//! El logger se pasa explícitamente (`Arc<Logger>`) a cada componente.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Salida de texto protegida por un mutex
pub struct Logger {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    /// Crea un logger sobre cualquier destino `Write`
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Mutex::new(Box::new(writer)),
        }
    }

    /// Logger sobre la salida estándar
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Logger que descarta todo
    pub fn discard() -> Self {
        Self::new(io::sink())
    }

    /// Logger en memoria, útil para verificar qué se registró
    ///
    /// # Ejemplo
    /// ```
    /// use pool_http_server::logger::Logger;
    ///
    /// let (logger, captured) = Logger::capture();
    /// logger.log("[INFO] hola");
    /// assert_eq!(captured.lines(), vec!["[INFO] hola".to_string()]);
    /// ```
    pub fn capture() -> (Self, CapturedLog) {
        let captured = CapturedLog::default();
        (Self::new(captured.clone()), captured)
    }

    /// Escribe `message` como una línea
    ///
    /// Los errores de escritura se ignoran: perder una línea de log no debe
    /// tumbar a un worker.
    pub fn log(&self, message: impl AsRef<str>) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(sink, "{}", message.as_ref());
        let _ = sink.flush();
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::stdout()
    }
}

/// Buffer compartido donde escribe un logger creado con [`Logger::capture`]
#[derive(Clone, Default)]
pub struct CapturedLog {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLog {
    /// Todo lo registrado hasta ahora
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Lo registrado, separado por líneas
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Cantidad de líneas que empiezan con `tag` (ej: "[CLOSED]")
    pub fn count_tag(&self, tag: &str) -> usize {
        self.lines().iter().filter(|line| line.starts_with(tag)).count()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
