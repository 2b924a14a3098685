//! # Proveedores de contenido
//! src/content.rs
//!
//! El servidor responde siempre con el mismo documento. De dónde sale ese
//! documento lo decide un [`ContentProvider`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Body que se envía cuando el proveedor no puede entregar el contenido
pub const FALLBACK_BODY: &str = "<html><body><h1>File not found</h1></body></html>";

/// Fuente del body de las respuestas
pub trait ContentProvider: Send + Sync {
    /// Retorna el contenido para `target` (ej: "/index.html")
    fn get_content(&self, target: &str) -> io::Result<Vec<u8>>;

    /// Nombre legible para los logs
    fn describe(&self) -> String;
}

/// Lee siempre el mismo archivo, sin importar el target
///
/// El archivo se lee en cada request, así los cambios se ven sin reiniciar.
#[derive(Debug, Clone)]
pub struct FileContent {
    path: PathBuf,
}

impl FileContent {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentProvider for FileContent {
    fn get_content(&self, _target: &str) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Contenido fijo en memoria
#[derive(Debug, Clone)]
pub struct StaticContent {
    body: Vec<u8>,
}

impl StaticContent {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }
}

impl ContentProvider for StaticContent {
    fn get_content(&self, _target: &str) -> io::Result<Vec<u8>> {
        Ok(self.body.clone())
    }

    fn describe(&self) -> String {
        format!("<{} bytes en memoria>", self.body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_content_ignores_target() {
        let provider = StaticContent::new("<h1>hi</h1>");

        assert_eq!(provider.get_content("/").unwrap(), b"<h1>hi</h1>");
        assert_eq!(provider.get_content("/otra/ruta").unwrap(), b"<h1>hi</h1>");
    }

    #[test]
    fn test_file_content_reads_file() {
        let path = std::env::temp_dir().join(format!("pool_http_server_{}.html", std::process::id()));
        fs::write(&path, "<p>desde disco</p>").unwrap();

        let provider = FileContent::new(&path);
        assert_eq!(provider.get_content("/cualquiera").unwrap(), b"<p>desde disco</p>");
        assert_eq!(provider.path(), path.as_path());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_content_missing_file() {
        let provider = FileContent::new("/no/existe/index.html");
        let err = provider.get_content("/").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_describe() {
        assert_eq!(StaticContent::new("abc").describe(), "<3 bytes en memoria>");
        assert_eq!(FileContent::new("index.html").describe(), "index.html");
    }
}
