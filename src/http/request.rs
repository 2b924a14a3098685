//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Parser tolerante: nunca falla. Cualquier secuencia de bytes produce un
//! resultado "best effort" (request line opcional + headers).
//!
//! ## Formato esperado
//!
//! ```text
//! GET / HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Connection: keep-alive\r\n
//! \r\n
//! ```
//!
//! La request line no se valida (método, path y versión se aceptan tal cual).

use std::collections::HashMap;

/// Máximo de bytes que se leen del socket por cada `read`
pub const READ_SIZE: usize = 1024;

/// Request parseado: request line + headers con nombre en minúsculas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRequest {
    /// Primera línea del request (ej: "GET / HTTP/1.1"), `None` si no llegó nada
    request_line: Option<String>,

    /// Headers HTTP (ej: {"connection": "keep-alive"})
    headers: HashMap<String, String>,
}

impl ParsedRequest {
    /// Parsea bytes crudos leídos del socket
    ///
    /// Los bytes que no son UTF-8 válido se descartan en silencio.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use pool_http_server::http::ParsedRequest;
    ///
    /// let request = ParsedRequest::parse(b"GET / HTTP/1.1\r\nConnection: Keep-Alive\r\n\r\n");
    ///
    /// assert_eq!(request.request_line(), Some("GET / HTTP/1.1"));
    /// assert!(request.is_persistent());
    /// ```
    pub fn parse(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        let text = decode_lossy(raw);
        let mut lines = text.split("\r\n");

        // `split` siempre produce al menos un elemento
        let request_line = lines.next().unwrap_or_default().to_string();
        let headers = Self::parse_headers(lines);

        Self {
            request_line: Some(request_line),
            headers,
        }
    }

    /// Parsea headers `Nombre: Valor` hasta la primera línea vacía
    ///
    /// Las líneas sin ':' se ignoran. Si un header se repite gana el último.
    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> HashMap<String, String> {
        let mut headers = HashMap::new();

        for line in lines {
            // La línea vacía marca el fin de los headers
            if line.is_empty() {
                break;
            }

            // Separar en el primer ':'
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_lowercase(), value.trim().to_string());
            }
        }

        headers
    }

    /// Obtiene la request line (sin parsear)
    pub fn request_line(&self) -> Option<&str> {
        self.request_line.as_deref()
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header específico (búsqueda case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Obtiene el target del request (segundo token de la request line)
    ///
    /// Si la request line está vacía o incompleta retorna "/".
    pub fn target(&self) -> &str {
        self.request_line
            .as_deref()
            .and_then(|line| line.split_whitespace().nth(1))
            .unwrap_or("/")
    }

    /// Indica si el cliente pidió una conexión persistente
    pub fn is_persistent(&self) -> bool {
        is_persistent(&self.headers)
    }
}

/// `true` si el header `connection` contiene "keep-alive" (sin importar mayúsculas)
///
/// Espera las claves en minúsculas, tal como las deja [`ParsedRequest::parse`].
pub fn is_persistent(headers: &HashMap<String, String>) -> bool {
    headers
        .get("connection")
        .map(|value| value.to_ascii_lowercase().contains("keep-alive"))
        .unwrap_or(false)
}

/// Decodifica UTF-8 descartando las secuencias inválidas
fn decode_lossy(raw: &[u8]) -> String {
    raw.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
