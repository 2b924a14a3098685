//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! El servidor solo responde `200 OK` con contenido HTML. El orden de los
//! headers es fijo para que la respuesta sea reproducible byte a byte:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 11\r\n
//! Connection: keep-alive\r\n
//! \r\n
//! <h1>hi</h1>
//! ```

/// Valor del header `Connection`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// La conexión sigue abierta para más requests
    KeepAlive,

    /// La conexión se cierra después de la respuesta
    Close,
}

impl ConnectionMode {
    pub fn from_persistent(persistent: bool) -> Self {
        if persistent {
            ConnectionMode::KeepAlive
        } else {
            ConnectionMode::Close
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionMode::KeepAlive => "keep-alive",
            ConnectionMode::Close => "close",
        }
    }
}

/// Respuesta `200 OK` con body HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    body: Vec<u8>,
    connection: ConnectionMode,
}

impl Response {
    /// Crea una respuesta `200 OK` (por defecto `Connection: close`)
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            connection: ConnectionMode::Close,
        }
    }

    /// Establece el modo de conexión
    pub fn with_connection(mut self, connection: ConnectionMode) -> Self {
        self.connection = connection;
        self
    }

    pub fn connection(&self) -> ConnectionMode {
        self.connection
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// `Content-Length` es la longitud en bytes del body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let head = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: text/html\r\n\
             Content-Length: {}\r\n\
             Connection: {}\r\n\
             \r\n",
            self.body.len(),
            self.connection.as_str()
        );

        let mut result = Vec::with_capacity(head.len() + self.body.len());
        result.extend_from_slice(head.as_bytes());
        result.extend_from_slice(&self.body);
        result
    }
}

/// Construye la respuesta completa para `content`
///
/// # Ejemplo
/// ```
/// use pool_http_server::http::build_response;
///
/// let bytes = build_response(b"<h1>hi</h1>", false);
/// assert!(bytes.ends_with(b"Connection: close\r\n\r\n<h1>hi</h1>"));
/// ```
pub fn build_response(content: &[u8], persistent: bool) -> Vec<u8> {
    Response::ok(content)
        .with_connection(ConnectionMode::from_persistent(persistent))
        .to_bytes()
}
