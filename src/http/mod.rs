//! # Módulo HTTP
//!
//! Framing mínimo de HTTP/1.1 sobre bytes crudos:
//!
//! - Parsing tolerante de requests (request line + headers)
//! - Detección de conexiones persistentes (`Connection: keep-alive`)
//! - Construcción byte a byte de la respuesta `200 OK`
//!
//! No hay chunked encoding, ni pipelining, ni despacho por método.

pub mod request;   // Parsing de requests
pub mod response;  // Construcción de responses

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{is_persistent, ParsedRequest, READ_SIZE};
pub use response::{build_response, ConnectionMode, Response};
