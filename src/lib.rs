//! # Pool HTTP Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 concurrente mínimo: un thread acepta conexiones y las
//! encola; un pool fijo de workers las atiende, con soporte para conexiones
//! persistentes (keep-alive) y timeouts de inactividad.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing de requests y construcción de responses
//! - `server`: Acceptor, cola de conexiones, workers y sesiones
//! - `logger`: Salida de log serializada entre threads
//! - `content`: Proveedores del documento que se sirve
//! - `stats`: Estadísticas reportadas al apagar
//! - `config`: Argumentos de línea de comandos
//! - `error`: Errores de arranque
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use pool_http_server::config::Config;
//! use pool_http_server::content::FileContent;
//! use pool_http_server::logger::Logger;
//! use pool_http_server::server::Server;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let content = Arc::new(FileContent::new(&config.index));
//! let acceptor = Server::new(config, Arc::new(Logger::stdout()), content)
//!     .bind()
//!     .expect("Error al iniciar servidor");
//! acceptor.run().expect("Error en el servidor");
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod http;
pub mod logger;
pub mod server;
pub mod stats;
