//! # Errores
//! src/error.rs
//!
//! Solo los errores de arranque llegan hasta `main`. Los errores de una
//! conexión se quedan dentro del worker que la atiende.

use std::io;
use thiserror::Error;

/// Errores de argumentos/configuración (salida con código 1)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Argumentos que no se pudieron parsear (ej: puerto no numérico)
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Argumentos bien formados pero con valores inválidos
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errores fatales al levantar el servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("could not resolve address {0}")]
    AddressResolution(String),

    #[error("could not bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("could not listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("could not start worker thread: {0}")]
    Spawn(#[source] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
