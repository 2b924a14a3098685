//! # Sesión por Conexión
//! src/server/session.rs
//!
//! Máquina de estados de una conexión:
//!
//! ```text
//! Receiving ──► Responding ──┬──► Closed                 (sin keep-alive)
//!                            └──► PersistentWait ◄──┐
//!                                   │  datos ───────┘ (reenvía la respuesta)
//!                                   └─► Closed        (cierre, timeout o error)
//! ```
//!
//! La sesión es dueña del socket. Se cierra exactamente una vez, al consumir
//! la sesión en [`Session::serve`], sin importar desde qué estado se salió.

use crate::content::{ContentProvider, FALLBACK_BODY};
use crate::http::{build_response, ParsedRequest, READ_SIZE};
use crate::logger::Logger;
use crate::stats::ServerStats;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Timeouts de lectura de una sesión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// Espera máxima por el primer request
    pub initial: Duration,

    /// Inactividad máxima entre requests en keep-alive
    pub keep_alive: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(30),
            keep_alive: Duration::from_secs(5),
        }
    }
}

/// Estados de la sesión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Receiving,
    Responding,
    PersistentWait,
    Closed,
}

/// Resultado de una lectura con timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Llegaron `n` bytes
    Data(usize),

    /// El cliente cerró su lado (read retornó 0)
    PeerClosed,

    /// Venció el timeout sin datos
    TimedOut,
}

/// Motivo por el que se cerró la conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Respuesta enviada a un cliente sin keep-alive
    Completed,

    /// El cliente cerró la conexión keep-alive
    PeerClosed,

    /// Keep-alive sin requests durante el timeout
    IdleTimeout,

    /// No llegó ningún request durante el timeout inicial
    InitialTimeout,

    /// Error de I/O (reset, broken pipe, ...)
    Error(io::ErrorKind),
}

/// Resumen de una sesión terminada
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub peer: SocketAddr,
    pub persistent: bool,
    /// Respuestas escritas completas
    pub responses: u32,
    pub close: CloseReason,
}

/// Lee del socket distinguiendo datos, cierre y timeout
///
/// Un timeout es un resultado normal, no un error.
pub fn read_with_timeout(stream: &mut impl Read, buffer: &mut [u8]) -> io::Result<ReadOutcome> {
    loop {
        match stream.read(buffer) {
            Ok(0) => return Ok(ReadOutcome::PeerClosed),
            Ok(n) => return Ok(ReadOutcome::Data(n)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // Unix reporta el timeout como WouldBlock, Windows como TimedOut
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Ok(ReadOutcome::TimedOut)
            }
            Err(e) => return Err(e),
        }
    }
}

/// Una conexión atendida por un único worker
pub struct Session<'a> {
    stream: TcpStream,
    peer: SocketAddr,
    timeouts: SessionTimeouts,
    state: SessionState,
    persistent: bool,
    responses: u32,
    logger: &'a Logger,
    content: &'a dyn ContentProvider,
    stats: &'a ServerStats,
}

impl<'a> Session<'a> {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        timeouts: SessionTimeouts,
        logger: &'a Logger,
        content: &'a dyn ContentProvider,
        stats: &'a ServerStats,
    ) -> Self {
        Self {
            stream,
            peer,
            timeouts,
            state: SessionState::Receiving,
            persistent: false,
            responses: 0,
            logger,
            content,
            stats,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Atiende la conexión hasta cerrarla
    ///
    /// Ningún error sale de aquí: todo termina en `Closed` y queda en el log.
    pub fn serve(mut self) -> SessionOutcome {
        self.logger
            .log(format!("[NEW CONNECTION] Cliente {} conectado", self.peer));

        let close = match self.drive() {
            Ok(reason) => reason,
            Err(e) => {
                self.logger
                    .log(format!("[ERROR] Problema con el cliente {}: {}", self.peer, e));
                CloseReason::Error(e.kind())
            }
        };

        self.state = SessionState::Closed;
        let outcome = SessionOutcome {
            peer: self.peer,
            persistent: self.persistent,
            responses: self.responses,
            close,
        };

        // Cerrar el socket: único punto de salida
        let Session { stream, logger, peer, .. } = self;
        drop(stream);
        logger.log(format!("[CLOSED] Conexión con {} cerrada", peer));

        outcome
    }

    fn drive(&mut self) -> io::Result<CloseReason> {
        // === Receiving ===
        self.state = SessionState::Receiving;
        self.stream.set_read_timeout(Some(self.timeouts.initial))?;
        self.stream.set_write_timeout(Some(self.timeouts.initial))?;

        let mut buffer = [0u8; READ_SIZE];
        let request = match read_with_timeout(&mut self.stream, &mut buffer)? {
            ReadOutcome::Data(n) => ParsedRequest::parse(&buffer[..n]),
            // Request vacío: igual se responde
            ReadOutcome::PeerClosed => ParsedRequest::default(),
            ReadOutcome::TimedOut => {
                self.logger.log(format!(
                    "[TIMEOUT] {} no envió ningún request, cerrando conexión",
                    self.peer
                ));
                return Ok(CloseReason::InitialTimeout);
            }
        };

        self.persistent = request.is_persistent();
        self.logger.log(format!(
            "[REQUEST] {} {}",
            request.request_line().unwrap_or(""),
            if self.persistent {
                "(persistent)"
            } else {
                "(will close after response)"
            }
        ));

        // === Responding ===
        self.state = SessionState::Responding;
        let content = self.fetch_content(request.target());
        let response = build_response(&content, self.persistent);
        self.send(&response)?;

        if !self.persistent {
            return Ok(CloseReason::Completed);
        }

        // === PersistentWait ===
        self.state = SessionState::PersistentWait;
        self.stream.set_read_timeout(Some(self.timeouts.keep_alive))?;

        loop {
            match read_with_timeout(&mut self.stream, &mut buffer)? {
                ReadOutcome::Data(_) => {
                    // El request nuevo no se parsea: se reenvía la primera
                    // respuesta tal cual, así que todas las respuestas de una
                    // conexión keep-alive son idénticas byte a byte.
                    self.logger.log(format!(
                        "[REQUEST] Otro request de {} (conexión persistente)",
                        self.peer
                    ));
                    self.send(&response)?;
                }
                ReadOutcome::PeerClosed => {
                    self.logger
                        .log(format!("[INFO] El cliente {} cerró la conexión", self.peer));
                    return Ok(CloseReason::PeerClosed);
                }
                ReadOutcome::TimedOut => {
                    self.logger.log(format!(
                        "[TIMEOUT] Sin más requests de {}, cerrando conexión",
                        self.peer
                    ));
                    return Ok(CloseReason::IdleTimeout);
                }
            }
        }
    }

    /// Obtiene el body; si el proveedor falla usa el contenido de respaldo
    fn fetch_content(&self, target: &str) -> Vec<u8> {
        match self.content.get_content(target) {
            Ok(content) => content,
            Err(e) => {
                self.logger.log(format!(
                    "[WARNING] No se pudo leer {} ({}), enviando contenido de respaldo",
                    self.content.describe(),
                    e
                ));
                self.stats.record_fallback();
                FALLBACK_BODY.as_bytes().to_vec()
            }
        }
    }

    fn send(&mut self, response: &[u8]) -> io::Result<()> {
        self.stream.write_all(response)?;
        self.stream.flush()?;
        self.responses += 1;
        Ok(())
    }
}
