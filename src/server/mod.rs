//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Pipeline de admisión de conexiones:
//!
//! ```text
//! Acceptor ──► ConnectionQueue ──► WorkerPool ──► Session ──► socket
//! ```
//!
//! 1. `acceptor`: socket de escucha y loop de `accept`
//! 2. `queue`: cola FIFO bloqueante con señal de parada
//! 3. `worker`: pool de tamaño fijo que consume la cola
//! 4. `session`: máquina de estados de cada conexión (keep-alive incluido)

pub mod acceptor;
pub mod queue;
pub mod session;
pub mod worker;

// Re-exportar para facilitar el uso
pub use acceptor::{Acceptor, Server, ServerReport, ShutdownHandle};
pub use queue::{ConnectionQueue, PendingConnection, QueueItem};
pub use session::{CloseReason, Session, SessionOutcome, SessionState, SessionTimeouts};
pub use worker::{WorkerContext, WorkerPool};
