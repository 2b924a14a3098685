//! # Cola de Conexiones
//! src/server/queue.rs
//!
//! Cola FIFO thread-safe entre el acceptor (productor) y los workers
//! (consumidores). `push` nunca bloquea; `pop` duerme en un `Condvar` hasta
//! que haya algo, sin polling.

use std::collections::VecDeque;
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Conexión aceptada esperando a un worker
#[derive(Debug)]
pub struct PendingConnection {
    /// Socket del cliente; lo posee el worker que la saque de la cola
    pub stream: TcpStream,

    /// Dirección del cliente
    pub peer: SocketAddr,

    /// Momento en que se encoló
    pub enqueued_at: Instant,
}

impl PendingConnection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            enqueued_at: Instant::now(),
        }
    }
}

/// Elemento de la cola: trabajo real o señal de parada
#[derive(Debug, PartialEq, Eq)]
pub enum QueueItem<T> {
    /// Trabajo para un worker
    Work(T),

    /// Le indica al worker que lo saque que debe terminar
    Stop,
}

/// Cola FIFO thread-safe
pub struct ConnectionQueue<T = PendingConnection> {
    /// Elementos pendientes, en orden de llegada
    items: Arc<Mutex<VecDeque<QueueItem<T>>>>,

    /// Condvar para despertar a los workers cuando llega algo
    condvar: Arc<Condvar>,
}

impl<T> ConnectionQueue<T> {
    /// Crea una cola vacía (sin límite de capacidad)
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(VecDeque::new())),
            condvar: Arc::new(Condvar::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueueItem<T>>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_item(&self, item: QueueItem<T>) {
        self.lock().push_back(item);

        // Notificar a un worker esperando
        self.condvar.notify_one();
    }

    /// Encola trabajo al final
    pub fn push(&self, item: T) {
        self.push_item(QueueItem::Work(item));
    }

    /// Encola una señal de parada al final
    ///
    /// Todo lo encolado antes se sigue entregando primero.
    pub fn push_stop(&self) {
        self.push_item(QueueItem::Stop);
    }

    /// Desencola el elemento más antiguo
    ///
    /// Bloquea hasta que haya un elemento disponible
    pub fn pop(&self) -> QueueItem<T> {
        let mut items = self.lock();

        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }

            // Esperar a que haya elementos
            items = self
                .condvar
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_pop(&self) -> Option<QueueItem<T>> {
        self.lock().pop_front()
    }

    /// Retorna el tamaño actual de la cola (incluye señales de parada)
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cantidad de señales de parada pendientes
    pub fn pending_stops(&self) -> usize {
        self.lock()
            .iter()
            .filter(|item| matches!(item, QueueItem::Stop))
            .count()
    }
}

impl<T> Default for ConnectionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ConnectionQueue<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            condvar: Arc::clone(&self.condvar),
        }
    }
}
