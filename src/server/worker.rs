//! # Pool de Workers
//! src/server/worker.rs
//!
//! N threads de larga vida, todos atados a la misma [`ConnectionQueue`].
//! Cada worker saca una conexión, la atiende completa y vuelve a la cola.
//! Termina cuando saca una señal de parada; hay exactamente una por worker.

use crate::content::ContentProvider;
use crate::logger::Logger;
use crate::server::queue::{ConnectionQueue, PendingConnection, QueueItem};
use crate::server::session::{Session, SessionTimeouts};
use crate::stats::ServerStats;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Dependencias compartidas por todos los workers
pub struct WorkerContext {
    pub logger: Arc<Logger>,
    pub content: Arc<dyn ContentProvider>,
    pub stats: Arc<ServerStats>,
    pub timeouts: SessionTimeouts,
}

/// Pool de tamaño fijo
pub struct WorkerPool {
    queue: ConnectionQueue<PendingConnection>,
    handles: Vec<JoinHandle<()>>,
    logger: Arc<Logger>,
}

impl WorkerPool {
    /// Inicia `size` workers consumiendo de `queue`
    ///
    /// Si un thread no se puede crear, los ya creados se detienen antes de
    /// retornar el error.
    pub fn spawn(
        size: usize,
        queue: ConnectionQueue<PendingConnection>,
        context: Arc<WorkerContext>,
    ) -> io::Result<Self> {
        let mut pool = Self {
            queue,
            handles: Vec::with_capacity(size),
            logger: Arc::clone(&context.logger),
        };

        for id in 1..=size {
            let queue = pool.queue.clone();
            let context = Arc::clone(&context);

            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, queue, context));

            match spawned {
                Ok(handle) => {
                    pool.handles.push(handle);
                    pool.logger.log(format!("[WORKER] Worker #{} iniciado", id));
                }
                Err(e) => {
                    pool.stop();
                    pool.join();
                    return Err(e);
                }
            }
        }

        Ok(pool)
    }

    /// Cantidad de workers vivos en el pool
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Encola una señal de parada por worker; retorna cuántas se encolaron
    pub fn stop(&self) -> usize {
        for _ in 0..self.handles.len() {
            self.queue.push_stop();
        }
        self.handles.len()
    }

    /// Espera a que todos los workers terminen
    ///
    /// Solo retorna después de [`WorkerPool::stop`] (o si todos murieron).
    pub fn join(self) {
        for handle in self.handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                self.logger
                    .log(format!("[ERROR] El thread {} terminó con panic", name));
            }
        }
    }
}

/// Loop principal del worker
fn worker_loop(id: usize, queue: ConnectionQueue<PendingConnection>, context: Arc<WorkerContext>) {
    loop {
        let connection = match queue.pop() {
            QueueItem::Work(connection) => connection,
            QueueItem::Stop => {
                context
                    .logger
                    .log(format!("[WORKER] Worker #{} terminando", id));
                break;
            }
        };

        let peer = connection.peer;

        // Un panic en una sesión no debe matar al worker
        let result = panic::catch_unwind(AssertUnwindSafe(|| handle_connection(connection, &context)));
        if let Err(payload) = result {
            context.logger.log(format!(
                "[ERROR] Worker #{} falló atendiendo a {}: {}",
                id,
                peer,
                panic_message(payload.as_ref())
            ));
        }
    }
}

/// Atiende una conexión sacada de la cola
pub fn handle_connection(connection: PendingConnection, context: &WorkerContext) {
    let PendingConnection {
        stream,
        peer,
        enqueued_at,
    } = connection;

    let wait = enqueued_at.elapsed();
    context.stats.record_dequeued(wait);
    context.logger.log(format!(
        "[DEQUEUED] Cliente {} siendo atendido (esperó {:.2} segundos)",
        peer,
        wait.as_secs_f64()
    ));

    let outcome = Session::new(
        stream,
        peer,
        context.timeouts,
        &context.logger,
        context.content.as_ref(),
        &context.stats,
    )
    .serve();

    context.stats.record_session(&outcome);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticContent;
    use crate::http::build_response;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::time::Duration;

    fn context(content: Arc<dyn ContentProvider>) -> (Arc<WorkerContext>, crate::logger::CapturedLog) {
        let (logger, captured) = Logger::capture();
        let context = WorkerContext {
            logger: Arc::new(logger),
            content,
            stats: Arc::new(ServerStats::new()),
            timeouts: SessionTimeouts {
                initial: Duration::from_millis(500),
                keep_alive: Duration::from_millis(200),
            },
        };
        (Arc::new(context), captured)
    }

    #[test]
    fn test_pool_serves_queued_connection_then_stops() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let queue = ConnectionQueue::new();
        let (context, captured) = context(Arc::new(StaticContent::new("<h1>hi</h1>")));
        let pool = WorkerPool::spawn(3, queue.clone(), Arc::clone(&context)).unwrap();
        assert_eq!(pool.size(), 3);

        let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (stream, peer) = listener.accept().unwrap();
        queue.push(PendingConnection::new(stream, peer));

        client.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).unwrap();
        assert_eq!(response, build_response(b"<h1>hi</h1>", false));

        assert_eq!(pool.stop(), 3);
        pool.join();

        assert_eq!(captured.count_tag("[WORKER] Worker #"), 6);
        assert_eq!(captured.count_tag("[DEQUEUED]"), 1);
        assert_eq!(captured.count_tag("[CLOSED]"), 1);
        assert_eq!(context.stats.snapshot().sessions, 1);
    }

    #[test]
    fn test_panicking_provider_does_not_kill_worker() {
        struct Exploding;
        impl ContentProvider for Exploding {
            fn get_content(&self, _target: &str) -> io::Result<Vec<u8>> {
                panic!("boom");
            }
            fn describe(&self) -> String {
                "exploding".to_string()
            }
        }

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let queue = ConnectionQueue::new();
        let (context, captured) = context(Arc::new(Exploding));
        let pool = WorkerPool::spawn(1, queue.clone(), context).unwrap();

        for _ in 0..2 {
            let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
            let (stream, peer) = listener.accept().unwrap();
            queue.push(PendingConnection::new(stream, peer));

            client.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();
            // El socket se cierra al desenrollar el panic
            let mut response = Vec::new();
            let _ = client.read_to_end(&mut response);
            assert!(response.is_empty());
        }

        pool.stop();
        pool.join();

        assert!(captured.contents().contains("boom"));
        assert_eq!(captured.count_tag("[ERROR] Worker #1"), 2);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("texto");
        assert_eq!(panic_message(payload.as_ref()), "texto");

        let payload: Box<dyn Any + Send> = Box::new(String::from("otro"));
        assert_eq!(panic_message(payload.as_ref()), "otro");

        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "panic");
    }
}
