//! # Acceptor
//! src/server/acceptor.rs
//!
//! Dueño del socket de escucha. Acepta conexiones, las encola con su
//! timestamp y, al pedir el apagado, encola una señal de parada por worker,
//! cierra el listener y espera a que el pool termine.

use crate::config::Config;
use crate::content::ContentProvider;
use crate::error::ServerError;
use crate::logger::Logger;
use crate::server::queue::{ConnectionQueue, PendingConnection};
use crate::server::worker::{WorkerContext, WorkerPool};
use crate::stats::{ServerStats, StatsSnapshot};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Servidor configurado, todavía sin socket
pub struct Server {
    config: Config,
    logger: Arc<Logger>,
    content: Arc<dyn ContentProvider>,
}

impl Server {
    pub fn new(config: Config, logger: Arc<Logger>, content: Arc<dyn ContentProvider>) -> Self {
        Self {
            config,
            logger,
            content,
        }
    }

    /// Abre el socket de escucha e inicia el pool de workers
    ///
    /// Cualquier error aquí es fatal. Lo que se haya creado antes del error
    /// (socket, workers) se libera antes de retornar.
    pub fn bind(self) -> Result<Acceptor, ServerError> {
        self.config.validate()?;

        let address = self.config.address();
        self.logger.log("[SETUP] Creando socket del servidor...");
        let addr = resolve(&self.config.host, self.config.port)?;

        self.logger.log(format!("[SETUP] Haciendo bind en {}...", address));
        let listener = open_listener(addr, self.config.backlog)?;
        let local_addr = listener.local_addr()?;

        self.logger.log(format!("[LISTENING] Servidor escuchando en {}", local_addr));
        self.logger.log(format!("[THREADPOOL] Usando {} workers", self.config.threadpool));

        let stats = Arc::new(ServerStats::new());
        let queue = ConnectionQueue::new();
        let context = Arc::new(WorkerContext {
            logger: Arc::clone(&self.logger),
            content: self.content,
            stats: Arc::clone(&stats),
            timeouts: self.config.timeouts(),
        });

        // Si falla, `listener` se cierra al salir de la función
        let pool = WorkerPool::spawn(self.config.threadpool, queue.clone(), context)
            .map_err(ServerError::Spawn)?;

        Ok(Acceptor {
            listener,
            local_addr,
            queue,
            pool,
            logger: self.logger,
            stats,
            shutdown: ShutdownHandle::new(local_addr),
        })
    }
}

/// Resuelve host:port a la primera dirección disponible
fn resolve(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let address = format!("{}:{}", host, port);
    (host, port)
        .to_socket_addrs()
        .map_err(|_| ServerError::AddressResolution(address.clone()))?
        .next()
        .ok_or(ServerError::AddressResolution(address))
}

/// Socket TCP con SO_REUSEADDR, bind y listen con el backlog dado
fn open_listener(addr: SocketAddr, backlog: i32) -> Result<TcpListener, ServerError> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;

    socket.bind(&addr.into()).map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })?;
    socket.listen(backlog).map_err(|source| ServerError::Listen {
        addr: addr.to_string(),
        source,
    })?;

    Ok(socket.into())
}

/// Permite pedir el apagado del acceptor desde otro thread
#[derive(Clone)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    fn new(local_addr: SocketAddr) -> Self {
        // Conectarse a 0.0.0.0 / :: no es portable; se usa loopback
        let ip = match local_addr.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
            ip => ip,
        };

        Self {
            requested: Arc::new(AtomicBool::new(false)),
            wake_addr: SocketAddr::new(ip, local_addr.port()),
        }
    }

    /// Pide el apagado; llamadas repetidas no hacen nada
    pub fn shutdown(&self) {
        if self.requested.swap(true, Ordering::SeqCst) {
            return;
        }

        // Despertar el `accept` bloqueado con una conexión descartable
        let _ = TcpStream::connect_timeout(&self.wake_addr, Duration::from_secs(1));
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Resumen devuelto al terminar [`Acceptor::run`]
#[derive(Debug, Clone)]
pub struct ServerReport {
    /// Señales de parada encoladas (una por worker)
    pub stop_signals: usize,

    pub stats: StatsSnapshot,
}

/// Servidor escuchando, listo para aceptar conexiones
pub struct Acceptor {
    listener: TcpListener,
    local_addr: SocketAddr,
    queue: ConnectionQueue<PendingConnection>,
    pool: WorkerPool,
    logger: Arc<Logger>,
    stats: Arc<ServerStats>,
    shutdown: ShutdownHandle,
}

impl Acceptor {
    /// Dirección real en la que escucha (útil con puerto 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Loop de `accept` hasta que se pida el apagado
    ///
    /// Bloquea el thread actual. Al salir, todos los workers terminaron.
    pub fn run(self) -> Result<ServerReport, ServerError> {
        let Acceptor {
            listener,
            queue,
            pool,
            logger,
            stats,
            shutdown,
            ..
        } = self;

        logger.log("[READY] Servidor listo para aceptar conexiones!");

        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if shutdown.is_requested() {
                        // Conexión de despertar (o una que llegó tarde)
                        drop(stream);
                        break;
                    }

                    queue.push(PendingConnection::new(stream, peer));
                    stats.record_accepted();
                    logger.log(format!("[QUEUED] Nuevo cliente {} agregado a la cola", peer));
                }
                Err(e) => {
                    if shutdown.is_requested() {
                        break;
                    }
                    logger.log(format!("[ERROR] Error al aceptar conexión: {}", e));
                }
            }
        }

        logger.log("[STOPPING] Apagado solicitado, no se aceptan más conexiones");
        logger.log("[CLEANUP] Deteniendo todos los workers...");
        let stop_signals = pool.stop();

        drop(listener);
        logger.log("[CLEANUP] Socket del servidor cerrado");

        pool.join();
        logger.log("[CLEANUP] Todos los workers terminaron");

        let snapshot = stats.snapshot();
        logger.log(format!("[STATS] {}", snapshot.to_json()));

        Ok(ServerReport {
            stop_signals,
            stats: snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticContent;
    use std::io::{Read, Write};
    use std::thread;

    fn test_config(threadpool: usize) -> Config {
        Config {
            port: 0,
            threadpool,
            ..Config::default()
        }
    }

    fn server(threadpool: usize) -> (Server, crate::logger::CapturedLog) {
        let (logger, captured) = Logger::capture();
        let server = Server::new(
            test_config(threadpool),
            Arc::new(logger),
            Arc::new(StaticContent::new("<h1>hi</h1>")),
        );
        (server, captured)
    }

    #[test]
    fn test_bind_ephemeral_port() {
        let (server, captured) = server(2);
        let acceptor = server.bind().unwrap();

        assert_ne!(acceptor.local_addr().port(), 0);
        assert_eq!(captured.count_tag("[LISTENING]"), 1);

        let handle = acceptor.shutdown_handle();
        let runner = thread::spawn(move || acceptor.run());
        handle.shutdown();

        let report = runner.join().unwrap().unwrap();
        assert_eq!(report.stop_signals, 2);
    }

    #[test]
    fn test_bind_fails_when_port_taken() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let (logger, _) = Logger::capture();
        let config = Config {
            port: taken.local_addr().unwrap().port(),
            threadpool: 1,
            ..Config::default()
        };

        let result = Server::new(config, Arc::new(logger), Arc::new(StaticContent::new("x"))).bind();
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (server, _) = server(0);
        assert!(matches!(server.bind(), Err(ServerError::Config(_))));
    }

    #[test]
    fn test_unresolvable_host() {
        let (logger, _) = Logger::capture();
        let config = Config {
            host: "host.invalid".to_string(),
            port: 0,
            ..Config::default()
        };

        let result = Server::new(config, Arc::new(logger), Arc::new(StaticContent::new("x"))).bind();
        assert!(matches!(result, Err(ServerError::AddressResolution(_))));
    }

    #[test]
    fn test_accepts_and_serves_then_stops() {
        let (server, captured) = server(4);
        let acceptor = server.bind().unwrap();
        let addr = acceptor.local_addr();
        let handle = acceptor.shutdown_handle();
        let runner = thread::spawn(move || acceptor.run());

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        let mut response = String::new();
        client.read_to_string(&mut response).unwrap();
        assert!(response.contains("Content-Length: 11\r\n"));
        assert!(response.ends_with("<h1>hi</h1>"));

        handle.shutdown();
        handle.shutdown();
        let report = runner.join().unwrap().unwrap();

        assert_eq!(report.stop_signals, 4);
        assert_eq!(report.stats.accepted, 1);
        assert_eq!(report.stats.sessions, 1);
        assert_eq!(captured.count_tag("[WORKER] Worker #"), 8);
        assert_eq!(captured.count_tag("[STATS]"), 1);
    }

    #[test]
    fn test_shutdown_handle_maps_unspecified_to_loopback() {
        let handle = ShutdownHandle::new("0.0.0.0:8080".parse().unwrap());
        assert_eq!(handle.wake_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert!(!handle.is_requested());
    }
}
