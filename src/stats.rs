//! # Estadísticas del Servidor
//! src/stats.rs
//!
//! Contadores thread-safe que alimentan la línea `[STATS]` al apagar el
//! servidor. Registrar estadísticas nunca cambia el comportamiento de una
//! sesión.

use crate::server::session::{CloseReason, SessionOutcome};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Collector de estadísticas thread-safe
#[derive(Clone)]
pub struct ServerStats {
    inner: Arc<Mutex<StatsData>>,
    start_time: Instant,
}

/// Datos internos
#[derive(Default)]
struct StatsData {
    accepted: u64,
    sessions: u64,
    responses: u64,
    keep_alive_sessions: u64,
    completed: u64,
    idle_timeouts: u64,
    initial_timeouts: u64,
    peer_closed: u64,
    errors: u64,
    fallback_content: u64,
    total_wait_us: u64,
    max_wait_us: u64,
}

/// Snapshot serializable de las estadísticas
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub accepted: u64,
    pub sessions: u64,
    pub responses: u64,
    pub keep_alive_sessions: u64,
    pub closed: ClosedBreakdown,
    pub fallback_content: u64,
    pub queue_wait_us: WaitSummary,
}

/// Cómo terminaron las sesiones
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedBreakdown {
    pub completed: u64,
    pub idle_timeout: u64,
    pub initial_timeout: u64,
    pub peer_closed: u64,
    pub error: u64,
}

/// Espera en la cola de conexiones (microsegundos)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitSummary {
    pub avg: u64,
    pub max: u64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatsData::default())),
            start_time: Instant::now(),
        }
    }

    fn data(&self) -> std::sync::MutexGuard<'_, StatsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Una conexión fue aceptada y encolada
    pub fn record_accepted(&self) {
        self.data().accepted += 1;
    }

    /// Un worker sacó una conexión de la cola después de esperar `wait`
    pub fn record_dequeued(&self, wait: Duration) {
        let wait_us = wait.as_micros() as u64;
        let mut data = self.data();
        data.total_wait_us += wait_us;
        data.max_wait_us = data.max_wait_us.max(wait_us);
    }

    /// El proveedor de contenido falló y se usó el body de respaldo
    pub fn record_fallback(&self) {
        self.data().fallback_content += 1;
    }

    /// Una sesión terminó
    pub fn record_session(&self, outcome: &SessionOutcome) {
        let mut data = self.data();
        data.sessions += 1;
        data.responses += u64::from(outcome.responses);
        if outcome.persistent {
            data.keep_alive_sessions += 1;
        }

        match outcome.close {
            CloseReason::Completed => data.completed += 1,
            CloseReason::IdleTimeout => data.idle_timeouts += 1,
            CloseReason::InitialTimeout => data.initial_timeouts += 1,
            CloseReason::PeerClosed => data.peer_closed += 1,
            CloseReason::Error(_) => data.errors += 1,
        }
    }

    /// Obtiene un snapshot de las estadísticas
    pub fn snapshot(&self) -> StatsSnapshot {
        let data = self.data();
        let avg = if data.sessions == 0 {
            0
        } else {
            data.total_wait_us / data.sessions
        };

        StatsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            accepted: data.accepted,
            sessions: data.sessions,
            responses: data.responses,
            keep_alive_sessions: data.keep_alive_sessions,
            closed: ClosedBreakdown {
                completed: data.completed,
                idle_timeout: data.idle_timeouts,
                initial_timeout: data.initial_timeouts,
                peer_closed: data.peer_closed,
                error: data.errors,
            },
            fallback_content: data.fallback_content,
            queue_wait_us: WaitSummary {
                avg,
                max: data.max_wait_us,
            },
        }
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSnapshot {
    /// Serializa el snapshot como JSON en una sola línea
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn outcome(close: CloseReason, persistent: bool, responses: u32) -> SessionOutcome {
        SessionOutcome {
            peer: "127.0.0.1:1234".parse().unwrap(),
            persistent,
            responses,
            close,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = ServerStats::new().snapshot();
        assert_eq!(snapshot.sessions, 0);
        assert_eq!(snapshot.queue_wait_us.avg, 0);
    }

    #[test]
    fn test_record_sessions() {
        let stats = ServerStats::new();
        stats.record_accepted();
        stats.record_accepted();
        stats.record_accepted();
        stats.record_session(&outcome(CloseReason::Completed, false, 1));
        stats.record_session(&outcome(CloseReason::IdleTimeout, true, 3));
        stats.record_session(&outcome(
            CloseReason::Error(io::ErrorKind::ConnectionReset),
            true,
            0,
        ));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.accepted, 3);
        assert_eq!(snapshot.sessions, 3);
        assert_eq!(snapshot.responses, 4);
        assert_eq!(snapshot.keep_alive_sessions, 2);
        assert_eq!(snapshot.closed.completed, 1);
        assert_eq!(snapshot.closed.idle_timeout, 1);
        assert_eq!(snapshot.closed.error, 1);
    }

    #[test]
    fn test_wait_summary() {
        let stats = ServerStats::new();
        stats.record_dequeued(Duration::from_micros(100));
        stats.record_dequeued(Duration::from_micros(300));
        stats.record_session(&outcome(CloseReason::Completed, false, 1));
        stats.record_session(&outcome(CloseReason::Completed, false, 1));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.queue_wait_us.avg, 200);
        assert_eq!(snapshot.queue_wait_us.max, 300);
    }

    #[test]
    fn test_json_format() {
        let stats = ServerStats::new();
        stats.record_fallback();

        let json: serde_json::Value = serde_json::from_str(&stats.snapshot().to_json()).unwrap();
        assert_eq!(json["fallback_content"], 1);
        assert_eq!(json["closed"]["completed"], 0);
        assert!(json["queue_wait_us"].is_object());
    }

    #[test]
    fn test_shared_between_clones() {
        let stats = ServerStats::new();
        let clone = stats.clone();
        clone.record_accepted();

        assert_eq!(stats.snapshot().accepted, 1);
    }
}
