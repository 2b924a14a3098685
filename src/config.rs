//! # Configuración del Servidor
//! src/config.rs
//!
//! Argumentos posicionales `[PORT] [HOST] [THREADPOOL]` más algunas opciones
//! largas para ajustar timeouts, backlog y el archivo servido.
//!
//! ## Ejemplos de uso
//!
//! ```bash
//! ./pool_http_server                      # 127.0.0.1:8080, 10 workers
//! ./pool_http_server 8000 0.0.0.0 20      # todas las interfaces, 20 workers
//! ./pool_http_server 8080 127.0.0.1 4 --keep-alive-timeout 2
//! ```

use crate::error::ConfigError;
use crate::server::SessionTimeouts;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Configuración del servidor HTTP
#[derive(Debug, Clone, Parser, PartialEq, Eq)]
#[command(name = "pool_http_server")]
#[command(about = "Servidor HTTP/1.1 concurrente con pool de workers y keep-alive")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(value_name = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Host/IP en el que escucha (0.0.0.0 = todas las interfaces)
    #[arg(value_name = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Número de workers que atienden conexiones
    #[arg(value_name = "THREADPOOL", default_value_t = 10)]
    pub threadpool: usize,

    /// Archivo que se envía en cada respuesta
    #[arg(long, default_value = "index.html")]
    pub index: PathBuf,

    /// Timeout (segundos) para recibir el primer request
    #[arg(long = "initial-timeout", default_value_t = 30)]
    pub initial_timeout_secs: u64,

    /// Timeout (segundos) de inactividad en conexiones keep-alive
    #[arg(long = "keep-alive-timeout", default_value_t = 5)]
    pub keep_alive_timeout_secs: u64,

    /// Conexiones establecidas que el SO mantiene esperando `accept`
    #[arg(long, default_value_t = 50)]
    pub backlog: i32,
}

/// Lo que `main` debe hacer según los argumentos
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Levantar el servidor
    Run(Config),

    /// Imprimir el uso y salir con código 0
    Help,

    /// Imprimir la versión y salir con código 0
    Version,
}

impl Config {
    /// Parsea los argumentos de línea de comandos (incluye el nombre del programa)
    ///
    /// # Ejemplo
    /// ```
    /// use pool_http_server::config::{CliCommand, Config};
    ///
    /// let cmd = Config::from_args(["server", "9000", "0.0.0.0", "4"]).unwrap();
    /// match cmd {
    ///     CliCommand::Run(config) => assert_eq!(config.address(), "0.0.0.0:9000"),
    ///     _ => unreachable!(),
    /// }
    /// ```
    pub fn from_args<I, T>(args: I) -> Result<CliCommand, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

        // "help" como primer argumento también muestra el uso
        if args.get(1).is_some_and(|arg| arg == "help") {
            return Ok(CliCommand::Help);
        }

        match Config::try_parse_from(args) {
            Ok(config) => {
                config.validate()?;
                Ok(CliCommand::Run(config))
            }
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp => Ok(CliCommand::Help),
                ErrorKind::DisplayVersion => Ok(CliCommand::Version),
                _ => {
                    // Solo la primera línea; el uso lo imprime `main`
                    let rendered = e.to_string();
                    let message = rendered.lines().next().unwrap_or_default();
                    let message = message.trim_start_matches("error: ").to_string();
                    Err(ConfigError::InvalidArguments(message))
                }
            },
        }
    }

    /// Texto de uso para `--help` y para errores de argumentos
    pub fn usage() -> String {
        let mut usage = Config::command().render_help().to_string();
        usage.push_str("\nEjemplo: pool_http_server 8000 0.0.0.0 20\n");
        usage.push_str("(0.0.0.0 significa escuchar en todas las interfaces)\n");
        usage
    }

    /// Texto de versión
    pub fn version() -> String {
        Config::command().render_version().to_string()
    }

    /// Obtiene la dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeouts de sesión derivados de la configuración
    pub fn timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            initial: Duration::from_secs(self.initial_timeout_secs),
            keep_alive: Duration::from_secs(self.keep_alive_timeout_secs),
        }
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threadpool == 0 {
            return Err(ConfigError::Invalid("threadpool must be >= 1".to_string()));
        }
        if self.initial_timeout_secs == 0 {
            return Err(ConfigError::Invalid("initial timeout must be > 0".to_string()));
        }
        if self.keep_alive_timeout_secs == 0 {
            return Err(ConfigError::Invalid("keep-alive timeout must be > 0".to_string()));
        }
        if self.backlog <= 0 {
            return Err(ConfigError::Invalid("backlog must be > 0".to_string()));
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("⚙️  Configuración:");
        println!("   Dirección:    {}", self.address());
        println!("   Workers:      {}", self.threadpool);
        println!("   Archivo:      {}", self.index.display());
        println!("   Timeouts:     {}s inicial / {}s keep-alive",
            self.initial_timeout_secs, self.keep_alive_timeout_secs);
        println!("   Backlog:      {}", self.backlog);
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            threadpool: 10,
            index: PathBuf::from("index.html"),
            initial_timeout_secs: 30,
            keep_alive_timeout_secs: 5,
            backlog: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Config {
        match Config::from_args(args.iter().copied()) {
            Ok(CliCommand::Run(config)) => config,
            other => panic!("expected Run, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.threadpool, 10);
        assert_eq!(config.backlog, 50);
    }

    #[test]
    fn test_no_args_equals_default() {
        assert_eq!(run(&["server"]), Config::default());
    }

    #[test]
    fn test_positional_args() {
        let config = run(&["server", "8000", "0.0.0.0", "20"]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.threadpool, 20);
    }

    #[test]
    fn test_partial_positional_args() {
        let config = run(&["server", "3000"]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.threadpool, 10);
    }

    #[test]
    fn test_long_options() {
        let config = run(&[
            "server", "--index", "www/home.html", "--keep-alive-timeout", "2",
            "--initial-timeout", "10", "--backlog", "128",
        ]);
        assert_eq!(config.index, PathBuf::from("www/home.html"));
        assert_eq!(config.timeouts().keep_alive, Duration::from_secs(2));
        assert_eq!(config.timeouts().initial, Duration::from_secs(10));
        assert_eq!(config.backlog, 128);
    }

    #[test]
    fn test_help_variants() {
        for flag in ["-h", "--help", "help"] {
            assert_eq!(Config::from_args(["server", flag]), Ok(CliCommand::Help));
        }
    }

    #[test]
    fn test_version_flag() {
        assert_eq!(Config::from_args(["server", "--version"]), Ok(CliCommand::Version));
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::from_args(["server", "abc"]);
        assert!(matches!(result, Err(ConfigError::InvalidArguments(_))));
    }

    #[test]
    fn test_invalid_threadpool() {
        let result = Config::from_args(["server", "8080", "127.0.0.1", "many"]);
        assert!(matches!(result, Err(ConfigError::InvalidArguments(_))));
    }

    #[test]
    fn test_zero_threadpool_rejected() {
        let result = Config::from_args(["server", "8080", "127.0.0.1", "0"]);
        assert!(matches!(result, Err(ConfigError::Invalid(m)) if m.contains("threadpool")));
    }

    #[test]
    fn test_validate_timeouts() {
        let mut config = Config::default();
        config.keep_alive_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.initial_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_backlog() {
        let mut config = Config::default();
        config.backlog = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_address() {
        let mut config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:8080");

        config.host = "0.0.0.0".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = Config::default().timeouts();
        assert_eq!(timeouts, SessionTimeouts::default());
    }

    #[test]
    fn test_usage_mentions_positionals() {
        let usage = Config::usage();
        assert!(usage.contains("PORT"));
        assert!(usage.contains("HOST"));
        assert!(usage.contains("THREADPOOL"));
    }

    #[test]
    fn test_config_print_summary() {
        // No debe hacer panic
        Config::default().print_summary();
    }
}
