//! # Pool HTTP Server - Entry Point
//! src/main.rs
//!
//! Parsea argumentos, levanta el servidor y espera Ctrl+C para apagarlo.

use pool_http_server::config::{CliCommand, Config};
use pool_http_server::content::FileContent;
use pool_http_server::logger::Logger;
use pool_http_server::server::{Server, ShutdownHandle};
use std::process;
use std::sync::Arc;
use std::thread;

fn main() {
    let config = match Config::from_args(std::env::args_os()) {
        Ok(CliCommand::Run(config)) => config,
        Ok(CliCommand::Help) => {
            println!("{}", Config::usage());
            process::exit(0);
        }
        Ok(CliCommand::Version) => {
            print!("{}", Config::version());
            process::exit(0);
        }
        Err(e) => {
            eprintln!("Error en los argumentos: {}", e);
            eprintln!();
            eprintln!("{}", Config::usage());
            process::exit(1);
        }
    };

    println!("=======================================");
    println!("  Pool HTTP/1.1 Server");
    println!("  Principios de Sistemas Operativos");
    println!("=======================================\n");
    config.print_summary();

    let logger = Arc::new(Logger::stdout());
    let content = Arc::new(FileContent::new(&config.index));

    // El socket parcialmente creado se libera solo si bind falla
    let acceptor = match Server::new(config, Arc::clone(&logger), content).bind() {
        Ok(acceptor) => acceptor,
        Err(e) => {
            logger.log(format!("[CRITICAL ERROR] El servidor no pudo iniciar: {}", e));
            process::exit(1);
        }
    };

    watch_ctrl_c(acceptor.shutdown_handle(), Arc::clone(&logger));

    match acceptor.run() {
        Ok(report) => {
            logger.log(format!(
                "[CLEANUP] Servidor detenido ({} señales de parada enviadas)",
                report.stop_signals
            ));
        }
        Err(e) => {
            logger.log(format!("[CRITICAL ERROR] {}", e));
            process::exit(1);
        }
    }
}

/// Espera Ctrl+C en un thread aparte y pide el apagado
fn watch_ctrl_c(shutdown: ShutdownHandle, logger: Arc<Logger>) {
    let thread_logger = Arc::clone(&logger);
    let spawned = thread::Builder::new()
        .name("signal".to_string())
        .spawn(move || {
            let logger = thread_logger;
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    logger.log(format!("[ERROR] No se pudo instalar el manejador de Ctrl+C: {}", e));
                    return;
                }
            };

            match runtime.block_on(tokio::signal::ctrl_c()) {
                Ok(()) => {
                    logger.log("[STOPPING] Señal de apagado recibida (Ctrl+C)");
                    shutdown.shutdown();
                }
                Err(e) => logger.log(format!("[ERROR] Error esperando Ctrl+C: {}", e)),
            }
        });

    if let Err(e) = spawned {
        logger.log(format!("[ERROR] No se pudo iniciar el thread de señales: {}", e));
    }
}
