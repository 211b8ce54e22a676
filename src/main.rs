// src/main.rs

//! A minimal console host for the Opalis client engine. It stands in for a
//! real embedding: one connection per process, driven by stdin lines.

use anyhow::Result;
use opalis::client::{PipelineConnection, Subscriber, SyncConnection};
use opalis::config::Config;
use opalis::core::ReplyAtom;
use opalis::core::protocol::Command;
use opalis::loader::{CsvLoader, TargetType};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::thread;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("Opalis version {VERSION}");
        return Ok(());
    }

    // Load configuration if a file was named; otherwise run on defaults.
    let mut config = match flag_value(&args, "--config") {
        Some(path) => match Config::from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load configuration from \"{path}\": {e}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Some(host) = flag_value(&args, "--host") {
        config.host = host.to_string();
    }
    if let Some(port_str) = flag_value(&args, "--port") {
        match port_str.parse::<u16>() {
            Ok(port) => config.port = port,
            Err(_) => {
                eprintln!("Invalid port number: {port_str}");
                std::process::exit(1);
            }
        }
    }
    let mode = flag_value(&args, "--mode").unwrap_or("sync");

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .compact()
        .with_ansi(true)
        .init();

    match mode {
        "sync" => run_sync(&config),
        "pipeline" => run_pipeline(&config),
        "subscribe" => run_subscribe(&config),
        other => {
            eprintln!("Unknown mode '{other}' (expected sync, pipeline, or subscribe)");
            std::process::exit(1);
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn print_atoms(atoms: &[ReplyAtom]) {
    let rendered: Vec<String> = atoms.iter().map(|a| a.to_string()).collect();
    println!("{}", rendered.join(" "));
}

fn run_sync(config: &Config) -> Result<()> {
    let mut conn = SyncConnection::connect(config)?;
    for line in io::stdin().lock().lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.split_first() {
            Some((&"command", rest)) => match Command::from_tokens(rest) {
                Ok(cmd) => match conn.send(&cmd) {
                    Ok(atoms) => print_atoms(&atoms),
                    Err(e) => error!("send failed: {e}"),
                },
                Err(e) => warn!("{e}"),
            },
            Some((&"csv", [path, target])) => match target.parse::<TargetType>() {
                Ok(target) => match CsvLoader::new(&mut conn, target).run(Path::new(path)) {
                    Ok(summary) => print_atoms(&summary.to_atoms()),
                    Err(e) => error!("csv load failed: {e}"),
                },
                Err(e) => warn!("{e}"),
            },
            Some((&"quit", _)) => break,
            Some(_) => warn!("expected: command <tokens...> | csv <path> <type> | quit"),
            None => {}
        }
    }
    Ok(())
}

fn run_pipeline(config: &Config) -> Result<()> {
    let mut conn = PipelineConnection::connect(config)?;
    for line in io::stdin().lock().lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.split_first() {
            Some((&"command", rest)) => match Command::from_tokens(rest) {
                Ok(cmd) => match conn.enqueue(&cmd) {
                    Ok(pending) => println!("pending {pending}"),
                    Err(e) => error!("enqueue failed: {e}"),
                },
                Err(e) => warn!("{e}"),
            },
            // A bare "drive" (or empty line) is the scheduling tick.
            Some((&"drive", _)) | None => match conn.drive() {
                Ok(outcome) => {
                    if let Some(atoms) = outcome.reply {
                        print_atoms(&atoms);
                    }
                    println!("pending {}", outcome.pending);
                }
                Err(e) => error!("drive failed: {e}"),
            },
            Some((&"quit", _)) => break,
            Some(_) => warn!("expected: command <tokens...> | drive | quit"),
        }
    }
    Ok(())
}

fn run_subscribe(config: &Config) -> Result<()> {
    let mut conn = Subscriber::connect(config)?;
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let tokens: Vec<String> = line.split_whitespace().map(String::from).collect();
        match tokens.split_first() {
            Some((verb, channels)) if verb == "subscribe" => {
                if let Err(e) = conn.subscribe(channels) {
                    warn!("{e}");
                }
            }
            Some((verb, channels)) if verb == "unsubscribe" => {
                if let Err(e) = conn.unsubscribe(channels) {
                    warn!("{e}");
                }
            }
            Some((verb, _)) if verb == "start" => conn.start(),
            Some((verb, _)) if verb == "stop" => conn.stop(),
            // Poll on the configured interval until the scheduler goes idle.
            Some((verb, _)) if verb == "listen" => {
                while conn.should_continue() {
                    match conn.poll_once() {
                        Ok(Some(atoms)) => print_atoms(&atoms),
                        Ok(None) => {}
                        Err(e) => error!("poll failed: {e}"),
                    }
                    io::stdout().flush()?;
                    thread::sleep(conn.poll_interval());
                }
            }
            Some((verb, _)) if verb == "quit" => break,
            Some(_) => {
                warn!("expected: subscribe <ch...> | unsubscribe <ch...> | start | stop | listen | quit")
            }
            None => {}
        }
    }
    Ok(())
}
