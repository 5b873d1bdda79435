//! Purpose: Run the atom bank's three command channels.
//! Exports: `ServeConfig`, `serve`.
//! Role: Tokio-based listeners (TCP sessions, UDP datagrams, console), all
//! Role: funneling into one shared `Bank`.
//! Invariants: Both sockets are bound before any channel reads input; a bind
//! Invariants: failure is fatal, with no partial startup.
//! Invariants: One session's failure never affects other sessions or the
//! Invariants: other listeners.
//! Invariants: Console responses go to stdout; diagnostics go to stderr.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use atomite::core::bank::{Bank, Origin, Response};
use atomite::core::catalog::Catalog;
use atomite::core::command::parse;
use atomite::core::error::{Error, ErrorKind};

/// Largest datagram we service; longer requests are truncated by the socket.
const MAX_DATAGRAM_LEN: usize = 2048;

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub tcp_bind: SocketAddr,
    pub udp_bind: SocketAddr,
    pub ceiling: u64,
    pub recipes: Option<PathBuf>,
    pub console: bool,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let catalog = match &config.recipes {
        Some(path) => Catalog::from_json_file(path)?,
        None => Catalog::builtin(),
    };
    let bank = Arc::new(Bank::new(catalog, config.ceiling));

    // Both sockets must be live before any channel starts reading.
    let tcp = TcpListener::bind(config.tcp_bind).await.map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to bind TCP listener on {}", config.tcp_bind))
            .with_source(err)
    })?;
    let udp = UdpSocket::bind(config.udp_bind).await.map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to bind UDP socket on {}", config.udp_bind))
            .with_source(err)
    })?;

    info!(
        tcp = %tcp.local_addr().unwrap_or(config.tcp_bind),
        udp = %udp.local_addr().unwrap_or(config.udp_bind),
        ceiling = config.ceiling,
        molecules = bank.catalog().len(),
        "atom bank listening"
    );

    let mut stream_task = tokio::spawn(accept_stream_sessions(tcp, bank.clone()));
    let mut datagram_task = tokio::spawn(serve_datagrams(udp, bank.clone()));
    if config.console {
        tokio::spawn(run_console(bank.clone()));
    }

    tokio::select! {
        result = &mut stream_task => Err(listener_failure("stream listener", result)),
        result = &mut datagram_task => Err(listener_failure("datagram listener", result)),
        _ = shutdown_signal() => {
            info!("shutting down");
            stream_task.abort();
            datagram_task.abort();
            Ok(())
        }
    }
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if config.ceiling == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--ceiling must be greater than zero")
            .with_hint("Use a positive value like 1000000000000000000."));
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        signal.recv().await;
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

fn listener_failure(listener: &str, result: Result<(), tokio::task::JoinError>) -> Error {
    let error = Error::new(ErrorKind::Internal).with_message(format!("{listener} stopped"));
    match result {
        Ok(()) => error,
        Err(err) => error.with_source(err),
    }
}

/// Accepts connections forever; each session runs in its own task so a
/// stalled or broken peer blocks only its own read loop.
async fn accept_stream_sessions(listener: TcpListener, bank: Arc<Bank>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "session opened");
                let bank = bank.clone();
                tokio::spawn(async move {
                    match run_session(stream, peer, &bank).await {
                        Ok(()) => debug!(%peer, "session closed"),
                        Err(err) => warn!(%peer, %err, "session ended with error"),
                    }
                });
            }
            Err(err) => {
                warn!(%err, "accept failed");
            }
        }
    }
}

async fn run_session(stream: TcpStream, peer: SocketAddr, bank: &Bank) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let response = bank.process(parse(&line), Origin::Stream);
        let reply = response.wire_text();
        debug!(%peer, request = %line.trim_end(), %reply, "stream command");
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
    }
    Ok(())
}

/// One datagram in, one datagram out; no per-peer state between requests.
async fn serve_datagrams(socket: UdpSocket, bank: Arc<Bank>) {
    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, peer)) => {
                let request = String::from_utf8_lossy(&buf[..len]);
                let response = bank.process(parse(&request), Origin::Datagram);
                let reply = format!("{}\r\n", response.wire_text());
                debug!(%peer, request = %request.trim_end(), reply = %reply.trim_end(), "datagram command");
                if let Err(err) = socket.send_to(reply.as_bytes(), peer).await {
                    warn!(%peer, %err, "datagram reply failed");
                }
            }
            Err(err) => {
                warn!(%err, "datagram receive failed");
            }
        }
    }
}

/// The privileged channel: may issue GEN, and reports locally instead of
/// replying to a peer. EOF ends only this loop, never the process.
async fn run_console(bank: Arc<Bank>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let response = bank.process(parse(&line), Origin::Console);
                for report_line in console_report(&response) {
                    println!("{report_line}");
                }
            }
            Ok(None) => {
                debug!("console input closed");
                return;
            }
            Err(err) => {
                warn!(%err, "console read failed");
                return;
            }
        }
    }
}

fn console_report(response: &Response) -> Vec<String> {
    match response {
        Response::Generated {
            name,
            count,
            levels,
            remaining,
        } => {
            let mut lines = vec![
                format!("Generated {count} {name}"),
                format!("Remaining atoms: {levels}"),
            ];
            lines.extend(
                remaining
                    .iter()
                    .map(|(molecule, units)| format!("You can generate {units} more {molecule}")),
            );
            lines
        }
        other => vec![other.wire_text()],
    }
}
