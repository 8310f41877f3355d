//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un hilo por conexión. Cada conexión transporta un único request: se lee
//! completo (headers y `Content-Length` bytes de body), se despacha por el
//! router y se cierra.

use crate::http::request::{content_length, header_end};
use crate::http::{Request, Response, StatusCode};
use crate::router::Router;
use crate::server::{build_router, AppState};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Tamaño máximo aceptado para un request
const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Timeout de lectura por conexión
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Servidor HTTP
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
    state: Arc<AppState>,
    next_request: Arc<AtomicU64>,
}

impl Server {
    /// Abre el socket; `address` acepta `host:port` (puerto 0 = efímero)
    pub fn bind(address: &str, state: Arc<AppState>) -> io::Result<Self> {
        let listener = TcpListener::bind(address)?;

        Ok(Self {
            listener,
            router: Arc::new(build_router()),
            state,
            next_request: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Loop de aceptación; no retorna salvo error fatal del listener
    pub fn run(&self) -> io::Result<()> {
        info!(address = %self.local_addr()?, "server listening");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => self.spawn_connection(stream),
                Err(e) => warn!(error = %e, "failed to accept connection"),
            }
        }

        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream) {
        let router = Arc::clone(&self.router);
        let state = Arc::clone(&self.state);
        let request_id = format!("{:016x}", self.next_request.fetch_add(1, Ordering::Relaxed));

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", &request_id[8..]))
            .spawn(move || {
                if let Err(e) = handle_connection(stream, &router, &state, &request_id) {
                    warn!(request_id = %request_id, error = %e, "connection error");
                }
            });

        if let Err(e) = spawned {
            error!(error = %e, "failed to spawn connection thread");
        }
    }
}

/// Lee del socket hasta tener el request completo
///
/// Retorna vacío si el peer cerró sin enviar nada.
fn read_request(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);

        if let Some(end) = header_end(&buffer) {
            if buffer.len() >= end.saturating_add(content_length(&buffer[..end])) {
                break;
            }
        }

        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "request exceeds maximum size",
            ));
        }
    }

    Ok(buffer)
}

/// Atiende una conexión completa: leer, despachar, responder
pub fn handle_connection(
    mut stream: TcpStream,
    router: &Router,
    state: &AppState,
    request_id: &str,
) -> io::Result<()> {
    let start = Instant::now();
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let buffer = read_request(&mut stream)?;
    if buffer.is_empty() {
        debug!(request_id, "peer closed without sending data");
        return Ok(());
    }

    let (mut response, path) = match Request::parse(&buffer) {
        Ok(request) => {
            let path = request.path().to_string();
            debug!(request_id, method = %request.method(), path = %path, "request received");
            (router.route(&request, state), path)
        }
        Err(e) => {
            warn!(request_id, error = %e, "malformed request");
            let mut response =
                Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e));
            Router::add_common_headers(&mut response);
            (response, String::from("-"))
        }
    };

    response.add_header("X-Request-Id", request_id);

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    info!(
        request_id,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "request served"
    );

    Ok(())
}
