//! Shared test utilities for rankset integration tests.
//!
//! Import via `mod common;` in integration test files:
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

use std::future::Future;
use std::sync::{mpsc, Arc};
use std::thread;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use rankset::resp::{encode_error, encode_value, Decoder};
use rankset::{Backend, Client, ConnectionConfig, Error, MemoryBackend, Value};

// ============================================================================
// Logging
// ============================================================================

/// Route `tracing` output through the test harness so it shows up only for
/// failing tests. Safe to call from every test.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Loopback servers
// ============================================================================

/// Run `serve` on a listener bound to a random local port, inside a tokio
/// runtime on a background thread, and return the port once it is bound.
///
/// The blocking [`Client`] under test stays outside that runtime.
fn spawn_server<F, Fut>(serve: F) -> u16
where
    F: FnOnce(TcpListener) -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    let (port_tx, port_rx) = mpsc::channel();
    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
            .expect("should build server runtime");
        rt.block_on(async move {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("should bind to random port");
            let port = listener.local_addr().expect("should have local addr").port();
            port_tx.send(port).expect("test should wait for the port");
            serve(listener).await;
        });
    });
    port_rx.recv().expect("server thread should report its port")
}

/// Serve `store` over RESP2 on a random local port and return the port.
///
/// Each accepted connection gets its own task. The server lives until the
/// test process exits.
#[allow(dead_code)]
pub fn spawn_loopback(store: Arc<MemoryBackend>) -> u16 {
    spawn_server(move |listener| async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let _ = serve(stream, &store).await;
            });
        }
    })
}

/// Accept one connection and answer each read from it with the next canned
/// reply, then hang up.
#[allow(dead_code)]
pub fn spawn_scripted(replies: Vec<&'static [u8]>) -> u16 {
    spawn_server(move |listener| async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut inbox = BytesMut::with_capacity(256);
        for reply in replies {
            inbox.clear();
            match stream.read_buf(&mut inbox).await {
                Ok(n) if n > 0 => {}
                _ => return,
            }
            if stream.write_all(reply).await.is_err() {
                return;
            }
        }
    })
}

async fn serve(mut stream: TcpStream, store: &MemoryBackend) -> std::io::Result<()> {
    let mut inbox = BytesMut::with_capacity(4096);
    let mut outbox = BytesMut::with_capacity(4096);
    let mut decoder = Decoder::new();

    loop {
        loop {
            let request = match decoder.decode(&mut inbox) {
                Ok(Some(request)) => request,
                Ok(None) => break,
                Err(_) => return Ok(()),
            };
            outbox.clear();
            match request_args(request) {
                Some(args) => match store.execute(&args) {
                    Ok(reply) => encode_value(&reply, &mut outbox),
                    Err(Error::Server(msg)) => encode_error(&msg, &mut outbox),
                    Err(other) => encode_error(&format!("ERR {}", other), &mut outbox),
                },
                None => encode_error("ERR Protocol error: expected array of bulk strings", &mut outbox),
            }
            stream.write_all(&outbox).await?;
        }

        if stream.read_buf(&mut inbox).await? == 0 {
            return Ok(());
        }
    }
}

fn request_args(request: Value) -> Option<Vec<Bytes>> {
    match request {
        Value::Array(items) => items.into_iter().map(|v| v.into_bytes().ok()).collect(),
        _ => None,
    }
}

/// A shared store, a loopback server over it and a client connected to it.
#[allow(dead_code)]
pub fn connected_client() -> (Arc<MemoryBackend>, Client) {
    let store = Arc::new(MemoryBackend::new());
    let port = spawn_loopback(Arc::clone(&store));
    let client = Client::connect_with(ConnectionConfig::from_addr("127.0.0.1", port))
        .expect("should connect to loopback server");
    (store, client)
}
