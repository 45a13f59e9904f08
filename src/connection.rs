//! A single TCP connection speaking RESP2.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::resp;
use crate::types::Value;

/// A TCP stream with buffered RESP I/O.
///
/// One command is in flight at a time: [`execute`](Connection::execute)
/// writes a command and reads exactly one reply.
///
/// Any failure other than an error reply leaves the stream out of step with
/// the replies, so the connection is marked broken and every later call
/// fails with [`Error::ConnectionClosed`].
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    read_buf: BytesMut,
    write_buf: BytesMut,
    decoder: resp::Decoder,
    broken: bool,
}

impl Connection {
    /// Connect, then authenticate and select the database as configured.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let addr = config.addr();
        let stream = TcpStream::connect(&addr).await?;
        stream.set_nodelay(true)?;
        debug!(%addr, database = config.database, "connected");

        let mut conn = Self {
            stream,
            read_buf: BytesMut::with_capacity(config.buffer_size),
            write_buf: BytesMut::with_capacity(config.buffer_size),
            decoder: resp::Decoder::new(),
            broken: false,
        };

        if let Some(password) = &config.password {
            conn.execute(&[
                Bytes::from_static(b"AUTH"),
                Bytes::copy_from_slice(password.as_bytes()),
            ])
            .await?
            .expect_ok()?;
        }
        if config.database != 0 {
            conn.execute(&[
                Bytes::from_static(b"SELECT"),
                Bytes::from(config.database.to_string()),
            ])
            .await?
            .expect_ok()?;
        }
        Ok(conn)
    }

    /// Send a command and read its reply.
    ///
    /// An error reply is returned as [`Error::Server`].
    pub async fn execute(&mut self, args: &[Bytes]) -> Result<Value> {
        if self.broken {
            return Err(Error::ConnectionClosed);
        }
        let result = self.round_trip(args).await;
        if let Err(e) = &result {
            if !matches!(e, Error::Server(_)) {
                debug!(error = %e, "connection marked broken");
                self.broken = true;
                self.read_buf.clear();
                self.decoder = resp::Decoder::new();
            }
        }
        result
    }

    /// Whether an earlier failure has retired this connection.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    async fn round_trip(&mut self, args: &[Bytes]) -> Result<Value> {
        if let Some(name) = args.first() {
            trace!(command = %String::from_utf8_lossy(name), argc = args.len() - 1, "send");
        }
        self.write_buf.clear();
        resp::encode_command(args, &mut self.write_buf);
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Value> {
        loop {
            if let Some(value) = self.decoder.decode(&mut self.read_buf)? {
                return Ok(value);
            }
            if self.stream.read_buf(&mut self.read_buf).await? == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }
}
