//! Blocking client for a remote store.

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tracing::warn;

use crate::backend::Backend;
use crate::config::{Config, ConnectionConfig};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::types::Value;

/// A blocking client over one TCP connection.
///
/// Owns a current-thread Tokio runtime and drives the connection on it, so
/// every call blocks the calling thread for exactly one round trip. Calls
/// from several threads are serialized on the connection. There are no
/// retries and no timeouts.
///
/// Must not be used from inside an async runtime.
///
/// # Examples
///
/// ```no_run
/// use rankset::{Backend, Client, Sortable, Order};
///
/// let client = Client::connect("127.0.0.1", 6379)?;
/// let board = client.sorted_set("leaderboard");
/// board.insert("alice", 42.0)?;
/// let top = board.select_by_rank(0, 9, true, Order::Descending)?;
/// # Ok::<(), rankset::Error>(())
/// ```
#[derive(Debug)]
pub struct Client {
    conn: Mutex<Connection>,
    rt: Runtime,
}

impl Client {
    /// Connect with default settings to `host:port`.
    pub fn connect(host: impl Into<String>, port: u16) -> Result<Self> {
        Self::connect_with(ConnectionConfig::from_addr(host, port))
    }

    /// Connect using a full [`ConnectionConfig`].
    pub fn connect_with(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
            .map_err(Error::Io)?;
        let conn = rt.block_on(Connection::connect(&config))?;
        Ok(Self {
            conn: Mutex::new(conn),
            rt,
        })
    }

    /// Connect using the `[connection]` section of a loaded [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::connect_with(config.connection.clone())
    }
}

impl Backend for Client {
    fn execute(&self, args: &[Bytes]) -> Result<Value> {
        let mut conn = self.conn.lock();
        let result = self.rt.block_on(conn.execute(args));
        if let Err(Error::Server(msg)) = &result {
            warn!(error = %msg, "server returned an error reply");
        }
        result
    }
}
