//! An in-process store that answers the same commands as the remote one.
//!
//! [`MemoryBackend`] keeps every key in one map behind a
//! [`parking_lot::RwLock`]. Each command runs under a single lock acquisition,
//! so like the remote store every command is atomic. Replies have the same
//! RESP2 shapes the remote store produces and errors carry the same message
//! prefixes (`WRONGTYPE`, `ERR`).

mod scan;
mod strings;
mod zset;

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::trace;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::member::{parse_score, ScoreBound};
use crate::types::Value;

use zset::ZSet;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// What a key holds.
#[derive(Debug, Clone)]
enum Stored {
    String(Bytes),
    SortedSet(ZSet),
}

type Keyspace = HashMap<Bytes, Stored>;

/// An in-memory backend.
///
/// Holds a single logical database; `SELECT` accepts only index 0. When built
/// with [`with_password`](MemoryBackend::with_password), `AUTH` checks the
/// password, but commands are not gated on it since the backend carries no
/// per-connection state.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    keys: RwLock<Keyspace>,
    password: Option<String>,
}

impl MemoryBackend {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store whose `AUTH` accepts only `password`.
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            password: Some(password.into()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }

    fn dispatch(&self, name: &str, args: &[Bytes]) -> Result<Value> {
        match name {
            "PING" => Ok(Value::Status("PONG".into())),
            "AUTH" => self.auth(args),
            "SELECT" => select(args),
            "EXISTS" => {
                arity(name, args, 1)?;
                let keys = self.keys.read();
                let n = args.iter().filter(|k| keys.contains_key(*k)).count();
                Ok(Value::Integer(n as i64))
            }
            "DEL" => {
                arity(name, args, 1)?;
                let mut keys = self.keys.write();
                let n = args.iter().filter(|k| keys.remove(*k).is_some()).count();
                Ok(Value::Integer(n as i64))
            }

            "GET" => strings::get(&self.keys.read(), args),
            "SET" => strings::set(&mut self.keys.write(), args),
            "INCRBY" => strings::incr_by(&mut self.keys.write(), args, false),
            "DECRBY" => strings::incr_by(&mut self.keys.write(), args, true),
            "INCRBYFLOAT" => strings::incr_by_float(&mut self.keys.write(), args),

            "ZADD" => zset::zadd(&mut self.keys.write(), args),
            "ZREM" => zset::zrem(&mut self.keys.write(), args),
            "ZCARD" => zset::zcard(&self.keys.read(), args),
            "ZCOUNT" => zset::zcount(&self.keys.read(), args),
            "ZSCORE" => zset::zscore(&self.keys.read(), args),
            "ZINCRBY" => zset::zincrby(&mut self.keys.write(), args),
            "ZRANGE" => zset::zrange(&self.keys.read(), args, false),
            "ZREVRANGE" => zset::zrange(&self.keys.read(), args, true),
            "ZRANGEBYSCORE" => zset::zrange_by_score(&self.keys.read(), args, false),
            "ZREVRANGEBYSCORE" => zset::zrange_by_score(&self.keys.read(), args, true),
            "ZRANK" => zset::zrank(&self.keys.read(), args, false),
            "ZREVRANK" => zset::zrank(&self.keys.read(), args, true),
            "ZREMRANGEBYRANK" => zset::zremrange_by_rank(&mut self.keys.write(), args),
            "ZREMRANGEBYSCORE" => zset::zremrange_by_score(&mut self.keys.write(), args),
            "ZINTERSTORE" => zset::zstore(&mut self.keys.write(), args, zset::Combine::Inter),
            "ZUNIONSTORE" => zset::zstore(&mut self.keys.write(), args, zset::Combine::Union),
            "ZSCAN" => scan::zscan(&self.keys.read(), args),

            _ => Err(server_error(format!("ERR unknown command '{}'", name))),
        }
    }

    fn auth(&self, args: &[Bytes]) -> Result<Value> {
        arity("AUTH", args, 1)?;
        let given = &args[args.len() - 1];
        match &self.password {
            None => Err(server_error(
                "ERR AUTH <password> called without any password configured for the default user",
            )),
            Some(pw) if pw.as_bytes() == &given[..] => Ok(ok()),
            Some(_) => Err(server_error(
                "WRONGPASS invalid username-password pair or user is disabled.",
            )),
        }
    }
}

impl Backend for MemoryBackend {
    fn execute(&self, args: &[Bytes]) -> Result<Value> {
        let Some((name, rest)) = args.split_first() else {
            return Err(server_error("ERR empty command"));
        };
        let name = String::from_utf8_lossy(name).to_ascii_uppercase();
        trace!(command = %name, argc = rest.len(), "memory backend dispatch");
        self.dispatch(&name, rest)
    }
}

fn select(args: &[Bytes]) -> Result<Value> {
    arity("SELECT", args, 1)?;
    match parse_int(&args[0])? {
        0 => Ok(ok()),
        _ => Err(server_error("ERR DB index is out of range")),
    }
}

// ── Shared helpers for the command modules ──────────────────────────────────

fn ok() -> Value {
    Value::Status("OK".into())
}

#[cold]
fn server_error(msg: impl Into<String>) -> Error {
    Error::Server(msg.into())
}

#[cold]
fn wrong_type() -> Error {
    server_error(WRONGTYPE)
}

#[cold]
fn syntax_error() -> Error {
    server_error("ERR syntax error")
}

/// Require at least `min` arguments after the command name.
fn arity(name: &str, args: &[Bytes], min: usize) -> Result<()> {
    if args.len() < min {
        return Err(server_error(format!(
            "ERR wrong number of arguments for '{}' command",
            name.to_ascii_lowercase()
        )));
    }
    Ok(())
}

/// Require exactly `n` arguments after the command name.
fn exact_arity(name: &str, args: &[Bytes], n: usize) -> Result<()> {
    arity(name, args, n)?;
    if args.len() > n {
        return Err(syntax_error());
    }
    Ok(())
}

fn parse_int(raw: &[u8]) -> Result<i64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| server_error("ERR value is not an integer or out of range"))
}

fn parse_float(raw: &[u8]) -> Result<f64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(parse_score)
        .ok_or_else(|| server_error("ERR value is not a valid float"))
}

fn parse_bound(raw: &[u8]) -> Result<ScoreBound> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<ScoreBound>().ok())
        .ok_or_else(|| server_error("ERR min or max is not a float"))
}

/// Does the option word at `raw` equal `word`, ignoring case?
fn is_word(raw: &[u8], word: &str) -> bool {
    raw.eq_ignore_ascii_case(word.as_bytes())
}
