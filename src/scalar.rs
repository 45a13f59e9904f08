//! Scalar counters stored as plain string keys.
//!
//! [`Counter`] rejects a zero delta before touching the store while
//! [`FloatCounter`] accepts any delta, zero included.

use bytes::Bytes;

use crate::backend::{arg, command, Backend};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::types::{score_from_bytes, ToArg};

/// An integer counter (GET / SET / INCRBY / DECRBY).
#[derive(Debug, Clone)]
pub struct Counter<B> {
    backend: B,
    key: Bytes,
}

impl<B: Backend> Counter<B> {
    /// A counter stored at `key`.
    pub fn new(backend: B, key: impl ToArg) -> Self {
        Self {
            backend,
            key: key.to_arg(),
        }
    }

    /// Current value, or `None` if the key is absent.
    pub fn get(&self) -> Result<Option<i64>> {
        let reply = self.backend.execute(&command("GET", &self.key))?;
        match reply.into_optional_bytes()? {
            None => Ok(None),
            Some(raw) => std::str::from_utf8(&raw)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .map(Some)
                .ok_or_else(|| Error::Protocol("counter value is not an integer".into())),
        }
    }

    /// Overwrite the value.
    pub fn set(&self, value: i64) -> Result<()> {
        let mut args = command("SET", &self.key);
        args.push(arg(value));
        self.backend.execute(&args)?.expect_ok()
    }

    /// Add `delta` and return the new value. A missing key counts as 0.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `delta` is 0; nothing is sent.
    pub fn increment(&self, delta: i64) -> Result<i64> {
        self.apply("INCRBY", delta)
    }

    /// Subtract `delta` and return the new value.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `delta` is 0; nothing is sent.
    pub fn decrement(&self, delta: i64) -> Result<i64> {
        self.apply("DECRBY", delta)
    }

    fn apply(&self, cmd: &'static str, delta: i64) -> Result<i64> {
        if delta == 0 {
            return Err(Error::invalid_argument("counter delta must be non-zero"));
        }
        let mut args = command(cmd, &self.key);
        args.push(arg(delta));
        self.backend.execute(&args)?.into_integer()
    }
}

impl<B: Backend> Element for Counter<B> {
    type Backend = B;

    fn key(&self) -> &Bytes {
        &self.key
    }

    fn backend(&self) -> &B {
        &self.backend
    }
}

/// A floating-point counter (GET / SET / INCRBYFLOAT).
#[derive(Debug, Clone)]
pub struct FloatCounter<B> {
    backend: B,
    key: Bytes,
}

impl<B: Backend> FloatCounter<B> {
    /// A float counter stored at `key`.
    pub fn new(backend: B, key: impl ToArg) -> Self {
        Self {
            backend,
            key: key.to_arg(),
        }
    }

    /// Current value, or `None` if the key is absent.
    pub fn get(&self) -> Result<Option<f64>> {
        let reply = self.backend.execute(&command("GET", &self.key))?;
        reply
            .into_optional_bytes()?
            .map(|raw| score_from_bytes(&raw))
            .transpose()
    }

    /// Overwrite the value.
    pub fn set(&self, value: f64) -> Result<()> {
        let mut args = command("SET", &self.key);
        args.push(arg(value));
        self.backend.execute(&args)?.expect_ok()
    }

    /// Add `delta` (which may be 0) and return the new value.
    pub fn increment(&self, delta: f64) -> Result<f64> {
        let mut args = command("INCRBYFLOAT", &self.key);
        args.push(arg(delta));
        self.backend.execute(&args)?.into_score()
    }

    /// Subtract `delta` and return the new value.
    pub fn decrement(&self, delta: f64) -> Result<f64> {
        self.increment(-delta)
    }
}

impl<B: Backend> Element for FloatCounter<B> {
    type Backend = B;

    fn key(&self) -> &Bytes {
        &self.key
    }

    fn backend(&self) -> &B {
        &self.backend
    }
}
