//! Keyed elements: a typed view of one key in the store.

use bytes::Bytes;

use crate::backend::{command, Backend};
use crate::error::Result;

/// A typed value stored under one key.
///
/// Implementors supply the key and the backend; the key-level helpers come
/// for free. Range queries are a separate capability, see
/// [`Sortable`](crate::Sortable).
pub trait Element {
    /// The backend commands are sent through.
    type Backend: Backend;

    /// The key this element lives under.
    fn key(&self) -> &Bytes;

    /// The backend this element talks to.
    fn backend(&self) -> &Self::Backend;

    /// Whether the key currently holds a value (EXISTS).
    fn exists(&self) -> Result<bool> {
        let args = command("EXISTS", self.key());
        Ok(self.backend().execute(&args)?.into_count()? > 0)
    }

    /// Delete the key and whatever it holds (DEL). Returns whether it existed.
    fn clear(&self) -> Result<bool> {
        let args = command("DEL", self.key());
        Ok(self.backend().execute(&args)?.into_count()? > 0)
    }
}
