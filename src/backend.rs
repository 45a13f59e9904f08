//! The seam between typed elements and the store that executes their commands.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;
use crate::scalar::{Counter, FloatCounter};
use crate::sorted_set::SortedSet;
use crate::types::{ToArg, Value};

/// Something that executes one command and returns its reply.
///
/// Every typed operation in this crate is a single call to [`execute`]
/// followed by reply normalization. An error reply from the store comes back
/// as [`Error::Server`](crate::Error::Server).
///
/// Implemented by [`Client`](crate::Client) for a remote store and by
/// [`MemoryBackend`](crate::MemoryBackend) for an in-process one.
///
/// [`execute`]: Backend::execute
pub trait Backend {
    /// Execute the command whose name and arguments are `args`.
    fn execute(&self, args: &[Bytes]) -> Result<Value>;

    /// An ordered set stored at `key`, borrowing this backend.
    fn sorted_set(&self, key: impl ToArg) -> SortedSet<&Self>
    where
        Self: Sized,
    {
        SortedSet::new(self, key)
    }

    /// An integer counter stored at `key`, borrowing this backend.
    fn counter(&self, key: impl ToArg) -> Counter<&Self>
    where
        Self: Sized,
    {
        Counter::new(self, key)
    }

    /// A floating-point counter stored at `key`, borrowing this backend.
    fn float_counter(&self, key: impl ToArg) -> FloatCounter<&Self>
    where
        Self: Sized,
    {
        FloatCounter::new(self, key)
    }
}

impl<T: Backend + ?Sized> Backend for &T {
    fn execute(&self, args: &[Bytes]) -> Result<Value> {
        (**self).execute(args)
    }
}

impl<T: Backend + ?Sized> Backend for Arc<T> {
    fn execute(&self, args: &[Bytes]) -> Result<Value> {
        (**self).execute(args)
    }
}

/// Start an argument vector with a command name and its key.
#[inline]
pub(crate) fn command(name: &'static str, key: &Bytes) -> Vec<Bytes> {
    vec![Bytes::from_static(name.as_bytes()), key.clone()]
}

/// Convert anything that implements [`ToArg`] into an argument.
#[inline]
pub(crate) fn arg<T: ToArg>(val: T) -> Bytes {
    val.to_arg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Records every command and answers with a fixed reply.
    struct Recorder {
        seen: Mutex<Vec<Vec<Bytes>>>,
    }

    impl Backend for Recorder {
        fn execute(&self, args: &[Bytes]) -> Result<Value> {
            self.seen.lock().push(args.to_vec());
            Ok(Value::Integer(1))
        }
    }

    #[test]
    fn test_forwarding_impls() {
        let rec = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let by_ref = &*rec;
        by_ref.execute(&[Bytes::from("PING")]).unwrap();
        rec.execute(&[Bytes::from("PING")]).unwrap();
        (&rec).execute(&[Bytes::from("PING")]).unwrap();
        assert_eq!(rec.seen.lock().len(), 3);
    }

    #[test]
    fn test_command_helper() {
        let key = Bytes::from("board");
        let mut args = command("ZCARD", &key);
        args.push(arg(3i64));
        assert_eq!(args, vec![Bytes::from("ZCARD"), key, Bytes::from("3")]);
    }
}
