//! Reply values and command argument conversion.

use bytes::Bytes;
use std::fmt;

use crate::error::{Error, Result};
use crate::member::{format_score, parse_score};

/// A reply decoded from the backing store.
///
/// Maps to the RESP2 reply types. Error replies never become a `Value`; they
/// surface as [`Error::Server`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A bulk string.
    String(Bytes),

    /// An integer reply.
    Integer(i64),

    /// An array of replies.
    Array(Vec<Value>),

    /// A null bulk string or null array.
    Nil,

    /// A simple string such as `+OK`.
    Status(String),
}

impl Value {
    /// Returns the value as a string, if it is one.
    ///
    /// # Examples
    /// ```
    /// # use rankset::Value;
    /// let val = Value::String(bytes::Bytes::from("hello"));
    /// assert_eq!(val.as_str(), Some("hello"));
    /// ```
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(b) => std::str::from_utf8(b).ok(),
            Value::Status(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns `true` if the value is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Converts the value into an `i64`.
    pub fn into_integer(self) -> Result<i64> {
        match self {
            Value::Integer(n) => Ok(n),
            other => Err(other.unexpected("integer")),
        }
    }

    /// Converts an integer reply that counts something into a `u64`.
    pub fn into_count(self) -> Result<u64> {
        let n = self.into_integer()?;
        u64::try_from(n).map_err(|_| Error::Protocol(format!("negative count: {}", n)))
    }

    /// Converts an integer-or-nil reply (ZRANK, ZREVRANK) into an `Option`.
    pub fn into_optional_integer(self) -> Result<Option<i64>> {
        match self {
            Value::Nil => Ok(None),
            Value::Integer(n) => Ok(Some(n)),
            other => Err(other.unexpected("integer or nil")),
        }
    }

    /// Converts the value into a `Vec<Value>`. Nil is an empty array.
    pub fn into_array(self) -> Result<Vec<Value>> {
        match self {
            Value::Array(arr) => Ok(arr),
            Value::Nil => Ok(vec![]),
            other => Err(other.unexpected("array")),
        }
    }

    /// Converts a bulk-string-or-nil reply into optional raw bytes.
    pub fn into_optional_bytes(self) -> Result<Option<Bytes>> {
        match self {
            Value::Nil => Ok(None),
            Value::String(b) => Ok(Some(b)),
            other => Err(other.unexpected("bulk string or nil")),
        }
    }

    /// Converts a bulk string reply into its raw bytes.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            Value::String(b) => Ok(b),
            other => Err(other.unexpected("bulk string")),
        }
    }

    /// Converts a score reply (a bulk string such as `"1.5"` or `"-inf"`).
    pub fn into_score(self) -> Result<f64> {
        match self {
            Value::String(b) => score_from_bytes(&b),
            Value::Integer(n) => Ok(n as f64),
            other => Err(other.unexpected("score")),
        }
    }

    /// Converts a score-or-nil reply (ZSCORE) into an `Option`.
    pub fn into_optional_score(self) -> Result<Option<f64>> {
        match self {
            Value::Nil => Ok(None),
            other => other.into_score().map(Some),
        }
    }

    /// Checks for a `+OK` status reply.
    pub fn expect_ok(self) -> Result<()> {
        match self {
            Value::Status(ref s) if s == "OK" => Ok(()),
            other => Err(other.unexpected("OK")),
        }
    }

    /// Returns a human-readable type name for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Array(_) => "array",
            Value::Nil => "nil",
            Value::Status(_) => "status",
        }
    }

    #[cold]
    fn unexpected(&self, expected: &'static str) -> Error {
        Error::UnexpectedResponse {
            expected,
            actual: self.type_name().to_string(),
        }
    }
}

pub(crate) fn score_from_bytes(bytes: &[u8]) -> Result<f64> {
    let s = std::str::from_utf8(bytes)
        .map_err(|_| Error::Protocol("invalid UTF-8 in score".into()))?;
    parse_score(s).ok_or_else(|| Error::Protocol(format!("invalid score: {}", s)))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "\"{}\"", s),
                Err(_) => write!(f, "<binary {} bytes>", b.len()),
            },
            Value::Integer(n) => write!(f, "(integer) {}", n),
            Value::Array(arr) => {
                for (i, val) in arr.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, val)?;
                }
                Ok(())
            }
            Value::Nil => write!(f, "(nil)"),
            Value::Status(s) => write!(f, "{}", s),
        }
    }
}

/// Trait for types that can be converted into command arguments.
pub trait ToArg {
    /// Encode this value as a RESP bulk string argument.
    fn to_arg(&self) -> Bytes;
}

impl ToArg for &str {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for &String {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for Bytes {
    fn to_arg(&self) -> Bytes {
        self.clone()
    }
}

impl ToArg for &Bytes {
    fn to_arg(&self) -> Bytes {
        (*self).clone()
    }
}

impl ToArg for &[u8] {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Vec<u8> {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for i64 {
    fn to_arg(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

impl ToArg for u64 {
    fn to_arg(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

impl ToArg for usize {
    fn to_arg(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

impl ToArg for f64 {
    fn to_arg(&self) -> Bytes {
        Bytes::from(format_score(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_count_rejects_negative() {
        assert_eq!(Value::Integer(3).into_count().unwrap(), 3);
        assert!(matches!(
            Value::Integer(-1).into_count(),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_into_optional_score() {
        assert_eq!(Value::Nil.into_optional_score().unwrap(), None);
        assert_eq!(
            Value::String(Bytes::from("2.5"))
                .into_optional_score()
                .unwrap(),
            Some(2.5)
        );
        assert_eq!(
            Value::String(Bytes::from("-inf")).into_score().unwrap(),
            f64::NEG_INFINITY
        );
        assert!(Value::String(Bytes::from("abc")).into_score().is_err());
    }

    #[test]
    fn test_unexpected_response() {
        let err = Value::Status("OK".into()).into_integer().unwrap_err();
        match err {
            Error::UnexpectedResponse { expected, actual } => {
                assert_eq!(expected, "integer");
                assert_eq!(actual, "status");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nil_array_is_empty() {
        assert!(Value::Nil.into_array().unwrap().is_empty());
    }

    #[test]
    fn test_float_arg_uses_score_format() {
        assert_eq!(f64::INFINITY.to_arg(), Bytes::from("+inf"));
        assert_eq!(1.5f64.to_arg(), Bytes::from("1.5"));
        assert_eq!(3.0f64.to_arg(), Bytes::from("3"));
    }
}
