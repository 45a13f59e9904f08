//! RESP2 wire format.
//!
//! Commands go out as arrays of bulk strings. Replies come back as a single
//! frame which a [`Decoder`] lifts into a [`Value`], turning error lines
//! into [`Error::Server`].

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::types::Value;

const CRLF: &[u8] = b"\r\n";

/// Encode a command as a RESP2 array of bulk strings.
///
/// ```text
/// *3\r\n$4\r\nZADD\r\n$1\r\nk\r\n...
/// ```
pub fn encode_command(args: &[Bytes], buf: &mut BytesMut) {
    put_header(buf, b'*', args.len() as i64);
    for arg in args {
        put_bulk(buf, arg);
    }
}

/// Encode a reply value. Used by servers and test harnesses that answer
/// commands with the same framing the client decodes.
pub fn encode_value(value: &Value, buf: &mut BytesMut) {
    match value {
        Value::Status(s) => {
            buf.put_u8(b'+');
            buf.put_slice(s.as_bytes());
            buf.put_slice(CRLF);
        }
        Value::Integer(n) => put_header(buf, b':', *n),
        Value::String(b) => put_bulk(buf, b),
        Value::Nil => buf.put_slice(b"$-1\r\n"),
        Value::Array(items) => {
            put_header(buf, b'*', items.len() as i64);
            for item in items {
                encode_value(item, buf);
            }
        }
    }
}

/// Encode an error reply line. Line breaks in `msg` are flattened.
pub fn encode_error(msg: &str, buf: &mut BytesMut) {
    buf.put_u8(b'-');
    for byte in msg.bytes() {
        buf.put_u8(if byte == b'\r' || byte == b'\n' { b' ' } else { byte });
    }
    buf.put_slice(CRLF);
}

fn put_header(buf: &mut BytesMut, prefix: u8, n: i64) {
    buf.put_u8(prefix);
    buf.put_slice(n.to_string().as_bytes());
    buf.put_slice(CRLF);
}

fn put_bulk(buf: &mut BytesMut, data: &[u8]) {
    put_header(buf, b'$', data.len() as i64);
    buf.put_slice(data);
    buf.put_slice(CRLF);
}

/// Deepest array nesting accepted in a reply.
const MAX_DEPTH: usize = 512;

/// Incremental reply decoder.
///
/// Frames are located with a non-allocating scan that resumes where the last
/// call stopped, so a large reply arriving in many reads is scanned once.
/// Values are only built once the whole frame is buffered, and bulk strings
/// share the frame's allocation.
///
/// Between calls that return `Ok(None)` the same buffer must be passed back
/// with bytes only appended to it.
#[derive(Debug, Default)]
pub struct Decoder {
    /// Offset of the first element header not yet scanned.
    scanned: usize,
    /// Elements still expected by each open array, innermost last.
    open: Vec<usize>,
}

impl Decoder {
    /// A decoder positioned at the start of a frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one frame from the front of `buf`.
    ///
    /// Returns `Ok(None)` when more bytes are needed and leaves `buf`
    /// untouched. A complete frame is always consumed, including an error
    /// reply, which is returned as [`Error::Server`] so the next frame starts
    /// clean. On any other error `buf` is left as is and the decoder resets.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Value>> {
        let end = match self.scan(&buf[..]) {
            Ok(Some(end)) => end,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };
        self.reset();

        let frame = buf.split_to(end).freeze();
        let (reply, _) = build(&frame, 0)?;
        reply.map(Some).map_err(Error::Server)
    }

    fn reset(&mut self) {
        self.scanned = 0;
        self.open.clear();
    }

    /// Advance over complete elements. Returns the frame length once the
    /// outermost element is complete.
    fn scan(&mut self, buf: &[u8]) -> Result<Option<usize>> {
        loop {
            let pos = self.scanned;
            let Some(&prefix) = buf.get(pos) else {
                return Ok(None);
            };
            let Some((line, next)) = line_at(buf, pos + 1) else {
                return Ok(None);
            };

            match prefix {
                b'+' | b'-' => self.scanned = next,
                b':' => {
                    decimal(line)?;
                    self.scanned = next;
                }
                b'$' => {
                    self.scanned = match length(line, "bulk string")? {
                        None => next,
                        Some(len) => {
                            let end = next.checked_add(len).ok_or_else(|| {
                                Error::Protocol("bulk string length overflow".into())
                            })?;
                            if buf.len() < end.saturating_add(CRLF.len()) {
                                return Ok(None);
                            }
                            if &buf[end..end + CRLF.len()] != CRLF {
                                return Err(Error::Protocol(
                                    "bulk string not terminated by CRLF".into(),
                                ));
                            }
                            end + CRLF.len()
                        }
                    };
                }
                b'*' => match length(line, "array")? {
                    None | Some(0) => self.scanned = next,
                    Some(count) => {
                        if self.open.len() >= MAX_DEPTH {
                            return Err(Error::Protocol("nesting too deep".into()));
                        }
                        self.open.push(count);
                        self.scanned = next;
                        continue;
                    }
                },
                other => return Err(unexpected_byte(other)),
            }

            // an element is complete; close every array it finishes
            loop {
                match self.open.last_mut() {
                    None => return Ok(Some(self.scanned)),
                    Some(remaining) => {
                        *remaining -= 1;
                        if *remaining > 0 {
                            break;
                        }
                        self.open.pop();
                    }
                }
            }
        }
    }
}

/// Decode one frame from the front of `buf` with a fresh [`Decoder`].
///
/// Suits a buffer that is decoded once; callers reading a stream should keep
/// a [`Decoder`] alongside their buffer instead.
pub fn decode_value(buf: &mut BytesMut) -> Result<Option<Value>> {
    Decoder::new().decode(buf)
}

/// A parsed frame: either a value or the text of an error reply.
type Reply = std::result::Result<Value, String>;

/// Build the element at `pos` of a frame that [`Decoder::scan`] has already
/// checked for completeness and nesting depth.
fn build(frame: &Bytes, pos: usize) -> Result<(Reply, usize)> {
    let truncated = || Error::Protocol("truncated frame".into());
    let prefix = *frame.get(pos).ok_or_else(truncated)?;
    let (line, next) = line_at(frame, pos + 1).ok_or_else(truncated)?;

    match prefix {
        b'+' => Ok((Ok(Value::Status(utf8(line)?.to_owned())), next)),
        b'-' => Ok((Err(utf8(line)?.to_owned()), next)),
        b':' => Ok((Ok(Value::Integer(decimal(line)?)), next)),
        b'$' => match length(line, "bulk string")? {
            None => Ok((Ok(Value::Nil), next)),
            Some(len) => {
                let end = next + len;
                if frame.len() < end + CRLF.len() {
                    return Err(truncated());
                }
                Ok((Ok(Value::String(frame.slice(next..end))), end + CRLF.len()))
            }
        },
        b'*' => match length(line, "array")? {
            None => Ok((Ok(Value::Nil), next)),
            Some(count) => {
                let mut items = Vec::with_capacity(count.min(1024));
                let mut failure = None;
                let mut cursor = next;
                for _ in 0..count {
                    let (item, after) = build(frame, cursor)?;
                    cursor = after;
                    match item {
                        Ok(value) => items.push(value),
                        Err(msg) => {
                            failure.get_or_insert(msg);
                        }
                    }
                }
                match failure {
                    Some(msg) => Ok((Err(msg), cursor)),
                    None => Ok((Ok(Value::Array(items)), cursor)),
                }
            }
        },
        other => Err(unexpected_byte(other)),
    }
}

/// A bulk string or array length; `-1` is the null form.
fn length(line: &[u8], what: &str) -> Result<Option<usize>> {
    match decimal(line)? {
        -1 => Ok(None),
        n => usize::try_from(n)
            .map(Some)
            .map_err(|_| Error::Protocol(format!("negative {} length", what))),
    }
}

#[cold]
fn unexpected_byte(byte: u8) -> Error {
    Error::Protocol(format!("unexpected byte: 0x{:02x}", byte))
}

/// Find the CRLF-terminated line starting at `start`.
fn line_at(buf: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = buf.get(start..)?;
    let idx = rest.windows(2).position(|w| w == CRLF)?;
    Some((&rest[..idx], start + idx + CRLF.len()))
}

fn utf8(line: &[u8]) -> Result<&str> {
    std::str::from_utf8(line).map_err(|e| Error::Protocol(format!("invalid UTF-8: {}", e)))
}

fn decimal(line: &[u8]) -> Result<i64> {
    let s = utf8(line)?;
    s.parse::<i64>()
        .map_err(|_| Error::Protocol(format!("invalid integer: {}", s)))
}
