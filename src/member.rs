//! Members, scores and range boundaries.
//!
//! A [`Member`] is a tagged scalar whose identity is its canonical byte
//! encoding. Equality, hashing and ordering all go through that encoding, so
//! the tie-break order among equal scores is the same whichever kind of scalar
//! populates a set.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::types::ToArg;

/// A member of an ordered set.
#[derive(Debug, Clone)]
pub enum Member {
    /// A text member, encoded as its UTF-8 bytes.
    Text(String),
    /// An integer member, encoded in decimal.
    Integer(i64),
    /// A floating-point member, encoded in shortest round-trip form.
    Float(f64),
}

impl Member {
    /// The canonical byte encoding sent to and received from the store.
    pub fn encode(&self) -> Cow<'_, [u8]> {
        match self {
            Member::Text(s) => Cow::Borrowed(s.as_bytes()),
            Member::Integer(n) => Cow::Owned(n.to_string().into_bytes()),
            Member::Float(f) => Cow::Owned(format_score(*f).into_bytes()),
        }
    }

    /// Decode a member from reply bytes.
    ///
    /// Picks the narrowest kind whose canonical encoding reproduces `bytes`
    /// exactly: integer, then finite float, then text.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| Error::Protocol("member is not valid UTF-8".into()))?;

        if let Ok(n) = text.parse::<i64>() {
            if n.to_string() == text {
                return Ok(Member::Integer(n));
            }
        }
        if let Ok(f) = text.parse::<f64>() {
            if f.is_finite() && f.to_string() == text {
                return Ok(Member::Float(f));
            }
        }
        Ok(Member::Text(text.to_owned()))
    }

    /// Returns the text if this is a text member.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Member::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an integer member.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Member::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float if this is a float member.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Member::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.encode() == other.encode()
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encode().hash(state);
    }
}

impl PartialOrd for Member {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Member {
    fn cmp(&self, other: &Self) -> Ordering {
        self.encode().cmp(&other.encode())
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Text(s) => f.write_str(s),
            Member::Integer(n) => write!(f, "{}", n),
            Member::Float(v) => f.write_str(&format_score(*v)),
        }
    }
}

impl ToArg for Member {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(&self.encode())
    }
}

impl ToArg for &Member {
    fn to_arg(&self) -> Bytes {
        (*self).to_arg()
    }
}

impl From<&str> for Member {
    fn from(s: &str) -> Self {
        Member::Text(s.to_owned())
    }
}

impl From<String> for Member {
    fn from(s: String) -> Self {
        Member::Text(s)
    }
}

impl From<i64> for Member {
    fn from(n: i64) -> Self {
        Member::Integer(n)
    }
}

impl From<i32> for Member {
    fn from(n: i32) -> Self {
        Member::Integer(n.into())
    }
}

impl From<u32> for Member {
    fn from(n: u32) -> Self {
        Member::Integer(n.into())
    }
}

impl From<f64> for Member {
    fn from(f: f64) -> Self {
        Member::Float(f)
    }
}

impl From<&Member> for Member {
    fn from(m: &Member) -> Self {
        m.clone()
    }
}

/// Format a score the way the store accepts it: `+inf`, `-inf`, or the
/// shortest decimal that round-trips.
pub fn format_score(score: f64) -> String {
    if score == f64::INFINITY {
        "+inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        score.to_string()
    }
}

/// Parse a score, accepting `inf`, `+inf` and `-inf` in any case.
///
/// NaN is never a valid score.
pub fn parse_score(s: &str) -> Option<f64> {
    match s.to_ascii_lowercase().as_str() {
        "+inf" | "inf" | "+infinity" | "infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        other => other.parse::<f64>().ok().filter(|f| !f.is_nan()),
    }
}

/// One side of a score range.
///
/// The textual form is the one the store uses: `-inf`, `+inf`, `1.5` for an
/// inclusive boundary and `(1.5` for an exclusive one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    /// Negative infinity.
    NegInf,
    /// Positive infinity.
    PosInf,
    /// Closed boundary.
    Inclusive(f64),
    /// Open boundary.
    Exclusive(f64),
}

impl ScoreBound {
    /// Closed boundary at `score`.
    pub fn inclusive(score: f64) -> Self {
        ScoreBound::Inclusive(score)
    }

    /// Open boundary at `score`.
    pub fn exclusive(score: f64) -> Self {
        ScoreBound::Exclusive(score)
    }

    fn limit(&self) -> (f64, bool) {
        match *self {
            ScoreBound::NegInf => (f64::NEG_INFINITY, false),
            ScoreBound::PosInf => (f64::INFINITY, false),
            ScoreBound::Inclusive(v) => (v, false),
            ScoreBound::Exclusive(v) => (v, true),
        }
    }

    /// Does `score` lie on the admitted side of this bound used as a minimum?
    pub fn lower_admits(&self, score: f64) -> bool {
        match self.limit() {
            (v, false) => score >= v,
            (v, true) => score > v,
        }
    }

    /// Does `score` lie on the admitted side of this bound used as a maximum?
    pub fn upper_admits(&self, score: f64) -> bool {
        match self.limit() {
            (v, false) => score <= v,
            (v, true) => score < v,
        }
    }
}

impl From<f64> for ScoreBound {
    fn from(score: f64) -> Self {
        if score == f64::INFINITY {
            ScoreBound::PosInf
        } else if score == f64::NEG_INFINITY {
            ScoreBound::NegInf
        } else {
            ScoreBound::Inclusive(score)
        }
    }
}

impl fmt::Display for ScoreBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ScoreBound::NegInf => f.write_str("-inf"),
            ScoreBound::PosInf => f.write_str("+inf"),
            ScoreBound::Inclusive(v) => f.write_str(&format_score(v)),
            ScoreBound::Exclusive(v) => write!(f, "({}", format_score(v)),
        }
    }
}

impl FromStr for ScoreBound {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::invalid_argument(format!("invalid score bound: {:?}", s));
        if let Some(rest) = s.strip_prefix('(') {
            return parse_score(rest)
                .map(ScoreBound::Exclusive)
                .ok_or_else(invalid);
        }
        parse_score(s).map(ScoreBound::from).ok_or_else(invalid)
    }
}

impl ToArg for ScoreBound {
    fn to_arg(&self) -> Bytes {
        Bytes::from(self.to_string())
    }
}

/// A member returned by a range or scan, with its score when requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The member.
    pub member: Member,
    /// The score; `None` unless scores were requested.
    pub score: Option<f64>,
}

/// Pagination window into the members matching a score range.
///
/// `offset` is 0-based: the first matching member is offset 0. A `count`
/// above `i64::MAX` is sent as the store's "all remaining" form (`-1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// Number of matching members to skip.
    pub offset: u64,
    /// Maximum number of members to return.
    pub count: u64,
}

impl Limit {
    /// Create a window of `count` members starting at `offset`.
    pub fn new(offset: u64, count: u64) -> Self {
        Self { offset, count }
    }

    /// Every matching member from `offset` on.
    pub fn from_offset(offset: u64) -> Self {
        Self {
            offset,
            count: u64::MAX,
        }
    }

    /// The count as sent on the wire.
    pub(crate) fn count_arg(&self) -> i64 {
        i64::try_from(self.count).unwrap_or(-1)
    }
}

/// Traversal direction over the score-then-member total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Lowest score first.
    #[default]
    Ascending,
    /// Highest score first.
    Descending,
}
