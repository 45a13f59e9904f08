//! Ordered sets: unique members kept in score order.
//!
//! [`SortedSet`] carries the point operations (insert, delete, score lookup,
//! increment). Range queries come from the [`Sortable`] capability, set
//! algebra and cursor scans live in their own submodules.

mod algebra;
mod cursor;
mod range;

pub use algebra::Aggregate;
pub use cursor::{MemberScan, ScanPage};
pub use range::Sortable;

use bytes::Bytes;

use crate::backend::{arg, command, Backend};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::member::{Entry, Member, ScoreBound};
use crate::types::{ToArg, Value};

/// An ordered set stored under one key.
///
/// Every method is one round trip to the backend and is atomic there.
///
/// # Examples
///
/// ```
/// use rankset::{Backend, MemoryBackend, Order, Sortable};
///
/// let db = MemoryBackend::new();
/// let board = db.sorted_set("leaderboard");
/// board.insert("alice", 10.0)?;
/// board.insert("bob", 7.5)?;
///
/// let top = board.select_by_rank(0, 0, true, Order::Descending)?;
/// assert_eq!(top[0].member.to_string(), "alice");
/// assert_eq!(board.rank("bob", Order::Ascending)?, Some(1));
/// # Ok::<(), rankset::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SortedSet<B> {
    backend: B,
    key: Bytes,
}

impl<B: Backend> SortedSet<B> {
    /// An ordered set stored at `key`. Nothing is sent until the first call.
    pub fn new(backend: B, key: impl ToArg) -> Self {
        Self {
            backend,
            key: key.to_arg(),
        }
    }

    fn call(&self, args: Vec<Bytes>) -> Result<Value> {
        self.backend.execute(&args)
    }

    /// Add `member` with `score`, or re-score it if present (ZADD).
    ///
    /// Returns `true` only if the member was newly created.
    pub fn insert(&self, member: impl Into<Member>, score: f64) -> Result<bool> {
        let mut args = command("ZADD", &self.key);
        args.push(arg(score));
        args.push(member_arg(member));
        Ok(self.call(args)?.into_count()? == 1)
    }

    /// Add or re-score many members in one ZADD. Returns how many were new.
    ///
    /// An empty batch returns 0 without contacting the backend.
    pub fn insert_batch<M: Into<Member>>(
        &self,
        pairs: impl IntoIterator<Item = (M, f64)>,
    ) -> Result<u64> {
        let mut args = command("ZADD", &self.key);
        for (member, score) in pairs {
            args.push(arg(score));
            args.push(member_arg(member));
        }
        if args.len() == 2 {
            return Ok(0);
        }
        self.call(args)?.into_count()
    }

    /// Remove members (ZREM). Absent members are ignored. Returns how many
    /// were removed.
    ///
    /// An empty input returns 0 without contacting the backend.
    pub fn delete<M: Into<Member>>(&self, members: impl IntoIterator<Item = M>) -> Result<u64> {
        let mut args = command("ZREM", &self.key);
        args.extend(members.into_iter().map(member_arg));
        if args.len() == 2 {
            return Ok(0);
        }
        self.call(args)?.into_count()
    }

    /// Number of members (ZCARD). An absent key counts as empty.
    pub fn count(&self) -> Result<u64> {
        self.call(command("ZCARD", &self.key))?.into_count()
    }

    /// Number of members whose score lies between `min` and `max` (ZCOUNT).
    pub fn count_by_score(
        &self,
        min: impl Into<ScoreBound>,
        max: impl Into<ScoreBound>,
    ) -> Result<u64> {
        let mut args = command("ZCOUNT", &self.key);
        args.push(bound_arg(min));
        args.push(bound_arg(max));
        self.call(args)?.into_count()
    }

    /// Score of `member`, or `None` if it is not in the set (ZSCORE).
    pub fn get_score(&self, member: impl Into<Member>) -> Result<Option<f64>> {
        let mut args = command("ZSCORE", &self.key);
        args.push(member_arg(member));
        self.call(args)?.into_optional_score()
    }

    /// Add `delta` to `member`'s score and return the new score (ZINCRBY).
    ///
    /// An absent member is created with score `delta`.
    pub fn increment(&self, member: impl Into<Member>, delta: f64) -> Result<f64> {
        let mut args = command("ZINCRBY", &self.key);
        args.push(arg(delta));
        args.push(member_arg(member));
        self.call(args)?.into_score()
    }

    /// Subtract `delta` from `member`'s score and return the new score.
    pub fn decrement(&self, member: impl Into<Member>, delta: f64) -> Result<f64> {
        self.increment(member, -delta)
    }
}

impl<B: Backend> Element for SortedSet<B> {
    type Backend = B;

    fn key(&self) -> &Bytes {
        &self.key
    }

    fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: Backend> Sortable for SortedSet<B> {}

pub(crate) fn member_arg(member: impl Into<Member>) -> Bytes {
    let member: Member = member.into();
    member.to_arg()
}

pub(crate) fn bound_arg(bound: impl Into<ScoreBound>) -> Bytes {
    let bound: ScoreBound = bound.into();
    bound.to_arg()
}

fn member_from(value: Value) -> Result<Member> {
    Member::decode(&value.into_bytes()?)
}

/// Decode a flat range reply: `[m, m, ...]` or `[m, s, m, s, ...]`.
pub(crate) fn decode_entries(reply: Value, with_scores: bool) -> Result<Vec<Entry>> {
    let items = reply.into_array()?;
    if !with_scores {
        return items
            .into_iter()
            .map(|v| {
                Ok(Entry {
                    member: member_from(v)?,
                    score: None,
                })
            })
            .collect();
    }

    if items.len() % 2 != 0 {
        return Err(Error::Protocol(format!(
            "odd number of elements in member/score reply: {}",
            items.len()
        )));
    }
    let mut entries = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(member), Some(score)) = (iter.next(), iter.next()) {
        entries.push(Entry {
            member: member_from(member)?,
            score: Some(score.into_score()?),
        });
    }
    Ok(entries)
}
