//! Sorted set storage and the Z* commands.

use std::collections::{BTreeSet, HashMap};

use bytes::Bytes;
use ordered_float::OrderedFloat;

use super::{
    arity, exact_arity, is_word, parse_bound, parse_float, parse_int, server_error, syntax_error,
    wrong_type, Keyspace, Stored,
};
use crate::error::Result;
use crate::member::{format_score, ScoreBound};
use crate::sorted_set::Aggregate;
use crate::types::Value;

/// A sorted set indexed both ways: by (score, member) for ordered walks and
/// by member for point lookups.
#[derive(Debug, Default, Clone)]
pub(super) struct ZSet {
    by_score: BTreeSet<(OrderedFloat<f64>, Bytes)>,
    by_member: HashMap<Bytes, f64>,
}

impl ZSet {
    pub(super) fn len(&self) -> usize {
        self.by_member.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.by_member.is_empty()
    }

    /// Set `member`'s score. Returns true if the member is new.
    pub(super) fn insert(&mut self, member: Bytes, score: f64) -> bool {
        match self.by_member.insert(member.clone(), score) {
            Some(old) => {
                self.by_score.remove(&(OrderedFloat(old), member.clone()));
                self.by_score.insert((OrderedFloat(score), member));
                false
            }
            None => {
                self.by_score.insert((OrderedFloat(score), member));
                true
            }
        }
    }

    pub(super) fn remove(&mut self, member: &[u8]) -> bool {
        match self.by_member.remove_entry(member) {
            Some((member, score)) => {
                self.by_score.remove(&(OrderedFloat(score), member));
                true
            }
            None => false,
        }
    }

    pub(super) fn score(&self, member: &[u8]) -> Option<f64> {
        self.by_member.get(member).copied()
    }

    /// 0-based ascending rank.
    pub(super) fn rank(&self, member: &[u8]) -> Option<usize> {
        let (member, &score) = self.by_member.get_key_value(member)?;
        Some(
            self.by_score
                .range(..(OrderedFloat(score), member.clone()))
                .count(),
        )
    }

    /// Members in ascending (score, member) order.
    pub(super) fn iter(&self) -> impl DoubleEndedIterator<Item = (&Bytes, f64)> + '_ {
        self.by_score.iter().map(|(score, member)| (member, score.0))
    }

    /// Members in no particular order.
    pub(super) fn members(&self) -> impl Iterator<Item = (&Bytes, f64)> + '_ {
        self.by_member.iter().map(|(member, &score)| (member, score))
    }

    /// Ascending members whose score lies within `[min, max]`.
    pub(super) fn in_score_range(&self, min: &ScoreBound, max: &ScoreBound) -> Vec<(&Bytes, f64)> {
        self.iter()
            .skip_while(|(_, score)| !min.lower_admits(*score))
            .take_while(|(_, score)| max.upper_admits(*score))
            .collect()
    }
}

/// Map inclusive rank indices, negative ones counting from the back, onto
/// `0..len`. `None` when the window is empty.
pub(super) fn normalize_rank_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

/// Scores go out the way the remote store writes them.
pub(super) fn score_value(score: f64) -> Value {
    if score == f64::INFINITY {
        Value::String(Bytes::from_static(b"inf"))
    } else {
        Value::String(Bytes::from(format_score(score)))
    }
}

fn entries_value<'a>(entries: impl Iterator<Item = (&'a Bytes, f64)>, with_scores: bool) -> Value {
    let mut out = Vec::new();
    for (member, score) in entries {
        out.push(Value::String(member.clone()));
        if with_scores {
            out.push(score_value(score));
        }
    }
    Value::Array(out)
}

fn zset_ref<'a>(keys: &'a Keyspace, key: &Bytes) -> Result<Option<&'a ZSet>> {
    match keys.get(key) {
        None => Ok(None),
        Some(Stored::SortedSet(z)) => Ok(Some(z)),
        Some(Stored::String(_)) => Err(wrong_type()),
    }
}

fn zset_existing<'a>(keys: &'a mut Keyspace, key: &Bytes) -> Result<Option<&'a mut ZSet>> {
    match keys.get_mut(key) {
        None => Ok(None),
        Some(Stored::SortedSet(z)) => Ok(Some(z)),
        Some(Stored::String(_)) => Err(wrong_type()),
    }
}

fn zset_or_create<'a>(keys: &'a mut Keyspace, key: &Bytes) -> Result<&'a mut ZSet> {
    match keys
        .entry(key.clone())
        .or_insert_with(|| Stored::SortedSet(ZSet::default()))
    {
        Stored::SortedSet(z) => Ok(z),
        Stored::String(_) => Err(wrong_type()),
    }
}

/// Drop `key` if it holds an empty sorted set.
fn prune(keys: &mut Keyspace, key: &Bytes) {
    if matches!(keys.get(key), Some(Stored::SortedSet(z)) if z.is_empty()) {
        keys.remove(key);
    }
}

/// ZADD key score member [score member ...]
pub(super) fn zadd(keys: &mut Keyspace, args: &[Bytes]) -> Result<Value> {
    arity("ZADD", args, 3)?;
    let pairs = &args[1..];
    if pairs.len() % 2 != 0 {
        return Err(syntax_error());
    }
    // validate every score before touching the set
    let parsed = pairs
        .chunks_exact(2)
        .map(|pair| Ok((parse_float(&pair[0])?, pair[1].clone())))
        .collect::<Result<Vec<_>>>()?;

    let set = zset_or_create(keys, &args[0])?;
    let mut added = 0i64;
    for (score, member) in parsed {
        if set.insert(member, score) {
            added += 1;
        }
    }
    Ok(Value::Integer(added))
}

/// ZREM key member [member ...]
pub(super) fn zrem(keys: &mut Keyspace, args: &[Bytes]) -> Result<Value> {
    arity("ZREM", args, 2)?;
    let Some(set) = zset_existing(keys, &args[0])? else {
        return Ok(Value::Integer(0));
    };
    let removed = args[1..].iter().filter(|m| set.remove(m)).count();
    prune(keys, &args[0]);
    Ok(Value::Integer(removed as i64))
}

/// ZCARD key
pub(super) fn zcard(keys: &Keyspace, args: &[Bytes]) -> Result<Value> {
    exact_arity("ZCARD", args, 1)?;
    let len = zset_ref(keys, &args[0])?.map_or(0, ZSet::len);
    Ok(Value::Integer(len as i64))
}

/// ZCOUNT key min max
pub(super) fn zcount(keys: &Keyspace, args: &[Bytes]) -> Result<Value> {
    exact_arity("ZCOUNT", args, 3)?;
    let min = parse_bound(&args[1])?;
    let max = parse_bound(&args[2])?;
    let n = zset_ref(keys, &args[0])?.map_or(0, |set| set.in_score_range(&min, &max).len());
    Ok(Value::Integer(n as i64))
}

/// ZSCORE key member
pub(super) fn zscore(keys: &Keyspace, args: &[Bytes]) -> Result<Value> {
    exact_arity("ZSCORE", args, 2)?;
    Ok(zset_ref(keys, &args[0])?
        .and_then(|set| set.score(&args[1]))
        .map_or(Value::Nil, score_value))
}

/// ZINCRBY key increment member
pub(super) fn zincrby(keys: &mut Keyspace, args: &[Bytes]) -> Result<Value> {
    exact_arity("ZINCRBY", args, 3)?;
    let delta = parse_float(&args[1])?;
    let member = &args[2];

    let current = zset_ref(keys, &args[0])?
        .and_then(|set| set.score(member))
        .unwrap_or(0.0);
    let next = current + delta;
    if next.is_nan() {
        return Err(server_error("ERR resulting score is not a number (NaN)"));
    }

    zset_or_create(keys, &args[0])?.insert(member.clone(), next);
    Ok(score_value(next))
}

/// ZRANGE key start stop [WITHSCORES] / ZREVRANGE key start stop [WITHSCORES]
pub(super) fn zrange(keys: &Keyspace, args: &[Bytes], rev: bool) -> Result<Value> {
    arity(if rev { "ZREVRANGE" } else { "ZRANGE" }, args, 3)?;
    let start = parse_int(&args[1])?;
    let stop = parse_int(&args[2])?;
    let with_scores = match &args[3..] {
        [] => false,
        [opt] if is_word(opt, "WITHSCORES") => true,
        _ => return Err(syntax_error()),
    };

    let Some(set) = zset_ref(keys, &args[0])? else {
        return Ok(Value::Array(vec![]));
    };
    let Some((lo, hi)) = normalize_rank_range(start, stop, set.len()) else {
        return Ok(Value::Array(vec![]));
    };

    let take = hi - lo + 1;
    Ok(if rev {
        entries_value(set.iter().rev().skip(lo).take(take), with_scores)
    } else {
        entries_value(set.iter().skip(lo).take(take), with_scores)
    })
}

/// ZRANGEBYSCORE key min max [WITHSCORES] [LIMIT offset count]
/// ZREVRANGEBYSCORE key max min [WITHSCORES] [LIMIT offset count]
pub(super) fn zrange_by_score(keys: &Keyspace, args: &[Bytes], rev: bool) -> Result<Value> {
    arity(if rev { "ZREVRANGEBYSCORE" } else { "ZRANGEBYSCORE" }, args, 3)?;
    let (min, max) = if rev {
        (parse_bound(&args[2])?, parse_bound(&args[1])?)
    } else {
        (parse_bound(&args[1])?, parse_bound(&args[2])?)
    };

    let mut with_scores = false;
    let mut limit = None;
    let mut i = 3;
    while i < args.len() {
        if is_word(&args[i], "WITHSCORES") {
            with_scores = true;
            i += 1;
        } else if is_word(&args[i], "LIMIT") && i + 2 < args.len() {
            limit = Some((parse_int(&args[i + 1])?, parse_int(&args[i + 2])?));
            i += 3;
        } else {
            return Err(syntax_error());
        }
    }

    let Some(set) = zset_ref(keys, &args[0])? else {
        return Ok(Value::Array(vec![]));
    };
    let mut matched = set.in_score_range(&min, &max);
    if rev {
        matched.reverse();
    }

    let (offset, count) = match limit {
        None => (0, usize::MAX),
        Some((offset, _)) if offset < 0 => return Ok(Value::Array(vec![])),
        // a negative count means "all remaining"
        Some((offset, count)) => (offset as usize, usize::try_from(count).unwrap_or(usize::MAX)),
    };
    Ok(entries_value(
        matched.into_iter().skip(offset).take(count),
        with_scores,
    ))
}

/// ZRANK key member / ZREVRANK key member
pub(super) fn zrank(keys: &Keyspace, args: &[Bytes], rev: bool) -> Result<Value> {
    exact_arity(if rev { "ZREVRANK" } else { "ZRANK" }, args, 2)?;
    let Some(set) = zset_ref(keys, &args[0])? else {
        return Ok(Value::Nil);
    };
    Ok(match set.rank(&args[1]) {
        Some(rank) if rev => Value::Integer((set.len() - 1 - rank) as i64),
        Some(rank) => Value::Integer(rank as i64),
        None => Value::Nil,
    })
}

/// ZREMRANGEBYRANK key start stop
pub(super) fn zremrange_by_rank(keys: &mut Keyspace, args: &[Bytes]) -> Result<Value> {
    exact_arity("ZREMRANGEBYRANK", args, 3)?;
    let start = parse_int(&args[1])?;
    let stop = parse_int(&args[2])?;
    let Some(set) = zset_existing(keys, &args[0])? else {
        return Ok(Value::Integer(0));
    };
    let Some((lo, hi)) = normalize_rank_range(start, stop, set.len()) else {
        return Ok(Value::Integer(0));
    };

    let doomed: Vec<Bytes> = set
        .iter()
        .skip(lo)
        .take(hi - lo + 1)
        .map(|(member, _)| member.clone())
        .collect();
    for member in &doomed {
        set.remove(member);
    }
    prune(keys, &args[0]);
    Ok(Value::Integer(doomed.len() as i64))
}

/// ZREMRANGEBYSCORE key min max
pub(super) fn zremrange_by_score(keys: &mut Keyspace, args: &[Bytes]) -> Result<Value> {
    exact_arity("ZREMRANGEBYSCORE", args, 3)?;
    let min = parse_bound(&args[1])?;
    let max = parse_bound(&args[2])?;
    let Some(set) = zset_existing(keys, &args[0])? else {
        return Ok(Value::Integer(0));
    };

    let doomed: Vec<Bytes> = set
        .in_score_range(&min, &max)
        .into_iter()
        .map(|(member, _)| member.clone())
        .collect();
    for member in &doomed {
        set.remove(member);
    }
    prune(keys, &args[0]);
    Ok(Value::Integer(doomed.len() as i64))
}

/// Which store command [`zstore`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Combine {
    Inter,
    Union,
}

impl Combine {
    fn name(self) -> &'static str {
        match self {
            Combine::Inter => "zinterstore",
            Combine::Union => "zunionstore",
        }
    }
}

/// Weighted score; `inf * 0` counts as 0.
fn weighted(score: f64, weight: f64) -> f64 {
    let v = score * weight;
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

fn aggregate(agg: Aggregate, a: f64, b: f64) -> f64 {
    let v = agg.combine(a, b);
    if v.is_nan() {
        0.0
    } else {
        v
    }
}

/// ZINTERSTORE / ZUNIONSTORE destination numkeys key [key ...]
/// [WEIGHTS weight [weight ...]] [AGGREGATE SUM|MIN|MAX]
///
/// The result is computed in full before the destination is written, so the
/// destination may also be one of the sources.
pub(super) fn zstore(keys: &mut Keyspace, args: &[Bytes], combine: Combine) -> Result<Value> {
    arity(combine.name(), args, 3)?;
    let numkeys = parse_int(&args[1])?;
    if numkeys < 1 {
        return Err(server_error(format!(
            "ERR at least 1 input key is needed for '{}' command",
            combine.name()
        )));
    }
    let numkeys = numkeys as usize;
    let Some(sources) = args.get(2..2 + numkeys) else {
        return Err(syntax_error());
    };

    let mut weights = vec![1.0; numkeys];
    let mut agg = Aggregate::Sum;
    let mut i = 2 + numkeys;
    while i < args.len() {
        if is_word(&args[i], "WEIGHTS") {
            let Some(raw) = args.get(i + 1..i + 1 + numkeys) else {
                return Err(syntax_error());
            };
            for (slot, w) in weights.iter_mut().zip(raw) {
                *slot = parse_float(w)
                    .map_err(|_| server_error("ERR weight value is not a float"))?;
            }
            i += 1 + numkeys;
        } else if is_word(&args[i], "AGGREGATE") && i + 1 < args.len() {
            agg = match &args[i + 1] {
                w if is_word(w, "SUM") => Aggregate::Sum,
                w if is_word(w, "MIN") => Aggregate::Min,
                w if is_word(w, "MAX") => Aggregate::Max,
                _ => return Err(syntax_error()),
            };
            i += 2;
        } else {
            return Err(syntax_error());
        }
    }

    let result = {
        let inputs = sources
            .iter()
            .map(|key| zset_ref(keys, key))
            .collect::<Result<Vec<_>>>()?;
        match combine {
            Combine::Union => union_of(&inputs, &weights, agg),
            Combine::Inter => intersection_of(&inputs, &weights, agg),
        }
    };

    let dest = args[0].clone();
    if result.is_empty() {
        keys.remove(&dest);
        return Ok(Value::Integer(0));
    }
    let mut set = ZSet::default();
    for (member, score) in result {
        set.insert(member, score);
    }
    let len = set.len();
    keys.insert(dest, Stored::SortedSet(set));
    Ok(Value::Integer(len as i64))
}

fn union_of(inputs: &[Option<&ZSet>], weights: &[f64], agg: Aggregate) -> HashMap<Bytes, f64> {
    let mut acc: HashMap<Bytes, f64> = HashMap::new();
    for (set, &w) in inputs.iter().zip(weights) {
        let Some(set) = set else { continue };
        for (member, score) in set.members() {
            let score = weighted(score, w);
            acc.entry(member.clone())
                .and_modify(|existing| *existing = aggregate(agg, *existing, score))
                .or_insert(score);
        }
    }
    acc
}

fn intersection_of(
    inputs: &[Option<&ZSet>],
    weights: &[f64],
    agg: Aggregate,
) -> HashMap<Bytes, f64> {
    let Some(sets) = inputs.iter().copied().collect::<Option<Vec<&ZSet>>>() else {
        // a missing source is an empty set
        return HashMap::new();
    };
    let Some((first, rest)) = sets.split_first() else {
        return HashMap::new();
    };

    let mut acc: HashMap<Bytes, f64> = first
        .members()
        .map(|(member, score)| (member.clone(), weighted(score, weights[0])))
        .collect();
    for (set, &w) in rest.iter().zip(&weights[1..]) {
        acc.retain(|member, existing| match set.score(member) {
            Some(score) => {
                *existing = aggregate(agg, *existing, weighted(score, w));
                true
            }
            None => false,
        });
    }
    acc
}
