//! ZSCAN and glob matching.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bytes::Bytes;

use super::zset::score_value;
use super::{arity, is_word, parse_int, server_error, syntax_error, wrong_type, Keyspace, Stored};
use crate::error::Result;
use crate::types::Value;

const DEFAULT_COUNT: usize = 10;

fn hash_member(member: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    member.hash(&mut hasher);
    hasher.finish()
}

/// ZSCAN key cursor [MATCH pattern] [COUNT count]
///
/// Members are walked in hash order. The returned cursor is the hash of the
/// first member not yet visited, so a member present for the whole scan is
/// returned at least once even if others are added or removed in between.
/// `MATCH` filters each page after it is cut, so a page may come back empty
/// with a nonzero cursor.
pub(super) fn zscan(keys: &Keyspace, args: &[Bytes]) -> Result<Value> {
    arity("ZSCAN", args, 2)?;
    let cursor = std::str::from_utf8(&args[1])
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| server_error("ERR invalid cursor"))?;

    let mut pattern: Option<&[u8]> = None;
    let mut count = DEFAULT_COUNT;
    let mut i = 2;
    while i < args.len() {
        if is_word(&args[i], "MATCH") && i + 1 < args.len() {
            pattern = Some(&args[i + 1][..]);
        } else if is_word(&args[i], "COUNT") && i + 1 < args.len() {
            count = match parse_int(&args[i + 1])? {
                n if n >= 1 => n as usize,
                _ => return Err(syntax_error()),
            };
        } else {
            return Err(syntax_error());
        }
        i += 2;
    }

    let set = match keys.get(&args[0]) {
        None => return Ok(page(0, Vec::new())),
        Some(Stored::SortedSet(z)) => z,
        Some(Stored::String(_)) => return Err(wrong_type()),
    };

    let mut members: Vec<(u64, &Bytes, f64)> = set
        .members()
        .map(|(member, score)| (hash_member(member), member, score))
        .collect();
    members.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let start = if cursor == 0 {
        0
    } else {
        members
            .iter()
            .position(|(h, _, _)| *h >= cursor)
            .unwrap_or(members.len())
    };
    let end = start.saturating_add(count).min(members.len());
    // 0 is the end-of-scan sentinel, so a real hash of 0 is bumped to 1
    let next = members.get(end).map_or(0, |(h, _, _)| (*h).max(1));

    let mut entries = Vec::new();
    for (_, member, score) in &members[start..end] {
        if pattern.map_or(true, |p| glob_match(p, member)) {
            entries.push(Value::String((*member).clone()));
            entries.push(score_value(*score));
        }
    }
    Ok(page(next, entries))
}

fn page(cursor: u64, entries: Vec<Value>) -> Value {
    Value::Array(vec![
        Value::String(Bytes::from(cursor.to_string())),
        Value::Array(entries),
    ])
}

/// Glob-style match of `text` against `pattern`.
///
/// Supports `*`, `?`, `[abc]`, `[^abc]`, `[a-z]` and `\` escapes. An
/// unterminated `[` matches itself.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let mut p = 0;
    let mut t = 0;
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        if pattern.get(p) == Some(&b'*') {
            resume = Some((p, t));
            p += 1;
            continue;
        }
        if p < pattern.len() {
            if let Some(next) = step(pattern, p, text[t]) {
                p = next;
                t += 1;
                continue;
            }
        }
        match resume {
            Some((star_p, star_t)) => {
                p = star_p + 1;
                t = star_t + 1;
                resume = Some((star_p, star_t + 1));
            }
            None => return false,
        }
    }

    while pattern.get(p) == Some(&b'*') {
        p += 1;
    }
    p == pattern.len()
}

/// If the single-byte pattern token at `p` matches `c`, the index after it.
fn step(pattern: &[u8], p: usize, c: u8) -> Option<usize> {
    match pattern[p] {
        b'?' => Some(p + 1),
        b'\\' if p + 1 < pattern.len() => (pattern[p + 1] == c).then_some(p + 2),
        b'[' => match class(pattern, p + 1, c) {
            Some((true, next)) => Some(next),
            Some((false, _)) => None,
            None => (c == b'[').then_some(p + 1),
        },
        lit => (lit == c).then_some(p + 1),
    }
}

/// Match `c` against the class body starting at `i`. Returns whether it
/// matched and the index after the closing `]`, or `None` if unterminated.
fn class(pattern: &[u8], mut i: usize, c: u8) -> Option<(bool, usize)> {
    let negate = pattern.get(i) == Some(&b'^');
    if negate {
        i += 1;
    }
    let mut matched = false;
    loop {
        match *pattern.get(i)? {
            b']' => return Some((matched != negate, i + 1)),
            b'\\' => {
                matched |= *pattern.get(i + 1)? == c;
                i += 2;
            }
            lo => match pattern.get(i + 2) {
                Some(&hi) if pattern[i + 1] == b'-' && hi != b']' => {
                    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                    matched |= (lo..=hi).contains(&c);
                    i += 3;
                }
                _ => {
                    matched |= lo == c;
                    i += 1;
                }
            },
        }
    }
}
