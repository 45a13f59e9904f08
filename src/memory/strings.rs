//! String keys: GET, SET and the counter increments.

use bytes::Bytes;

use super::{
    arity, exact_arity, ok, parse_float, parse_int, server_error, syntax_error, wrong_type,
    Keyspace, Stored,
};
use crate::error::Result;
use crate::member::format_score;
use crate::types::Value;

fn string_at<'a>(keys: &'a Keyspace, key: &Bytes) -> Result<Option<&'a Bytes>> {
    match keys.get(key) {
        None => Ok(None),
        Some(Stored::String(v)) => Ok(Some(v)),
        Some(Stored::SortedSet(_)) => Err(wrong_type()),
    }
}

/// GET key
pub(super) fn get(keys: &Keyspace, args: &[Bytes]) -> Result<Value> {
    exact_arity("GET", args, 1)?;
    Ok(match string_at(keys, &args[0])? {
        Some(v) => Value::String(v.clone()),
        None => Value::Nil,
    })
}

/// SET key value
///
/// Overwrites whatever the key held, including a sorted set.
pub(super) fn set(keys: &mut Keyspace, args: &[Bytes]) -> Result<Value> {
    arity("SET", args, 2)?;
    if args.len() > 2 {
        // expiry and conditional flags are not supported
        return Err(syntax_error());
    }
    keys.insert(args[0].clone(), Stored::String(args[1].clone()));
    Ok(ok())
}

/// INCRBY key delta / DECRBY key delta
pub(super) fn incr_by(keys: &mut Keyspace, args: &[Bytes], negate: bool) -> Result<Value> {
    exact_arity(if negate { "DECRBY" } else { "INCRBY" }, args, 2)?;
    let delta = parse_int(&args[1])?;
    let current = match string_at(keys, &args[0])? {
        Some(raw) => parse_int(raw)?,
        None => 0,
    };

    let delta = if negate { delta.checked_neg() } else { Some(delta) };
    let next = delta
        .and_then(|d| current.checked_add(d))
        .ok_or_else(|| server_error("ERR increment or decrement would overflow"))?;

    keys.insert(args[0].clone(), Stored::String(Bytes::from(next.to_string())));
    Ok(Value::Integer(next))
}

/// INCRBYFLOAT key delta
pub(super) fn incr_by_float(keys: &mut Keyspace, args: &[Bytes]) -> Result<Value> {
    exact_arity("INCRBYFLOAT", args, 2)?;
    let delta = parse_float(&args[1])?;
    let current = match string_at(keys, &args[0])? {
        Some(raw) => parse_float(raw)?,
        None => 0.0,
    };

    let next = current + delta;
    if !next.is_finite() {
        return Err(server_error("ERR increment would produce NaN or Infinity"));
    }

    let text = Bytes::from(format_score(next));
    keys.insert(args[0].clone(), Stored::String(text.clone()));
    Ok(Value::String(text))
}
