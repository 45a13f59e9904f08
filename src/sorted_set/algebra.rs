//! Weighted union and intersection, stored into the current set.
//!
//! Every operation here **overwrites** the set it is called on: the set's own
//! key is the destination. Its prior contents take part only if its key is
//! listed among the sources.

use bytes::Bytes;
use tracing::debug;

use super::{SortedSet, Sortable};
use crate::backend::{arg, command, Backend};
use crate::error::{Error, Result};
use crate::member::{Member, Order};
use crate::types::ToArg;

/// How the scores of a member present in several sources are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregate {
    /// Add the weighted scores.
    #[default]
    Sum,
    /// Keep the smallest weighted score.
    Min,
    /// Keep the largest weighted score.
    Max,
}

impl Aggregate {
    /// The `AGGREGATE` option word.
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }

    pub(crate) fn combine(self, a: f64, b: f64) -> f64 {
        match self {
            Aggregate::Sum => a + b,
            Aggregate::Min => a.min(b),
            Aggregate::Max => a.max(b),
        }
    }
}

impl<B: Backend> SortedSet<B> {
    /// Replace this set with the intersection of `sources` (ZINTERSTORE).
    ///
    /// A member survives only if every source contains it; a missing source
    /// key counts as empty. `weights`, when given, must have one entry per
    /// source and multiply that source's scores. Returns the resulting
    /// cardinality.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `sources` is empty or the weight count
    /// differs from the source count; nothing is sent.
    pub fn inter_aggregate<K: ToArg>(
        &self,
        sources: &[K],
        weights: Option<&[f64]>,
        aggregate: Aggregate,
    ) -> Result<u64> {
        self.store_combined("ZINTERSTORE", sources, weights, aggregate)
    }

    /// Replace this set with the union of `sources` (ZUNIONSTORE).
    ///
    /// A member absent from a source contributes nothing for that source.
    /// Argument rules are those of [`inter_aggregate`](Self::inter_aggregate).
    pub fn union_aggregate<K: ToArg>(
        &self,
        sources: &[K],
        weights: Option<&[f64]>,
        aggregate: Aggregate,
    ) -> Result<u64> {
        self.store_combined("ZUNIONSTORE", sources, weights, aggregate)
    }

    fn store_combined<K: ToArg>(
        &self,
        name: &'static str,
        sources: &[K],
        weights: Option<&[f64]>,
        aggregate: Aggregate,
    ) -> Result<u64> {
        if sources.is_empty() {
            return Err(Error::invalid_argument(format!(
                "{} needs at least one source set",
                name
            )));
        }
        if let Some(w) = weights {
            if w.len() != sources.len() {
                return Err(Error::invalid_argument(format!(
                    "{} weights for {} source sets",
                    w.len(),
                    sources.len()
                )));
            }
        }

        let mut args = command(name, &self.key);
        args.push(arg(sources.len()));
        args.extend(sources.iter().map(ToArg::to_arg));
        if let Some(w) = weights {
            args.push(Bytes::from_static(b"WEIGHTS"));
            args.extend(w.iter().map(ToArg::to_arg));
        }
        args.push(Bytes::from_static(b"AGGREGATE"));
        args.push(Bytes::from_static(aggregate.as_str().as_bytes()));

        debug!(
            command = name,
            destination = %String::from_utf8_lossy(&self.key),
            sources = sources.len(),
            aggregate = aggregate.as_str(),
            "overwriting sorted set with combined sources"
        );
        self.call(args)?.into_count()
    }

    /// Intersection with summed scores.
    pub fn inter_sum<K: ToArg>(&self, sources: &[K], weights: Option<&[f64]>) -> Result<u64> {
        self.inter_aggregate(sources, weights, Aggregate::Sum)
    }

    /// Intersection keeping the minimum score.
    pub fn inter_min<K: ToArg>(&self, sources: &[K], weights: Option<&[f64]>) -> Result<u64> {
        self.inter_aggregate(sources, weights, Aggregate::Min)
    }

    /// Intersection keeping the maximum score.
    pub fn inter_max<K: ToArg>(&self, sources: &[K], weights: Option<&[f64]>) -> Result<u64> {
        self.inter_aggregate(sources, weights, Aggregate::Max)
    }

    /// Union with summed scores.
    pub fn union_sum<K: ToArg>(&self, sources: &[K], weights: Option<&[f64]>) -> Result<u64> {
        self.union_aggregate(sources, weights, Aggregate::Sum)
    }

    /// Union keeping the minimum score.
    pub fn union_min<K: ToArg>(&self, sources: &[K], weights: Option<&[f64]>) -> Result<u64> {
        self.union_aggregate(sources, weights, Aggregate::Min)
    }

    /// Union keeping the maximum score.
    pub fn union_max<K: ToArg>(&self, sources: &[K], weights: Option<&[f64]>) -> Result<u64> {
        self.union_aggregate(sources, weights, Aggregate::Max)
    }

    /// Store the summed intersection of `sources` into this set, then read
    /// back every member in ascending order.
    ///
    /// **Destructive**: this set is overwritten. The store and the read-back
    /// are two commands and are not atomic together.
    pub fn inter<K: ToArg>(&self, sources: &[K]) -> Result<Vec<Member>> {
        self.inter_sum(sources, None)?;
        self.all_members()
    }

    /// Store the summed union of `sources` into this set, then read back
    /// every member in ascending order.
    ///
    /// **Destructive**: this set is overwritten. The store and the read-back
    /// are two commands and are not atomic together.
    pub fn union<K: ToArg>(&self, sources: &[K]) -> Result<Vec<Member>> {
        self.union_sum(sources, None)?;
        self.all_members()
    }

    fn all_members(&self) -> Result<Vec<Member>> {
        Ok(self
            .select_by_rank(0, -1, false, Order::Ascending)?
            .into_iter()
            .map(|e| e.member)
            .collect())
    }
}
