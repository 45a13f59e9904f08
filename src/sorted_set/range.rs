//! Rank- and score-addressed range queries.

use bytes::Bytes;

use super::{bound_arg, decode_entries, member_arg};
use crate::backend::{arg, command, Backend};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::member::{Entry, Limit, Member, Order, ScoreBound};

/// Range queries over an element whose members are kept in score order.
///
/// Ranks passed in are 0-based and inclusive at both ends; negative values
/// count from the back, so `(0, -1)` is the whole set. Ranks returned by
/// [`rank`](Sortable::rank) are 1-based.
pub trait Sortable: Element {
    /// Members between ranks `start` and `stop` (ZRANGE / ZREVRANGE).
    ///
    /// With [`Order::Descending`] rank 0 is the highest score.
    fn select_by_rank(
        &self,
        start: i64,
        stop: i64,
        with_scores: bool,
        order: Order,
    ) -> Result<Vec<Entry>> {
        let name = match order {
            Order::Ascending => "ZRANGE",
            Order::Descending => "ZREVRANGE",
        };
        let mut args = command(name, self.key());
        args.push(arg(start));
        args.push(arg(stop));
        if with_scores {
            args.push(Bytes::from_static(b"WITHSCORES"));
        }
        decode_entries(self.backend().execute(&args)?, with_scores)
    }

    /// Members whose score lies between `min` and `max`
    /// (ZRANGEBYSCORE / ZREVRANGEBYSCORE).
    ///
    /// `limit` windows the matching members in traversal order. Its offset is
    /// 0-based and sent as given.
    fn select_by_score(
        &self,
        min: impl Into<ScoreBound>,
        max: impl Into<ScoreBound>,
        limit: Option<Limit>,
        with_scores: bool,
        order: Order,
    ) -> Result<Vec<Entry>> {
        // the descending form takes its bounds high-to-low
        let (name, first, second) = match order {
            Order::Ascending => ("ZRANGEBYSCORE", bound_arg(min), bound_arg(max)),
            Order::Descending => ("ZREVRANGEBYSCORE", bound_arg(max), bound_arg(min)),
        };
        let mut args = command(name, self.key());
        args.push(first);
        args.push(second);
        if with_scores {
            args.push(Bytes::from_static(b"WITHSCORES"));
        }
        if let Some(limit) = limit {
            args.push(Bytes::from_static(b"LIMIT"));
            args.push(arg(limit.offset));
            args.push(arg(limit.count_arg()));
        }
        decode_entries(self.backend().execute(&args)?, with_scores)
    }

    /// 1-based position of `member` in `order`, or `None` if absent
    /// (ZRANK / ZREVRANK).
    fn rank(&self, member: impl Into<Member>, order: Order) -> Result<Option<u64>> {
        let name = match order {
            Order::Ascending => "ZRANK",
            Order::Descending => "ZREVRANK",
        };
        let mut args = command(name, self.key());
        args.push(member_arg(member));
        match self.backend().execute(&args)?.into_optional_integer()? {
            None => Ok(None),
            Some(rank) => u64::try_from(rank)
                .map(|r| Some(r + 1))
                .map_err(|_| Error::Protocol(format!("negative rank: {}", rank))),
        }
    }

    /// Remove members between ranks `start` and `stop` in ascending order
    /// (ZREMRANGEBYRANK). Returns how many were removed.
    fn delete_by_rank(&self, start: i64, stop: i64) -> Result<u64> {
        let mut args = command("ZREMRANGEBYRANK", self.key());
        args.push(arg(start));
        args.push(arg(stop));
        self.backend().execute(&args)?.into_count()
    }

    /// Remove members whose score lies between `min` and `max`
    /// (ZREMRANGEBYSCORE). Returns how many were removed.
    fn remove_by_score(
        &self,
        min: impl Into<ScoreBound>,
        max: impl Into<ScoreBound>,
    ) -> Result<u64> {
        let mut args = command("ZREMRANGEBYSCORE", self.key());
        args.push(bound_arg(min));
        args.push(bound_arg(max));
        self.backend().execute(&args)?.into_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    fn names(entries: Vec<Entry>) -> Vec<String> {
        entries.into_iter().map(|e| e.member.to_string()).collect()
    }

    fn seeded(db: &MemoryBackend) -> crate::SortedSet<&MemoryBackend> {
        let set = db.sorted_set("r");
        set.insert_batch([("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0), ("e", 5.0)])
            .unwrap();
        set
    }

    #[test]
    fn test_select_by_rank_orders() {
        let db = MemoryBackend::new();
        let set = seeded(&db);
        assert_eq!(
            names(set.select_by_rank(0, 1, false, Order::Ascending).unwrap()),
            ["a", "b"]
        );
        assert_eq!(
            names(set.select_by_rank(0, 1, false, Order::Descending).unwrap()),
            ["e", "d"]
        );
        assert_eq!(
            names(set.select_by_rank(-2, -1, false, Order::Ascending).unwrap()),
            ["d", "e"]
        );
        assert!(set
            .select_by_rank(3, 1, false, Order::Ascending)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_select_by_score_with_limit() {
        let db = MemoryBackend::new();
        let set = seeded(&db);
        let window = set
            .select_by_score(
                ScoreBound::NegInf,
                ScoreBound::PosInf,
                Some(Limit::new(1, 2)),
                true,
                Order::Ascending,
            )
            .unwrap();
        assert_eq!(
            window,
            vec![
                Entry {
                    member: Member::from("b"),
                    score: Some(2.0)
                },
                Entry {
                    member: Member::from("c"),
                    score: Some(3.0)
                },
            ]
        );

        let desc = set
            .select_by_score(2.0, ScoreBound::exclusive(5.0), None, false, Order::Descending)
            .unwrap();
        assert_eq!(names(desc), ["d", "c", "b"]);
    }

    #[test]
    fn test_limit_without_count_takes_the_rest() {
        let db = MemoryBackend::new();
        let set = seeded(&db);
        let rest = set
            .select_by_score(
                ScoreBound::NegInf,
                ScoreBound::PosInf,
                Some(Limit::from_offset(2)),
                false,
                Order::Ascending,
            )
            .unwrap();
        assert_eq!(names(rest), ["c", "d", "e"]);

        let huge = Limit::new(3, u64::MAX - 1);
        let rest = set
            .select_by_score(ScoreBound::NegInf, ScoreBound::PosInf, Some(huge), false, Order::Descending)
            .unwrap();
        assert_eq!(names(rest), ["b", "a"]);
    }

    #[test]
    fn test_rank_is_one_based() {
        let db = MemoryBackend::new();
        let set = seeded(&db);
        assert_eq!(set.rank("a", Order::Ascending).unwrap(), Some(1));
        assert_eq!(set.rank("a", Order::Descending).unwrap(), Some(5));
        assert_eq!(set.rank("nobody", Order::Ascending).unwrap(), None);
    }

    #[test]
    fn test_delete_ranges() {
        let db = MemoryBackend::new();
        let set = seeded(&db);
        assert_eq!(set.delete_by_rank(0, 1).unwrap(), 2);
        assert_eq!(set.remove_by_score(ScoreBound::exclusive(3.0), ScoreBound::PosInf).unwrap(), 2);
        assert_eq!(
            names(set.select_by_rank(0, -1, false, Order::Ascending).unwrap()),
            ["c"]
        );
    }
}
