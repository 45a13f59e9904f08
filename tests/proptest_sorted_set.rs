//! Property-based tests for sorted sets and counters
//!
//! Uses proptest to check ordering, counting and algebra invariants against
//! the in-process backend for randomly generated members and scores.
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use std::collections::{BTreeMap, HashMap, HashSet};

use ordered_float::OrderedFloat;

use rankset::{
    Backend, Counter, Element, Member, MemoryBackend, Order, ScoreBound, Sortable,
};

// ============================================================================
// Test Strategies
// ============================================================================

/// Strategy for generating text members
fn member_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,12}"
}

/// Finite scores with a fair share of ties
fn score_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1000i32..1000).prop_map(f64::from),
        -1.0e6f64..1.0e6,
    ]
}

/// Member → score maps; insertion keeps the last score per member
fn members_strategy() -> impl Strategy<Value = HashMap<String, f64>> {
    prop::collection::hash_map(member_strategy(), score_strategy(), 0..60)
}

fn expected_order(members: &HashMap<String, f64>) -> Vec<String> {
    let sorted: BTreeMap<(OrderedFloat<f64>, &[u8]), &str> = members
        .iter()
        .map(|(m, s)| ((OrderedFloat(*s), m.as_bytes()), m.as_str()))
        .collect();
    sorted.into_values().map(str::to_owned).collect()
}

// ============================================================================
// Ordering Properties
// ============================================================================

proptest! {
    /// Full ascending range is (score, member bytes) order
    #[test]
    fn prop_range_order(members in members_strategy()) {
        let db = MemoryBackend::new();
        let set = db.sorted_set("z");
        set.insert_batch(members.iter().map(|(m, s)| (m.clone(), *s))).unwrap();

        let got: Vec<String> = set
            .select_by_rank(0, -1, false, Order::Ascending)
            .unwrap()
            .into_iter()
            .map(|e| e.member.to_string())
            .collect();
        prop_assert_eq!(got, expected_order(&members));
    }

    /// Descending is the exact reverse of ascending
    #[test]
    fn prop_descending_is_reverse(members in members_strategy()) {
        let db = MemoryBackend::new();
        let set = db.sorted_set("z");
        set.insert_batch(members.iter().map(|(m, s)| (m.clone(), *s))).unwrap();

        let mut asc = set.select_by_rank(0, -1, true, Order::Ascending).unwrap();
        asc.reverse();
        let desc = set.select_by_rank(0, -1, true, Order::Descending).unwrap();
        prop_assert_eq!(asc, desc);
    }

    /// Rank agrees with position in the full range
    #[test]
    fn prop_rank_matches_position(members in members_strategy()) {
        let db = MemoryBackend::new();
        let set = db.sorted_set("z");
        set.insert_batch(members.iter().map(|(m, s)| (m.clone(), *s))).unwrap();

        let order = expected_order(&members);
        let n = order.len() as u64;
        for (i, m) in order.iter().enumerate() {
            let i = i as u64;
            prop_assert_eq!(set.rank(m.as_str(), Order::Ascending).unwrap(), Some(i + 1));
            prop_assert_eq!(set.rank(m.as_str(), Order::Descending).unwrap(), Some(n - i));
        }
    }

    /// Score reads back exactly as inserted
    #[test]
    fn prop_score_roundtrip(member in member_strategy(), score in score_strategy()) {
        let db = MemoryBackend::new();
        let set = db.sorted_set("z");
        prop_assert!(set.insert(member.as_str(), score).unwrap());
        prop_assert_eq!(set.get_score(member.as_str()).unwrap(), Some(score));
    }
}

// ============================================================================
// Counting Properties
// ============================================================================

proptest! {
    /// Count equals distinct members, and count_by_score(-inf, +inf) agrees
    #[test]
    fn prop_count_is_distinct_members(pairs in prop::collection::vec((member_strategy(), score_strategy()), 0..80)) {
        let db = MemoryBackend::new();
        let set = db.sorted_set("z");
        set.insert_batch(pairs.clone()).unwrap();

        let distinct: HashSet<&String> = pairs.iter().map(|(m, _)| m).collect();
        prop_assert_eq!(set.count().unwrap(), distinct.len() as u64);
        prop_assert_eq!(
            set.count_by_score(ScoreBound::NegInf, ScoreBound::PosInf).unwrap(),
            distinct.len() as u64
        );
        prop_assert_eq!(set.exists().unwrap(), !distinct.is_empty());
    }

    /// Score ranges match a linear filter for every bound kind
    #[test]
    fn prop_score_range_matches_filter(
        members in members_strategy(),
        lo in score_strategy(),
        hi in score_strategy(),
        lo_open in any::<bool>(),
        hi_open in any::<bool>(),
    ) {
        let db = MemoryBackend::new();
        let set = db.sorted_set("z");
        set.insert_batch(members.iter().map(|(m, s)| (m.clone(), *s))).unwrap();

        let bound = |v: f64, open: bool| if open { ScoreBound::exclusive(v) } else { ScoreBound::inclusive(v) };
        let (min, max) = (bound(lo, lo_open), bound(hi, hi_open));

        let expected: Vec<String> = expected_order(&members)
            .into_iter()
            .filter(|m| min.lower_admits(members[m]) && max.upper_admits(members[m]))
            .collect();
        let got: Vec<String> = set
            .select_by_score(min, max, None, false, Order::Ascending)
            .unwrap()
            .into_iter()
            .map(|e| e.member.to_string())
            .collect();
        prop_assert_eq!(set.count_by_score(min, max).unwrap(), expected.len() as u64);
        prop_assert_eq!(got, expected);
    }

    /// Removing by score leaves exactly the members outside the range
    #[test]
    fn prop_remove_by_score_complement(members in members_strategy(), lo in score_strategy(), hi in score_strategy()) {
        let db = MemoryBackend::new();
        let set = db.sorted_set("z");
        set.insert_batch(members.iter().map(|(m, s)| (m.clone(), *s))).unwrap();

        let inside = members.values().filter(|s| lo <= **s && **s <= hi).count() as u64;
        prop_assert_eq!(set.remove_by_score(lo, hi).unwrap(), inside);
        prop_assert_eq!(set.count().unwrap(), members.len() as u64 - inside);
        prop_assert_eq!(set.count_by_score(lo, hi).unwrap(), 0);
    }
}

// ============================================================================
// Algebra Properties
// ============================================================================

proptest! {
    /// Union SUM adds scores of shared members and keeps the rest as-is
    #[test]
    fn prop_union_sum(a in members_strategy(), b in members_strategy()) {
        let db = MemoryBackend::new();
        db.sorted_set("a").insert_batch(a.iter().map(|(m, s)| (m.clone(), *s))).unwrap();
        db.sorted_set("b").insert_batch(b.iter().map(|(m, s)| (m.clone(), *s))).unwrap();
        let out = db.sorted_set("out");

        let keys: HashSet<&String> = a.keys().chain(b.keys()).collect();
        prop_assert_eq!(out.union_sum(&["a", "b"], None).unwrap(), keys.len() as u64);
        for m in keys {
            let expected = a.get(m).copied().unwrap_or(0.0) + b.get(m).copied().unwrap_or(0.0);
            prop_assert_eq!(out.get_score(m.as_str()).unwrap(), Some(expected));
        }
    }

    /// Intersection holds exactly the shared members
    #[test]
    fn prop_inter_members(a in members_strategy(), b in members_strategy(), wa in -4i32..4, wb in -4i32..4) {
        let db = MemoryBackend::new();
        db.sorted_set("a").insert_batch(a.iter().map(|(m, s)| (m.clone(), *s))).unwrap();
        db.sorted_set("b").insert_batch(b.iter().map(|(m, s)| (m.clone(), *s))).unwrap();
        let out = db.sorted_set("out");

        let weights = [f64::from(wa), f64::from(wb)];
        let shared: HashSet<Member> = a
            .keys()
            .filter(|m| b.contains_key(*m))
            .map(|m| Member::from(m.as_str()))
            .collect();
        prop_assert_eq!(out.inter_max(&["a", "b"], Some(&weights[..])).unwrap(), shared.len() as u64);

        let got: HashSet<Member> = out
            .select_by_rank(0, -1, false, Order::Ascending)
            .unwrap()
            .into_iter()
            .map(|e| e.member)
            .collect();
        prop_assert_eq!(got, shared);
    }
}

// ============================================================================
// Counter Properties
// ============================================================================

proptest! {
    /// A sequence of non-zero increments sums up
    #[test]
    fn prop_counter_sums_deltas(deltas in prop::collection::vec(prop_oneof![-1000i64..-1, 1i64..1000], 1..50)) {
        let db = MemoryBackend::new();
        let counter = Counter::new(&db, "c");
        let mut total = 0;
        for d in &deltas {
            total += d;
            prop_assert_eq!(counter.increment(*d).unwrap(), total);
        }
        prop_assert_eq!(counter.get().unwrap(), Some(total));
    }
}
