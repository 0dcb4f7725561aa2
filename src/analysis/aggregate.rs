//! Per-author and per-party score aggregation.

use std::collections::BTreeMap;

use crate::table::models::{GroupAggregate, GroupKey, Orientation, ScoredRecord};

/// Count-weighted blend of a group's mean with itself.
///
/// `mean * (count / max_count) + mean * (1 - count / max_count)`, which is
/// algebraically `mean`. Evaluated literally, not simplified.
pub fn normalized_score(mean: f64, count: u64, max_count: u64) -> f64 {
    if max_count == 0 {
        return mean;
    }
    let weight = count as f64 / max_count as f64;
    mean * weight + mean * (1.0 - weight)
}

#[derive(Default)]
struct Accumulator {
    sum: i64,
    count: u64,
    orientation: Option<Orientation>,
}

/// Group scored rows by author or party. Output is ordered by key.
pub fn aggregate(records: &[ScoredRecord], key: GroupKey) -> Vec<GroupAggregate> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();

    for record in records {
        let acc = groups.entry(key.value_of(record)).or_default();
        acc.sum += record.score.value();
        acc.count += 1;
        if key == GroupKey::Party && acc.orientation.is_none() {
            acc.orientation = record.orientation;
        }
    }

    let max_count = groups.values().map(|acc| acc.count).max().unwrap_or(0);

    groups
        .into_iter()
        .map(|(name, acc)| {
            let mean = acc.sum as f64 / acc.count as f64;
            GroupAggregate {
                key: name.to_string(),
                average_score: mean,
                count: acc.count,
                normalized_score: normalized_score(mean, acc.count, max_count),
                orientation: acc.orientation,
                image_url: None,
            }
        })
        .collect()
}

/// Sort descending by normalized score; ties by key for a stable display.
pub fn rank_by_normalized_score(mut groups: Vec<GroupAggregate>) -> Vec<GroupAggregate> {
    groups.sort_by(|a, b| {
        b.normalized_score
            .total_cmp(&a.normalized_score)
            .then_with(|| a.key.cmp(&b.key))
    });
    groups
}

/// Group with the lowest normalized score (first one on ties).
pub fn lowest(groups: &[GroupAggregate]) -> Option<&GroupAggregate> {
    groups.iter().reduce(|best, g| {
        if g.normalized_score < best.normalized_score {
            g
        } else {
            best
        }
    })
}

/// Group with the highest normalized score (first one on ties).
pub fn highest(groups: &[GroupAggregate]) -> Option<&GroupAggregate> {
    groups.iter().reduce(|best, g| {
        if g.normalized_score > best.normalized_score {
            g
        } else {
            best
        }
    })
}
