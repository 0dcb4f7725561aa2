//! Score distributions and time series over the scored table.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::processing::dates::UNKNOWN_DATE;
use crate::table::models::{ScoredRecord, Score};

/// How many statements of each score an author has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreHistogram {
    pub author: String,
    pub negative: u64,
    pub neutral: u64,
    pub positive: u64,
}

impl ScoreHistogram {
    pub fn total(&self) -> u64 {
        self.negative + self.neutral + self.positive
    }

    pub fn get(&self, score: Score) -> u64 {
        match score {
            Score::Negative => self.negative,
            Score::Neutral => self.neutral,
            Score::Positive => self.positive,
        }
    }
}

/// Per-author score counts, ordered by author.
pub fn score_histogram(records: &[ScoredRecord]) -> Vec<ScoreHistogram> {
    let mut by_author: BTreeMap<&str, ScoreHistogram> = BTreeMap::new();

    for record in records {
        let author = record.statement.author.as_str();
        let entry = by_author.entry(author).or_insert_with(|| ScoreHistogram {
            author: author.to_string(),
            negative: 0,
            neutral: 0,
            positive: 0,
        });
        match record.score {
            Score::Negative => entry.negative += 1,
            Score::Neutral => entry.neutral += 1,
            Score::Positive => entry.positive += 1,
        }
    }

    by_author.into_values().collect()
}

/// Statements per calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    /// `YYYY-MM`
    pub month: String,
    pub count: u64,
    pub average_score: f64,
}

/// Monthly counts and mean score, oldest first. Rows carrying the
/// unknown-date sentinel are left out.
pub fn monthly_series(records: &[ScoredRecord]) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<&str, (u64, i64)> = BTreeMap::new();

    for record in records {
        let date = record.statement.date.as_str();
        if date == UNKNOWN_DATE {
            continue;
        }
        let Some(month) = date.get(..7) else {
            continue;
        };
        let entry = months.entry(month).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += record.score.value();
    }

    months
        .into_iter()
        .map(|(month, (count, sum))| MonthlyPoint {
            month: month.to_string(),
            count,
            average_score: sum as f64 / count as f64,
        })
        .collect()
}
