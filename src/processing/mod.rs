//! Classification and normalization of the scraped statement table.

pub mod dates;
pub mod party;
pub mod verdict;

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::info;

use crate::paths::ProjectPaths;
use crate::table::models::{ScoredRecord, StatementRecord};
use crate::table::parquet::{read_statements, write_scored};

use self::dates::standardize_date;
use self::party::{canonicalize_party, orientation};
use self::verdict::VerdictClassifier;

/// Counts reported by [`normalize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub input_rows: usize,
    pub dropped_incomplete: usize,
    pub dropped_duplicate: usize,
    pub output_rows: usize,
}

/// Turn raw statements into scored, canonical rows.
///
/// Dates become ISO strings, verdicts become scores, party names are
/// canonicalized and mapped to an orientation. Rows with a blank author,
/// party or verdict are dropped, ids are deduplicated (first wins) and the
/// result is sorted by date, newest first.
pub fn normalize(records: Vec<StatementRecord>) -> (Vec<ScoredRecord>, NormalizeStats) {
    let classifier = VerdictClassifier::italian();
    let mut stats = NormalizeStats {
        input_rows: records.len(),
        ..Default::default()
    };

    let mut seen = HashSet::new();
    let mut scored = Vec::with_capacity(records.len());

    for mut record in records {
        record.date = standardize_date(Some(&record.date));
        record.party = canonicalize_party(&record.party);
        record.author = record.author.trim().to_string();
        record.verdict = record.verdict.trim().to_string();

        if record.author.is_empty() || record.party.is_empty() || record.verdict.is_empty() {
            stats.dropped_incomplete += 1;
            continue;
        }
        if !seen.insert(record.id.clone()) {
            stats.dropped_duplicate += 1;
            continue;
        }

        let score = classifier.classify(&record.verdict);
        let orientation = orientation(&record.party);
        scored.push(ScoredRecord {
            statement: record,
            score,
            orientation,
        });
    }

    // ISO dates sort lexicographically; the sort is stable so ties keep input order.
    scored.sort_by(|a, b| b.statement.date.cmp(&a.statement.date));
    stats.output_rows = scored.len();

    info!(
        input = stats.input_rows,
        incomplete = stats.dropped_incomplete,
        duplicates = stats.dropped_duplicate,
        output = stats.output_rows,
        "Statements normalized"
    );

    (scored, stats)
}

/// Rebuild the scored table from the raw statement table.
pub fn run(paths: &ProjectPaths) -> Result<NormalizeStats> {
    let input = paths.raw_statements();
    let raw = read_statements(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let (scored, stats) = normalize(raw);

    let output = paths.scored_statements();
    write_scored(&output, &scored)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(path = %output.display(), rows = scored.len(), "Scored table written");
    Ok(stats)
}
