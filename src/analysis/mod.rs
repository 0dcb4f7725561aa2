pub mod aggregate;
pub mod charts;
pub mod distribution;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{AppConfig, ChartTheme};
use crate::paths::ProjectPaths;
use crate::table::models::{GroupAggregate, GroupKey, ScoredRecord};
use crate::table::parquet::{read_aggregates, read_scored, write_aggregates};
use crate::table::TableError;

use self::aggregate::{aggregate, highest, lowest, rank_by_normalized_score};
use self::charts::{render_all, ChartData};
use self::distribution::{monthly_series, score_histogram};

/// Ranked aggregates for both groupings.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTables {
    pub by_author: Vec<GroupAggregate>,
    pub by_party: Vec<GroupAggregate>,
}

impl GroupTables {
    pub fn from_records(records: &[ScoredRecord]) -> Self {
        Self {
            by_author: rank_by_normalized_score(aggregate(records, GroupKey::Author)),
            by_party: rank_by_normalized_score(aggregate(records, GroupKey::Party)),
        }
    }
}

fn carry_images(groups: &mut [GroupAggregate], previous: Vec<GroupAggregate>) {
    let images: HashMap<String, String> = previous
        .into_iter()
        .filter_map(|g| g.image_url.map(|url| (g.key, url)))
        .collect();
    for group in groups {
        if let Some(url) = images.get(&group.key) {
            group.image_url = Some(url.clone());
        }
    }
}

fn read_previous(path: &std::path::Path, key: GroupKey) -> Result<Vec<GroupAggregate>> {
    match read_aggregates(path, key) {
        Ok(rows) => Ok(rows),
        Err(TableError::NotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Recompute both aggregate tables from the scored table. Images already
/// attached to a group survive the rebuild.
pub fn aggregate_tables(paths: &ProjectPaths) -> Result<GroupTables> {
    let scored_path = paths.scored_statements();
    let records = read_scored(&scored_path)
        .with_context(|| format!("Failed to read {}", scored_path.display()))?;
    let mut tables = GroupTables::from_records(&records);

    for (key, path, groups) in [
        (GroupKey::Author, paths.author_averages(), &mut tables.by_author),
        (GroupKey::Party, paths.party_averages(), &mut tables.by_party),
    ] {
        carry_images(groups, read_previous(&path, key)?);
        write_aggregates(&path, groups, key)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(table = key.column(), groups = groups.len(), "Aggregate table written");
    }

    Ok(tables)
}

/// Console summary of the extremes.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub lowest_author: Option<(String, f64)>,
    pub highest_party: Option<(String, f64)>,
}

impl Report {
    pub fn from_tables(tables: &GroupTables) -> Self {
        Self {
            lowest_author: lowest(&tables.by_author).map(|g| (g.key.clone(), g.normalized_score)),
            highest_party: highest(&tables.by_party).map(|g| (g.key.clone(), g.normalized_score)),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lowest_author {
            Some((author, score)) => writeln!(
                f,
                "The politician with the lowest average credibility score is: {author} with a score of {score:.2}"
            )?,
            None => writeln!(f, "No politicians to rank")?,
        }
        match &self.highest_party {
            Some((party, score)) => write!(
                f,
                "The party with the highest average credibility score is: {party} with a score of {score:.2}"
            ),
            None => write!(f, "No parties to rank"),
        }
    }
}

/// Build the report and render every chart for the scored table.
pub fn analyze(
    config: &AppConfig,
    paths: &ProjectPaths,
    theme: ChartTheme,
) -> Result<(Report, Vec<PathBuf>)> {
    let scored_path = paths.scored_statements();
    let records = read_scored(&scored_path)
        .with_context(|| format!("Failed to read {}", scored_path.display()))?;

    let tables = GroupTables::from_records(&records);
    let report = Report::from_tables(&tables);

    let histogram = score_histogram(&records);
    let monthly = monthly_series(&records);
    let data = ChartData {
        by_author: &tables.by_author,
        by_party: &tables.by_party,
        histogram: &histogram,
        monthly: &monthly,
    };
    let files = render_all(&paths.charts_dir(config), &data, theme)?;

    Ok((report, files))
}
