//! Collecting new fact-check statements and their verdicts.

pub mod browser;
pub mod cards;
pub mod locator;

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::paths::ProjectPaths;
use crate::table::models::{StatementRecord, NO_VERDICT};
use crate::table::parquet::{read_statements_or_empty, write_statements};

use self::browser::{CardBrowser, HttpBrowser};
use self::cards::CardSelectors;

/// Page through the listing until `max_cards` unique titles are collected
/// or the browser runs out of pages.
///
/// A page that adds no new title ends the listing. Sites that serve their
/// last page again for any page number past the end would otherwise never
/// stop.
pub async fn load_all_cards<B>(browser: &mut B, max_cards: usize) -> Result<Vec<StatementRecord>>
where
    B: CardBrowser + ?Sized,
{
    let selectors = CardSelectors::new()?;
    let mut cards = Vec::new();
    let mut titles = HashSet::new();

    loop {
        let before = cards.len();
        for card in selectors.extract_cards(browser.page_source()) {
            if titles.insert(card.title.clone()) {
                cards.push(card);
            }
        }
        if cards.len() >= max_cards {
            cards.truncate(max_cards);
            break;
        }
        if cards.len() == before {
            info!(count = cards.len(), "Page added no new cards, listing exhausted");
            break;
        }
        if !browser.load_more().await? {
            break;
        }
    }

    info!(count = cards.len(), "Cards loaded");
    Ok(cards)
}

/// Fill in each card's verdict, falling back to [`NO_VERDICT`] on any failure.
pub async fn reveal_verdicts<B>(
    browser: &mut B,
    cards: Vec<StatementRecord>,
    timeout: Duration,
) -> Vec<StatementRecord>
where
    B: CardBrowser + ?Sized,
{
    let mut revealed = Vec::with_capacity(cards.len());

    for (index, mut card) in cards.into_iter().enumerate() {
        if !card.verdict.is_empty() {
            revealed.push(card);
            continue;
        }
        card.verdict = match tokio::time::timeout(timeout, browser.reveal_verdict(&card)).await {
            Ok(Ok(Some(verdict))) if !verdict.trim().is_empty() => verdict.trim().to_string(),
            Ok(Ok(_)) => {
                warn!(index, title = %card.title, "Verdict element not found");
                NO_VERDICT.to_string()
            }
            Ok(Err(e)) => {
                error!(index, title = %card.title, error = %e, "Failed to reveal verdict");
                NO_VERDICT.to_string()
            }
            Err(_) => {
                error!(index, title = %card.title, "Timed out revealing verdict");
                NO_VERDICT.to_string()
            }
        };
        revealed.push(card);
    }

    revealed
}

/// Run a full listing session and return only new cards with a real verdict.
///
/// The session is closed even when loading fails.
pub async fn scrape_new_statements<B>(
    browser: &mut B,
    existing_ids: &HashSet<String>,
    max_cards: usize,
    verdict_timeout: Duration,
) -> Result<Vec<StatementRecord>>
where
    B: CardBrowser + ?Sized,
{
    browser.open().await.context("Failed to open listing")?;
    let result = collect_new(browser, existing_ids, max_cards, verdict_timeout).await;
    if let Err(e) = browser.close().await {
        warn!(error = %e, "Failed to close listing session");
    }

    let revealed = result?;
    let total = revealed.len();
    let kept: Vec<StatementRecord> = revealed.into_iter().filter(|c| c.has_verdict()).collect();
    info!(kept = kept.len(), discarded = total - kept.len(), "Scrape finished");
    Ok(kept)
}

async fn collect_new<B>(
    browser: &mut B,
    existing_ids: &HashSet<String>,
    max_cards: usize,
    verdict_timeout: Duration,
) -> Result<Vec<StatementRecord>>
where
    B: CardBrowser + ?Sized,
{
    let cards = load_all_cards(browser, max_cards).await?;
    let new_cards: Vec<StatementRecord> = cards
        .into_iter()
        .filter(|c| !existing_ids.contains(&c.id))
        .collect();
    info!(new = new_cards.len(), "Revealing verdicts for new cards");
    Ok(reveal_verdicts(browser, new_cards, verdict_timeout).await)
}

/// Append `new` rows to `existing`, keeping the existing row for any
/// repeated id.
pub fn merge_statements(
    existing: Vec<StatementRecord>,
    new: Vec<StatementRecord>,
) -> Vec<StatementRecord> {
    let mut seen = HashSet::with_capacity(existing.len() + new.len());
    existing
        .into_iter()
        .chain(new)
        .filter(|row| seen.insert(row.id.clone()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub new_rows: usize,
    pub total_rows: usize,
}

/// Scrape the live listing and merge new statements into the raw table.
pub async fn run(config: &AppConfig, paths: &ProjectPaths) -> Result<ScrapeSummary> {
    let table = paths.raw_statements();
    let existing = read_statements_or_empty(&table)
        .with_context(|| format!("Failed to read {}", table.display()))?;
    let existing_ids: HashSet<String> = existing.iter().map(|r| r.id.clone()).collect();
    info!(existing = existing_ids.len(), path = %table.display(), "Loaded existing ids");

    let mut browser = HttpBrowser::new(&config.scraper, &config.rate_limit)?;
    let new_rows = scrape_new_statements(
        &mut browser,
        &existing_ids,
        config.scraper.max_cards,
        Duration::from_secs(config.scraper.verdict_timeout_seconds),
    )
    .await?;

    if new_rows.is_empty() {
        info!("No new cards to process");
        return Ok(ScrapeSummary {
            new_rows: 0,
            total_rows: existing.len(),
        });
    }

    let added = new_rows.len();
    let merged = merge_statements(existing, new_rows);
    write_statements(&table, &merged)
        .with_context(|| format!("Failed to write {}", table.display()))?;
    info!(added, total = merged.len(), "Statements table updated");

    Ok(ScrapeSummary {
        new_rows: added,
        total_rows: merged.len(),
    })
}
