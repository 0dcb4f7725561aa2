//! Card extraction from the fact-checking listing markup.

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

use crate::table::models::StatementRecord;

const SOURCE_PREFIX: &str = "Fonte:";

pub(crate) fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{css}': {e}"))
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Compiled selectors for one listing card.
#[derive(Debug, Clone)]
pub struct CardSelectors {
    item: Selector,
    article: Selector,
    pub(crate) title: Selector,
    date: Selector,
    source: Selector,
    link: Selector,
    author: Selector,
    party: Selector,
}

impl CardSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            item: parse_selector("li.col-span-4.flex")?,
            article: parse_selector("article.card")?,
            title: parse_selector("h3.declaration")?,
            date: parse_selector("div.declaration-date")?,
            source: parse_selector("div.declaration-fonte")?,
            link: parse_selector("a.btn")?,
            author: parse_selector("h4.declaration-author")?,
            party: parse_selector("p.declaration-date")?,
        })
    }

    fn first_text(&self, article: ElementRef<'_>, selector: &Selector) -> String {
        article
            .select(selector)
            .next()
            .map(element_text)
            .unwrap_or_default()
    }

    /// Title text of an article card: its first `h3.declaration`.
    pub(crate) fn title_of(&self, article: ElementRef<'_>) -> String {
        self.first_text(article, &self.title)
    }

    fn card(&self, article: ElementRef<'_>) -> StatementRecord {
        let title = self.title_of(article);
        let date = self.first_text(article, &self.date);
        let source = self
            .first_text(article, &self.source)
            .replace(SOURCE_PREFIX, "")
            .trim()
            .to_string();
        let read_more_link = article
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .unwrap_or_default()
            .to_string();

        StatementRecord {
            id: StatementRecord::content_id(&title, &date),
            author: self.first_text(article, &self.author),
            party: self.first_text(article, &self.party),
            verdict: String::new(),
            title,
            date,
            source,
            read_more_link,
        }
    }

    /// Every card on a listing page, in document order, verdicts empty.
    /// List items without an `article.card` are skipped.
    pub fn extract_cards(&self, html: &str) -> Vec<StatementRecord> {
        let document = Html::parse_document(html);
        document
            .select(&self.item)
            .filter_map(|item| item.select(&self.article).next())
            .map(|article| self.card(article))
            .collect()
    }

    pub(crate) fn articles<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.article).collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub fn card(title: &str, date: &str, verdict: Option<&str>) -> String {
        let verdict = verdict
            .map(|v| format!(r#"<h3 class="declaration line-clamp-6 text-white">{v}</h3>"#))
            .unwrap_or_default();
        format!(
            r#"<li class="col-span-4 flex">
  <article class="card">
    <h4 class="declaration-author">Matteo Salvini</h4>
    <p class="declaration-date">Lega</p>
    <h3 class="declaration">{title}</h3>
    <div class="declaration-date">{date}</div>
    <div class="declaration-fonte">Fonte: Twitter</div>
    <a class="btn" href="/fact-checking/{slug}">Leggi</a>
    {verdict}
  </article>
</li>"#,
            slug = title.to_lowercase().replace(' ', "-"),
        )
    }

    pub fn listing(cards: &[String]) -> String {
        format!(
            "<html><body><ul>{}</ul></body></html>",
            cards.join("\n")
        )
    }
}
