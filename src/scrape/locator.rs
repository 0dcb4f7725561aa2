//! Finding a card's article and its verdict text.

use anyhow::Result;
use scraper::{ElementRef, Html, Selector};

use super::cards::{element_text, parse_selector, CardSelectors};

const TITLE_PREFIX_CHARS: usize = 40;

/// Verdict selectors tried in order inside a listing article.
const LISTING_VERDICT_SELECTORS: &[&str] = &[
    "h3.declaration.line-clamp-6.text-white",
    "h3.declaration.text-white",
    ".verdetto",
];

/// Verdict selectors tried in order on a statement's detail page.
const DETAIL_VERDICT_SELECTORS: &[&str] = &[
    "h3.declaration.line-clamp-6.text-white",
    ".verdetto h3",
    ".verdetto",
    ".verdict",
];

/// Strategies for matching a listing article to a card title, strictest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleLocator {
    ExactTitle,
    TitlePrefix,
    FirstWord,
}

impl ArticleLocator {
    pub const ORDER: [ArticleLocator; 3] = [
        ArticleLocator::ExactTitle,
        ArticleLocator::TitlePrefix,
        ArticleLocator::FirstWord,
    ];

    /// Whether an article whose title text is `candidate` belongs to `title`.
    pub fn matches(self, candidate: &str, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        match self {
            Self::ExactTitle => candidate.contains(title),
            Self::TitlePrefix => {
                let prefix: String = title.chars().take(TITLE_PREFIX_CHARS).collect();
                candidate.contains(prefix.as_str())
            }
            Self::FirstWord => match (
                candidate.split_whitespace().next(),
                title.split_whitespace().next(),
            ) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerdictLocator {
    cards: CardSelectors,
    listing: Vec<Selector>,
    detail: Vec<Selector>,
}

fn compile(selectors: &[&str]) -> Result<Vec<Selector>> {
    selectors.iter().map(|css| parse_selector(css)).collect()
}

fn first_match(root: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        root.select(selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

impl VerdictLocator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            cards: CardSelectors::new()?,
            listing: compile(LISTING_VERDICT_SELECTORS)?,
            detail: compile(DETAIL_VERDICT_SELECTORS)?,
        })
    }

    /// Verdict of the article matching `title` across listing pages.
    ///
    /// Each strategy is tried on every page before the next, looser one.
    pub fn listing_verdict<S: AsRef<str>>(&self, pages: &[S], title: &str) -> Option<String> {
        let documents: Vec<Html> = pages.iter().map(|p| Html::parse_document(p.as_ref())).collect();
        let pages: Vec<(Vec<ElementRef<'_>>, Vec<String>)> = documents
            .iter()
            .map(|doc| {
                let articles = self.cards.articles(doc);
                let titles = articles.iter().map(|a| self.cards.title_of(*a)).collect();
                (articles, titles)
            })
            .collect();

        let (locator, article) = ArticleLocator::ORDER.iter().find_map(|locator| {
            pages.iter().find_map(|(articles, titles)| {
                titles
                    .iter()
                    .position(|candidate| locator.matches(candidate, title))
                    .map(|i| (*locator, articles[i]))
            })
        })?;

        let verdict = first_match(article, &self.listing);
        tracing::debug!(?locator, found = verdict.is_some(), "Article located");
        verdict
    }

    /// Verdict on a statement's own page.
    pub fn detail_verdict(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        first_match(document.root_element(), &self.detail)
    }
}
