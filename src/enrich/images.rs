//! Portrait lookup on a MediaWiki site.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{EnrichmentConfig, RateLimitConfig};
use crate::net::{http_client, limiter::RateLimiter};
use crate::scrape::cards::{element_text, parse_selector};

const EXACT_PHRASE: &str = "politico italiano";
const GENERIC_PHRASE: &str = "politic";
const POLITICS_SECTIONS: &[&str] = &["politica", "politics"];

/// Outcome of inspecting a fetched wiki page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WikiPage {
    /// A disambiguation page and the link chosen from it, if any.
    Disambiguation(Option<String>),
    /// A regular article and its infobox image, if any.
    Article(Option<String>),
}

struct PageSelectors {
    disambiguation: Selector,
    infobox_image: Selector,
}

impl PageSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            disambiguation: parse_selector("#disambigbox, .avviso-disambigua, .disambig")?,
            infobox_image: parse_selector("table.infobox img, table.sinottico img")?,
        })
    }
}

struct Candidate {
    href: String,
    text: String,
    in_politics_section: bool,
}

fn enclosing_list_item(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "li")
}

/// Article links inside list items, in document order, tagged with whether
/// they sit under a politics heading.
fn candidates(document: &Html) -> Vec<Candidate> {
    let mut section = String::new();
    let mut out = Vec::new();

    for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
        match element.value().name() {
            "h2" | "h3" => section = element_text(element).to_lowercase(),
            "a" => {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                if !href.starts_with("/wiki/") || href.contains(':') {
                    continue;
                }
                let Some(item) = enclosing_list_item(element) else {
                    continue;
                };
                let title = element.value().attr("title").unwrap_or_default();
                let text = format!("{} {} {}", element_text(element), title, element_text(item))
                    .to_lowercase();
                out.push(Candidate {
                    href: href.to_string(),
                    text,
                    in_politics_section: POLITICS_SECTIONS.iter().any(|s| section.contains(s)),
                });
            }
            _ => {}
        }
    }

    out
}

/// Pick the politician among disambiguation candidates.
///
/// The first exact-phrase match wins outright. After that: the last link
/// mentioning politics, then the last link under a politics heading, then
/// the last candidate at all.
fn choose_candidate(candidates: &[Candidate]) -> Option<&str> {
    if let Some(c) = candidates.iter().find(|c| c.text.contains(EXACT_PHRASE)) {
        return Some(&c.href);
    }
    candidates
        .iter()
        .rev()
        .find(|c| c.text.contains(GENERIC_PHRASE))
        .or_else(|| candidates.iter().rev().find(|c| c.in_politics_section))
        .or_else(|| candidates.last())
        .map(|c| c.href.as_str())
}

fn inspect(selectors: &PageSelectors, html: &str) -> WikiPage {
    let document = Html::parse_document(html);
    if document.select(&selectors.disambiguation).next().is_some() {
        let found = candidates(&document);
        return WikiPage::Disambiguation(choose_candidate(&found).map(str::to_string));
    }
    let image = document
        .select(&selectors.infobox_image)
        .find_map(|img| img.value().attr("src"))
        .map(str::to_string);
    WikiPage::Article(image)
}

/// Resolves a public figure's name to an image URL.
pub struct ImageResolver {
    http: reqwest::Client,
    limiter: RateLimiter,
    base_url: Url,
    overrides: HashMap<String, String>,
    selectors: PageSelectors,
}

impl ImageResolver {
    pub fn new(config: &EnrichmentConfig, rate_limit: &RateLimitConfig) -> Result<Self> {
        let base_url = Url::parse(&config.wiki_base_url)
            .with_context(|| format!("Invalid wiki_base_url: {}", config.wiki_base_url))?;
        Ok(Self {
            http: http_client(config.request_timeout_seconds)?,
            limiter: RateLimiter::new(rate_limit),
            base_url,
            overrides: config.image_overrides.clone(),
            selectors: PageSelectors::new()?,
        })
    }

    /// Image URL for `name`, or `None` on any failure.
    #[instrument(skip(self))]
    pub async fn fetch_image(&self, name: &str) -> Option<String> {
        if let Some(url) = self.overrides.get(name) {
            debug!("Using image override");
            return Some(url.clone());
        }
        match self.lookup(name).await {
            Ok(Some(url)) => Some(url),
            Ok(None) => {
                warn!("No image found");
                None
            }
            Err(e) => {
                warn!(error = %e, "Image lookup failed");
                None
            }
        }
    }

    async fn lookup(&self, name: &str) -> Result<Option<String>> {
        let title = name.trim().replace(' ', "_");
        let page_url = self
            .base_url
            .join(&format!("/wiki/{}", urlencoding::encode(&title)))
            .context("Failed to build wiki URL")?;

        let image = match inspect(&self.selectors, &self.get(&page_url).await?) {
            WikiPage::Article(image) => image,
            WikiPage::Disambiguation(None) => bail!("Disambiguation page without candidates"),
            WikiPage::Disambiguation(Some(href)) => {
                let resolved = self
                    .base_url
                    .join(&href)
                    .with_context(|| format!("Invalid candidate link: {href}"))?;
                debug!(resolved = %resolved, "Disambiguation resolved");
                match inspect(&self.selectors, &self.get(&resolved).await?) {
                    WikiPage::Article(image) => image,
                    WikiPage::Disambiguation(_) => {
                        bail!("Candidate is itself a disambiguation page")
                    }
                }
            }
        };

        Ok(image.map(|src| self.absolute(&src)))
    }

    fn absolute(&self, src: &str) -> String {
        if let Some(rest) = src.strip_prefix("//") {
            return format!("{}://{}", self.base_url.scheme(), rest);
        }
        self.base_url
            .join(src)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| src.to_string())
    }

    async fn get(&self, url: &Url) -> Result<String> {
        if !self.limiter.acquire().await {
            bail!("Rate limit exhausted before GET {url}");
        }
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("GET {url} returned {status}");
        }
        resp.text()
            .await
            .with_context(|| format!("Failed to read body of {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disambiguation(body: &str) -> String {
        format!(r#"<html><body><div id="disambigbox"></div>{body}</body></html>"#)
    }

    fn inspect_html(html: &str) -> WikiPage {
        inspect(&PageSelectors::new().unwrap(), html)
    }

    #[test]
    fn test_exact_phrase_wins_immediately() {
        let html = disambiguation(
            r#"<ul>
            <li><a href="/wiki/Mario_Rossi_(calciatore)">Mario Rossi</a>, calciatore</li>
            <li><a href="/wiki/Mario_Rossi_(1950)">Mario Rossi</a>, politico italiano</li>
            <li><a href="/wiki/Mario_Rossi_(sindaco)">Mario Rossi</a>, politico</li>
            </ul>"#,
        );
        assert_eq!(
            inspect_html(&html),
            WikiPage::Disambiguation(Some("/wiki/Mario_Rossi_(1950)".into()))
        );
    }

    #[test]
    fn test_last_generic_match() {
        let html = disambiguation(
            r#"<ul>
            <li><a href="/wiki/A">A</a>, politica francese</li>
            <li><a href="/wiki/B">B</a>, politico spagnolo</li>
            <li><a href="/wiki/C">C</a>, attore</li>
            </ul>"#,
        );
        assert_eq!(inspect_html(&html), WikiPage::Disambiguation(Some("/wiki/B".into())));
    }

    #[test]
    fn test_politics_section_then_last_candidate() {
        let html = disambiguation(
            r#"<h2>Sport</h2><ul><li><a href="/wiki/S1">S1</a></li></ul>
            <h2>Politica</h2><ul><li><a href="/wiki/P1">P1</a></li><li><a href="/wiki/P2">P2</a></li></ul>
            <h2>Musica</h2><ul><li><a href="/wiki/M1">M1</a></li></ul>"#,
        );
        assert_eq!(inspect_html(&html), WikiPage::Disambiguation(Some("/wiki/P2".into())));

        let html = disambiguation(
            r#"<ul><li><a href="/wiki/X">X</a></li><li><a href="/wiki/Y">Y</a></li></ul>"#,
        );
        assert_eq!(inspect_html(&html), WikiPage::Disambiguation(Some("/wiki/Y".into())));
    }

    #[test]
    fn test_disambiguation_without_list_links() {
        let html = disambiguation(r#"<p><a href="/wiki/X">X</a></p><ul><li><a href="/wiki/File:X.jpg">f</a></li></ul>"#);
        assert_eq!(inspect_html(&html), WikiPage::Disambiguation(None));
    }

    #[test]
    fn test_article_infobox_image() {
        let html = r#"<table class="sinottico"><tr><td><img src="//upload.example.org/a.jpg"></td></tr></table>"#;
        assert_eq!(
            inspect_html(html),
            WikiPage::Article(Some("//upload.example.org/a.jpg".into()))
        );
        assert_eq!(inspect_html("<p>no box</p>"), WikiPage::Article(None));
    }
}
