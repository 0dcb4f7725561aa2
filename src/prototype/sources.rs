//! Evidence sources backed by public web APIs.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use scraper::Html;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::{Evidence, EvidenceSource};
use crate::net::limiter::RateLimiter;
use crate::scrape::cards::{element_text, parse_selector};

async fn checked_get(
    limiter: &RateLimiter,
    request: reqwest::RequestBuilder,
    what: &str,
) -> Result<reqwest::Response> {
    if !limiter.acquire().await {
        bail!("Rate limit exhausted before {what} request");
    }
    let resp = request
        .send()
        .await
        .with_context(|| format!("{what} request failed"))?;
    let status = resp.status();
    if !status.is_success() {
        bail!("{what} returned {status}");
    }
    Ok(resp)
}

/// Paragraph text of an HTML page, one paragraph per line.
pub fn paragraph_text(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let paragraphs = parse_selector("p")?;
    Ok(document
        .select(&paragraphs)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

// ─── Wikipedia ───

/// The article whose title is the claim itself.
pub struct WikipediaSource {
    http: reqwest::Client,
    limiter: RateLimiter,
    base_url: Url,
}

impl WikipediaSource {
    pub fn new(http: reqwest::Client, limiter: RateLimiter, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid wikipedia_base_url: {base_url}"))?;
        Ok(Self {
            http,
            limiter,
            base_url,
        })
    }
}

#[async_trait]
impl EvidenceSource for WikipediaSource {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    #[instrument(skip(self, claim))]
    async fn fetch(&self, claim: &str) -> Result<Evidence> {
        let title = claim.trim().replace(' ', "_");
        let url = self
            .base_url
            .join(&format!("/wiki/{}", urlencoding::encode(&title)))
            .context("Failed to build Wikipedia URL")?;

        let body = checked_get(&self.limiter, self.http.get(url), "Wikipedia")
            .await?
            .text()
            .await
            .context("Failed to read Wikipedia page")?;

        Ok(Evidence {
            source: self.name(),
            text: paragraph_text(&body)?,
            ratings: Vec::new(),
            available: true,
        })
    }
}

// ─── NewsAPI ───

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsArticle {
    content: Option<String>,
}

/// NewsAPI `everything` search; article contents joined with spaces.
pub struct NewsApiSource {
    http: reqwest::Client,
    limiter: RateLimiter,
    url: String,
    api_key: Option<SecretString>,
}

impl NewsApiSource {
    pub fn new(
        http: reqwest::Client,
        limiter: RateLimiter,
        url: &str,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            limiter,
            url: url.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl EvidenceSource for NewsApiSource {
    fn name(&self) -> &'static str {
        "newsapi"
    }

    #[instrument(skip(self, claim))]
    async fn fetch(&self, claim: &str) -> Result<Evidence> {
        let Some(key) = &self.api_key else {
            bail!("NEWS_API_KEY is not set");
        };
        let request = self
            .http
            .get(&self.url)
            .query(&[("q", claim), ("apiKey", key.expose_secret())]);

        let parsed: NewsResponse = checked_get(&self.limiter, request, "NewsAPI")
            .await?
            .json()
            .await
            .context("Failed to parse NewsAPI response")?;

        let text = parsed
            .articles
            .into_iter()
            .filter_map(|a| a.content)
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Evidence {
            source: self.name(),
            text,
            ratings: Vec::new(),
            available: true,
        })
    }
}

// ─── Google Fact Check Tools ───

#[derive(Debug, Deserialize)]
struct ClaimSearchResponse {
    #[serde(default)]
    claims: Vec<ClaimEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimEntry {
    #[serde(default)]
    text: String,
    #[serde(default)]
    claim_review: Vec<ClaimReview>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimReview {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    textual_rating: Option<String>,
}

/// Published fact-checks of similar claims, with their textual ratings.
pub struct FactCheckSource {
    http: reqwest::Client,
    limiter: RateLimiter,
    url: String,
    api_key: Option<SecretString>,
}

impl FactCheckSource {
    pub fn new(
        http: reqwest::Client,
        limiter: RateLimiter,
        url: &str,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            limiter,
            url: url.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl EvidenceSource for FactCheckSource {
    fn name(&self) -> &'static str {
        "factcheck"
    }

    #[instrument(skip(self, claim))]
    async fn fetch(&self, claim: &str) -> Result<Evidence> {
        let Some(key) = &self.api_key else {
            bail!("FACT_CHECK_API_KEY is not set");
        };
        let request = self
            .http
            .get(&self.url)
            .query(&[("query", claim), ("key", key.expose_secret())]);

        let parsed: ClaimSearchResponse = checked_get(&self.limiter, request, "Fact Check Tools")
            .await?
            .json()
            .await
            .context("Failed to parse Fact Check Tools response")?;

        let mut lines = Vec::new();
        let mut ratings = Vec::new();
        for entry in parsed.claims {
            if !entry.text.is_empty() {
                lines.push(entry.text);
            }
            for review in entry.claim_review {
                lines.extend(review.title.filter(|t| !t.is_empty()));
                ratings.extend(review.textual_rating.filter(|r| !r.is_empty()));
            }
        }

        Ok(Evidence {
            source: self.name(),
            text: lines.join("\n"),
            ratings,
            available: true,
        })
    }
}
