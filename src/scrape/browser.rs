//! Page sessions over the fact-checking listing.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, instrument};
use url::Url;

use super::cards::CardSelectors;
use super::locator::VerdictLocator;
use crate::config::{RateLimitConfig, ScraperConfig};
use crate::net::{http_client, limiter::RateLimiter};
use crate::table::models::StatementRecord;

/// A listing session: open a page, page through more cards, reveal verdicts.
#[async_trait]
pub trait CardBrowser: Send {
    async fn open(&mut self) -> Result<()>;

    /// Markup of the most recently loaded listing page.
    fn page_source(&self) -> &str;

    /// Load the next batch of cards. `Ok(false)` means there are no more.
    async fn load_more(&mut self) -> Result<bool>;

    /// Verdict text for a card, or `None` when it cannot be found.
    async fn reveal_verdict(&mut self, card: &StatementRecord) -> Result<Option<String>>;

    async fn close(&mut self) -> Result<()>;
}

/// [`CardBrowser`] over plain HTTP. Further cards come from `?page=N`.
pub struct HttpBrowser {
    http: reqwest::Client,
    limiter: RateLimiter,
    base_url: Url,
    page_delay: Duration,
    locator: VerdictLocator,
    cards: CardSelectors,
    page: u32,
    pages: Vec<String>,
    open: bool,
}

impl HttpBrowser {
    pub fn new(config: &ScraperConfig, rate_limit: &RateLimitConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid scraper base_url: {}", config.base_url))?;

        Ok(Self {
            http: http_client(config.page_timeout_seconds)?,
            limiter: RateLimiter::new(rate_limit),
            base_url,
            page_delay: Duration::from_millis(config.page_delay_ms),
            locator: VerdictLocator::new()?,
            cards: CardSelectors::new()?,
            page: 1,
            pages: Vec::new(),
            open: false,
        })
    }

    fn page_url(&self, page: u32) -> Url {
        let mut url = self.base_url.clone();
        if page > 1 {
            url.query_pairs_mut().append_pair("page", &page.to_string());
        }
        url
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

#[async_trait]
impl CardBrowser for HttpBrowser {
    #[instrument(skip(self))]
    async fn open(&mut self) -> Result<()> {
        let body = self.get(&self.page_url(1)).await?;
        self.page = 1;
        self.pages = vec![body];
        self.open = true;
        info!(url = %self.base_url, "Listing session opened");
        Ok(())
    }

    fn page_source(&self) -> &str {
        self.pages.last().map(String::as_str).unwrap_or_default()
    }

    async fn load_more(&mut self) -> Result<bool> {
        if !self.open {
            bail!("Listing session is not open");
        }
        tokio::time::sleep(self.page_delay).await;

        let next = self.page + 1;
        let body = match self.get(&self.page_url(next)).await {
            Ok(body) => body,
            Err(e) => {
                info!(page = next, error = %e, "No more cards to load");
                return Ok(false);
            }
        };
        if self.pages.last() == Some(&body) || self.cards.extract_cards(&body).is_empty() {
            info!(page = next, "No more cards to load");
            return Ok(false);
        }

        debug!(page = next, "Loaded listing page");
        self.page = next;
        self.pages.push(body);
        Ok(true)
    }

    #[instrument(skip(self, card), fields(title = %card.title))]
    async fn reveal_verdict(&mut self, card: &StatementRecord) -> Result<Option<String>> {
        if !self.open {
            bail!("Listing session is not open");
        }

        if let Some(verdict) = self.locator.listing_verdict(&self.pages, &card.title) {
            return Ok(Some(verdict));
        }

        if card.read_more_link.is_empty() {
            return Ok(None);
        }
        let detail_url = self
            .base_url
            .join(&card.read_more_link)
            .with_context(|| format!("Invalid detail link: {}", card.read_more_link))?;
        let body = self.get(&detail_url).await?;
        Ok(self.locator.detail_verdict(&body))
    }

    async fn close(&mut self) -> Result<()> {
        self.pages.clear();
        self.open = false;
        info!(pages = self.page, "Listing session closed");
        Ok(())
    }
}
