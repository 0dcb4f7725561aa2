//! Standalone credibility check for a single free-text claim.

pub mod claim;
pub mod similarity;
pub mod sources;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{PrototypeConfig, RateLimitConfig, Secrets};
use crate::net::{http_client, limiter::RateLimiter};

use self::claim::ClaimAnalysis;
use self::sources::{FactCheckSource, NewsApiSource, WikipediaSource};

/// Text and ratings one source returned for a claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evidence {
    pub source: &'static str,
    pub text: String,
    pub ratings: Vec<String>,
    /// False when the source failed and this is a placeholder.
    pub available: bool,
}

impl Evidence {
    pub fn empty(source: &'static str) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }
}

/// Anything that can return evidence about a claim.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, claim: &str) -> Result<Evidence>;
}

pub struct ClaimAnalyzer {
    sources: Vec<Box<dyn EvidenceSource>>,
    similarity_threshold: f64,
}

impl ClaimAnalyzer {
    pub fn new(sources: Vec<Box<dyn EvidenceSource>>, similarity_threshold: f64) -> Self {
        Self {
            sources,
            similarity_threshold,
        }
    }

    /// Wikipedia, NewsAPI and Fact Check Tools sharing one client and budget.
    pub fn from_config(
        config: &PrototypeConfig,
        rate_limit: &RateLimitConfig,
        secrets: &Secrets,
    ) -> Result<Self> {
        let http = http_client(config.request_timeout_seconds)?;
        let limiter = RateLimiter::new(rate_limit);

        let sources: Vec<Box<dyn EvidenceSource>> = vec![
            Box::new(WikipediaSource::new(
                http.clone(),
                limiter.clone(),
                &config.wikipedia_base_url,
            )?),
            Box::new(NewsApiSource::new(
                http.clone(),
                limiter.clone(),
                &config.news_api_url,
                secrets.news_api_key.clone(),
            )),
            Box::new(FactCheckSource::new(
                http,
                limiter,
                &config.fact_check_api_url,
                secrets.fact_check_api_key.clone(),
            )),
        ];

        Ok(Self::new(sources, config.similarity_threshold))
    }

    /// Query every source concurrently. A failing source contributes empty
    /// evidence.
    pub async fn gather(&self, claim: &str) -> Vec<Evidence> {
        join_all(self.sources.iter().map(|source| async move {
            match source.fetch(claim).await {
                Ok(evidence) => {
                    info!(
                        source = source.name(),
                        chars = evidence.text.len(),
                        ratings = evidence.ratings.len(),
                        "Evidence fetched"
                    );
                    evidence
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Evidence source failed");
                    Evidence::empty(source.name())
                }
            }
        }))
        .await
    }

    pub async fn analyze(&self, claim: &str) -> ClaimAnalysis {
        let evidence = self.gather(claim).await;
        let analysis = claim::analyze(claim, &evidence, self.similarity_threshold);
        info!(
            score = analysis.credibility_score,
            matches = analysis.matches.len(),
            "Claim analyzed"
        );
        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct Fixed(&'static str, Option<&'static str>, &'static [&'static str]);

    #[async_trait]
    impl EvidenceSource for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn fetch(&self, _claim: &str) -> Result<Evidence> {
            match self.1 {
                Some(text) => Ok(Evidence {
                    source: self.0,
                    text: text.to_string(),
                    ratings: self.2.iter().map(|r| r.to_string()).collect(),
                    available: true,
                }),
                None => bail!("offline"),
            }
        }
    }

    #[tokio::test]
    async fn test_failed_source_becomes_empty() {
        let analyzer = ClaimAnalyzer::new(
            vec![
                Box::new(Fixed("up", Some("Rome is the capital city of Italy."), &["True"])),
                Box::new(Fixed("down", None, &[])),
            ],
            0.7,
        );
        let evidence = analyzer.gather("Rome is the capital of Italy").await;
        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[1], Evidence::empty("down"));
        assert!(evidence[0].available);

        let analysis = analyzer.analyze("Rome is the capital of Italy").await;
        assert_eq!(analysis.credibility_score, 80);
        assert_eq!(analysis.fact_check_score, Some(1.0));
        assert_eq!(analysis.entities, vec!["Rome", "Italy"]);
        assert!(!analysis.sources[1].available);
    }

    #[tokio::test]
    async fn test_all_sources_down() {
        let analyzer = ClaimAnalyzer::new(vec![Box::new(Fixed("down", None, &[]))], 0.7);
        let analysis = analyzer.analyze("anything").await;
        assert_eq!(analysis.credibility_score, 0);
        assert_eq!(analysis.message, claim::NO_DATA_MESSAGE);
    }
}
