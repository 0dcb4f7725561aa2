use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Sentinel verdict recorded when a card's verdict could not be revealed.
pub const NO_VERDICT: &str = "No verdict available";

/// One scraped fact-check card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub id: String,
    pub title: String,
    pub date: String,
    pub source: String,
    pub read_more_link: String,
    pub author: String,
    pub party: String,
    pub verdict: String,
}

impl StatementRecord {
    /// Content hash of title + date, or of the title alone when the date is empty.
    pub fn content_id(title: &str, date: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        if !date.is_empty() {
            hasher.update(date.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn has_verdict(&self) -> bool {
        !self.verdict.is_empty() && self.verdict != NO_VERDICT
    }
}

/// Polarity of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Score {
    Negative,
    Neutral,
    Positive,
}

impl Score {
    pub const ALL: [Score; 3] = [Score::Negative, Score::Neutral, Score::Positive];

    pub fn value(self) -> i64 {
        match self {
            Self::Negative => -1,
            Self::Neutral => 0,
            Self::Positive => 1,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::Negative),
            0 => Some(Self::Neutral),
            1 => Some(Self::Positive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Left,
    Center,
    Right,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized statement with its verdict score and party orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub statement: StatementRecord,
    #[serde(serialize_with = "serialize_score", deserialize_with = "deserialize_score")]
    pub score: Score,
    pub orientation: Option<Orientation>,
}

fn serialize_score<S: serde::Serializer>(score: &Score, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(score.value())
}

fn deserialize_score<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Score, D::Error> {
    let value = i64::deserialize(d)?;
    Score::from_value(value)
        .ok_or_else(|| serde::de::Error::custom(format!("score out of range: {value}")))
}

/// Which field a table is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Author,
    Party,
}

impl GroupKey {
    pub fn column(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Party => "party",
        }
    }

    pub fn value_of(self, record: &ScoredRecord) -> &str {
        match self {
            Self::Author => &record.statement.author,
            Self::Party => &record.statement.party,
        }
    }
}

/// One row per distinct author or party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAggregate {
    pub key: String,
    pub average_score: f64,
    pub count: u64,
    /// Ranking only. Never written to a table or the document store.
    #[serde(skip)]
    pub normalized_score: f64,
    pub orientation: Option<Orientation>,
    pub image_url: Option<String>,
}
