//! Keyword-based verdict classification.
//!
//! A verdict is lowercased and tested against ordered keyword lists as
//! whole-word/phrase matches. The first list with a hit decides the score;
//! no hit means neutral.

use std::sync::OnceLock;

use regex::Regex;

use crate::table::models::Score;

pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "falsa",
    "scorretta",
    "sbagliata",
    "non è supportata",
    "non stanno proprio",
    "esagerata",
    "imprecisa",
    "parecchio esagerato",
    "fuorviante",
    "omette",
    "non la racconta giusta",
    "fa confusione",
    "smentiscono",
    "danno torto",
    "confonde",
    "completamente sbagliato",
    "sbaglia",
    "torto",
    "dà meriti che non ha",
];

pub const NEUTRAL_KEYWORDS: &[&str] = &[
    "esagera",
    "troppo semplice",
    "parziale",
    "troppo ottimista",
    "semplificazione",
    "eccessivo",
    "dipende",
    "provvisori",
];

// "Sì" never matches lowercased input.
pub const POSITIVE_KEYWORDS: &[&str] = &[
    "verità",
    "corretta",
    "corrette",
    "più alte",
    "Sì",
    "ha ragione",
    "sostanzialmente corretta",
    "danno ragione",
    "sono corretti",
    "supportata dai fatti",
    "attendibile",
    "previsioni scientifiche",
    "ordine di grandezza è corretto",
    "cifre esatte",
];

/// English fact-check ratings ("False", "Half true", ...).
pub const RATING_NEGATIVE_KEYWORDS: &[&str] = &[
    "false",
    "pants on fire",
    "incorrect",
    "misleading",
    "fake",
    "wrong",
    "inaccurate",
    "unsupported",
    "no evidence",
    "distorts",
    "exaggerat",
];

pub const RATING_NEUTRAL_KEYWORDS: &[&str] = &[
    "half true",
    "mixture",
    "mixed",
    "partly",
    "partially",
    "unproven",
    "lacks context",
    "needs context",
];

pub const RATING_POSITIVE_KEYWORDS: &[&str] = &[
    "true",
    "correct",
    "accurate",
    "mostly true",
    "supported",
];

/// Ordered (score, pattern) pairs evaluated in priority order.
pub struct VerdictClassifier {
    rules: Vec<(Score, Regex)>,
}

impl VerdictClassifier {
    pub fn new(lists: &[(Score, &[&str])]) -> Self {
        let rules = lists
            .iter()
            .filter(|(_, keywords)| !keywords.is_empty())
            .map(|(score, keywords)| (*score, compile_keywords(keywords)))
            .collect();
        Self { rules }
    }

    /// The Italian verdict lists used for pipeline scoring.
    pub fn italian() -> Self {
        Self::new(&[
            (Score::Negative, NEGATIVE_KEYWORDS),
            (Score::Neutral, NEUTRAL_KEYWORDS),
            (Score::Positive, POSITIVE_KEYWORDS),
        ])
    }

    /// English rating lists used for fact-check API ratings.
    ///
    /// Negative entries are matched as prefixes ("exaggerat" covers
    /// "exaggerated"), everything else as whole words.
    pub fn english_ratings() -> Self {
        let mut classifier = Self::new(&[
            (Score::Neutral, RATING_NEUTRAL_KEYWORDS),
            (Score::Positive, RATING_POSITIVE_KEYWORDS),
        ]);
        let negative = Regex::new(&format!(
            r"\b(?:{})",
            RATING_NEGATIVE_KEYWORDS
                .iter()
                .map(|kw| regex::escape(kw))
                .collect::<Vec<_>>()
                .join("|")
        ))
        .expect("escaped keyword alternation is a valid regex");
        // Negative first, then "half true" before plain "true".
        classifier.rules.insert(0, (Score::Negative, negative));
        classifier
    }

    pub fn classify(&self, verdict: &str) -> Score {
        let verdict = verdict.to_lowercase();
        self.rules
            .iter()
            .find(|(_, pattern)| pattern.is_match(&verdict))
            .map(|(score, _)| *score)
            .unwrap_or(Score::Neutral)
    }
}

fn compile_keywords(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|kw| regex::escape(kw))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b"))
        .expect("escaped keyword alternation is a valid regex")
}

/// Classify an Italian verdict string into a score.
pub fn classify_verdict(verdict: &str) -> Score {
    static ITALIAN: OnceLock<VerdictClassifier> = OnceLock::new();
    ITALIAN.get_or_init(VerdictClassifier::italian).classify(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_wins_over_positive() {
        assert_eq!(classify_verdict("sbagliata ma ha ragione"), Score::Negative);
        assert_eq!(
            classify_verdict("La dichiarazione è corretta ma fuorviante"),
            Score::Negative
        );
    }

    #[test]
    fn test_neutral_checked_before_positive() {
        assert_eq!(
            classify_verdict("Una semplificazione, ma ha ragione"),
            Score::Neutral
        );
    }

    #[test]
    fn test_positive_phrases() {
        assert_eq!(classify_verdict("Ha ragione"), Score::Positive);
        assert_eq!(classify_verdict("Le cifre esatte confermano"), Score::Positive);
        assert_eq!(classify_verdict("È la VERITÀ"), Score::Positive);
    }

    #[test]
    fn test_no_keyword_is_neutral() {
        assert_eq!(classify_verdict("Nessun commento"), Score::Neutral);
        assert_eq!(classify_verdict(""), Score::Neutral);
    }

    #[test]
    fn test_whole_word_only() {
        // "torto" must not match inside "contorto", "esagera" not inside "esagerazioni".
        assert_eq!(classify_verdict("un ragionamento contorto"), Score::Neutral);
        assert_eq!(classify_verdict("esagerazioni varie"), Score::Neutral);
        assert_eq!(classify_verdict("ha torto"), Score::Negative);
    }

    #[test]
    fn test_capitalized_si_never_matches() {
        assert_eq!(classify_verdict("Sì"), Score::Neutral);
    }

    #[test]
    fn test_english_ratings() {
        let classifier = VerdictClassifier::english_ratings();
        assert_eq!(classifier.classify("False"), Score::Negative);
        assert_eq!(classifier.classify("Exaggerated"), Score::Negative);
        assert_eq!(classifier.classify("Half True"), Score::Neutral);
        assert_eq!(classifier.classify("Mostly True"), Score::Positive);
        assert_eq!(classifier.classify("Satire"), Score::Neutral);
    }
}
