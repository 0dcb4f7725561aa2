//! Scoring a free-text claim against gathered evidence.

use serde::Serialize;

use super::similarity::ratio;
use super::Evidence;
use crate::processing::verdict::VerdictClassifier;

pub const BASE_SCORE: u32 = 20;
pub const MATCH_BONUS: u32 = 60;

pub const NO_DATA_MESSAGE: &str = "No supporting data found";
pub const COMPLETE_MESSAGE: &str = "Analysis complete";

/// Whether a source contributed to an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStatus {
    pub name: &'static str,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimAnalysis {
    pub credibility_score: u32,
    pub message: String,
    pub matches: Vec<String>,
    pub entities: Vec<String>,
    pub sources: Vec<SourceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_check_score: Option<f64>,
}

/// Runs of capitalized words, e.g. "Giorgia Meloni" or "Italia" in
/// "Giorgia Meloni dice che l'Italia cresce".
pub fn extract_entities(claim: &str) -> Vec<String> {
    let mut entities = Vec::new();
    let mut run: Vec<&str> = Vec::new();

    let mut flush = |run: &mut Vec<&str>| {
        if !run.is_empty() {
            let entity = run.join(" ");
            if !entities.contains(&entity) {
                entities.push(entity);
            }
            run.clear();
        }
    };

    for raw in claim.split_whitespace() {
        let word = raw.rsplit(['\'', '’']).next().unwrap_or(raw);
        let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric());
        let capitalized = trimmed.chars().next().is_some_and(char::is_uppercase)
            && trimmed.chars().count() > 1;

        if capitalized {
            run.push(trimmed);
        } else {
            flush(&mut run);
        }
        // Punctuation after a word closes the run.
        if capitalized && trimmed.len() < word.len() && !word.ends_with(trimmed) {
            flush(&mut run);
        }
    }
    flush(&mut run);

    entities
}

/// Split on sentence-ending punctuation followed by whitespace, and on newlines.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '\n' => Some(i),
            '.' | '!' | '?' => match chars.peek() {
                Some((_, next)) if next.is_whitespace() => Some(i + c.len_utf8()),
                None => Some(i + c.len_utf8()),
                _ => None,
            },
            _ => None,
        };
        if let Some(end) = boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// Sentences of `text` that mention an entity and are close enough to the claim.
pub fn matching_sentences(claim: &str, text: &str, threshold: f64) -> Vec<String> {
    let entities: Vec<String> = extract_entities(claim)
        .into_iter()
        .map(|e| e.to_lowercase())
        .collect();
    if entities.is_empty() {
        return Vec::new();
    }

    let claim = claim.to_lowercase();
    let text = text.to_lowercase();

    split_sentences(&text)
        .into_iter()
        .filter(|sentence| entities.iter().any(|e| sentence.contains(e.as_str())))
        .filter(|sentence| ratio(&claim, sentence) > threshold)
        .map(str::to_string)
        .collect()
}

/// Mean polarity of textual ratings, or `None` without ratings.
pub fn fact_check_score(ratings: &[String]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let classifier = VerdictClassifier::english_ratings();
    let sum: i64 = ratings.iter().map(|r| classifier.classify(r).value()).sum();
    Some(sum as f64 / ratings.len() as f64)
}

pub fn analyze(claim: &str, evidence: &[Evidence], threshold: f64) -> ClaimAnalysis {
    let text = evidence
        .iter()
        .map(|e| e.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let ratings: Vec<String> = evidence.iter().flat_map(|e| e.ratings.iter().cloned()).collect();
    let sources = evidence
        .iter()
        .map(|e| SourceStatus {
            name: e.source,
            available: e.available,
        })
        .collect();
    let entities = extract_entities(claim);

    if text.is_empty() {
        return ClaimAnalysis {
            credibility_score: 0,
            message: NO_DATA_MESSAGE.to_string(),
            matches: Vec::new(),
            entities,
            sources,
            fact_check_score: fact_check_score(&ratings),
        };
    }

    let matches = matching_sentences(claim, &text, threshold);
    let credibility_score = BASE_SCORE + if matches.is_empty() { 0 } else { MATCH_BONUS };

    ClaimAnalysis {
        credibility_score,
        message: COMPLETE_MESSAGE.to_string(),
        matches,
        entities,
        sources,
        fact_check_score: fact_check_score(&ratings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(text: &str, ratings: &[&str]) -> Evidence {
        Evidence {
            source: "test",
            text: text.to_string(),
            ratings: ratings.iter().map(|r| r.to_string()).collect(),
            available: true,
        }
    }

    #[test]
    fn test_entities_are_capitalized_runs() {
        assert_eq!(
            extract_entities("Giorgia Meloni dice che l'Italia cresce"),
            vec!["Giorgia Meloni", "Italia"]
        );
        assert_eq!(
            extract_entities("Secondo Mario Draghi, la BCE sbaglia"),
            vec!["Secondo Mario Draghi", "BCE"]
        );
        assert!(extract_entities("tutto minuscolo qui").is_empty());
    }

    #[test]
    fn test_split_sentences() {
        let text = "Prima frase. Seconda frase! Versione 2.5 ok\nTerza";
        assert_eq!(
            split_sentences(text),
            vec!["Prima frase.", "Seconda frase!", "Versione 2.5 ok", "Terza"]
        );
    }

    #[test]
    fn test_no_data() {
        let result = analyze("Rome is the capital", &[evidence("", &[])], 0.7);
        assert_eq!(result.credibility_score, 0);
        assert_eq!(result.message, NO_DATA_MESSAGE);
    }

    #[test]
    fn test_matching_sentence_raises_score() {
        let claim = "Rome is the capital of Italy";
        let result = analyze(
            claim,
            &[evidence(
                "Rome is the capital city of Italy. Paris is in France.",
                &[],
            )],
            0.7,
        );
        assert_eq!(result.credibility_score, 80);
        assert_eq!(result.matches, vec!["rome is the capital city of italy."]);
    }

    #[test]
    fn test_unrelated_text_scores_base() {
        let result = analyze(
            "Rome is the capital of Italy",
            &[evidence("Football scores from the weekend.", &[])],
            0.7,
        );
        assert_eq!(result.credibility_score, BASE_SCORE);
        assert!(result.matches.is_empty());
        assert_eq!(result.message, COMPLETE_MESSAGE);
    }

    #[test]
    fn test_fact_check_score() {
        assert_eq!(fact_check_score(&[]), None);
        let ratings = vec!["False".to_string(), "True".to_string(), "Mostly false".to_string()];
        let score = fact_check_score(&ratings).unwrap();
        assert!((score - (-1.0 / 3.0)).abs() < 1e-9);
    }
}
