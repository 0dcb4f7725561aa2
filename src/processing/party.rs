//! Party name canonicalization and left/center/right orientation lookup.

use std::sync::OnceLock;

use regex::Regex;

use crate::table::models::Orientation;

/// Connector words kept lowercase unless they open the name.
const LOWERCASE_WORDS: [&str; 3] = ["e", "d'", "di"];

/// Canonical party name → orientation.
const ORIENTATIONS: &[(&str, Orientation)] = &[
    ("Partito Democratico", Orientation::Left),
    ("Alleanza Verdi e Sinistra", Orientation::Left),
    ("Sinistra Italiana", Orientation::Left),
    ("Europa Verde", Orientation::Left),
    ("Articolo Uno", Orientation::Left),
    ("Movimento 5 Stelle", Orientation::Center),
    ("Azione", Orientation::Center),
    ("Italia Viva", Orientation::Center),
    ("Più Europa", Orientation::Center),
    ("Noi Moderati", Orientation::Center),
    ("Forza Italia", Orientation::Right),
    ("Lega", Orientation::Right),
    ("Fratelli d'Italia", Orientation::Right),
];

fn elided_article() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^d'(\p{L}+)$").expect("static pattern is valid")
    })
}

/// Uppercase the first character, lowercase the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn canonicalize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if LOWERCASE_WORDS.contains(&lower.as_str()) {
        return lower;
    }
    if let Some(caps) = elided_article().captures(word) {
        return format!("d'{}", capitalize(&caps[1]));
    }
    capitalize(word)
}

/// Canonical capitalization of a party name:
/// `"partito d'azione"` → `"Partito d'Azione"`.
pub fn canonicalize_party(raw: &str) -> String {
    raw.split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            if i == 0 {
                capitalize(word)
            } else {
                canonicalize_word(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Orientation for a canonical party name; `None` when unmapped.
pub fn orientation(party: &str) -> Option<Orientation> {
    ORIENTATIONS
        .iter()
        .find(|(name, _)| *name == party)
        .map(|(_, orientation)| *orientation)
}
