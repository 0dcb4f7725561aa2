//! Ratcliff/Obershelp string similarity.

use std::collections::{HashMap, HashSet};

/// Sequences at least this long drop their most frequent characters from
/// matching.
const AUTOJUNK_MIN_LEN: usize = 200;

struct Matcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            let popular: HashSet<char> = b2j
                .iter()
                .filter(|(_, positions)| positions.len() > limit)
                .map(|(c, _)| *c)
                .collect();
            b2j.retain(|c, _| !popular.contains(c));
        }
        Self { a, b, b2j }
    }

    /// Longest common block in `a[alo..ahi]` × `b[blo..bhi]`, earliest on ties.
    ///
    /// The block found through `b2j` is then grown over neighbouring equal
    /// characters, which picks up the popular ones autojunk dropped.
    fn longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
        let mut lengths: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = if j == 0 {
                        1
                    } else {
                        lengths.get(&(j - 1)).copied().unwrap_or(0) + 1
                    };
                    next.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            lengths = next;
        }

        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && self.a[best_i + best_k] == self.b[best_j + best_k]
        {
            best_k += 1;
        }

        (best_i, best_j, best_k)
    }

    fn matching_chars(&self) -> usize {
        let mut total = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }
}

/// `2 * M / T`, where `M` is the number of matched characters and `T` the
/// combined length. Two empty strings score 1.0. Not symmetric.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = Matcher::new(&a, &b).matching_chars();
    2.0 * matched as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ratios() {
        assert_eq!(ratio("abcd", "bcde"), 0.75);
        assert_eq!(ratio("tide", "diet"), 0.25);
        assert_eq!(ratio("diet", "tide"), 0.5);
    }

    #[test]
    fn test_identity_and_disjoint() {
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("abc", "abc"), 1.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(ratio("più", "più"), 1.0);
        assert_eq!(ratio("è", "e"), 0.0);
    }

    #[test]
    fn test_long_sequences_grow_into_popular_chars() {
        let b = format!("{}the cat", "e ".repeat(110));
        assert_eq!(b.chars().count(), 227);
        assert_eq!(ratio("the the the the the cat", &b), 0.072);

        let claim = "la spesa pubblica è aumentata del 3 per cento nel 2023";
        let page = format!("{}{claim}", "la ".repeat(70));
        assert!((ratio(claim, &page) - 108.0 / 318.0).abs() < 1e-12);
    }

    #[test]
    fn test_close_sentences_score_high() {
        let claim = "the unemployment rate fell in 2023";
        let sentence = "the unemployment rate fell sharply in 2023";
        assert!(ratio(claim, sentence) > 0.7);
        assert!(ratio(claim, "football results from sunday") < 0.7);
    }
}
