//! Keyword extraction primitives
//!
//! Pure functions over borrowed text; no state, no side effects. Everything
//! downstream (themes, arcs, outline review) shares this tokenizer so that
//! "significant word" means the same thing across the pipeline.

mod stopwords;

use std::collections::{BTreeMap, BTreeSet};

use stopwords::is_stop_word;

/// Extract significant keywords from text
///
/// Lowercases, strips punctuation (inner apostrophes survive so
/// contractions still match the stop list), splits on whitespace, then
/// drops stop words, pure-numeric tokens, and tokens shorter than
/// `min_len`. Duplicates are preserved in document order so callers can
/// count frequencies.
pub fn extract_keywords(text: &str, min_len: usize) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let token: String = raw
                .chars()
                .filter(|c| !c.is_ascii_punctuation() || *c == '\'')
                .collect::<String>()
                .to_lowercase();
            let token = token.trim_matches('\'').to_string();
            if token.len() < min_len
                || is_stop_word(&token)
                || token.chars().all(|c| c.is_ascii_digit())
            {
                None
            } else {
                Some(token)
            }
        })
        .collect()
}

/// Unique significant words of a text, in sorted order
pub fn significant_words(text: &str, min_len: usize) -> BTreeSet<String> {
    extract_keywords(text, min_len).into_iter().collect()
}

/// Top `n` keywords across a set of texts, ranked by total frequency
///
/// Ties break lexicographically so the ranking is reproducible.
pub fn top_keywords<'a, I>(texts: I, min_len: usize, n: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for text in texts {
        for word in extract_keywords(text, min_len) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }
    rank_by_count(counts, n)
}

/// Rank a word-count map by count descending, word ascending
pub fn rank_by_count(counts: BTreeMap<String, usize>, n: usize) -> Vec<String> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(n).map(|(word, _)| word).collect()
}

/// Whitespace word count of raw text
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_keywords_filters() {
        let words = extract_keywords("The Garden, the garden! 1234 ab rose.", 4);
        assert_eq!(words, vec!["garden", "garden", "rose"]);
    }

    #[test]
    fn test_min_length_varies() {
        let words = extract_keywords("sun sets over red hills", 3);
        assert_eq!(words, vec!["sun", "sets", "red", "hills"]);
        let words = extract_keywords("sun sets over red hills", 4);
        assert_eq!(words, vec!["sets", "hills"]);
    }

    #[test]
    fn test_contractions_are_stop_words() {
        let words = extract_keywords("she didn't like the 'garden' plan", 4);
        assert_eq!(words, vec!["like", "garden", "plan"]);
    }

    #[test]
    fn test_significant_words_deduplicates() {
        let words = significant_words("rose rose bloom", 4);
        assert_eq!(words.len(), 2);
        assert!(words.contains("rose"));
        assert!(words.contains("bloom"));
    }

    #[test]
    fn test_top_keywords_ranking() {
        let texts = ["garden rose rose", "garden bloom"];
        let top = top_keywords(texts.iter().copied(), 4, 2);
        // garden and rose both appear twice; lexicographic tie-break
        assert_eq!(top, vec!["garden", "rose"]);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("one two  three"), 3);
        assert_eq!(word_count(""), 0);
    }
}
