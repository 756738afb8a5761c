//! Keyword containment filter
//!
//! An entry is relevant when its question contains any word of the user's
//! question, compared case-insensitively. Words are taken verbatim, so
//! punctuation attached to a word must match too.

use crate::faq::{FaqEntry, ProductFaqs};

/// Select the entries of `product` relevant to `question`.
///
/// Falls back to every entry of the product when nothing matches.
pub fn relevant_entries<'a>(product: &'a ProductFaqs, question: &str) -> Vec<&'a FaqEntry> {
    let question = question.to_lowercase();
    let words: Vec<&str> = question.split_whitespace().collect();

    let matched: Vec<&FaqEntry> = product
        .entries
        .iter()
        .filter(|entry| {
            let text = entry.question.to_lowercase();
            words.iter().any(|word| text.contains(word))
        })
        .collect();

    if matched.is_empty() {
        product.entries.iter().collect()
    } else {
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductFaqs {
        let entry = |q: &str, a: &str| FaqEntry {
            question: q.to_string(),
            answer: a.to_string(),
        };
        ProductFaqs {
            name: "Router X1".to_string(),
            entries: vec![
                entry("Come si resetta il router?", "Tasto reset."),
                entry("Qual è la GARANZIA?", "Due anni."),
                entry("Dove trovo il manuale?", "Sul sito."),
            ],
        }
    }

    fn questions(entries: &[&FaqEntry]) -> Vec<String> {
        entries.iter().map(|e| e.question.clone()).collect()
    }

    #[test]
    fn test_matches_case_insensitively() {
        let product = product();
        let found = relevant_entries(&product, "Garanzia scaduta");
        assert_eq!(questions(&found), vec!["Qual è la GARANZIA?"]);
    }

    #[test]
    fn test_substring_match_inside_words() {
        let product = product();
        // "rese" is contained in "resetta"
        let found = relevant_entries(&product, "rese");
        assert_eq!(questions(&found), vec!["Come si resetta il router?"]);
    }

    #[test]
    fn test_short_words_match_broadly_in_order() {
        let product = product();
        // "il" occurs in the first and third question
        let found = relevant_entries(&product, "il");
        assert_eq!(
            questions(&found),
            vec!["Come si resetta il router?", "Dove trovo il manuale?"]
        );
    }

    #[test]
    fn test_punctuation_is_not_stripped() {
        let product = product();
        let found = relevant_entries(&product, "manuale!");
        // no match, so every entry comes back
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_fallback_to_all_entries() {
        let product = product();
        assert_eq!(relevant_entries(&product, "xyz").len(), 3);
        assert_eq!(relevant_entries(&product, "   ").len(), 3);
    }

    #[test]
    fn test_empty_product() {
        let product = ProductFaqs {
            name: "Empty".to_string(),
            entries: Vec::new(),
        };
        assert!(relevant_entries(&product, "anything").is_empty());
    }
}
