//! Compact prompt construction

use crate::faq::{relevant_entries, FaqDataset, FaqEntry, FaqError};
use crate::types::Language;

/// Render the prompt for one question.
///
/// Layout:
/// ```text
/// Product: <name>
/// FAQ: {"question": "answer", ...}
/// Q: <question>
/// A: <answer instruction>
/// ```
pub fn build_prompt(
    product_name: &str,
    entries: &[&FaqEntry],
    question: &str,
    language: Language,
) -> String {
    format!(
        "Product: {product_name}\nFAQ: {faq}\nQ: {question}\nA: {instruction}",
        faq = faq_json(entries),
        instruction = language.answer_instruction(),
    )
}

/// Look up the product, keep the relevant entries and render the prompt
pub fn compact_prompt(
    dataset: &FaqDataset,
    product_name: &str,
    question: &str,
    language: Language,
) -> Result<String, FaqError> {
    let product = dataset
        .product(product_name)
        .ok_or_else(|| FaqError::UnknownProduct(product_name.to_string()))?;

    let question = question.trim();
    let entries = relevant_entries(product, question);
    tracing::debug!(
        "{} of {} FAQ entries relevant for {:?}",
        entries.len(),
        product.entries.len(),
        question
    );

    Ok(build_prompt(&product.name, &entries, question, language))
}

/// JSON object with `", "` and `": "` separators and non-ASCII kept as-is
fn faq_json(entries: &[&FaqEntry]) -> String {
    let mut out = String::from("{");
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&json_string(&entry.question));
        out.push_str(": ");
        out.push_str(&json_string(&entry.answer));
    }
    out.push('}');
    out
}

fn json_string(s: &str) -> String {
    // serializing a &str cannot fail
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}
