//! FAQ dataset loading
//!
//! The FAQ file is a JSON object mapping each product name to an object
//! mapping question text to answer text. Key order is kept as written.

use crate::faq::FaqError;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A single question/answer pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// All FAQ entries of one product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFaqs {
    pub name: String,
    pub entries: Vec<FaqEntry>,
}

/// The whole FAQ database, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaqDataset {
    products: Vec<ProductFaqs>,
}

impl FaqDataset {
    /// Load the dataset from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FaqError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let dataset = Self::from_json_str(&json)?;
        tracing::info!(
            "Loaded {} products from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Parse the dataset from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, FaqError> {
        let root: Value = serde_json::from_str(json)?;
        let Value::Object(root) = root else {
            return Err(FaqError::InvalidShape(
                "<root>: expected an object of products".to_string(),
            ));
        };

        let mut products = Vec::with_capacity(root.len());
        for (name, faqs) in root {
            let Value::Object(faqs) = faqs else {
                return Err(FaqError::InvalidShape(format!(
                    "{name}: expected an object of questions"
                )));
            };

            let mut entries = Vec::with_capacity(faqs.len());
            for (question, answer) in faqs {
                let Value::String(answer) = answer else {
                    return Err(FaqError::InvalidShape(format!(
                        "{name}.{question}: expected a string answer"
                    )));
                };
                entries.push(FaqEntry { question, answer });
            }

            products.push(ProductFaqs { name, entries });
        }

        Ok(Self { products })
    }

    /// Product names in file order
    pub fn product_names(&self) -> Vec<&str> {
        self.products.iter().map(|p| p.name.as_str()).collect()
    }

    /// Look up a product by exact name
    pub fn product(&self, name: &str) -> Option<&ProductFaqs> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "Router X1": {
            "Come si resetta?": "Tieni premuto il tasto reset per 10 secondi.",
            "Qual è la garanzia?": "Due anni."
        },
        "Aspirapolvere Z": {
            "Quanto dura la batteria?": "Circa 40 minuti."
        },
        "Empty": {}
    }"#;

    #[test]
    fn test_parse_keeps_file_order() {
        let dataset = FaqDataset::from_json_str(SAMPLE).unwrap();
        assert_eq!(
            dataset.product_names(),
            vec!["Router X1", "Aspirapolvere Z", "Empty"]
        );

        let router = dataset.product("Router X1").unwrap();
        assert_eq!(router.entries.len(), 2);
        assert_eq!(router.entries[0].question, "Come si resetta?");
        assert_eq!(router.entries[1].answer, "Due anni.");
    }

    #[test]
    fn test_empty_product_is_allowed() {
        let dataset = FaqDataset::from_json_str(SAMPLE).unwrap();
        assert!(dataset.product("Empty").unwrap().entries.is_empty());
        assert!(dataset.product("Missing").is_none());
    }

    #[test]
    fn test_rejects_non_object_root() {
        let err = FaqDataset::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, FaqError::InvalidShape(_)));
    }

    #[test]
    fn test_rejects_non_string_answer() {
        let err = FaqDataset::from_json_str(r#"{"P": {"Q?": 3}}"#).unwrap_err();
        match err {
            FaqError::InvalidShape(path) => assert_eq!(path, "P.Q?: expected a string answer"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = FaqDataset::from_json_str("{").unwrap_err();
        assert!(matches!(err, FaqError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let dataset = FaqDataset::load(file.path()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert!(!dataset.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FaqDataset::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, FaqError::Io(_)));
    }
}
