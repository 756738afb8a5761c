//! Question answering pipeline
//!
//! Joins the FAQ dataset, the prompt builder and a text generator.

use crate::faq::{compact_prompt, FaqDataset, FaqError};
use crate::inference::{GenerationParams, InferenceError, TextGenerator, TokenStream};
use crate::types::Language;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Pause between two drains of a running answer
const DRAIN_INTERVAL: Duration = Duration::from_millis(15);

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Question is empty")]
    EmptyQuestion,
    #[error(transparent)]
    Faq(#[from] FaqError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Start streaming an answer to `question` about `product`
pub fn ask<G: TextGenerator + ?Sized>(
    generator: &G,
    dataset: &FaqDataset,
    product: &str,
    question: &str,
    language: Language,
    params: &GenerationParams,
) -> Result<TokenStream, AssistantError> {
    if question.trim().is_empty() {
        return Err(AssistantError::EmptyQuestion);
    }

    let prompt = compact_prompt(dataset, product, question, language)?;
    tracing::debug!("Prompt:\n{}", prompt);

    Ok(generator.generate_stream(&prompt, params)?)
}

/// Feed `stream` to `on_text` until it ends, cancelling it once `stop` is set.
///
/// Everything available is drained at once so each tick is one re-render.
pub async fn stream_answer(
    stream: TokenStream,
    stop: &AtomicBool,
    mut on_text: impl FnMut(&str),
) -> Result<(), String> {
    loop {
        if stop.load(Ordering::Relaxed) {
            stream.cancel();
        }

        let drained = stream.try_drain();
        if !drained.text.is_empty() {
            on_text(&drained.text);
        }
        match drained.end {
            Some(end) => return end,
            None => tokio::time::sleep(DRAIN_INTERVAL).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::streaming;
    use std::sync::Mutex;

    /// Replies with fixed chunks and remembers the prompts it was given
    struct ScriptedGenerator {
        chunks: Vec<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(chunks: Vec<&'static str>) -> Self {
            Self {
                chunks,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate_stream(
            &self,
            prompt: &str,
            params: &GenerationParams,
        ) -> Result<TokenStream, InferenceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());

            let (sender, stream) = streaming::channel();
            let chunks = self.chunks.clone();
            let stop = params.stop.clone();
            std::thread::spawn(move || {
                let mut filter = crate::inference::StopSequenceFilter::new(&stop);
                for chunk in chunks {
                    sender.send_text(filter.push(chunk));
                    if filter.is_stopped() {
                        break;
                    }
                }
                sender.send_text(filter.finish());
                sender.finish();
            });
            Ok(stream)
        }
    }

    const FAQ: &str = r#"{
        "Router X1": {
            "Come si resetta?": "Tasto reset per 10 secondi.",
            "Qual è la garanzia?": "Due anni."
        }
    }"#;

    #[test]
    fn test_ask_streams_answer_until_stop() {
        let dataset = FaqDataset::from_json_str(FAQ).unwrap();
        let generator = ScriptedGenerator::new(vec![" Due", " anni.", "\n", "\nQ: altro"]);

        let stream = ask(
            &generator,
            &dataset,
            "Router X1",
            "garanzia?",
            Language::Italian,
            &GenerationParams::default(),
        )
        .unwrap();

        assert_eq!(stream.collect_blocking().unwrap(), " Due anni.");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Product: Router X1\n"));
        assert!(prompts[0].contains("Q: garanzia?\n"));
    }

    #[test]
    fn test_ask_rejects_blank_question() {
        let dataset = FaqDataset::from_json_str(FAQ).unwrap();
        let generator = ScriptedGenerator::new(vec![]);
        let err = ask(
            &generator,
            &dataset,
            "Router X1",
            "  \t ",
            Language::Italian,
            &GenerationParams::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, AssistantError::EmptyQuestion));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_ask_unknown_product() {
        let dataset = FaqDataset::from_json_str(FAQ).unwrap();
        let generator = ScriptedGenerator::new(vec![]);
        let err = ask(
            &generator,
            &dataset,
            "Frigo",
            "garanzia",
            Language::English,
            &GenerationParams::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, AssistantError::Faq(FaqError::UnknownProduct(_))));
    }

    #[test]
    fn test_ask_without_model_reports_inference_error() {
        let dataset = FaqDataset::from_json_str(FAQ).unwrap();
        let engine = crate::inference::LlamaEngine::new();
        let err = ask(
            &engine,
            &dataset,
            "Router X1",
            "garanzia",
            Language::Italian,
            &GenerationParams::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            AssistantError::Inference(InferenceError::ModelNotLoaded)
        ));
    }

    #[tokio::test]
    async fn test_stream_answer_collects_text() {
        let dataset = FaqDataset::from_json_str(FAQ).unwrap();
        let generator = ScriptedGenerator::new(vec!["Tasto", " reset", ".\n\nQ:"]);
        let stream = ask(
            &generator,
            &dataset,
            "Router X1",
            "resetta",
            Language::Italian,
            &GenerationParams::default(),
        )
        .unwrap();

        let mut answer = String::new();
        let stop = AtomicBool::new(false);
        let end = stream_answer(stream, &stop, |text| answer.push_str(text)).await;

        assert_eq!(end, Ok(()));
        assert_eq!(answer, "Tasto reset.");
    }

    #[tokio::test]
    async fn test_stream_answer_cancels_on_stop() {
        let (sender, stream) = streaming::channel();
        let worker = std::thread::spawn(move || {
            sender.send_text("inizio");
            while !sender.is_cancelled() {
                std::thread::sleep(Duration::from_millis(1));
            }
            sender.finish();
        });

        let stop = AtomicBool::new(true);
        let mut answer = String::new();
        let end = stream_answer(stream, &stop, |text| answer.push_str(text)).await;

        assert_eq!(end, Ok(()));
        assert!(answer.is_empty() || answer == "inizio");
        worker.join().unwrap();
    }

    #[tokio::test]
    async fn test_stream_answer_reports_lost_worker() {
        let (sender, stream) = streaming::channel();
        std::thread::spawn(move || {
            sender.send_text("parziale");
            drop(sender);
        })
        .join()
        .unwrap();

        let stop = AtomicBool::new(false);
        let mut answer = String::new();
        let end = stream_answer(stream, &stop, |text| answer.push_str(text)).await;

        assert_eq!(answer, "parziale");
        assert!(end.is_err());
    }
}
