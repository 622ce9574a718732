//! Writing-style extraction — distills a user's writing samples into a tone
//! and structure descriptor the newsletter composer can imitate.

pub mod handlers;
pub mod prompts;

use tracing::warn;

use crate::llm_client::{GenerationRequest, TextGenerator};

const DEFAULT_TONE: &str = "professional";
const DEFAULT_STRUCTURE: &str = "standard";

/// A user's extracted writing style. Never persisted, rebuilt per generation.
#[derive(Debug, Clone, PartialEq)]
pub struct WritingStyle {
    pub samples: Vec<String>,
    pub tone: String,
    pub structure: String,
}

impl WritingStyle {
    fn defaults(samples: Vec<String>) -> Self {
        Self {
            samples,
            tone: DEFAULT_TONE.to_string(),
            structure: DEFAULT_STRUCTURE.to_string(),
        }
    }
}

/// Extracts tone and structure from the samples. This function never fails:
/// no samples means defaults without a generator call, and a generator error
/// degrades to defaults rather than blocking newsletter generation.
pub async fn extract_writing_style(
    generator: &dyn TextGenerator,
    samples: Vec<String>,
) -> WritingStyle {
    if samples.is_empty() {
        return WritingStyle::defaults(samples);
    }

    let prompt = prompts::STYLE_EXTRACTION_PROMPT.replace("{samples}", &samples.join("\n\n---\n\n"));

    let response = generator
        .complete(GenerationRequest {
            system: prompts::STYLE_EXTRACTION_SYSTEM,
            prompt: &prompt,
            temperature: 0.3,
            max_tokens: 500,
        })
        .await;

    match response {
        Ok(text) => {
            let (tone, structure) = parse_style_response(&text);
            WritingStyle {
                samples,
                tone,
                structure,
            }
        }
        Err(e) => {
            warn!(error = %e, "style extraction failed, using defaults");
            WritingStyle::defaults(samples)
        }
    }
}

/// Pulls `Tone:` and `Structure:` lines out of the response, case
/// insensitively. Each field falls back to its default independently.
fn parse_style_response(text: &str) -> (String, String) {
    let mut tone = None;
    let mut structure = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = strip_prefix_ci(line, "tone:") {
            if !rest.trim().is_empty() {
                tone = Some(rest.trim().to_string());
            }
        } else if let Some(rest) = strip_prefix_ci(line, "structure:") {
            if !rest.trim().is_empty() {
                structure = Some(rest.trim().to_string());
            }
        }
    }

    (
        tone.unwrap_or_else(|| DEFAULT_TONE.to_string()),
        structure.unwrap_or_else(|| DEFAULT_STRUCTURE.to_string()),
    )
}

// `prefix` must be ASCII.
fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.is_char_boundary(prefix.len()) && line[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::llm_client::LlmError;

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn complete(&self, _request: GenerationRequest<'_>) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn complete(&self, _request: GenerationRequest<'_>) -> Result<String, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    struct PanickingGenerator;

    #[async_trait]
    impl TextGenerator for PanickingGenerator {
        async fn complete(&self, _request: GenerationRequest<'_>) -> Result<String, LlmError> {
            panic!("generator must not be invoked");
        }
    }

    #[tokio::test]
    async fn test_no_samples_skips_generator() {
        let style = extract_writing_style(&PanickingGenerator, Vec::new()).await;
        assert_eq!(style.tone, "professional");
        assert_eq!(style.structure, "standard");
    }

    #[tokio::test]
    async fn test_parses_both_fields() {
        let generator = FixedGenerator("Tone: witty\nStructure: listicle");
        let style = extract_writing_style(&generator, vec!["sample".to_string()]).await;
        assert_eq!(style.tone, "witty");
        assert_eq!(style.structure, "listicle");
    }

    #[tokio::test]
    async fn test_missing_field_defaults_independently() {
        let generator = FixedGenerator("TONE: casual\nsome unrelated line");
        let style = extract_writing_style(&generator, vec!["sample".to_string()]).await;
        assert_eq!(style.tone, "casual");
        assert_eq!(style.structure, "standard");
    }

    #[tokio::test]
    async fn test_generator_error_degrades_to_defaults() {
        let samples = vec!["one".to_string(), "two".to_string()];
        let style = extract_writing_style(&FailingGenerator, samples.clone()).await;
        assert_eq!(style, WritingStyle::defaults(samples));
    }

    #[test]
    fn test_parse_ignores_empty_values() {
        let (tone, structure) = parse_style_response("Tone:\nStructure: tight");
        assert_eq!(tone, "professional");
        assert_eq!(structure, "tight");
    }
}
