// src/intent/mod.rs
// Intent classification with deterministic fallback. classify() is total:
// it always yields a valid Intent and never errors.

use tracing::{info, warn};

use crate::llm::{CompletionBackend, CompletionRequest, Message, call_with_retry};
use crate::session::ChatMessage;

/// The classified purpose of a user turn, driving pipeline selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    CodeExplanation,
    CodeImprovement,
    GeneralQuestion,
}

impl Intent {
    pub const ALL: [Intent; 3] = [
        Intent::CodeExplanation,
        Intent::CodeImprovement,
        Intent::GeneralQuestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CodeExplanation => "code_explanation",
            Intent::CodeImprovement => "code_improvement",
            Intent::GeneralQuestion => "general_question",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const CLASSIFIER_SYSTEM_PROMPT: &str = "\
You are an intent classifier. Analyze the user's input and the conversation \
history, then classify it into ONE of these categories:
- code_explanation: the user wants to understand what code does (including \
references to previously discussed code)
- code_improvement: the user wants suggestions to improve code (including \
\"improve this\", \"fix this\", referencing prior code)
- general_question: the user asks a general programming question

If the user refers to \"this code\", \"the code\", \"it\", etc., look at the \
conversation history to understand what they mean.

Respond with ONLY the category name, nothing else.";

/// Keywords in the current input that select the explanation pipeline when
/// the model's label is unrecognized
const EXPLANATION_KEYWORDS: [&str; 3] = ["explain", "what does", "how does"];

/// Keywords that select the improvement pipeline
const IMPROVEMENT_KEYWORDS: [&str; 4] = ["improve", "better", "optimize", "refactor"];

/// Match a raw model label against the known categories. Tolerates the exact
/// token or its human-readable variant anywhere in the text.
fn match_label(raw: &str) -> Option<Intent> {
    let normalized = raw.trim().to_lowercase();
    Intent::ALL.into_iter().find(|intent| {
        let token = intent.as_str();
        normalized.contains(token) || normalized.contains(&token.replace('_', " "))
    })
}

/// Deterministic keyword heuristic over the current input only
fn keyword_fallback(input: &str) -> Intent {
    let lower = input.to_lowercase();
    if EXPLANATION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Intent::CodeExplanation
    } else if IMPROVEMENT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Intent::CodeImprovement
    } else {
        Intent::GeneralQuestion
    }
}

/// Classify the current input, consulting windowed session history so that
/// references like "this code" resolve. Two-tier fallback: label
/// normalization, then the keyword heuristic, then the hard default;
/// classification failure must never abort the request.
pub async fn classify(
    backend: &dyn CompletionBackend,
    history: &[ChatMessage],
    input: &str,
) -> Intent {
    let mut messages = vec![Message::system(CLASSIFIER_SYSTEM_PROMPT)];
    messages.extend(history.iter().map(Message::from));
    messages.push(Message::user(input));

    let request = CompletionRequest::new(messages);
    let raw = call_with_retry("classify", || backend.complete(request.clone())).await;

    match raw {
        Ok(label) => {
            if let Some(intent) = match_label(&label) {
                info!(intent = %intent, "classified intent");
                intent
            } else {
                let fallback = keyword_fallback(input);
                warn!(
                    label = %label.trim(),
                    fallback = %fallback,
                    "unrecognized intent label, using keyword fallback"
                );
                fallback
            }
        }
        Err(e) => {
            warn!(error = %e, "intent classification failed, defaulting to general_question");
            Intent::GeneralQuestion
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_label_exact_token() {
        assert_eq!(match_label("code_explanation"), Some(Intent::CodeExplanation));
        assert_eq!(match_label("  CODE_IMPROVEMENT  "), Some(Intent::CodeImprovement));
    }

    #[test]
    fn test_match_label_spaced_variant() {
        assert_eq!(
            match_label("That looks like a code explanation request."),
            Some(Intent::CodeExplanation)
        );
    }

    #[test]
    fn test_match_label_embedded() {
        assert_eq!(
            match_label("Category: general_question."),
            Some(Intent::GeneralQuestion)
        );
    }

    #[test]
    fn test_match_label_unknown() {
        assert_eq!(match_label("chitchat"), None);
    }

    #[test]
    fn test_keyword_fallback_explanation() {
        assert_eq!(
            keyword_fallback("Explain what this does"),
            Intent::CodeExplanation
        );
        assert_eq!(
            keyword_fallback("what does the loop do?"),
            Intent::CodeExplanation
        );
    }

    #[test]
    fn test_keyword_fallback_improvement() {
        assert_eq!(keyword_fallback("make it better"), Intent::CodeImprovement);
        assert_eq!(
            keyword_fallback("refactor this function"),
            Intent::CodeImprovement
        );
    }

    #[test]
    fn test_keyword_fallback_default() {
        assert_eq!(keyword_fallback("hello there"), Intent::GeneralQuestion);
        assert_eq!(keyword_fallback(""), Intent::GeneralQuestion);
    }

    #[test]
    fn test_as_str_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(match_label(intent.as_str()), Some(intent));
        }
    }
}
