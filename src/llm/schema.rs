// src/llm/schema.rs
// Structured result shapes (explanation, improvement), their JSON schemas
// for the response-format hint, and parsing with validation

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Result, VegaError};

/// Structured output for code explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeExplanation {
    /// Programming language detected
    pub language: String,
    /// Detailed explanation of what the code does
    pub detailed_explanation: String,
    /// Key programming concepts used
    pub key_concepts: Vec<String>,
}

/// Structured output for code improvement suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeImprovement {
    /// Issues found in the original code
    pub original_issues: Vec<String>,
    /// Specific improvement suggestions
    pub suggestions: Vec<String>,
    /// The improved version of the code
    pub improved_code: String,
    /// Explanation of the improvements made
    pub explanation: String,
}

/// Response-format hint requesting a strict explanation payload
pub fn explanation_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "code_explanation",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "language": {
                        "type": "string",
                        "description": "Programming language detected"
                    },
                    "detailed_explanation": {
                        "type": "string",
                        "description": "Detailed explanation of what the code does"
                    },
                    "key_concepts": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1,
                        "description": "Key programming concepts used"
                    }
                },
                "required": ["language", "detailed_explanation", "key_concepts"],
                "additionalProperties": false
            }
        }
    })
}

/// Response-format hint requesting a strict improvement payload
pub fn improvement_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "code_improvement",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "original_issues": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Issues found in the original code"
                    },
                    "suggestions": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Specific improvement suggestions"
                    },
                    "improved_code": {
                        "type": "string",
                        "description": "The improved version of the code"
                    },
                    "explanation": {
                        "type": "string",
                        "description": "Explanation of the improvements made"
                    }
                },
                "required": ["original_issues", "suggestions", "improved_code", "explanation"],
                "additionalProperties": false
            }
        }
    })
}

/// Format instructions embedded in the structured system prompts, for models
/// that ignore the response-format hint
pub fn explanation_format_instructions() -> String {
    "Respond with a single JSON object with exactly these fields:\n\
     - \"language\" (string): the programming language detected\n\
     - \"detailed_explanation\" (string): what the code does\n\
     - \"key_concepts\" (array of strings): key programming concepts used"
        .to_string()
}

pub fn improvement_format_instructions() -> String {
    "Respond with a single JSON object with exactly these fields:\n\
     - \"original_issues\" (array of strings): issues found in the original code\n\
     - \"suggestions\" (array of strings): specific improvement suggestions\n\
     - \"improved_code\" (string): the improved version of the code\n\
     - \"explanation\" (string): explanation of the improvements made"
        .to_string()
}

/// Strip markdown code fences and surrounding prose, keeping the outermost
/// JSON object. Models occasionally wrap payloads despite instructions.
fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => &trimmed[s..=e],
        _ => trimmed,
    }
}

/// Parse and validate an explanation payload
pub fn parse_explanation(raw: &str) -> Result<CodeExplanation> {
    let parsed: CodeExplanation = serde_json::from_str(extract_json(raw))
        .map_err(|e| VegaError::Schema(format!("explanation payload: {e}")))?;

    if parsed.language.trim().is_empty() {
        return Err(VegaError::Schema("language cannot be empty".to_string()));
    }
    if parsed.detailed_explanation.trim().is_empty() {
        return Err(VegaError::Schema(
            "detailed_explanation cannot be empty".to_string(),
        ));
    }
    if parsed.key_concepts.is_empty() {
        return Err(VegaError::Schema("key_concepts cannot be empty".to_string()));
    }
    Ok(parsed)
}

/// Parse and validate an improvement payload
pub fn parse_improvement(raw: &str) -> Result<CodeImprovement> {
    let parsed: CodeImprovement = serde_json::from_str(extract_json(raw))
        .map_err(|e| VegaError::Schema(format!("improvement payload: {e}")))?;

    if parsed.improved_code.trim().is_empty() {
        return Err(VegaError::Schema("improved_code cannot be empty".to_string()));
    }
    if parsed.explanation.trim().is_empty() {
        return Err(VegaError::Schema("explanation cannot be empty".to_string()));
    }
    Ok(parsed)
}
