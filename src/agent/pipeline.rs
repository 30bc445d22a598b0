// src/agent/pipeline.rs
// Intent-specific pipeline execution: prompt assembly, optional code
// analysis enrichment, structured parsing, and the degraded free-text
// fallback

use tracing::{debug, info, warn};

use super::AgentReply;
use super::prompts;
use crate::analyzer;
use crate::error::{Result, VegaError};
use crate::llm::schema::{
    explanation_response_format, improvement_response_format, parse_explanation, parse_improvement,
};
use crate::llm::{CompletionBackend, CompletionRequest, Message, call_with_retry};
use crate::session::ChatMessage;

/// Fixed apology returned when even the degraded fallback fails. A
/// user-facing message, deliberately not an error.
pub const FALLBACK_APOLOGY: &str = "\
I apologize, but I encountered an error processing your request. Please try:
1. Rephrasing your question
2. Providing more complete code
3. Clearing the session to reset the conversation";

/// What a pipeline produced, and how the facade should treat history
pub(crate) enum PipelineOutcome {
    /// Normal result: the facade appends (human, ai) to the session
    Reply(AgentReply),
    /// Both the structured attempt and the fallback failed: returned as
    /// text, intentionally not appended to history
    Apology(String),
}

/// Enrich code-like input with analyzer metadata. Explicit two-step: a
/// need-check, then a direct analyzer call. The analyzer is a pure text
/// function, so enrichment can never fail the request.
fn enrich_input(input: &str) -> String {
    if !analyzer::needs_analysis(input) {
        return input.to_string();
    }
    let report = analyzer::analyze(input);
    debug!(
        language = %report.language,
        lines = report.line_count,
        "enriched input with code analysis"
    );
    format!("{input}\n\n[Code Analysis]:\n{report}")
}

fn assemble(system: String, history: &[ChatMessage], input: &str) -> Vec<Message> {
    let mut messages = vec![Message::system(system)];
    messages.extend(history.iter().map(Message::from));
    messages.push(Message::user(input));
    messages
}

/// Explanation pipeline: structured payload expected, free-text fallback on
/// parse failure
pub(crate) async fn run_explanation(
    backend: &dyn CompletionBackend,
    history: &[ChatMessage],
    input: &str,
) -> Result<PipelineOutcome> {
    info!("using explanation pipeline");
    let enhanced = enrich_input(input);
    let request = CompletionRequest::new(assemble(prompts::explanation_prompt(), history, &enhanced))
        .with_response_format(explanation_response_format());

    let raw = call_with_retry("explain", || backend.complete(request.clone())).await?;

    match parse_explanation(&raw) {
        Ok(explanation) => Ok(PipelineOutcome::Reply(AgentReply::Explanation(explanation))),
        Err(e) => degrade(backend, history, input, e).await,
    }
}

/// Improvement pipeline: identical shape, producing an improvement payload
pub(crate) async fn run_improvement(
    backend: &dyn CompletionBackend,
    history: &[ChatMessage],
    input: &str,
) -> Result<PipelineOutcome> {
    info!("using improvement pipeline");
    let enhanced = enrich_input(input);
    let request = CompletionRequest::new(assemble(prompts::improvement_prompt(), history, &enhanced))
        .with_response_format(improvement_response_format());

    let raw = call_with_retry("improve", || backend.complete(request.clone())).await?;

    match parse_improvement(&raw) {
        Ok(improvement) => Ok(PipelineOutcome::Reply(AgentReply::Improvement(improvement))),
        Err(e) => degrade(backend, history, input, e).await,
    }
}

/// General pipeline: no schema, the raw text response is the result
pub(crate) async fn run_general(
    backend: &dyn CompletionBackend,
    history: &[ChatMessage],
    input: &str,
) -> Result<PipelineOutcome> {
    info!("using general pipeline");
    let request =
        CompletionRequest::new(assemble(prompts::GENERAL_SYSTEM.to_string(), history, input));
    let text = call_with_retry("general", || backend.complete(request.clone())).await?;
    Ok(PipelineOutcome::Reply(AgentReply::Text(text)))
}

/// Structured-output fallback: one supplementary free-text request with the
/// same input and an explicit no-formatting instruction. If this also
/// fails, the apology is returned instead of an error. Rate limiting is the
/// exception: it propagates so the facade renders its advisory.
async fn degrade(
    backend: &dyn CompletionBackend,
    history: &[ChatMessage],
    input: &str,
    cause: VegaError,
) -> Result<PipelineOutcome> {
    warn!(error = %cause, "structured output failed to parse, falling back to free text");

    let fallback_input =
        format!("{input}\n\nPlease provide a clear explanation (no JSON formatting needed).");
    let request = CompletionRequest::new(assemble(
        prompts::GENERAL_SYSTEM.to_string(),
        history,
        &fallback_input,
    ));

    match call_with_retry("fallback", || backend.complete(request.clone())).await {
        Ok(text) => {
            info!("fallback succeeded, returning unstructured response");
            Ok(PipelineOutcome::Reply(AgentReply::Text(text)))
        }
        Err(VegaError::RateLimited) => Err(VegaError::RateLimited),
        Err(e) => {
            warn!(error = %e, "fallback request also failed");
            Ok(PipelineOutcome::Apology(FALLBACK_APOLOGY.to_string()))
        }
    }
}
