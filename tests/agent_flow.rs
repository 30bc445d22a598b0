// tests/agent_flow.rs
// End-to-end facade behavior against a scripted completion backend

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{StubBackend, StubResponse, valid_explanation_json, valid_improvement_json};
use vega::agent::{Agent, AgentReply, FALLBACK_APOLOGY, RATE_LIMIT_ADVISORY};
use vega::error::VegaError;
use vega::llm::MAX_RETRIES;
use vega::session::{ChatRole, SessionStore};

fn agent_with(stub: StubBackend) -> (Agent, Arc<SessionStore>, Arc<StubBackend>) {
    let backend = Arc::new(stub);
    let store = Arc::new(SessionStore::new(25));
    let agent = Agent::new(backend.clone(), store.clone());
    (agent, store, backend)
}

#[tokio::test]
async fn explanation_pipeline_produces_structured_reply() {
    let stub = StubBackend::new(vec![
        StubResponse::Ok("code_explanation".to_string()),
        StubResponse::Ok(valid_explanation_json()),
    ]);
    let (agent, store, backend) = agent_with(stub);

    let input = "Explain this code:\n def f(): return 1";
    let reply = agent.run(input, "s1").await.unwrap();

    let AgentReply::Explanation(explanation) = &reply else {
        panic!("expected structured explanation, got {reply:?}");
    };
    assert_eq!(explanation.language, "Python");
    assert!(!explanation.key_concepts.is_empty());

    // Classification, then one structured pipeline call
    assert_eq!(backend.call_count(), 2);

    let requests = backend.requests();
    // Structured call carries the response-format hint
    assert!(requests[1].response_format.is_some());
    // Code-like input was enriched with analyzer metadata
    let last_user = &requests[1].messages.last().unwrap().content;
    assert!(last_user.contains("[Code Analysis]"));
    assert!(last_user.contains("Language: Python"));

    // Exactly two messages appended: the input and the reply
    let messages = store.messages("s1").await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, ChatRole::Human);
    assert_eq!(messages[0].content, input);
    assert_eq!(messages[1].role, ChatRole::Ai);
    assert!(messages[1].content.contains("\"language\""));
}

#[tokio::test]
async fn improvement_pipeline_produces_structured_reply() {
    let stub = StubBackend::new(vec![
        StubResponse::Ok("code_improvement".to_string()),
        StubResponse::Ok(valid_improvement_json()),
    ]);
    let (agent, _store, _backend) = agent_with(stub);

    let reply = agent
        .run("Please improve this function:\n def f(): return 1", "s1")
        .await
        .unwrap();

    let AgentReply::Improvement(improvement) = &reply else {
        panic!("expected structured improvement, got {reply:?}");
    };
    assert!(improvement.improved_code.contains("def f"));
    assert_eq!(reply.kind(), "code_improvement");
}

#[tokio::test(start_paused = true)]
async fn rate_limited_pipeline_retries_full_schedule_then_advises() {
    // Classification succeeds; every pipeline call is rate limited
    let stub = StubBackend::new(vec![StubResponse::Ok("general_question".to_string())])
        .then_always(StubResponse::RateLimited);
    let (agent, store, backend) = agent_with(stub);

    let start = tokio::time::Instant::now();
    let reply = agent.run("What is a closure?", "s1").await.unwrap();

    assert_eq!(reply, AgentReply::Text(RATE_LIMIT_ADVISORY.to_string()));
    // One classification call, then MAX_RETRIES + 1 pipeline attempts
    assert_eq!(backend.call_count(), 1 + MAX_RETRIES + 1);
    // The fixed 5s + 15s + 30s backoff schedule ran in virtual time
    assert_eq!(start.elapsed(), Duration::from_secs(50));
    // The advisory path does not touch history
    assert!(store.messages("s1").await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn rate_limited_classification_still_degrades_gracefully() {
    // Everything rate limits: classification exhausts its retries, defaults
    // to the general pipeline, which exhausts its own and yields the advisory
    let stub = StubBackend::always(StubResponse::RateLimited);
    let (agent, _store, backend) = agent_with(stub);

    let reply = agent.run("hello", "s1").await.unwrap();

    assert_eq!(reply, AgentReply::Text(RATE_LIMIT_ADVISORY.to_string()));
    assert_eq!(backend.call_count(), 2 * (MAX_RETRIES + 1));
}

#[tokio::test]
async fn malformed_structured_output_falls_back_to_free_text() {
    let stub = StubBackend::new(vec![
        StubResponse::Ok("code_improvement".to_string()),
        StubResponse::Ok("Sure! You should add error handling.".to_string()),
        StubResponse::Ok("Here is some plain advice.".to_string()),
    ]);
    let (agent, store, backend) = agent_with(stub);

    let input = "Improve this:\n def f(): return 1";
    let reply = agent.run(input, "s1").await.unwrap();

    assert_eq!(reply, AgentReply::Text("Here is some plain advice.".to_string()));

    // Exactly one supplementary fallback request was issued
    assert_eq!(backend.call_count(), 3);
    let requests = backend.requests();
    assert!(requests[2].response_format.is_none());
    let fallback_user = &requests[2].messages.last().unwrap().content;
    assert!(fallback_user.contains("no JSON formatting needed"));

    // The successful fallback still appends the turn
    let messages = store.messages("s1").await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "Here is some plain advice.");
}

#[tokio::test]
async fn failed_fallback_returns_apology_without_touching_history() {
    let stub = StubBackend::new(vec![
        StubResponse::Ok("code_explanation".to_string()),
        StubResponse::Ok("not json at all".to_string()),
        StubResponse::Fail("upstream exploded".to_string()),
    ]);
    let (agent, store, _backend) = agent_with(stub);

    let reply = agent
        .run("Explain this code:\n def f(): return 1", "s1")
        .await
        .unwrap();

    assert_eq!(reply, AgentReply::Text(FALLBACK_APOLOGY.to_string()));
    assert!(store.messages("s1").await.is_empty());
}

#[tokio::test]
async fn classification_failure_defaults_to_general_pipeline() {
    let stub = StubBackend::new(vec![
        StubResponse::Fail("classifier down".to_string()),
        StubResponse::Ok("A closure captures its environment.".to_string()),
    ]);
    let (agent, _store, backend) = agent_with(stub);

    let reply = agent.run("hello there", "s1").await.unwrap();

    assert_eq!(
        reply,
        AgentReply::Text("A closure captures its environment.".to_string())
    );
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn unrecognized_label_uses_keyword_fallback_routing() {
    let stub = StubBackend::new(vec![
        StubResponse::Ok("definitely-not-a-category".to_string()),
        StubResponse::Ok(valid_explanation_json()),
    ]);
    let (agent, _store, backend) = agent_with(stub);

    let reply = agent
        .run("Please explain what does this do:\n def foo(): pass", "s1")
        .await
        .unwrap();

    assert_eq!(reply.kind(), "code_explanation");
    // The routed pipeline asked for structured output
    assert!(backend.requests()[1].response_format.is_some());
}

#[tokio::test]
async fn empty_input_is_rejected_before_any_remote_call() {
    let stub = StubBackend::new(vec![]);
    let (agent, _store, backend) = agent_with(stub);

    let err = agent.run("   \n\t ", "s1").await.unwrap_err();
    assert!(matches!(err, VegaError::InvalidInput(_)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn unexpected_failure_is_wrapped_as_execution_error() {
    let stub = StubBackend::new(vec![
        StubResponse::Ok("general_question".to_string()),
        StubResponse::Fail("connection reset".to_string()),
    ]);
    let (agent, _store, _backend) = agent_with(stub);

    let err = agent.run("what is a trait?", "s1").await.unwrap_err();
    assert!(matches!(err, VegaError::Execution(_)));
    assert!(err.to_string().contains("execution failed"));
    assert!(err.to_string().contains("connection reset"));
}

#[tokio::test]
async fn each_successful_turn_grows_session_by_two() {
    let stub = StubBackend::new(vec![
        StubResponse::Ok("general_question".to_string()),
        StubResponse::Ok("first answer".to_string()),
        StubResponse::Ok("general_question".to_string()),
        StubResponse::Ok("second answer".to_string()),
    ]);
    let (agent, store, _backend) = agent_with(stub);

    agent.run("question one", "s1").await.unwrap();
    agent.run("question two", "s1").await.unwrap();

    let messages = store.messages("s1").await;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].content, "question two");
    assert_eq!(messages[3].content, "second answer");
}

#[tokio::test]
async fn history_is_windowed_before_classification() {
    let stub = StubBackend::new(vec![
        StubResponse::Ok("general_question".to_string()),
        StubResponse::Ok("answer".to_string()),
    ]);
    let backend = Arc::new(stub);
    let store = Arc::new(SessionStore::new(4));
    let agent = Agent::new(backend.clone(), store.clone());

    for i in 0..6 {
        store
            .append("s1", ChatRole::Human, format!("old message {i}"))
            .await;
    }

    agent.run("latest question", "s1").await.unwrap();

    // The classification request saw at most window-size history messages
    // (system + 4 history + current input)
    let first_request = &backend.requests()[0];
    assert_eq!(first_request.messages.len(), 1 + 4 + 1);
    assert!(first_request.messages[1].content.contains("old message 2"));
}

#[tokio::test]
async fn admin_surface_passes_through_to_store() {
    let stub = StubBackend::new(vec![]);
    let (agent, _store, _backend) = agent_with(stub);

    // Never-created session: no-op, nothing fails
    agent.clear_memory("ghost").await;
    let stats = agent.get_stats().await;
    assert_eq!(stats.active_sessions, 0);

    assert!(agent.get_memory("ghost2").await.is_empty());
    let formatted = agent.get_formatted_memory("ghost2", 100).await;
    assert!(formatted.contains("No conversation history"));
}
