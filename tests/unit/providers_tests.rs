/*!
 * Tests for engine conversations and the mock engine
 */

use std::sync::Arc;

use pairport::errors::ProviderError;
use pairport::invoker::TranslationInvoker;
use pairport::providers::mock::MockEngine;
use pairport::providers::{ask, Conversation, Role};

#[tokio::test]
async fn test_ask_shouldReturnExtendedConversation() {
    let engine = MockEngine::replying("# A.tgt\n```lang2\nx\n```\n");
    let mut chunks = Vec::new();
    let mut sink = |chunk: &str| chunks.push(chunk.to_string());

    let base = Conversation::new("rules");
    let (completion, conversation) = ask(&engine, base.clone(), "translate A", &mut sink)
        .await
        .expect("mock reply");

    assert_eq!(completion.text, "# A.tgt\n```lang2\nx\n```\n");
    assert_eq!(chunks.concat(), completion.text);
    assert!(base.messages().is_empty());

    let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(conversation.messages()[0].content, "translate A");
    assert_eq!(conversation.system(), "rules");
}

#[tokio::test]
async fn test_ask_twice_shouldCarryHistoryIntoSecondCall() {
    let engine = MockEngine::replying("ok");
    let mut sink = |_: &str| {};

    let (_, first) = ask(&engine, Conversation::new("rules"), "one", &mut sink).await.expect("first");
    let (_, second) = ask(&engine, first, "two", &mut sink).await.expect("second");

    assert_eq!(second.messages().len(), 4);
    let requests = engine.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].messages().len(), 3);
}

#[tokio::test]
async fn test_mockFailing_shouldReturnApiError() {
    let engine = MockEngine::failing("overloaded");
    let mut sink = |_: &str| {};

    let err = ask(&engine, Conversation::new("rules"), "x", &mut sink).await.unwrap_err();

    assert!(matches!(err, ProviderError::ApiError { status_code: 500, .. }));
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn test_invoke_withBrokenStream_shouldFailWithoutResult() {
    let engine = MockEngine::failing_mid_stream("# A.tgt\n```lang2\nhalf of it\n```\n");
    let invoker = TranslationInvoker::new(Arc::new(engine.clone()), "rules", std::env::temp_dir()).quiet();

    let err = invoker.invoke("context").await.unwrap_err();

    assert!(matches!(err, ProviderError::StreamError(_)));
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn test_invoke_shouldSendSystemPromptAndContext() {
    let engine = MockEngine::replying("done");
    let invoker = TranslationInvoker::new(Arc::new(engine.clone()), "rules", std::env::temp_dir()).quiet();

    let invocation = invoker.invoke("the context").await.expect("invocation");

    assert_eq!(invocation.completion.text, "done");
    let requests = engine.requests();
    let request = &requests[0];
    assert_eq!(request.system(), "rules");
    assert_eq!(request.messages()[0].content, "the context");
    assert_eq!(invocation.conversation.messages().len(), 2);
}
