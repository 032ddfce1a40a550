//! Tests for forgeclaw-llm: ChatMessage conversion and StubProvider

use forgeclaw_core::Message;
use forgeclaw_llm::{ChatMessage, LlmProvider, StubProvider};
use futures::StreamExt;

#[test]
fn chat_message_from_core_message_maps_roles() {
    let m = Message::system("sp");
    let cm = ChatMessage::from(&m);
    assert_eq!(cm.role, "system");
    assert_eq!(cm.content, "sp");

    assert_eq!(ChatMessage::from(&Message::user("hi")).role, "user");
    assert_eq!(ChatMessage::from(&Message::assistant("ok")).role, "assistant");
}

#[tokio::test]
async fn stub_provider_returns_scripted_completion() {
    let provider = StubProvider::new(["hello", "second"]);
    let history = vec![Message::system("sp"), Message::user("hi")];
    let first = provider.complete(&history, "any-model", 0.7).await.unwrap();
    assert_eq!(first, "hello");
    let second = provider.complete(&history, "any-model", 0.7).await.unwrap();
    assert_eq!(second, "second");
}

#[tokio::test]
#[should_panic(expected = "scripted responses exhausted")]
async fn stub_provider_panics_when_exhausted() {
    let provider = StubProvider::new(Vec::<String>::new());
    let history = vec![Message::system("sp")];
    let _ = provider.complete(&history, "m", 0.0).await;
}

#[tokio::test]
async fn stub_provider_streams_text_then_done() {
    let provider = StubProvider::new(["streamed text"]);
    let history = vec![Message::system("sp")];
    let mut stream = provider.complete_stream(&history, "m", 0.0, None).await.unwrap();

    let first = stream.next().await.unwrap().unwrap();
    match first {
        forgeclaw_llm::StreamDelta::Text(t) => assert_eq!(t, "streamed text"),
        _ => panic!("expected text delta"),
    }
    let second = stream.next().await.unwrap().unwrap();
    assert!(matches!(second, forgeclaw_llm::StreamDelta::Done));
}
