/*!
 * Integration tests for session reuse and cleanup through the dispatcher
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use aisylum::builtin::{SummarizerOptions, SummaryType, TextLength};
use aisylum::session::SessionKey;
use aisylum::ChatContext;

use crate::common::Harness;

/// Test that a conversation keeps its session across prompts
#[tokio::test]
async fn test_prompt_withSameChat_shouldReuseSession() {
    let harness = Harness::available();
    harness.device.prompt.answer_with("local answer");
    let chat = ChatContext::new(42);

    assert_eq!(harness.dispatcher.prompt(&chat, "First").await.unwrap(), "local answer");
    assert_eq!(harness.dispatcher.prompt(&chat, "Second").await.unwrap(), "local answer");

    assert_eq!(harness.device.prompt.created(), 1);
    assert_eq!(harness.device.prompt.inputs(), vec!["First".to_string(), "Second".to_string()]);
    assert!(harness.sessions.chats().contains(&SessionKey::chat(42)));

    harness.dispatcher.prompt(&ChatContext::new(43), "Other chat").await.unwrap();
    assert_eq!(harness.device.prompt.created(), 2);
    assert_eq!(harness.remote.request_count(), 0);
}

/// Test that the cached session object is shared for equal keys
#[tokio::test]
async fn test_summarize_withEqualOptions_shouldShareSession() {
    let harness = Harness::available();
    let options = SummarizerOptions::new(SummaryType::Teaser, TextLength::Short);

    harness.dispatcher.summarize("One", &options).await.unwrap();
    let first = harness.sessions.summarizers().get(&options.session_key()).unwrap();
    harness.dispatcher.summarize("Two", &options).await.unwrap();
    let second = harness.sessions.summarizers().get(&options.session_key()).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(harness.device.summarizer.created(), 1);

    harness.dispatcher.summarize("Three", &SummarizerOptions::headline()).await.unwrap();
    assert_eq!(harness.device.summarizer.created(), 2);
}

/// Test that concurrent prompts of one conversation create one session
#[tokio::test]
async fn test_prompt_withConcurrentCalls_shouldCreateOnce() {
    let harness = Harness::available();
    harness.device.prompt.delay_create(30);
    let chat = ChatContext::new(5);

    let (a, b, c) = tokio::join!(
        harness.dispatcher.prompt(&chat, "a"),
        harness.dispatcher.prompt(&chat, "b"),
        harness.dispatcher.prompt(&chat, "c"),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(harness.device.prompt.created(), 1);
    assert_eq!(harness.device.prompt.operations(), 3);
}

/// Test that a failed creation is retried on the next call
#[tokio::test]
async fn test_prompt_afterFailedCreation_shouldCreateAgain() {
    let harness = Harness::available();
    let chat = ChatContext::new(9);

    harness.device.prompt.fail_create(true);
    assert_eq!(harness.dispatcher.prompt(&chat, "Hello").await.unwrap(), "[REMOTE] Hello");
    assert!(!harness.sessions.chats().contains(&SessionKey::chat(9)));

    harness.device.prompt.fail_create(false);
    harness.device.prompt.answer_with("local");
    assert_eq!(harness.dispatcher.prompt(&chat, "Hello").await.unwrap(), "local");
    assert_eq!(harness.device.prompt.created(), 1);
    assert_eq!(harness.remote.request_count(), 1);
}

/// Test ending a conversation, including one without a session
#[tokio::test]
async fn test_end_chat_shouldDestroyOnlyExistingSession() {
    let harness = Harness::available();
    harness.dispatcher.prompt(&ChatContext::new(1), "Hello").await.unwrap();

    assert!(!harness.dispatcher.end_chat(2));
    assert_eq!(harness.device.prompt.destroyed(), 0);

    assert!(harness.dispatcher.end_chat(1));
    assert_eq!(harness.device.prompt.destroyed(), 1);

    harness.dispatcher.prompt(&ChatContext::new(1), "Hello again").await.unwrap();
    assert_eq!(harness.device.prompt.created(), 2);
}

/// Test that dispose destroys every cached session
#[tokio::test]
async fn test_dispose_shouldDestroyCachedSessions() {
    let harness = Harness::available();
    harness.device.detector.detect_as(&[("es", 0.9)]);

    harness.dispatcher.prompt(&ChatContext::new(1), "Hello").await.unwrap();
    harness.dispatcher.summarize("Text", &SummarizerOptions::default()).await.unwrap();
    harness.dispatcher.translate("Hola", "en").await.unwrap();

    // chat, summarizer, detector and translator
    assert_eq!(harness.sessions.live_sessions(), 4);
    assert_eq!(harness.dispatcher.dispose(), 4);
    assert_eq!(harness.sessions.live_sessions(), 0);

    let destroyed: usize = [
        &harness.device.prompt,
        &harness.device.summarizer,
        &harness.device.detector,
        &harness.device.translator,
    ]
    .iter()
    .map(|script| script.destroyed())
    .sum();
    assert_eq!(destroyed, 4);
}

/// Test that session factories receive the download monitor
#[tokio::test]
async fn test_download_monitor_shouldReceiveProgress() {
    let harness = Harness::available();
    let reports = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reports);
    harness
        .sessions
        .set_download_monitor(Some(Arc::new(move |_progress: f64| {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

    harness.dispatcher.prompt(&ChatContext::new(1), "Hello").await.unwrap();
    assert_eq!(reports.load(Ordering::SeqCst), 1);

    // Reused sessions do not download again
    harness.dispatcher.prompt(&ChatContext::new(1), "Hello").await.unwrap();
    assert_eq!(reports.load(Ordering::SeqCst), 1);
}
