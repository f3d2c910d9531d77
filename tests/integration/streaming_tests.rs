/*!
 * Integration tests for streamed prompts
 */

use futures::StreamExt;

use aisylum::capability::AvailabilityState;
use aisylum::errors::AiError;
use aisylum::providers::mock::MockRemote;
use aisylum::ChatContext;

use crate::common::Harness;
use crate::common::mock_device::FakeDevice;

/// Test that cumulative on-device snapshots arrive as increments
#[tokio::test]
async fn test_prompt_streaming_withLocalSnapshots_shouldYieldDeltas() {
    let harness = Harness::available();
    harness
        .device
        .prompt
        .stream_snapshots(&["Once", "Once upon", "Once upon", "Once upon a time"]);

    let stream = harness
        .dispatcher
        .prompt_streaming(&ChatContext::new(1), "Tell me a story")
        .await
        .unwrap();
    let chunks: Vec<String> = stream.map(|chunk| chunk.unwrap()).collect().await;

    assert_eq!(chunks, vec!["Once", " upon", " a time"]);
    assert_eq!(chunks.concat(), "Once upon a time");
    assert_eq!(harness.remote.request_count(), 0);
}

/// Test that the remote answer arrives as one chunk
#[tokio::test]
async fn test_prompt_streaming_withRemote_shouldYieldSingleChunk() {
    let harness = Harness::new(
        FakeDevice::with_state(AvailabilityState::Downloading),
        MockRemote::working(),
    );

    let stream = harness
        .dispatcher
        .prompt_streaming(&ChatContext::new(1), "Hello")
        .await
        .unwrap();
    let chunks: Vec<Result<String, AiError>> = stream.collect().await;

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].as_ref().unwrap(), "[REMOTE] Hello");
}

/// Test that a stream breaking off after it started ends with an error
#[tokio::test]
async fn test_prompt_streaming_withBrokenStream_shouldEndWithInterruption() {
    let harness = Harness::available();
    harness.device.prompt.stream_snapshots(&["Partial", "Partial answer"]);
    harness.device.prompt.fail_stream();

    let stream = harness
        .dispatcher
        .prompt_streaming(&ChatContext::new(1), "Hello")
        .await
        .unwrap();
    let chunks: Vec<Result<String, AiError>> = stream.collect().await;

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[1].as_ref().unwrap(), " answer");
    assert!(matches!(chunks[2], Err(AiError::StreamInterrupted(_))));
    // Started streams are not replayed remotely
    assert_eq!(harness.remote.request_count(), 0);
}

/// Test that a stream that cannot start falls back
#[tokio::test]
async fn test_prompt_streaming_withFailingStart_shouldFallBack() {
    let harness = Harness::available();
    harness.device.prompt.fail_operation(true);

    let stream = harness
        .dispatcher
        .prompt_streaming(&ChatContext::new(1), "Hello")
        .await
        .unwrap();
    let chunks: Vec<String> = stream.map(|chunk| chunk.unwrap()).collect().await;

    assert_eq!(chunks, vec!["[REMOTE] Hello"]);
    assert_eq!(harness.remote.request_count(), 1);
}
