/*!
 * Integration tests for detection-driven translation and language detection
 */

use std::sync::{Arc, Mutex};

use aisylum::capability::AvailabilityState;
use aisylum::dispatch::DEFAULT_DETECTION_RESULTS;
use aisylum::providers::mock::{MockRemote, RemoteCall};

use crate::common::Harness;
use crate::common::mock_device::FakeDevice;

/// Test that the detected source language selects the local translator
#[tokio::test]
async fn test_translate_withDetectedSpanish_shouldUseLocalTranslator() {
    let harness = Harness::available();
    harness.device.detector.detect_as(&[("es", 0.92), ("pt", 0.05)]);
    harness.device.translator.answer_with("Where is the library?");

    let translation = harness.dispatcher.translate("¿Dónde está la biblioteca?", "en").await.unwrap();

    assert_eq!(translation.text, "Where is the library?");
    assert_eq!(translation.source_language.as_deref(), Some("es"));
    assert_eq!(harness.device.translator.configs(), vec!["es-en".to_string()]);
    assert_eq!(harness.remote.request_count(), 0);
}

/// Test that without detection the remote proxy infers the source
#[tokio::test]
async fn test_translate_withDetectorUnavailable_shouldCallRemoteWithoutSource() {
    let harness = Harness::available();
    harness.device.detector.set_state(AvailabilityState::Unavailable);

    let translation = harness.dispatcher.translate("Hola", "en").await.unwrap();

    assert_eq!(translation.text, "[TRANSLATED to en] Hola");
    assert_eq!(translation.source_language, None);
    assert_eq!(harness.device.translator.created(), 0);
    assert_eq!(
        harness.remote.last_call(),
        Some(RemoteCall::Translate {
            text: "Hola".to_string(),
            source_language: None,
            target_language: "en".to_string(),
        })
    );
    // Detection never goes remote on the translation path
    assert_eq!(harness.remote.request_count(), 1);
}

/// Test that an empty detection result leaves the source unknown
#[tokio::test]
async fn test_translate_withNoDetectionCandidates_shouldFallBack() {
    let harness = Harness::available();

    let translation = harness.dispatcher.translate("???", "fr").await.unwrap();

    assert_eq!(translation.source_language, None);
    assert_eq!(translation.text, "[TRANSLATED to fr] ???");
    assert_eq!(harness.device.translator.created(), 0);
}

/// Test that a known source still goes remote without it when the pair is unavailable
#[tokio::test]
async fn test_translate_withPairUnavailable_shouldOmitSourceRemotely() {
    let harness = Harness::available();
    harness.device.detector.detect_as(&[("ja", 0.99)]);
    harness.device.translator.set_state(AvailabilityState::Downloadable);

    let translation = harness.dispatcher.translate("こんにちは", "en").await.unwrap();

    assert_eq!(translation.source_language.as_deref(), Some("ja"));
    assert_eq!(translation.text, "[TRANSLATED to en] こんにちは");
    assert!(matches!(
        harness.remote.last_call(),
        Some(RemoteCall::Translate { source_language: None, .. })
    ));
}

/// Test that a cached translator reports a complete download immediately
#[tokio::test]
async fn test_translate_withCachedTranslator_shouldReportFullProgress() {
    let harness = Harness::available();
    harness.device.detector.detect_as(&[("es", 0.9)]);
    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    harness
        .sessions
        .set_download_monitor(Some(Arc::new(move |progress: f64| sink.lock().unwrap().push(progress))));

    harness.dispatcher.translate("Hola", "en").await.unwrap();
    // Detector and translator creation
    assert_eq!(reports.lock().unwrap().len(), 2);

    harness.dispatcher.translate("Adiós", "en").await.unwrap();
    let reports = reports.lock().unwrap().clone();
    assert_eq!(reports, vec![1.0, 1.0, 1.0]);
    assert_eq!(harness.device.translator.created(), 1);
}

/// Test local language detection results
#[tokio::test]
async fn test_detect_language_withLocalDetector_shouldReturnCandidates() {
    let harness = Harness::available();
    harness.device.detector.detect_as(&[("fr", 0.8), ("it", 0.1)]);

    let detections = harness.dispatcher.detect_language("Bonjour tout le monde", 3).await.unwrap();

    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].detected_language, "fr");
    assert_eq!(harness.remote.request_count(), 0);
}

/// Test that the remote language name is converted to a code
#[tokio::test]
async fn test_detect_language_withRemote_shouldNormalizeName() {
    let harness = Harness::new(
        FakeDevice::with_state(AvailabilityState::Unavailable),
        MockRemote::working().detecting("Spanish"),
    );

    let detections = harness.dispatcher.detect_language("Hola", 3).await.unwrap();

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].detected_language, "es");
    assert_eq!(detections[0].confidence, 1.0);
}

/// Test that an unrecognized remote language name is kept as is
#[tokio::test]
async fn test_detect_language_withUnknownRemoteName_shouldKeepName() {
    let harness = Harness::new(
        FakeDevice::with_state(AvailabilityState::Unavailable),
        MockRemote::working().detecting("Elvish"),
    );

    let detections = harness.dispatcher.detect_language("Mae govannen", 3).await.unwrap();

    assert_eq!(detections[0].detected_language, "Elvish");
}

/// Test that clear rewriting asks for the detected language
#[tokio::test]
async fn test_rewrite_clearly_shouldUseDetectedLanguage() {
    let harness = Harness::available();
    harness.device.detector.detect_as(&[("de", 0.95)]);
    harness.device.rewriter.set_state(AvailabilityState::Unavailable);

    harness.dispatcher.rewrite_clearly("Das ist ein Test").await.unwrap();

    match harness.remote.last_call() {
        Some(RemoteCall::Rewrite { text, options }) => {
            assert_eq!(text, "Das ist ein Test");
            assert_eq!(options.language.as_deref(), Some("de"));
        }
        other => panic!("Expected a rewrite call, got {:?}", other),
    }
}

/// Test that local candidates are ranked and cut to the requested count
#[tokio::test]
async fn test_detect_language_withManyCandidates_shouldKeepTopResults() {
    let harness = Harness::available();
    harness
        .device
        .detector
        .detect_as(&[("it", 0.05), ("es", 0.7), ("pt", 0.2), ("gl", 0.04), ("ca", 0.01)]);

    let detections = harness
        .dispatcher
        .detect_language("Hola amigos", DEFAULT_DETECTION_RESULTS)
        .await
        .unwrap();

    let languages: Vec<&str> = detections.iter().map(|d| d.detected_language.as_str()).collect();
    assert_eq!(languages, vec!["es", "pt", "it"]);

    let single = harness.dispatcher.detect_language("Hola amigos", 1).await.unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].detected_language, "es");
}

/// Test that text already in the target language is returned unchanged
#[tokio::test]
async fn test_translate_withSourceMatchingTarget_shouldReturnTextUnchanged() {
    let harness = Harness::available();
    harness.device.detector.detect_as(&[("de", 0.97)]);

    // ISO 639-2 target naming the detected language
    let translation = harness.dispatcher.translate("Guten Morgen", "deu").await.unwrap();

    assert_eq!(translation.text, "Guten Morgen");
    assert_eq!(translation.source_language.as_deref(), Some("de"));
    assert_eq!(harness.device.translator.created(), 0);
    assert_eq!(harness.remote.request_count(), 0);
}
