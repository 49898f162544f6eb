use std::sync::Arc;

use crate::config::CategoryConfig;
use crate::core::classifier::{FnClassifier, InputShape};
use crate::core::error::RecognitionError;
use crate::core::preprocess::LandmarkInput;

use super::{FrameOutcome, Recognizer};

fn labels() -> Vec<String> {
    vec!["a".to_string(), "b".to_string(), "c".to_string()]
}

fn letters(cooldown_frames: u32) -> CategoryConfig {
    CategoryConfig {
        cooldown_frames,
        ..CategoryConfig::preset("letters").unwrap()
    }
}

fn letters_recognizer(cooldown_frames: u32, confidence: f32) -> Recognizer {
    let classifier = FnClassifier::index_encoded(InputShape::single(126), labels(), confidence);
    Recognizer::with_classifier(letters(cooldown_frames), Arc::new(classifier), None).unwrap()
}

/// A two-hand frame whose first value encodes the label index.
fn frame(index: usize) -> LandmarkInput {
    let mut values = vec![0.5; 126];
    values[0] = index as f32;
    LandmarkInput::Frame(values)
}

#[tokio::test]
async fn test_labels_are_canonicalized() {
    let recognizer = letters_recognizer(0, 0.9);
    assert_eq!(recognizer.labels(), &["A", "B", "C"]);

    let info = recognizer.info();
    assert_eq!(info.input_width, 126);
    assert_eq!(info.classes, 3);
    assert_eq!(info.adapter, "exact");
    assert_eq!(info.backend, "function");
    assert!(info.model_loaded);
}

#[tokio::test]
async fn test_dominant_hand_adapter_for_single_hand_model() {
    let classifier = FnClassifier::index_encoded(InputShape::single(63), labels(), 0.9);
    let recognizer =
        Recognizer::with_classifier(letters(0), Arc::new(classifier), None).unwrap();
    assert_eq!(recognizer.info().adapter, "dominant_hand");
    assert_eq!(recognizer.info().model_input_width, 63);
}

#[test]
fn test_incompatible_width_is_unavailable() {
    let classifier = FnClassifier::index_encoded(InputShape::single(60), labels(), 0.9);
    let err = Recognizer::with_classifier(letters(0), Arc::new(classifier), None)
        .err()
        .unwrap();
    assert!(matches!(err, RecognitionError::ClassifierUnavailable(_)));
}

#[test]
fn test_sequence_model_for_static_category_is_unavailable() {
    let classifier = FnClassifier::index_encoded(InputShape::sequence(30, 126), labels(), 0.9);
    let err = Recognizer::with_classifier(letters(0), Arc::new(classifier), None)
        .err()
        .unwrap();
    assert!(err.to_string().contains("static category"));
}

#[tokio::test]
async fn test_process_confirms_target() {
    let recognizer = letters_recognizer(0, 0.95);
    let mut session = recognizer.new_session();
    let config = recognizer.config();
    let bound = config.min_consistent + config.stability.window_size;

    let mut confirmed_at = None;
    for i in 0..bound {
        let outcome = recognizer
            .process(&mut session, frame(1), Some("b"))
            .await
            .unwrap();
        if let FrameOutcome::Decided { decision, raw } = &outcome {
            assert_eq!(raw.label, "B");
            assert_eq!(raw.probabilities.len(), 3);
            if decision.confirmed && confirmed_at.is_none() {
                confirmed_at = Some(i);
            }
        }
    }
    assert!(confirmed_at.is_some_and(|i| i < bound));
}

#[tokio::test]
async fn test_process_first_frames_unstable() {
    let recognizer = letters_recognizer(0, 0.95);
    let mut session = recognizer.new_session();
    for _ in 0..4 {
        let outcome = recognizer.process(&mut session, frame(0), None).await.unwrap();
        assert_eq!(outcome, FrameOutcome::Unstable);
    }
    let outcome = recognizer.process(&mut session, frame(0), None).await.unwrap();
    assert!(matches!(outcome, FrameOutcome::BuildingHistory { .. }));
}

#[tokio::test]
async fn test_process_no_detection_leaves_state_untouched() {
    let recognizer = letters_recognizer(0, 0.95);
    let mut session = recognizer.new_session();

    let outcome = recognizer
        .process(&mut session, LandmarkInput::Frame(vec![0.0; 126]), Some("c"))
        .await
        .unwrap();
    assert!(matches!(outcome, FrameOutcome::NoDetection { .. }));
    assert_eq!(outcome.status(), "no_detection");
    assert_eq!(session.last_target(), None);
}

#[tokio::test]
async fn test_process_invalid_shape() {
    let recognizer = letters_recognizer(0, 0.95);
    let mut session = recognizer.new_session();

    let err = recognizer
        .process(&mut session, LandmarkInput::Frame(vec![1.0; 64]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RecognitionError::InvalidInputShape(_)));
}

#[tokio::test]
async fn test_process_cooldown_after_detection() {
    let recognizer = letters_recognizer(3, 0.95);
    let mut session = recognizer.new_session();

    let mut outcomes = Vec::new();
    for _ in 0..9 {
        outcomes.push(recognizer.process(&mut session, frame(2), None).await.unwrap());
    }
    let first_decided = outcomes
        .iter()
        .position(|o| matches!(o, FrameOutcome::Decided { .. }))
        .expect("should decide");
    assert_eq!(
        outcomes[first_decided + 1],
        FrameOutcome::Cooldown { remaining: 2 }
    );
}

#[tokio::test]
async fn test_predict_once() {
    let recognizer = letters_recognizer(0, 0.95);
    let prediction = recognizer.predict_once(frame(2)).await.unwrap();
    assert_eq!(prediction.label, "C");
    assert!((prediction.confidence - 0.95).abs() < 1e-6);
}

#[tokio::test]
async fn test_predict_once_below_threshold() {
    let recognizer = letters_recognizer(0, 0.5);
    let err = recognizer.predict_once(frame(0)).await.unwrap_err();
    match err {
        RecognitionError::BelowConfidenceThreshold { label, confidence } => {
            assert_eq!(label, "A");
            assert!((confidence - 0.5).abs() < 1e-6);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_sequence_category_pads_short_sequences() {
    let config = CategoryConfig {
        frame_width: 6,
        ..CategoryConfig::preset("words").unwrap()
    };
    let classifier = FnClassifier::new(InputShape::sequence(30, 6), labels(), |input| {
        assert_eq!(input.len(), 180);
        vec![0.1, 0.1, 0.8]
    });
    let recognizer = Recognizer::with_classifier(config, Arc::new(classifier), None).unwrap();
    assert_eq!(recognizer.sequence_length(), Some(30));
    assert_eq!(recognizer.labels(), &["A", "B", "C"]);

    let sequence = LandmarkInput::Sequence(vec![vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; 12]);
    let prediction = recognizer.predict_once(sequence.clone()).await.unwrap();
    assert_eq!(prediction.label, "C");

    // stability gating is off for sequence categories
    let mut session = recognizer.new_session();
    let outcome = recognizer.process(&mut session, sequence, None).await.unwrap();
    assert!(matches!(outcome, FrameOutcome::BuildingHistory { .. }));
}

#[tokio::test]
async fn test_process_low_confidence_reports_below_threshold() {
    // letters votes only above 0.7
    let recognizer = letters_recognizer(0, 0.5);
    let mut session = recognizer.new_session();

    for _ in 0..4 {
        let outcome = recognizer.process(&mut session, frame(1), None).await.unwrap();
        assert_eq!(outcome, FrameOutcome::Unstable);
    }
    for _ in 0..6 {
        let outcome = recognizer.process(&mut session, frame(1), None).await.unwrap();
        assert_eq!(outcome.status(), "below_threshold");
        match outcome {
            FrameOutcome::BelowThreshold { raw } => {
                assert_eq!(raw.label, "B");
                assert!((raw.confidence - 0.5).abs() < 1e-6);
                assert_eq!(raw.probabilities.len(), 3);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(session.history_len(), 0);
}

#[tokio::test]
async fn test_process_above_floor_still_builds_history() {
    let recognizer = letters_recognizer(0, 0.95);
    let mut session = recognizer.new_session();
    for _ in 0..4 {
        recognizer.process(&mut session, frame(1), None).await.unwrap();
    }
    let outcome = recognizer.process(&mut session, frame(1), None).await.unwrap();
    assert_eq!(outcome.status(), "building_history");
}

#[tokio::test]
async fn test_process_missing_coordinate_keeps_hand_stable() {
    let recognizer = letters_recognizer(0, 0.95);
    let mut session = recognizer.new_session();
    for _ in 0..5 {
        recognizer.process(&mut session, frame(1), None).await.unwrap();
    }

    let mut values = vec![0.5; 126];
    values[0] = 1.0;
    values[10] = f32::NAN;
    let outcome = recognizer
        .process(&mut session, LandmarkInput::Frame(values), None)
        .await
        .unwrap();
    assert_ne!(outcome, FrameOutcome::Unstable);

    for _ in 0..4 {
        let outcome = recognizer.process(&mut session, frame(1), None).await.unwrap();
        assert_ne!(outcome, FrameOutcome::Unstable);
    }
}
