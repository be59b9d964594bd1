//! 캡처 → 릴레이 → 관찰 흐름 통합 테스트


use async_trait::async_trait;
use handrelay_app::capture::{run_capture, StopReason, SyntheticHandSource};
use handrelay_app::observer::run_observer;
use handrelay_core::config::{CaptureConfig, ObserverConfig};
use handrelay_core::error::CoreError;
use handrelay_core::models::landmark::Frame;
use handrelay_core::ports::landmark_source::LandmarkSource;
use handrelay_core::protocol::ServerMessage;
use std::collections::VecDeque;
use std::time::Duration;
use test_relay::{next_message, numbered_frame, TestRelay};
use tokio::sync::watch;

/// 미리 정한 샘플을 순서대로 내놓는 소스. 소진되면 읽기 실패.
struct ScriptedSource {
    samples: VecDeque<Option<Frame>>,
}

impl ScriptedSource {
    fn new(samples: Vec<Option<Frame>>) -> Self {
        Self {
            samples: samples.into(),
        }
    }
}

#[async_trait]
impl LandmarkSource for ScriptedSource {
    async fn next_sample(&mut self) -> Result<Option<Frame>, CoreError> {
        self.samples
            .pop_front()
            .ok_or_else(|| CoreError::Source("카메라 프레임 읽기 실패".to_string()))
    }

    fn describe(&self) -> String {
        "스크립트 소스".to_string()
    }
}

fn capture_config(relay: &TestRelay) -> CaptureConfig {
    CaptureConfig {
        server_url: relay.ws_url(),
        frame_interval_ms: 1,
        ..CaptureConfig::default()
    }
}

#[tokio::test]
async fn detected_hands_are_streamed_until_source_fails() {
    let relay = TestRelay::start().await;
    let (observer, mut observer_events) = relay.connect().await;

    let mut source = ScriptedSource::new(vec![
        Some(numbered_frame(1)),
        None,
        Some(numbered_frame(2)),
    ]);
    let (_tx, rx) = watch::channel(false);
    let report = run_capture(&mut source, &capture_config(&relay), rx).await;

    assert!(report.connected);
    assert_eq!(report.samples, 4);
    assert_eq!(report.hands_detected, 2);
    assert_eq!(report.sent, 2);
    assert!(matches!(report.stop_reason, StopReason::SourceFailed(_)));

    assert_eq!(
        next_message(&mut observer_events).await,
        ServerMessage::landmarks_received(report.session_id.clone(), 1)
    );
    assert_eq!(
        next_message(&mut observer_events).await,
        ServerMessage::landmarks_received(report.session_id.clone(), 2)
    );

    observer.request_history(&report.session_id).await.unwrap();
    let ServerMessage::HandData(history) = next_message(&mut observer_events).await else {
        panic!("hand_data 응답이어야 함");
    };
    assert_eq!(history.data, vec![numbered_frame(1), numbered_frame(2)]);
}

#[tokio::test]
async fn synthetic_capture_stops_at_frame_limit() {
    let relay = TestRelay::start().await;
    let (_observer, mut observer_events) = relay.connect().await;

    let config = CaptureConfig {
        max_frames: Some(3),
        ..capture_config(&relay)
    };
    let (_tx, rx) = watch::channel(false);
    let report = run_capture(&mut SyntheticHandSource::new(0), &config, rx).await;

    assert_eq!(report.stop_reason, StopReason::FrameLimit);
    assert_eq!(report.sent, 3);
    for n in 1..=3 {
        let ServerMessage::LandmarksReceived(ack) = next_message(&mut observer_events).await else {
            panic!("landmarks_received여야 함");
        };
        assert_eq!(ack.hand_id, report.session_id);
        assert_eq!(ack.frames_stored, n);
    }
}

#[tokio::test]
async fn capture_stops_on_shutdown_signal() {
    let relay = TestRelay::start().await;
    let config = CaptureConfig {
        frame_interval_ms: 5,
        ..capture_config(&relay)
    };
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut source = SyntheticHandSource::new(1);
        run_capture(&mut source, &config, rx).await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(true).unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("종료 신호 후 캡처가 멈춰야 함")
        .unwrap();
    assert_eq!(report.stop_reason, StopReason::Shutdown);
    assert!(report.samples > 0);
}

#[tokio::test]
async fn observer_polls_history_of_latest_hand() {
    let relay = TestRelay::start().await;
    let config = ObserverConfig {
        server_url: relay.ws_url(),
        poll_interval_ms: 20,
    };
    let (tx, rx) = watch::channel(false);
    let observer = tokio::spawn(async move { run_observer(&config, rx).await });

    // 관찰자 접속 후 업데이트 전송
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (sender, mut sender_events) = relay.connect().await;
    sender.send_landmarks("abc", &numbered_frame(1)).await.unwrap();
    assert_eq!(
        next_message(&mut sender_events).await,
        ServerMessage::landmarks_received("abc", 1)
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    tx.send(true).unwrap();
    let report = tokio::time::timeout(Duration::from_secs(5), observer)
        .await
        .expect("종료 신호 후 관찰자가 멈춰야 함")
        .unwrap();

    assert!(report.connected);
    assert_eq!(report.landmarks_events, 1);
    assert_eq!(report.latest_hand_id.as_deref(), Some("abc"));
    assert!(report.hand_data_replies >= 1);
    assert_eq!(report.last_history_len, Some(1));
}
