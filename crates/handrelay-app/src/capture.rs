//! 캡처 어댑터.
//!
//! 랜드마크 소스에서 영상 프레임마다 샘플을 읽어
//! 손이 검출되면 `hand_landmarks`로 릴레이에 스트리밍한다.
//!
//! - 실행마다 새 세션 ID (UUID v4)
//! - 릴레이 접속 실패: 경고 후 스트리밍 없이 계속 실행
//! - 소스 읽기 실패: 재시도 없이 루프 종료

use async_trait::async_trait;
use handrelay_core::config::CaptureConfig;
use handrelay_core::error::CoreError;
use handrelay_core::models::landmark::{
    Frame, HandJoint, Landmark, HAND_CONNECTIONS, LANDMARKS_PER_FRAME,
};
use handrelay_core::ports::landmark_source::LandmarkSource;
use handrelay_network::relay_client::{RelayClient, RelayEvent};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// ============================================================
// 합성 손 소스
// ============================================================

/// 손목이 원을 그리며 움직이는 21관절 합성 손
///
/// 카메라/포즈 추정 모델 없이 파이프라인을 구동하기 위한 기본 소스.
/// 카메라 인덱스는 원 위의 시작 위상으로 쓰인다.
pub struct SyntheticHandSource {
    camera_index: u32,
    tick: u64,
    /// n번째 샘플마다 손 미검출
    dropout_every: Option<u64>,
}

/// 손목 궤적 중심
const ORBIT_CENTER: (f64, f64) = (0.5, 0.55);
/// 손목 궤적 반지름
const ORBIT_RADIUS: f64 = 0.15;
/// 한 바퀴에 걸리는 샘플 수
const SAMPLES_PER_ORBIT: f64 = 120.0;
/// 손가락 마디 길이
const BONE_LENGTH: f64 = 0.035;
/// 손가락 사이 벌어진 각도 (라디안)
const FINGER_SPREAD: f64 = 0.3;

impl SyntheticHandSource {
    pub fn new(camera_index: u32) -> Self {
        Self {
            camera_index,
            tick: 0,
            dropout_every: None,
        }
    }

    /// `every`번째 샘플마다 손이 화면 밖으로 나간 것처럼 `None` 반환
    pub fn with_dropout(mut self, every: u64) -> Self {
        self.dropout_every = (every > 0).then_some(every);
        self
    }

    /// 샘플 번호 `tick`의 손 포즈
    pub fn pose_at(&self, tick: u64) -> Frame {
        let phase = f64::from(self.camera_index) * FRAC_PI_4;
        let angle = phase + TAU * (tick as f64 / SAMPLES_PER_ORBIT);
        let wrist = (
            ORBIT_CENTER.0 + ORBIT_RADIUS * angle.cos(),
            ORBIT_CENTER.1 + ORBIT_RADIUS * angle.sin(),
        );

        let mut joints = [None::<Landmark>; LANDMARKS_PER_FRAME];
        joints[HandJoint::Wrist.index()] = Some(Landmark::new(wrist.0, wrist.1, 0.0));

        // 손목에서 골격 연결선을 따라 바깥쪽 관절 배치, 손바닥 가로선은 건너뜀
        for &(parent, child) in HAND_CONNECTIONS {
            let (Some(from), None) = (joints[parent], joints[child]) else {
                continue;
            };
            // 1..=4 엄지, 5..=8 검지, ... 17..=20 새끼
            let finger = (child - 1) / 4;
            let direction = FRAC_PI_2 + (finger as f64 - 2.0) * FINGER_SPREAD;
            joints[child] = Some(Landmark::new(
                clamp_unit(from.x + BONE_LENGTH * direction.cos()),
                clamp_unit(from.y - BONE_LENGTH * direction.sin()),
                from.z - 0.01,
            ));
        }

        joints.into_iter().flatten().collect::<Vec<_>>().into()
    }
}

fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[async_trait]
impl LandmarkSource for SyntheticHandSource {
    async fn next_sample(&mut self) -> Result<Option<Frame>, CoreError> {
        let tick = self.tick;
        self.tick += 1;

        if let Some(every) = self.dropout_every {
            if (tick + 1) % every == 0 {
                return Ok(None);
            }
        }
        Ok(Some(self.pose_at(tick)))
    }

    fn describe(&self) -> String {
        format!("합성 손 (카메라 {})", self.camera_index)
    }
}

// ============================================================
// 캡처 루프
// ============================================================

/// 캡처 루프 종료 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// 종료 신호
    Shutdown,
    /// 소스 읽기 실패
    SourceFailed(String),
    /// `max_frames` 도달
    FrameLimit,
}

/// 캡처 실행 결과
#[derive(Debug, Clone)]
pub struct CaptureReport {
    /// 이번 실행의 세션 ID
    pub session_id: String,
    /// 처리한 영상 프레임 수
    pub samples: u64,
    /// 손이 검출된 프레임 수
    pub hands_detected: u64,
    /// 릴레이로 전송한 업데이트 수
    pub sent: u64,
    /// 시작 시 릴레이 접속 성공 여부
    pub connected: bool,
    pub stop_reason: StopReason,
}

/// 캡처 루프 실행
///
/// # Arguments
/// * `source` - 랜드마크 소스
/// * `config` - 릴레이 URL, 프레임 간격, 최대 프레임 수
/// * `shutdown_rx` - 종료 신호 수신 채널
pub async fn run_capture<S>(
    source: &mut S,
    config: &CaptureConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> CaptureReport
where
    S: LandmarkSource + ?Sized,
{
    let session_id = Uuid::new_v4().to_string();
    info!(
        "캡처 시작: 세션 {session_id}, 소스 {}, 릴레이 {}",
        source.describe(),
        config.server_url
    );

    let mut client = connect_relay(&config.server_url).await;
    let mut report = CaptureReport {
        session_id,
        samples: 0,
        hands_detected: 0,
        sent: 0,
        connected: client.is_some(),
        stop_reason: StopReason::Shutdown,
    };

    let mut ticker = tokio::time::interval(config.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if *shutdown_rx.borrow() {
            report.stop_reason = StopReason::Shutdown;
            break;
        }
        if config.max_frames.is_some_and(|max| report.samples >= max) {
            report.stop_reason = StopReason::FrameLimit;
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    report.stop_reason = StopReason::Shutdown;
                    break;
                }
                continue;
            }
        }

        let sample = source.next_sample().await;
        report.samples += 1;

        match sample {
            Ok(Some(frame)) => {
                report.hands_detected += 1;
                if let Some(bbox) = frame.bounding_box() {
                    debug!(
                        "프레임 {}: 손 영역 ({:.3}, {:.3})-({:.3}, {:.3})",
                        report.samples, bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
                    );
                }
                let Some(relay) = client.as_ref() else {
                    continue;
                };
                let result = relay.send_landmarks(&report.session_id, &frame).await;
                match result {
                    Ok(()) => report.sent += 1,
                    Err(e) => {
                        // 재연결하지 않는다
                        warn!("랜드마크 전송 실패, 스트리밍 중단: {e}");
                        client = None;
                    }
                }
            }
            Ok(None) => debug!("프레임 {}: 손 미검출", report.samples),
            Err(e) => {
                error!("소스 읽기 실패: {e}");
                report.stop_reason = StopReason::SourceFailed(e.to_string());
                break;
            }
        }
    }

    if let Some(relay) = client {
        if let Err(e) = relay.close().await {
            debug!("릴레이 연결 종료 실패: {e}");
        }
    }

    info!(
        "캡처 종료 ({:?}): 프레임 {}, 손 검출 {}, 전송 {}",
        report.stop_reason, report.samples, report.hands_detected, report.sent
    );
    report
}

/// 릴레이 접속. 실패는 한 번 경고하고 `None`.
async fn connect_relay(url: &str) -> Option<RelayClient> {
    match RelayClient::connect(url).await {
        Ok((client, mut events)) => {
            // 수신 이벤트는 로그만 남기고 버린다
            tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    match event {
                        RelayEvent::Message(msg) => debug!("릴레이 이벤트: {}", msg.event_name()),
                        RelayEvent::Unrecognized(text) => debug!("알 수 없는 릴레이 이벤트: {text}"),
                    }
                }
            });
            Some(client)
        }
        Err(e) => {
            warn!("릴레이 접속 실패, 스트리밍 없이 계속: {e}");
            None
        }
    }
}
