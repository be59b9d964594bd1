//! 관찰 클라이언트.
//!
//! 릴레이에 접속해 브로드캐스트 요약을 기록하고, 마지막으로 본 손 세션의
//! 이력을 주기적으로 조회한다.

use handrelay_core::config::ObserverConfig;
use handrelay_core::models::landmark::HandJoint;
use handrelay_core::protocol::ServerMessage;
use handrelay_network::relay_client::{RelayClient, RelayEvent};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// 관찰 실행 결과
#[derive(Debug, Clone, Default)]
pub struct ObserverReport {
    /// 릴레이 접속 성공 여부
    pub connected: bool,
    /// 수신한 `landmarks_received` 수
    pub landmarks_events: u64,
    /// 수신한 `hand_data` 응답 수
    pub hand_data_replies: u64,
    /// 마지막으로 수신한 `hand_data`의 프레임 수
    pub last_history_len: Option<usize>,
    /// 마지막으로 본 손 세션 ID
    pub latest_hand_id: Option<String>,
}

/// 관찰 루프 실행
///
/// 접속 실패는 경고만 남기고 빈 결과를 반환한다.
/// 종료 신호 또는 릴레이 연결 종료 시 반환.
pub async fn run_observer(
    config: &ObserverConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> ObserverReport {
    let mut report = ObserverReport::default();

    info!("관찰 클라이언트 접속: {}", config.server_url);
    let (client, mut events) = match RelayClient::connect(&config.server_url).await {
        Ok(pair) => pair,
        Err(e) => {
            warn!("릴레이 접속 실패: {e}");
            return report;
        }
    };
    report.connected = true;

    let mut ticker = tokio::time::interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            event = events.next() => {
                let Some(event) = event else {
                    info!("릴레이 연결 종료");
                    break;
                };
                handle_event(event, &mut report);
            }
            _ = ticker.tick() => {
                match report.latest_hand_id.as_deref() {
                    Some(hand_id) => {
                        debug!("이력 요청: {hand_id}");
                        if let Err(e) = client.request_history(hand_id).await {
                            warn!("이력 요청 실패: {e}");
                            break;
                        }
                    }
                    None => debug!("손 세션 대기 중"),
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    if let Err(e) = client.close().await {
        debug!("릴레이 연결 종료 실패: {e}");
    }
    info!(
        "관찰 종료: 업데이트 {}개, 이력 응답 {}개",
        report.landmarks_events, report.hand_data_replies
    );
    report
}

fn handle_event(event: RelayEvent, report: &mut ObserverReport) {
    match event {
        RelayEvent::Message(ServerMessage::ConnectionResponse(response)) => {
            info!("서버 응답: {}", response.data);
        }
        RelayEvent::Message(ServerMessage::LandmarksReceived(ack)) => {
            info!(
                "랜드마크 수신: status={:?}, hand_id={}, frames={}",
                ack.status, ack.hand_id, ack.frames_stored
            );
            report.landmarks_events += 1;
            report.latest_hand_id = Some(ack.hand_id);
        }
        RelayEvent::Message(ServerMessage::HandData(history)) => {
            let sample = history
                .data
                .last()
                .and_then(|frame| frame.joint(HandJoint::Wrist).copied());
            info!(
                "손 데이터 수신: hand_id={:?}, 프레임 {}개, 최신 손목 {:?}",
                history.hand_id,
                history.data.len(),
                sample
            );
            report.hand_data_replies += 1;
            report.last_history_len = Some(history.data.len());
        }
        RelayEvent::Unrecognized(text) => info!("알 수 없는 이벤트: {text}"),
    }
}
