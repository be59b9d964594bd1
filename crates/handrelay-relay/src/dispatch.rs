//! 인바운드 이벤트 처리.
//!
//! 연결 계층과 분리된 순수 로직: 클라이언트 메시지 하나를 받아
//! 저장소를 갱신하고 누구에게 무엇을 보낼지 결정한다.

use handrelay_core::ports::session_store::SessionStore;
use handrelay_core::protocol::{ClientMessage, HandData, ServerMessage};
use tracing::debug;

/// 메시지 처리 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 요청한 클라이언트에게만 응답
    Reply(ServerMessage),
    /// 연결된 모든 클라이언트에게 전송 (요청자 포함)
    Broadcast(ServerMessage),
    /// 아무것도 보내지 않음
    Dropped,
}

/// 텍스트 프레임 처리
///
/// 해석할 수 없는 봉투나 알 수 없는 이벤트는 조용히 버린다.
pub fn handle_text(store: &dyn SessionStore, text: &str) -> Outcome {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => handle_message(store, message),
        Err(e) => {
            debug!("해석할 수 없는 메시지 무시: {e}");
            Outcome::Dropped
        }
    }
}

/// 클라이언트 메시지 처리
pub fn handle_message(store: &dyn SessionStore, message: ClientMessage) -> Outcome {
    match message {
        ClientMessage::HandLandmarks(update) => {
            // hand_id 또는 landmarks 누락: 에러 응답도 브로드캐스트도 없음
            let Some((hand_id, frame)) = update.into_parts() else {
                debug!("hand_id/landmarks 누락된 업데이트 무시");
                return Outcome::Dropped;
            };

            match store.append(&hand_id, frame) {
                Ok(frames_stored) => {
                    debug!("세션 {hand_id}: 프레임 {frames_stored}개 저장, 전체 브로드캐스트");
                    Outcome::Broadcast(ServerMessage::landmarks_received(hand_id, frames_stored))
                }
                Err(e) => {
                    debug!("업데이트 거부: {e}");
                    Outcome::Dropped
                }
            }
        }
        ClientMessage::GetHandData(query) => {
            let data = query
                .hand_id
                .as_deref()
                .map(|id| store.get(id))
                .unwrap_or_default();
            debug!(
                "이력 조회: {:?} → 프레임 {}개",
                query.hand_id.as_deref(),
                data.len()
            );
            Outcome::Reply(ServerMessage::HandData(HandData {
                hand_id: query.hand_id,
                data,
            }))
        }
    }
}
