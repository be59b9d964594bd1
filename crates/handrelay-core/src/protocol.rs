//! 릴레이 와이어 프로토콜.
//!
//! WebSocket 텍스트 프레임 하나에 JSON 봉투 하나를 싣는다:
//! `{"event": "<이벤트 이름>", "data": <페이로드>}`

use serde::{Deserialize, Serialize};

use crate::models::landmark::Frame;

/// 연결 확인 메시지 본문
pub const CONNECTED_TEXT: &str = "Connected";

/// 클라이언트 → 서버 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// 캡처 어댑터의 프레임 업데이트
    HandLandmarks(LandmarksUpdate),
    /// 세션 이력 조회
    GetHandData(HandDataQuery),
}

/// `hand_landmarks` 페이로드
///
/// 필드 누락은 역직렬화 에러가 아니라 `None`으로 받는다.
/// 누락된 업데이트는 릴레이에서 조용히 버려진다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarksUpdate {
    #[serde(default)]
    pub hand_id: Option<String>,
    #[serde(default)]
    pub landmarks: Option<Frame>,
}

impl LandmarksUpdate {
    pub fn new(hand_id: impl Into<String>, landmarks: Frame) -> Self {
        Self {
            hand_id: Some(hand_id.into()),
            landmarks: Some(landmarks),
        }
    }

    /// 세션 ID와 프레임이 모두 있고 비어 있지 않을 때만 반환
    pub fn into_parts(self) -> Option<(String, Frame)> {
        match (self.hand_id, self.landmarks) {
            (Some(id), Some(frame)) if !id.is_empty() && !frame.is_empty() => Some((id, frame)),
            _ => None,
        }
    }
}

/// `get_hand_data` 페이로드
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandDataQuery {
    #[serde(default)]
    pub hand_id: Option<String>,
}

/// 서버 → 클라이언트 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 연결 직후 해당 클라이언트에게만
    ConnectionResponse(ConnectionResponse),
    /// 업데이트 수락 요약 (전체 브로드캐스트)
    LandmarksReceived(LandmarksReceived),
    /// 이력 조회 응답 (요청자에게만)
    HandData(HandData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub data: String,
}

/// 수락 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarksReceived {
    pub status: AckStatus,
    pub hand_id: String,
    pub frames_stored: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandData {
    pub hand_id: Option<String>,
    /// 오래된 것 → 최신 순
    pub data: Vec<Frame>,
}

impl ServerMessage {
    pub fn connected() -> Self {
        ServerMessage::ConnectionResponse(ConnectionResponse {
            data: CONNECTED_TEXT.to_string(),
        })
    }

    pub fn landmarks_received(hand_id: impl Into<String>, frames_stored: usize) -> Self {
        ServerMessage::LandmarksReceived(LandmarksReceived {
            status: AckStatus::Success,
            hand_id: hand_id.into(),
            frames_stored,
        })
    }

    /// 이벤트 이름 반환
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::ConnectionResponse(_) => "connection_response",
            ServerMessage::LandmarksReceived(_) => "landmarks_received",
            ServerMessage::HandData(_) => "hand_data",
        }
    }
}

impl ClientMessage {
    /// 이벤트 이름 반환
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::HandLandmarks(_) => "hand_landmarks",
            ClientMessage::GetHandData(_) => "get_hand_data",
        }
    }
}
