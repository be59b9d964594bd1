//! 릴레이 프로토콜 클라이언트.
//!
//! `WsClient` 위에 이벤트 봉투 직렬화를 얹은 타입 안전 래퍼.

use handrelay_core::error::CoreError;
use handrelay_core::models::landmark::Frame;
use handrelay_core::protocol::{ClientMessage, HandDataQuery, LandmarksUpdate, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ws_client::{WsClient, WsSender};

/// 릴레이에서 수신한 이벤트
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// 해석된 서버 메시지
    Message(ServerMessage),
    /// 알 수 없는 이벤트 (원문 그대로)
    Unrecognized(String),
}

/// 릴레이 송신 핸들
#[derive(Clone)]
pub struct RelayClient {
    sender: WsSender,
}

/// 릴레이 수신 스트림
pub struct RelayEvents {
    rx: mpsc::Receiver<String>,
}

impl RelayClient {
    /// 릴레이 접속
    ///
    /// 접속 실패는 `CoreError::Network`. 재시도하지 않는다.
    pub async fn connect(url: &str) -> Result<(RelayClient, RelayEvents), CoreError> {
        let (sender, rx) = WsClient::new(url).connect().await?;
        Ok((RelayClient { sender }, RelayEvents { rx }))
    }

    /// 임의의 클라이언트 메시지 전송
    pub async fn send(&self, message: &ClientMessage) -> Result<(), CoreError> {
        debug!("릴레이 전송: {}", message.event_name());
        let json = serde_json::to_string(message)?;
        self.sender.send_text(json).await
    }

    /// `hand_landmarks` 전송
    pub async fn send_landmarks(&self, hand_id: &str, frame: &Frame) -> Result<(), CoreError> {
        self.send(&ClientMessage::HandLandmarks(LandmarksUpdate::new(
            hand_id,
            frame.clone(),
        )))
        .await
    }

    /// `get_hand_data` 전송
    pub async fn request_history(&self, hand_id: &str) -> Result<(), CoreError> {
        self.send(&ClientMessage::GetHandData(HandDataQuery {
            hand_id: Some(hand_id.to_string()),
        }))
        .await
    }

    /// 가공되지 않은 텍스트 프레임 전송 (형식 오류 메시지 재현용)
    pub async fn send_raw(&self, text: &str) -> Result<(), CoreError> {
        self.sender.send_text(text.to_owned()).await
    }

    /// 연결 종료
    pub async fn close(&self) -> Result<(), CoreError> {
        self.sender.close().await
    }
}

impl RelayEvents {
    /// 다음 이벤트 대기. 연결이 끊기면 `None`.
    pub async fn next(&mut self) -> Option<RelayEvent> {
        self.rx.recv().await.map(parse_event)
    }

    /// 다음 서버 메시지만 대기 (알 수 없는 이벤트는 건너뜀)
    pub async fn next_message(&mut self) -> Option<ServerMessage> {
        loop {
            match self.next().await? {
                RelayEvent::Message(msg) => return Some(msg),
                RelayEvent::Unrecognized(_) => continue,
            }
        }
    }
}

fn parse_event(text: String) -> RelayEvent {
    match serde_json::from_str::<ServerMessage>(&text) {
        Ok(msg) => RelayEvent::Message(msg),
        Err(e) => {
            warn!("알 수 없는 릴레이 이벤트: {e}");
            RelayEvent::Unrecognized(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_event() {
        let text = r#"{"event":"connection_response","data":{"data":"Connected"}}"#;
        assert_eq!(
            parse_event(text.to_string()),
            RelayEvent::Message(ServerMessage::connected())
        );
    }

    #[test]
    fn keeps_unknown_event_text() {
        let text = r#"{"event":"mystery","data":1}"#.to_string();
        assert_eq!(
            parse_event(text.clone()),
            RelayEvent::Unrecognized(text)
        );
    }

    #[tokio::test]
    async fn events_end_when_connection_closes() {
        let (tx, rx) = mpsc::channel(8);
        let mut events = RelayEvents { rx };

        tx.send(
            r#"{"event":"landmarks_received","data":{"status":"success","hand_id":"a","frames_stored":2}}"#
                .to_string(),
        )
        .await
        .unwrap();
        drop(tx);

        assert_eq!(
            events.next().await,
            Some(RelayEvent::Message(ServerMessage::landmarks_received("a", 2)))
        );
        assert_eq!(events.next().await, None);
    }

    #[tokio::test]
    async fn next_message_skips_unrecognized() {
        let (tx, rx) = mpsc::channel(8);
        let mut events = RelayEvents { rx };

        tx.send("not json".to_string()).await.unwrap();
        tx.send(r#"{"event":"connection_response","data":{"data":"Connected"}}"#.to_string())
            .await
            .unwrap();
        drop(tx);

        assert_eq!(events.next_message().await, Some(ServerMessage::connected()));
        assert_eq!(events.next_message().await, None);
    }
}
