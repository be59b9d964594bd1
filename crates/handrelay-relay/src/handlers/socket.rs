//! WebSocket 릴레이 연결 핸들러.
//!
//! 연결마다 태스크 하나: 인바운드 이벤트 처리와
//! 브로드캐스트 채널 수신을 `select!`로 다중화한다.
//! 브로드캐스트를 먼저 비우므로 요청자는 자신의 수신 확인을
//! 이후 요청의 응답보다 먼저 받는다.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use handrelay_core::protocol::ServerMessage;
use std::sync::atomic::Ordering;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatch::{self, Outcome};
use crate::AppState;

type Sink = SplitSink<WebSocket, Message>;

/// WebSocket 업그레이드 엔드포인트
///
/// GET /ws
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// 연결 수명주기: 등록 → 확인 응답 → 이벤트 루프 → 해제
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    let active = state.connections.fetch_add(1, Ordering::SeqCst) + 1;
    info!("클라이언트 연결: {conn_id} (활성 연결 {active}개)");

    let (mut sink, mut stream) = socket.split();
    // 확인 응답 전에 구독해야 직후 브로드캐스트를 놓치지 않는다
    let mut broadcasts = state.event_tx.subscribe();

    if let Err(e) = send(&mut sink, &ServerMessage::connected()).await {
        warn!("연결 확인 응답 실패 {conn_id}: {e}");
    } else {
        loop {
            tokio::select! {
                // 대기 중인 브로드캐스트를 먼저 내보내야 처리 순서대로 도착한다
                biased;

                event = next_broadcast(&mut broadcasts, conn_id) => match event {
                    Some(summary) => {
                        if let Err(e) = send(&mut sink, &summary).await {
                            warn!("브로드캐스트 전송 실패 {conn_id}: {e}");
                            break;
                        }
                    }
                    None => break,
                },
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match dispatch::handle_text(state.store.as_ref(), text.as_str()) {
                            Outcome::Reply(reply) => {
                                if let Err(e) = send(&mut sink, &reply).await {
                                    warn!("응답 전송 실패 {conn_id}: {e}");
                                    break;
                                }
                            }
                            Outcome::Broadcast(summary) => {
                                // 요청자도 구독 중이므로 수신자는 최소 1명
                                if let Err(e) = state.event_tx.send(summary) {
                                    warn!("브로드캐스트 실패: {e}");
                                }
                            }
                            Outcome::Dropped => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Binary/Ping/Pong
                    Some(Err(e)) => {
                        debug!("수신 에러 {conn_id}: {e}");
                        break;
                    }
                },
            }
        }
    }

    let remaining = state.connections.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
    info!("클라이언트 연결 해제: {conn_id} (활성 연결 {remaining}개)");
}

/// 서버 메시지를 JSON 텍스트 프레임으로 전송
async fn send(sink: &mut Sink, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    sink.send(Message::Text(json.into())).await
}

/// 다음 브로드캐스트. 밀려서 건너뛴 메시지는 경고만 남기고, 채널이 닫히면 `None`.
async fn next_broadcast(
    rx: &mut broadcast::Receiver<ServerMessage>,
    conn_id: Uuid,
) -> Option<ServerMessage> {
    loop {
        match rx.recv().await {
            Ok(message) => return Some(message),
            Err(RecvError::Lagged(skipped)) => {
                warn!("관찰자 {conn_id} 지연: 브로드캐스트 {skipped}개 건너뜀");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}
