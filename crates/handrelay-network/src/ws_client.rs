//! WebSocket 텍스트 채널.
//!
//! `tokio-tungstenite` 연결 하나를 수신 태스크와 송신 태스크로 나눈다.
//! 릴레이 프로토콜은 텍스트 프레임만 쓰므로 그 외 프레임은 버린다.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use handrelay_core::error::CoreError;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 수신 텍스트 버퍼 크기
const INBOUND_BUFFER: usize = 64;

/// 송신 대기열 크기
const OUTBOUND_BUFFER: usize = 64;

/// WebSocket 접속 대상
pub struct WsClient {
    url: String,
}

impl WsClient {
    /// `http(s)://` URL은 `ws(s)://`로 바꾼다.
    pub fn new(url: &str) -> Self {
        Self {
            url: url
                .trim_end_matches('/')
                .replace("http://", "ws://")
                .replace("https://", "wss://"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 연결 수립
    ///
    /// 수신 텍스트는 반환된 채널로 들어오고, 연결이 끝나면 채널이 닫힌다.
    pub async fn connect(&self) -> Result<(WsSender, mpsc::Receiver<String>), CoreError> {
        info!("WebSocket 연결: {}", self.url);

        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| CoreError::Network(format!("WebSocket 연결 실패: {e}")))?;

        let (sink, stream) = ws_stream.split();
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);

        tokio::spawn(forward_text(stream, inbound_tx));
        tokio::spawn(drain_outbound(sink, outbound_rx));

        Ok((
            WsSender {
                outbound: outbound_tx,
            },
            inbound_rx,
        ))
    }
}

/// 텍스트 프레임만 채널로 전달
async fn forward_text(mut stream: SplitStream<WsStream>, inbound: mpsc::Sender<String>) {
    loop {
        let text = match stream.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            Some(Ok(Message::Close(frame))) => {
                debug!("서버가 연결 종료: {frame:?}");
                break;
            }
            Some(Ok(other)) => {
                debug!("텍스트 외 프레임 무시 ({} bytes)", other.len());
                continue;
            }
            Some(Err(e)) => {
                warn!("WebSocket 수신 에러: {e}");
                break;
            }
            None => break,
        };
        if inbound.send(text).await.is_err() {
            break;
        }
    }
}

/// 대기열 순서대로 전송. 닫기 프레임 또는 전송 실패 시 종료.
async fn drain_outbound(
    mut sink: SplitSink<WsStream, Message>,
    mut outbound: mpsc::Receiver<Message>,
) {
    while let Some(message) = outbound.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            warn!("WebSocket 전송 실패: {e}");
            break;
        }
        if closing {
            break;
        }
    }
}

/// 송신 핸들
///
/// 송신 태스크가 끝난 뒤의 전송은 `CoreError::Network`.
#[derive(Clone)]
pub struct WsSender {
    outbound: mpsc::Sender<Message>,
}

impl WsSender {
    pub async fn send_text(&self, text: String) -> Result<(), CoreError> {
        self.push(Message::Text(text.into())).await
    }

    /// 닫기 프레임 전송
    pub async fn close(&self) -> Result<(), CoreError> {
        self.push(Message::Close(None)).await
    }

    async fn push(&self, message: Message) -> Result<(), CoreError> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| CoreError::Network("WebSocket 연결이 닫힘".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_url_is_rewritten() {
        let ws = WsClient::new("http://localhost:5000/ws/");
        assert_eq!(ws.url(), "ws://localhost:5000/ws");

        let wss = WsClient::new("https://relay.example.com/ws");
        assert_eq!(wss.url(), "wss://relay.example.com/ws");

        let plain = WsClient::new("ws://127.0.0.1:5000/ws");
        assert_eq!(plain.url(), "ws://127.0.0.1:5000/ws");
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        // 빈 포트 확보 후 즉시 해제
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = WsClient::new(&format!("ws://127.0.0.1:{port}/ws"));
        let result = client.connect().await;
        assert!(matches!(result, Err(CoreError::Network(_))));
    }

    #[tokio::test]
    async fn send_after_writer_exit_is_a_network_error() {
        let (outbound, rx) = mpsc::channel(1);
        drop(rx);
        let sender = WsSender { outbound };
        assert!(matches!(
            sender.send_text("{}".to_string()).await,
            Err(CoreError::Network(_))
        ));
    }
}
