//! # handrelay-network
//!
//! 릴레이 서버 WebSocket 클라이언트 어댑터.
//! 캡처 어댑터의 프레임 전송과 관찰 클라이언트의 이력 조회/브로드캐스트 수신을 담당한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use handrelay_network::relay_client::RelayClient;
//!
//! let (client, mut events) = RelayClient::connect("ws://localhost:5000/ws").await?;
//! client.request_history("sess-1").await?;
//! while let Some(event) = events.next().await { /* ... */ }
//! ```

pub mod relay_client;
pub mod ws_client;
