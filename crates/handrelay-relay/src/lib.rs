//! # handrelay-relay
//!
//! 손 랜드마크 릴레이 서버.
//! Axum 기반 HTTP 상태 확인 + WebSocket 이벤트 릴레이.
//!
//! ## 기능
//! - `hand_landmarks` 수신 → 세션 저장소 추가 → 전체 클라이언트 브로드캐스트
//! - `get_hand_data` 이력 조회 (요청자에게만 응답)
//! - 선택적 유휴 세션 정리

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sweeper;

use axum::Router;
use handrelay_core::config::RelayConfig;
use handrelay_core::ports::session_store::SessionStore;
use handrelay_core::protocol::ServerMessage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::RelayError;

/// 릴레이 서버 상태 (연결 핸들러 공유)
#[derive(Clone)]
pub struct AppState {
    /// 세션 저장소
    pub store: Arc<dyn SessionStore>,
    /// 전체 브로드캐스트 송신 채널
    pub event_tx: broadcast::Sender<ServerMessage>,
    /// 활성 연결 수
    pub connections: Arc<AtomicUsize>,
}

/// 릴레이 서버
pub struct RelayServer {
    config: RelayConfig,
    state: AppState,
}

impl RelayServer {
    /// 새 릴레이 서버 생성
    pub fn new(store: Arc<dyn SessionStore>, config: RelayConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.broadcast_capacity.max(1));
        Self {
            config,
            state: AppState {
                store,
                event_tx,
                connections: Arc::new(AtomicUsize::new(0)),
            },
        }
    }

    /// 현재 활성 연결 수
    pub fn active_connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// 라우터 구성
    pub fn router(&self) -> Router {
        // CORS: 모든 출처 허용
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(routes::relay_routes())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// 설정된 고정 주소에 바인드 후 실행
    ///
    /// 포트가 사용 중이면 대체 포트를 찾지 않고 에러를 반환한다.
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) -> Result<(), RelayError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;
        self.serve(listener, shutdown_rx).await
    }

    /// 이미 바인드된 리스너로 실행
    ///
    /// # Arguments
    /// * `shutdown_rx` - 종료 신호 수신 채널
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), RelayError> {
        let local_addr = listener.local_addr()?;

        if let Some(max_idle) = self.config.session_idle_timeout() {
            tokio::spawn(sweeper::run_idle_sweeper(
                self.state.store.clone(),
                max_idle,
                self.config.sweep_interval(),
                shutdown_rx.clone(),
            ));
        }

        let app = self.router();
        info!(
            "릴레이 서버 시작: http://{local_addr} (WebSocket: /ws, 세션당 프레임 {}개)",
            self.state.store.capacity()
        );

        // Graceful shutdown과 함께 서버 실행
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        info!("릴레이 서버 종료 신호 수신");
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;

        info!("릴레이 서버 종료 (활성 연결 {}개)", self.active_connections());
        Ok(())
    }

    /// 서버 URL 반환
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.config.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use handrelay_storage::MemorySessionStore;
    use tower::ServiceExt;

    fn test_server() -> RelayServer {
        RelayServer::new(
            Arc::new(MemorySessionStore::new(100)),
            RelayConfig::default(),
        )
    }

    #[tokio::test]
    async fn index_returns_liveness_text() {
        let response = test_server()
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], handlers::index::INDEX_TEXT.as_bytes());
    }

    #[tokio::test]
    async fn ws_route_requires_upgrade() {
        let response = test_server()
            .router()
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = test_server()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn server_url_uses_configured_port() {
        assert_eq!(test_server().url(), "http://localhost:5000");
        assert_eq!(test_server().active_connections(), 0);
    }

    #[tokio::test]
    async fn occupied_port_is_a_bind_error() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let config = RelayConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..RelayConfig::default()
        };
        let server = RelayServer::new(Arc::new(MemorySessionStore::new(100)), config);
        let (_tx, rx) = watch::channel(false);

        let result = server.run(rx).await;
        assert!(matches!(result, Err(RelayError::Bind { .. })));
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(test_server().serve(listener, rx));

        tx.send(true).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("종료 신호 후 서버가 멈춰야 함")
            .unwrap();
        assert!(result.is_ok());
    }
}
