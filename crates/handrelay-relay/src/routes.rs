//! 라우트 정의.

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::AppState;

/// 릴레이 라우트 생성
pub fn relay_routes() -> Router<AppState> {
    Router::new()
        // 상태 확인 (프로토콜 외)
        .route("/", get(handlers::index::index))
        // 릴레이 이벤트 채널
        .route("/ws", get(handlers::socket::ws_upgrade))
}
