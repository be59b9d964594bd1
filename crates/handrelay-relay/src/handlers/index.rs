//! 상태 확인 엔드포인트.

/// `GET /` 응답 본문
pub const INDEX_TEXT: &str = "Hand Tracking Server Running";

/// 상태 확인
///
/// GET /
pub async fn index() -> &'static str {
    INDEX_TEXT
}
