//! 세션 저장소 포트.
//!
//! 구현: `handrelay-storage` crate (인메모리 링 버퍼)

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::landmark::Frame;

/// 세션별 최근 프레임 이력 저장소
///
/// 모든 연산은 원자적이며 await 지점을 갖지 않는다.
pub trait SessionStore: Send + Sync {
    /// 프레임 추가. 세션이 없으면 생성한다.
    ///
    /// 추가 후 보관 중인 프레임 수(용량 상한)를 반환.
    /// 빈 세션 ID나 빈 프레임은 상태 변경 없이 `Validation` 에러.
    fn append(&self, session_id: &str, frame: Frame) -> Result<usize, CoreError>;

    /// 보관 중인 프레임 (오래된 것 → 최신). 모르는 세션이면 빈 목록.
    fn get(&self, session_id: &str) -> Vec<Frame>;

    /// 세션당 최대 프레임 수
    fn capacity(&self) -> usize;

    /// 현재 세션 수
    fn session_count(&self) -> usize;

    /// `cutoff` 이후로 갱신되지 않은 세션 삭제. 삭제된 세션 수 반환.
    fn expire_idle(&self, cutoff: DateTime<Utc>) -> usize;
}
