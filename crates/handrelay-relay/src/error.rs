//! 릴레이 서버 에러 처리.

use handrelay_core::error::CoreError;
use thiserror::Error;

/// 릴레이 서버 에러
#[derive(Debug, Error)]
pub enum RelayError {
    /// 고정 포트 바인드 실패
    #[error("주소 바인드 실패 {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// 서버 실행 중 I/O 오류
    #[error("서버 I/O 오류: {0}")]
    Io(#[from] std::io::Error),

    /// 코어 레이어 오류
    #[error(transparent)]
    Core(#[from] CoreError),
}
