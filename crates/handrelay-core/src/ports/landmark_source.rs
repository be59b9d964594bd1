//! 랜드마크 소스 포트.
//!
//! 카메라 + 손 포즈 추정 모델을 감싸는 외부 협력자.
//! 구현: `handrelay-app` crate (합성 손 소스)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::landmark::Frame;

/// 영상 프레임당 손 랜드마크 생성기
#[async_trait]
pub trait LandmarkSource: Send {
    /// 다음 영상 프레임 처리
    ///
    /// 손이 검출되지 않으면 `Ok(None)`.
    /// 장치 읽기 실패는 `Err`. 캡처 루프는 재시도 없이 종료한다.
    async fn next_sample(&mut self) -> Result<Option<Frame>, CoreError>;

    /// 로그용 소스 설명
    fn describe(&self) -> String;
}
