//! # handrelay-app
//!
//! 바이너리와 통합 테스트가 공유하는 실행 구성 요소.

pub mod capture;
pub mod lifecycle;
pub mod observer;
