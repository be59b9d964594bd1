//! # handrelay-core
//!
//! handrelay 도메인 모델, 와이어 프로토콜, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 랜드마크/프레임 데이터 구조체 (serde Serialize/Deserialize)
//! - [`protocol`]: 릴레이 이벤트 봉투 (클라이언트 ↔ 서버)
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 애플리케이션 설정 구조체 및 로더

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
pub mod protocol;
