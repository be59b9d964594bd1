//! 도메인 모델.
//!
//! 모든 모델은 serde Serialize/Deserialize를 구현한다.

pub mod landmark;
