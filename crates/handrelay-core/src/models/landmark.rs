//! 손 랜드마크 모델.
//!
//! 포즈 추정기가 영상 프레임마다 생성하는 21개 관절 좌표와
//! 관절 인덱스, 골격 연결 정보를 정의.

use serde::{Deserialize, Serialize};

/// 한 손의 관절 수
pub const LANDMARKS_PER_FRAME: usize = 21;

/// 골격 연결선 (관절 인덱스 쌍)
pub const HAND_CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (5, 9),
    (9, 13),
    (13, 17),
];

/// 3D 랜드마크 좌표
///
/// `x`, `y`는 이미지 너비/높이 기준 [0, 1] 정규화 좌표,
/// `z`는 손목 기준 상대 깊이 (단위 없음).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// 관절 인덱스 (포즈 추정기 출력 순서)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandJoint {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl HandJoint {
    /// 인덱스 순서의 전체 관절
    pub const ALL: [HandJoint; LANDMARKS_PER_FRAME] = [
        HandJoint::Wrist,
        HandJoint::ThumbCmc,
        HandJoint::ThumbMcp,
        HandJoint::ThumbIp,
        HandJoint::ThumbTip,
        HandJoint::IndexMcp,
        HandJoint::IndexPip,
        HandJoint::IndexDip,
        HandJoint::IndexTip,
        HandJoint::MiddleMcp,
        HandJoint::MiddlePip,
        HandJoint::MiddleDip,
        HandJoint::MiddleTip,
        HandJoint::RingMcp,
        HandJoint::RingPip,
        HandJoint::RingDip,
        HandJoint::RingTip,
        HandJoint::PinkyMcp,
        HandJoint::PinkyPip,
        HandJoint::PinkyDip,
        HandJoint::PinkyTip,
    ];

    /// 프레임 내 위치
    pub fn index(self) -> usize {
        self as usize
    }
}

/// 정규화 좌표 바운딩 박스
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// 한 시점의 손 포즈 샘플
///
/// 순서는 [`HandJoint`] 인덱스를 따르지만 릴레이는 개수/순서를 검증하지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frame(Vec<Landmark>);

impl Frame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 21개 관절이 모두 있는지
    pub fn is_complete(&self) -> bool {
        self.0.len() == LANDMARKS_PER_FRAME
    }

    /// 특정 관절 좌표
    pub fn joint(&self, joint: HandJoint) -> Option<&Landmark> {
        self.0.get(joint.index())
    }

    /// 전체 랜드마크를 감싸는 바운딩 박스 (빈 프레임이면 None)
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.0.first()?;
        let init = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(self.0.iter().skip(1).fold(init, |b, p| BoundingBox {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }
}

impl From<Vec<Landmark>> for Frame {
    fn from(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }
}
