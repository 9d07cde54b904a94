use serde::{Deserialize, Serialize};

/// Landmarks in the holistic pose model.
pub const POSE_LANDMARK_COUNT: usize = 33;
/// Landmarks per detected hand.
pub const HAND_LANDMARK_COUNT: usize = 21;
/// Values recorded per landmark: x, y, z, visibility.
pub const VALUES_PER_LANDMARK: usize = 4;

/// A single detected point. Coordinates are normalised to the frame, `z` is
/// depth relative to the group's origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    pub fn values(&self) -> [f32; VALUES_PER_LANDMARK] {
        [self.x, self.y, self.z, self.visibility]
    }
}

/// The four independently detected landmark groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkGroup {
    Pose,
    Face,
    LeftHand,
    RightHand,
}

impl LandmarkGroup {
    pub const ALL: [LandmarkGroup; 4] = [
        LandmarkGroup::Pose,
        LandmarkGroup::Face,
        LandmarkGroup::LeftHand,
        LandmarkGroup::RightHand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LandmarkGroup::Pose => "pose",
            LandmarkGroup::Face => "face",
            LandmarkGroup::LeftHand => "left_hand",
            LandmarkGroup::RightHand => "right_hand",
        }
    }
}

/// One frame's output from the landmark detector. Each group is absent when
/// the detector found nothing for it, which is a normal result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub pose: Option<Vec<Landmark>>,
    #[serde(default)]
    pub face: Option<Vec<Landmark>>,
    #[serde(default)]
    pub left_hand: Option<Vec<Landmark>>,
    #[serde(default)]
    pub right_hand: Option<Vec<Landmark>>,
}

impl Detection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn group(&self, group: LandmarkGroup) -> Option<&[Landmark]> {
        let landmarks = match group {
            LandmarkGroup::Pose => self.pose.as_deref(),
            LandmarkGroup::Face => self.face.as_deref(),
            LandmarkGroup::LeftHand => self.left_hand.as_deref(),
            LandmarkGroup::RightHand => self.right_hand.as_deref(),
        };
        landmarks.filter(|points| !points.is_empty())
    }

    /// A group counts as present only when it carries at least one landmark.
    pub fn has(&self, group: LandmarkGroup) -> bool {
        self.group(group).is_some()
    }
}
