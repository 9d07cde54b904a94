use serde::Serialize;

use crate::models::{Detection, LandmarkGroup};

/// Points awarded for each detected group; four groups make 100.
pub const POINTS_PER_GROUP: u8 = 25;

/// Which landmark groups the detector found in a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Presence {
    pub pose: bool,
    pub face: bool,
    pub left_hand: bool,
    pub right_hand: bool,
}

impl Presence {
    pub fn of(detection: &Detection) -> Self {
        Self {
            pose: detection.has(LandmarkGroup::Pose),
            face: detection.has(LandmarkGroup::Face),
            left_hand: detection.has(LandmarkGroup::LeftHand),
            right_hand: detection.has(LandmarkGroup::RightHand),
        }
    }

    pub fn get(&self, group: LandmarkGroup) -> bool {
        match group {
            LandmarkGroup::Pose => self.pose,
            LandmarkGroup::Face => self.face,
            LandmarkGroup::LeftHand => self.left_hand,
            LandmarkGroup::RightHand => self.right_hand,
        }
    }

    pub fn count(&self) -> u8 {
        LandmarkGroup::ALL.iter().filter(|g| self.get(**g)).count() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    /// 0, 25, 50, 75 or 100.
    pub score: u8,
    pub presence: Presence,
}

impl QualityReport {
    pub fn passes(&self, threshold: u8) -> bool {
        self.score >= threshold
    }
}

/// Presence-based quality: each detected group is worth the same, whatever
/// the detector's confidence in it.
pub fn score(detection: &Detection) -> QualityReport {
    let presence = Presence::of(detection);
    QualityReport {
        score: presence.count() * POINTS_PER_GROUP,
        presence,
    }
}
