use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::models::detection::{HAND_LANDMARK_COUNT, POSE_LANDMARK_COUNT};
use crate::models::{Detection, Landmark};

use super::{Frame, FrameSource, LandmarkDetector, Pacer};

/// Points in a refined face mesh (468 + 10 iris points).
const FACE_MESH_SIZE: usize = 478;

/// Endless stream of empty frames.
pub struct SyntheticCamera {
    sequence: u64,
    pacer: Pacer,
}

impl SyntheticCamera {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            sequence: 0,
            pacer: Pacer::new(frame_interval),
        }
    }
}

impl FrameSource for SyntheticCamera {
    fn read_frame(&mut self) -> Result<Frame> {
        self.pacer.wait();
        self.sequence += 1;
        Ok(Frame::new(self.sequence, Vec::new()))
    }
}

/// Produces random detections; each group appears with its configured
/// probability (pose, face, left hand, right hand).
pub struct SyntheticDetector {
    presence: [f64; 4],
    rng: StdRng,
}

impl SyntheticDetector {
    pub fn new(presence: [f64; 4], seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            presence: presence.map(|p| p.clamp(0.0, 1.0)),
            rng,
        }
    }

    fn maybe_group(&mut self, probability: f64, count: usize) -> Option<Vec<Landmark>> {
        if !self.rng.gen_bool(probability) {
            return None;
        }
        let rng = &mut self.rng;
        Some(
            (0..count)
                .map(|_| {
                    Landmark::new(
                        rng.gen_range(0.0..1.0),
                        rng.gen_range(0.0..1.0),
                        rng.gen_range(-0.5..0.5),
                        rng.gen_range(0.5..1.0),
                    )
                })
                .collect(),
        )
    }
}

impl LandmarkDetector for SyntheticDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Detection> {
        let [pose, face, left, right] = self.presence;
        Ok(Detection {
            pose: self.maybe_group(pose, POSE_LANDMARK_COUNT),
            face: self.maybe_group(face, FACE_MESH_SIZE),
            left_hand: self.maybe_group(left, HAND_LANDMARK_COUNT),
            right_hand: self.maybe_group(right, HAND_LANDMARK_COUNT),
        })
    }
}
