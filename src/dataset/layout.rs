//! Fixed column layout shared by every category store, and the encoder that
//! turns one detection into a row of that layout.
//!
//! The layout is the compatibility contract between all contributors' stores:
//! metadata first, then pose, curated face, left hand and right hand, each
//! landmark as `x, y, z, v`. A group that was not detected is zero-filled to
//! its full width, so every row has exactly [`COLUMN_COUNT`] fields.

use chrono::NaiveDateTime;

use crate::models::detection::{
    HAND_LANDMARK_COUNT, POSE_LANDMARK_COUNT, VALUES_PER_LANDMARK,
};
use crate::models::{Category, Detection, Landmark, LandmarkGroup, SessionMode};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const METADATA_COLUMNS: [&str; 5] =
    ["class", "timestamp", "user_id", "session_type", "quality_score"];

/// Column holding the contributor id.
pub const CONTRIBUTOR_COLUMN: &str = "user_id";

/// Curated face-mesh points kept in the feature vector, as (name, mesh index).
pub const FACE_LANDMARKS: [(&str, usize); 25] = [
    ("left_eye_inner", 362),
    ("left_eye_outer", 263),
    ("right_eye_inner", 133),
    ("right_eye_outer", 33),
    ("left_eye_center", 385),
    ("right_eye_center", 160),
    ("left_iris_center", 474),
    ("right_iris_center", 469),
    ("nose_tip", 3),
    ("nose_bridge", 168),
    ("nose_left", 49),
    ("nose_right", 279),
    ("mouth_left", 61),
    ("mouth_right", 291),
    ("mouth_top", 13),
    ("mouth_bottom", 14),
    ("mouth_center", 17),
    ("chin_center", 175),
    ("jaw_left", 172),
    ("jaw_right", 397),
    ("forehead", 9),
    ("left_eyebrow_inner", 55),
    ("left_eyebrow_outer", 70),
    ("right_eyebrow_inner", 285),
    ("right_eyebrow_outer", 300),
];

pub const POSE_WIDTH: usize = POSE_LANDMARK_COUNT * VALUES_PER_LANDMARK;
pub const FACE_WIDTH: usize = FACE_LANDMARKS.len() * VALUES_PER_LANDMARK;
pub const HAND_WIDTH: usize = HAND_LANDMARK_COUNT * VALUES_PER_LANDMARK;
pub const FEATURE_WIDTH: usize = POSE_WIDTH + FACE_WIDTH + 2 * HAND_WIDTH;
pub const COLUMN_COUNT: usize = METADATA_COLUMNS.len() + FEATURE_WIDTH;

const AXES: [&str; VALUES_PER_LANDMARK] = ["x", "y", "z", "v"];

/// Column names in store order.
pub fn header() -> Vec<String> {
    let mut columns: Vec<String> = METADATA_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.reserve(FEATURE_WIDTH);

    for group in LandmarkGroup::ALL {
        let prefix = group.as_str();
        match group {
            LandmarkGroup::Face => {
                for (name, _) in FACE_LANDMARKS {
                    for axis in AXES {
                        columns.push(format!("{prefix}_{name}_{axis}"));
                    }
                }
            }
            LandmarkGroup::Pose | LandmarkGroup::LeftHand | LandmarkGroup::RightHand => {
                let count = if group == LandmarkGroup::Pose {
                    POSE_LANDMARK_COUNT
                } else {
                    HAND_LANDMARK_COUNT
                };
                for i in 1..=count {
                    for axis in AXES {
                        columns.push(format!("{prefix}_{axis}{i}"));
                    }
                }
            }
        }
    }

    columns
}

/// One accepted frame, ready to be appended to its category store.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub category: Category,
    pub timestamp: NaiveDateTime,
    pub contributor: String,
    pub mode: SessionMode,
    pub score: u8,
    pub features: Vec<f32>,
}

impl Sample {
    /// Fields in column order.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(COLUMN_COUNT);
        record.push(self.category.as_str().to_string());
        record.push(self.timestamp.format(TIMESTAMP_FORMAT).to_string());
        record.push(self.contributor.clone());
        record.push(self.mode.as_str().to_string());
        record.push(format_value(f32::from(self.score)));
        record.extend(self.features.iter().map(|v| format_value(*v)));
        record
    }
}

/// Build the sample for one detection. Never fails: missing or short groups
/// are zero-filled, extra landmarks are ignored.
pub fn encode(
    category: Category,
    timestamp: NaiveDateTime,
    contributor: &str,
    mode: SessionMode,
    score: u8,
    detection: &Detection,
) -> Sample {
    Sample {
        category,
        timestamp,
        contributor: contributor.to_string(),
        mode,
        score,
        features: feature_vector(detection),
    }
}

/// Flattened pose, face, left-hand and right-hand values.
pub fn feature_vector(detection: &Detection) -> Vec<f32> {
    let mut features = Vec::with_capacity(FEATURE_WIDTH);
    push_group(
        &mut features,
        detection.group(LandmarkGroup::Pose),
        POSE_LANDMARK_COUNT,
    );
    push_face(&mut features, detection.group(LandmarkGroup::Face));
    push_group(
        &mut features,
        detection.group(LandmarkGroup::LeftHand),
        HAND_LANDMARK_COUNT,
    );
    push_group(
        &mut features,
        detection.group(LandmarkGroup::RightHand),
        HAND_LANDMARK_COUNT,
    );
    debug_assert_eq!(features.len(), FEATURE_WIDTH);
    features
}

fn push_group(out: &mut Vec<f32>, landmarks: Option<&[Landmark]>, count: usize) {
    let landmarks = landmarks.unwrap_or(&[]);
    for i in 0..count {
        let values = landmarks.get(i).map(Landmark::values).unwrap_or_default();
        out.extend_from_slice(&values);
    }
}

fn push_face(out: &mut Vec<f32>, mesh: Option<&[Landmark]>) {
    let Some(mesh) = mesh else {
        out.resize(out.len() + FACE_WIDTH, 0.0);
        return;
    };

    for (name, index) in FACE_LANDMARKS {
        match mesh.get(index) {
            Some(landmark) => out.extend_from_slice(&landmark.values()),
            None => {
                log_warn!(
                    "face landmark {name} (index {index}) missing from {}-point mesh; zero-filled",
                    mesh.len()
                );
                out.extend_from_slice(&[0.0; VALUES_PER_LANDMARK]);
            }
        }
    }
}

/// Stable float rendering: zero is written as `0.0`, other values use the
/// shortest representation that round-trips.
fn format_value(value: f32) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 2)
            .unwrap()
            .and_hms_opt(2, 24, 45)
            .unwrap()
    }

    fn full_detection() -> Detection {
        let points = |n: usize, base: f32| -> Vec<Landmark> {
            (0..n)
                .map(|i| Landmark::new(base + i as f32 * 0.001, 0.5, -0.25, 0.75))
                .collect()
        };
        Detection {
            pose: Some(points(POSE_LANDMARK_COUNT, 0.1)),
            face: Some(points(478, 0.2)),
            left_hand: Some(points(HAND_LANDMARK_COUNT, 0.3)),
            right_hand: Some(points(HAND_LANDMARK_COUNT, 0.4)),
        }
    }

    #[test]
    fn column_count_matches_layout() {
        assert_eq!(COLUMN_COUNT, 5 + 4 * 33 + 4 * 25 + 8 * 21);
        assert_eq!(header().len(), COLUMN_COUNT);
    }

    #[test]
    fn header_starts_with_metadata_then_pose() {
        let header = header();
        assert_eq!(&header[..5], &METADATA_COLUMNS.map(String::from));
        assert_eq!(header[5], "pose_x1");
        assert_eq!(header[8], "pose_v1");
        assert_eq!(header[5 + POSE_WIDTH], "face_left_eye_inner_x");
        assert_eq!(header[5 + POSE_WIDTH + FACE_WIDTH], "left_hand_x1");
        assert_eq!(header[5 + POSE_WIDTH + FACE_WIDTH + HAND_WIDTH], "right_hand_x1");
        assert_eq!(header.last().unwrap(), "right_hand_v21");
    }

    #[test]
    fn row_width_is_fixed_for_every_presence_subset() {
        let full = full_detection();
        for mask in 0u8..16 {
            let detection = Detection {
                pose: (mask & 1 != 0).then(|| full.pose.clone().unwrap()),
                face: (mask & 2 != 0).then(|| full.face.clone().unwrap()),
                left_hand: (mask & 4 != 0).then(|| full.left_hand.clone().unwrap()),
                right_hand: (mask & 8 != 0).then(|| full.right_hand.clone().unwrap()),
            };
            let sample = encode(
                Category::Slouching,
                timestamp(),
                "alice",
                SessionMode::Balanced,
                25 * mask.count_ones() as u8,
                &detection,
            );
            assert_eq!(sample.to_record().len(), COLUMN_COUNT, "mask {mask:04b}");
        }
    }

    #[test]
    fn missing_groups_are_zero_filled() {
        let detection = Detection {
            left_hand: Some(vec![Landmark::new(0.5, 0.5, 0.5, 1.0); HAND_LANDMARK_COUNT]),
            ..Detection::default()
        };
        let features = feature_vector(&detection);

        assert!(features[..POSE_WIDTH + FACE_WIDTH].iter().all(|v| *v == 0.0));
        let left = &features[POSE_WIDTH + FACE_WIDTH..POSE_WIDTH + FACE_WIDTH + HAND_WIDTH];
        assert_eq!(&left[..4], &[0.5, 0.5, 0.5, 1.0]);
        assert!(features[POSE_WIDTH + FACE_WIDTH + HAND_WIDTH..]
            .iter()
            .all(|v| *v == 0.0));
    }

    #[test]
    fn face_uses_curated_indices_in_order() {
        let mesh: Vec<Landmark> = (0..478)
            .map(|i| Landmark::new(i as f32, 0.0, 0.0, 1.0))
            .collect();
        let detection = Detection {
            face: Some(mesh),
            ..Detection::default()
        };
        let features = feature_vector(&detection);
        let face = &features[POSE_WIDTH..POSE_WIDTH + FACE_WIDTH];

        for (slot, (_, index)) in FACE_LANDMARKS.iter().enumerate() {
            assert_eq!(face[slot * 4], *index as f32);
        }
    }

    #[test]
    fn short_face_mesh_zero_fills_out_of_range_points() {
        // 468-point meshes have no iris landmarks.
        let mesh = vec![Landmark::new(0.5, 0.5, 0.0, 1.0); 468];
        let features = feature_vector(&Detection {
            face: Some(mesh),
            ..Detection::default()
        });
        let face = &features[POSE_WIDTH..POSE_WIDTH + FACE_WIDTH];

        let iris_slot = FACE_LANDMARKS
            .iter()
            .position(|(name, _)| *name == "left_iris_center")
            .unwrap();
        assert_eq!(&face[iris_slot * 4..iris_slot * 4 + 4], &[0.0; 4]);
        assert_eq!(&face[..4], &[0.5, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let detection = full_detection();
        let a = encode(
            Category::HeadDown,
            timestamp(),
            "bob",
            SessionMode::Validation,
            100,
            &detection,
        );
        let b = encode(
            Category::HeadDown,
            timestamp(),
            "bob",
            SessionMode::Validation,
            100,
            &detection,
        );
        assert_eq!(a.to_record(), b.to_record());
    }

    #[test]
    fn metadata_fields_are_formatted() {
        let sample = encode(
            Category::GoodPosture,
            timestamp(),
            "carol",
            SessionMode::Debug,
            75,
            &Detection::empty(),
        );
        let record = sample.to_record();

        assert_eq!(
            &record[..5],
            &["Good_Posture", "2025-08-02 02:24:45", "carol", "debug", "75.0"]
        );
        assert_eq!(record[5], "0.0");
    }
}
