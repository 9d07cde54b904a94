use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ConfigError;

/// Posture and expression labels collected by this tool. The declaration
/// order is the canonical category order used for planning and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Good_Posture")]
    GoodPosture,
    #[serde(rename = "Slouching")]
    Slouching,
    #[serde(rename = "Forward_Head")]
    ForwardHead,
    #[serde(rename = "Shoulders_Hunched")]
    ShouldersHunched,
    #[serde(rename = "Leaning_Forward")]
    LeaningForward,
    #[serde(rename = "Leaning_Back")]
    LeaningBack,
    #[serde(rename = "Confident_Expression")]
    ConfidentExpression,
    #[serde(rename = "Nervous_Expression")]
    NervousExpression,
    #[serde(rename = "Head_Down")]
    HeadDown,
    #[serde(rename = "Fidgeting_Hands")]
    FidgetingHands,
}

impl Category {
    pub const COUNT: usize = 10;

    pub const ALL: [Category; Category::COUNT] = [
        Category::GoodPosture,
        Category::Slouching,
        Category::ForwardHead,
        Category::ShouldersHunched,
        Category::LeaningForward,
        Category::LeaningBack,
        Category::ConfidentExpression,
        Category::NervousExpression,
        Category::HeadDown,
        Category::FidgetingHands,
    ];

    /// Label as written into the `class` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::GoodPosture => "Good_Posture",
            Category::Slouching => "Slouching",
            Category::ForwardHead => "Forward_Head",
            Category::ShouldersHunched => "Shoulders_Hunched",
            Category::LeaningForward => "Leaning_Forward",
            Category::LeaningBack => "Leaning_Back",
            Category::ConfidentExpression => "Confident_Expression",
            Category::NervousExpression => "Nervous_Expression",
            Category::HeadDown => "Head_Down",
            Category::FidgetingHands => "Fidgeting_Hands",
        }
    }

    /// Position in the canonical order.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Select by 1-based menu number.
    pub fn from_menu_choice(choice: &str) -> Result<Self, ConfigError> {
        choice
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Category::ALL.get(i).copied())
            .ok_or_else(|| ConfigError::InvalidCategory(choice.trim().to_string()))
    }

    /// File name of this category's store inside the dataset directory.
    pub fn store_file_name(&self) -> String {
        format!("{}_data.csv", self.as_str().to_lowercase())
    }

    pub fn instructions(&self) -> &'static [&'static str] {
        match self {
            Category::GoodPosture => &[
                "Sit straight with back against chair",
                "Shoulders relaxed and pulled back",
                "Head upright, eyes focused on camera",
                "Confident, alert expression",
                "Hands visible and naturally positioned",
            ],
            Category::Slouching => &[
                "Let your back curve forward (away from chair)",
                "Round shoulders inward toward chest",
                "Allow chest to cave in slightly",
                "Maintain relaxed but poor spinal alignment",
            ],
            Category::ForwardHead => &[
                "Push head and neck forward toward camera",
                "Create prominent 'chicken neck' posture",
                "Keep body relatively straight",
                "Common when leaning toward screens",
            ],
            Category::ShouldersHunched => &[
                "Actively raise shoulders toward your ears",
                "Tense shoulder and neck muscles",
                "Shows physical stress or tension",
                "Keep rest of posture relatively normal",
            ],
            Category::LeaningForward => &[
                "Lean entire torso toward the camera",
                "Move whole upper body forward from hips",
                "Shows nervousness, eagerness, or over-engagement",
                "Maintain forward lean consistently",
            ],
            Category::LeaningBack => &[
                "Lean entire torso away from camera",
                "Push back into chair, create distance",
                "Appears disinterested or overly casual",
                "May suggest disengagement from conversation",
            ],
            Category::ConfidentExpression => &[
                "Maintain steady eye contact with camera",
                "Show slight smile or pleasant, alert expression",
                "Keep facial muscles engaged but relaxed",
                "Project confidence and professional presence",
            ],
            Category::NervousExpression => &[
                "Display tense, worried facial muscles",
                "Show furrowed brow or concerned look",
                "Tight lips, forced smile, or anxious expression",
                "Project stress, uncertainty, or nervousness",
            ],
            Category::HeadDown => &[
                "Look down frequently (avoid camera eye contact)",
                "Tilt head downward toward desk/lap",
                "Appears withdrawn, shy, or lacking confidence",
                "Shows avoidance of direct engagement",
            ],
            Category::FidgetingHands => &[
                "Continuously change hand positions",
                "Touch face, hair, clothing, or objects",
                "Tap fingers, adjust items, show restless energy",
                "Display nervous hand movements throughout",
            ],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ConfigError::InvalidCategory(trimmed.to_string()))
    }
}
