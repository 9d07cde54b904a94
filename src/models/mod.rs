pub mod category;
pub mod detection;
pub mod error;
pub mod session;

pub use category::Category;
pub use detection::{Detection, Landmark, LandmarkGroup};
pub use error::ConfigError;
pub use session::{SessionMode, WorkItem};
