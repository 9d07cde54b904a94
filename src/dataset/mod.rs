pub mod layout;
pub mod progress;
pub mod store;

pub use layout::{encode, Sample, COLUMN_COUNT};
pub use progress::{
    progress, CategoryCount, ContributorProgress, DatasetSnapshot, ScanDiagnostic, StoreStatus,
};
pub use store::CategoryStore;
