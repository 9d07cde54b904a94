pub mod controller;

pub use controller::{run_session, ItemDecision, Session, SessionConsole};
