pub mod loop_worker;
pub mod quality;
pub mod state;

pub use loop_worker::{
    run_capture, CaptureConsole, CaptureContext, CaptureEvent, CaptureExit, CaptureOutcome,
    SampleSink,
};
pub use quality::{score, Presence, QualityReport};
pub use state::{AbortReason, CaptureMachine, CaptureState, OperatorCommand, Transition};
