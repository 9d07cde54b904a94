use serde::{Deserialize, Serialize};

use super::quality::QualityReport;

/// Operator commands understood by the capture loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperatorCommand {
    Start,
    Pause,
    Resume,
    /// Pause when collecting, resume when paused.
    TogglePause,
    /// Stop this category and end the session.
    Quit,
    /// Stop this category and move on to the next one.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbortReason {
    Quit,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureState {
    Preview,
    Collecting,
    Paused,
    Done,
    Aborted(AbortReason),
}

impl Default for CaptureState {
    fn default() -> Self {
        CaptureState::Preview
    }
}

impl CaptureState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureState::Done | CaptureState::Aborted(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Preview => "PREVIEW",
            CaptureState::Collecting => "RECORDING",
            CaptureState::Paused => "PAUSED",
            CaptureState::Done => "DONE",
            CaptureState::Aborted(AbortReason::Quit) => "QUIT",
            CaptureState::Aborted(AbortReason::Skip) => "SKIPPED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { from: CaptureState, to: CaptureState },
    /// The command has no effect in the current state.
    Ignored {
        state: CaptureState,
        hint: &'static str,
    },
}

/// What the quality gate decided for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVerdict {
    /// Collecting and good enough: encode and persist.
    Eligible,
    /// Collecting, but below the threshold.
    BelowThreshold,
    /// Not collecting; the frame only feeds the live display.
    Observed,
}

/// Per-category acquisition state. Counts accepted samples against the work
/// item's target and moves to `Done` the moment the target is reached.
#[derive(Debug, Clone)]
pub struct CaptureMachine {
    state: CaptureState,
    target: u32,
    threshold: u8,
    accepted: u32,
    frames: u64,
    low_quality: u64,
}

impl CaptureMachine {
    pub fn new(target: u32, threshold: u8) -> Self {
        Self {
            state: if target == 0 {
                CaptureState::Done
            } else {
                CaptureState::Preview
            },
            target,
            threshold,
            accepted: 0,
            frames: 0,
            low_quality: 0,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn accepted(&self) -> u32 {
        self.accepted
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn low_quality(&self) -> u64 {
        self.low_quality
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Run the quality gate for one processed frame.
    pub fn evaluate(&mut self, report: &QualityReport) -> FrameVerdict {
        self.frames += 1;
        if self.state != CaptureState::Collecting {
            return FrameVerdict::Observed;
        }
        if report.passes(self.threshold) {
            FrameVerdict::Eligible
        } else {
            self.low_quality += 1;
            FrameVerdict::BelowThreshold
        }
    }

    /// Count a sample that was written. Returns `true` when this sample
    /// completed the target.
    pub fn record_accepted(&mut self) -> bool {
        if self.state != CaptureState::Collecting {
            return false;
        }
        self.accepted += 1;
        if self.accepted >= self.target {
            self.state = CaptureState::Done;
            return true;
        }
        false
    }

    pub fn apply(&mut self, command: OperatorCommand) -> Transition {
        use CaptureState::*;
        use OperatorCommand as Cmd;

        let from = self.state;
        let to = match (from, command) {
            (Done | Aborted(_), _) => {
                return Transition::Ignored {
                    state: from,
                    hint: "collection already finished",
                }
            }
            (_, Cmd::Quit) => Aborted(AbortReason::Quit),
            (_, Cmd::Skip) => Aborted(AbortReason::Skip),
            (Preview, Cmd::Start) => Collecting,
            (Collecting, Cmd::Pause | Cmd::TogglePause) => Paused,
            (Paused, Cmd::Resume | Cmd::TogglePause) => Collecting,
            (Preview, _) => {
                return Transition::Ignored {
                    state: from,
                    hint: "still in preview; start collecting first",
                }
            }
            (Collecting, _) => {
                return Transition::Ignored {
                    state: from,
                    hint: "already collecting; pause or resume with 'p'",
                }
            }
            (Paused, _) => {
                return Transition::Ignored {
                    state: from,
                    hint: "collection is paused; resume with 'p'",
                }
            }
        };

        self.state = to;
        Transition::Moved { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::quality::Presence;

    fn report(score: u8) -> QualityReport {
        QualityReport {
            score,
            presence: Presence::default(),
        }
    }

    #[test]
    fn starts_in_preview() {
        let machine = CaptureMachine::new(10, 50);
        assert_eq!(machine.state(), CaptureState::Preview);
    }

    #[test]
    fn only_start_leaves_preview_for_collecting() {
        for command in [
            OperatorCommand::Pause,
            OperatorCommand::Resume,
            OperatorCommand::TogglePause,
        ] {
            let mut machine = CaptureMachine::new(10, 50);
            assert!(matches!(machine.apply(command), Transition::Ignored { .. }));
            assert_eq!(machine.state(), CaptureState::Preview);
        }

        let mut machine = CaptureMachine::new(10, 50);
        assert_eq!(
            machine.apply(OperatorCommand::Start),
            Transition::Moved {
                from: CaptureState::Preview,
                to: CaptureState::Collecting
            }
        );
    }

    #[test]
    fn pause_and_resume() {
        let mut machine = CaptureMachine::new(10, 50);
        machine.apply(OperatorCommand::Start);
        machine.apply(OperatorCommand::Pause);
        assert_eq!(machine.state(), CaptureState::Paused);
        assert!(matches!(
            machine.apply(OperatorCommand::Start),
            Transition::Ignored { .. }
        ));
        machine.apply(OperatorCommand::Resume);
        assert_eq!(machine.state(), CaptureState::Collecting);

        machine.apply(OperatorCommand::TogglePause);
        assert_eq!(machine.state(), CaptureState::Paused);
        machine.apply(OperatorCommand::TogglePause);
        assert_eq!(machine.state(), CaptureState::Collecting);
    }

    #[test]
    fn quit_and_skip_abort_from_any_live_state() {
        for setup in [
            &[][..],
            &[OperatorCommand::Start][..],
            &[OperatorCommand::Start, OperatorCommand::Pause][..],
        ] {
            for (command, reason) in [
                (OperatorCommand::Quit, AbortReason::Quit),
                (OperatorCommand::Skip, AbortReason::Skip),
            ] {
                let mut machine = CaptureMachine::new(10, 50);
                for step in setup {
                    machine.apply(*step);
                }
                machine.apply(command);
                assert_eq!(machine.state(), CaptureState::Aborted(reason));
                assert!(machine.is_finished());
            }
        }
    }

    #[test]
    fn quit_while_collecting_ignores_pending_target() {
        let mut machine = CaptureMachine::new(3, 50);
        machine.apply(OperatorCommand::Start);
        assert_eq!(machine.evaluate(&report(100)), FrameVerdict::Eligible);
        machine.record_accepted();
        machine.apply(OperatorCommand::Quit);

        assert_eq!(machine.state(), CaptureState::Aborted(AbortReason::Quit));
        assert_eq!(machine.accepted(), 1);
    }

    #[test]
    fn frames_outside_collecting_are_only_observed() {
        let mut machine = CaptureMachine::new(3, 0);
        assert_eq!(machine.evaluate(&report(100)), FrameVerdict::Observed);
        machine.apply(OperatorCommand::Start);
        machine.apply(OperatorCommand::Pause);
        assert_eq!(machine.evaluate(&report(100)), FrameVerdict::Observed);
        assert!(!machine.record_accepted());
        assert_eq!(machine.accepted(), 0);
        assert_eq!(machine.frames(), 2);
    }

    #[test]
    fn threshold_gates_eligibility() {
        let mut machine = CaptureMachine::new(5, 50);
        machine.apply(OperatorCommand::Start);
        assert_eq!(machine.evaluate(&report(25)), FrameVerdict::BelowThreshold);
        assert_eq!(machine.evaluate(&report(50)), FrameVerdict::Eligible);
        assert_eq!(machine.low_quality(), 1);
    }

    #[test]
    fn reaching_target_is_done_and_stops_counting() {
        let mut machine = CaptureMachine::new(2, 50);
        machine.apply(OperatorCommand::Start);
        assert!(!machine.record_accepted());
        assert!(machine.record_accepted());
        assert_eq!(machine.state(), CaptureState::Done);

        assert_eq!(machine.evaluate(&report(100)), FrameVerdict::Observed);
        assert!(!machine.record_accepted());
        assert_eq!(machine.accepted(), 2);
        assert!(matches!(
            machine.apply(OperatorCommand::Quit),
            Transition::Ignored { .. }
        ));
    }

    #[test]
    fn zero_target_is_immediately_done() {
        let machine = CaptureMachine::new(0, 50);
        assert_eq!(machine.state(), CaptureState::Done);
    }
}
