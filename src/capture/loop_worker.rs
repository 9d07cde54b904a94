use anyhow::Result;
use serde::Serialize;

use crate::dataset::{encode, CategoryStore, Sample};
use crate::models::{Category, SessionMode, WorkItem};
use crate::sensing::Feed;

use super::quality::{self, QualityReport};
use super::state::{
    AbortReason, CaptureMachine, CaptureState, FrameVerdict, OperatorCommand, Transition,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Destination for accepted samples.
pub trait SampleSink {
    fn append(&mut self, sample: &Sample) -> Result<()>;
}

impl SampleSink for CategoryStore {
    fn append(&mut self, sample: &Sample) -> Result<()> {
        CategoryStore::append(self, sample)
    }
}

/// Operator side of the capture loop: commands in, live feedback out.
pub trait CaptureConsole {
    /// Latest command issued since the previous frame, if any.
    fn poll_command(&mut self) -> Option<OperatorCommand>;
    fn on_event(&mut self, event: &CaptureEvent<'_>);
}

#[derive(Debug, Clone, Copy)]
pub enum CaptureEvent<'a> {
    /// Emitted for every processed frame, whatever the state.
    Frame {
        item: &'a WorkItem,
        state: CaptureState,
        accepted: u32,
        threshold: u8,
        report: &'a QualityReport,
    },
    Saved {
        accepted: u32,
        target: u32,
        score: u8,
    },
    LowQuality {
        count: u64,
        report: &'a QualityReport,
    },
    Transition {
        from: CaptureState,
        to: CaptureState,
    },
    Ignored {
        hint: &'static str,
    },
    WriteFailed {
        error: &'a anyhow::Error,
    },
    SourceFailed {
        error: &'a anyhow::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureExit {
    /// Target reached.
    Completed,
    Quit,
    Skipped,
    /// The frame source failed or could not be opened.
    SourceFailed(String),
    /// The work item was never started (e.g. store schema mismatch).
    NotStarted(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutcome {
    pub category: Category,
    pub target: u32,
    pub accepted: u32,
    pub frames: u64,
    pub low_quality: u64,
    pub write_failures: u64,
    pub exit: CaptureExit,
}

impl CaptureOutcome {
    pub fn not_started(item: &WorkItem, exit: CaptureExit) -> Self {
        Self {
            category: item.category,
            target: item.target,
            accepted: 0,
            frames: 0,
            low_quality: 0,
            write_failures: 0,
            exit,
        }
    }

    pub fn is_short(&self) -> bool {
        self.accepted < self.target
    }

    /// Accepted samples as a percentage of processed frames.
    pub fn success_rate(&self) -> Option<f64> {
        (self.frames > 0).then(|| f64::from(self.accepted) / self.frames as f64 * 100.0)
    }
}

/// Fixed parameters for one capture run.
#[derive(Debug, Clone, Copy)]
pub struct CaptureContext<'a> {
    pub contributor: &'a str,
    pub mode: SessionMode,
    pub threshold: u8,
    /// Report rejected frames every N occurrences; 0 disables the report.
    pub low_quality_report_every: u64,
}

/// Acquire samples for one work item until the target is reached, the
/// operator quits or skips, or the frame source fails.
///
/// Each frame is read, scored and, if the machine is collecting and the
/// score passes, encoded and appended. The operator's command is applied
/// after the frame has been handled. A failed append drops that frame only.
pub fn run_capture(
    item: &WorkItem,
    ctx: &CaptureContext<'_>,
    feed: &mut Feed,
    sink: &mut dyn SampleSink,
    console: &mut dyn CaptureConsole,
) -> CaptureOutcome {
    let mut machine = CaptureMachine::new(item.target, ctx.threshold);
    let mut write_failures = 0u64;
    let mut source_error: Option<String> = None;

    log_info!(
        "capture started: {} target={} threshold={} mode={} contributor={}",
        item.category,
        item.target,
        ctx.threshold,
        ctx.mode,
        ctx.contributor
    );

    while !machine.is_finished() {
        let frame = match feed.source.read_frame() {
            Ok(frame) => frame,
            Err(err) => {
                log_error!(
                    "frame source failed during {} after {} frames: {err:#}",
                    item.category,
                    machine.frames()
                );
                console.on_event(&CaptureEvent::SourceFailed { error: &err });
                source_error = Some(format!("{err:#}"));
                break;
            }
        };

        let detection = feed.detector.detect(&frame).unwrap_or_else(|err| {
            log_warn!("detector failed on frame {}: {err:#}", frame.sequence);
            Default::default()
        });
        let report = quality::score(&detection);

        match machine.evaluate(&report) {
            FrameVerdict::Eligible => {
                let sample = encode(
                    item.category,
                    frame.captured_at,
                    ctx.contributor,
                    ctx.mode,
                    report.score,
                    &detection,
                );
                match sink.append(&sample) {
                    Ok(()) => {
                        let finished = machine.record_accepted();
                        console.on_event(&CaptureEvent::Saved {
                            accepted: machine.accepted(),
                            target: item.target,
                            score: report.score,
                        });
                        if finished {
                            console.on_event(&CaptureEvent::Transition {
                                from: CaptureState::Collecting,
                                to: CaptureState::Done,
                            });
                            break;
                        }
                    }
                    Err(err) => {
                        write_failures += 1;
                        log_error!("dropping frame {}: {err:#}", frame.sequence);
                        console.on_event(&CaptureEvent::WriteFailed { error: &err });
                    }
                }
            }
            FrameVerdict::BelowThreshold => {
                let count = machine.low_quality();
                if ctx.low_quality_report_every > 0 && count % ctx.low_quality_report_every == 0 {
                    console.on_event(&CaptureEvent::LowQuality {
                        count,
                        report: &report,
                    });
                }
            }
            FrameVerdict::Observed => {}
        }

        console.on_event(&CaptureEvent::Frame {
            item,
            state: machine.state(),
            accepted: machine.accepted(),
            threshold: ctx.threshold,
            report: &report,
        });

        if let Some(command) = console.poll_command() {
            match machine.apply(command) {
                Transition::Moved { from, to } => {
                    log_info!("{}: {:?} -> {:?}", item.category, from, to);
                    console.on_event(&CaptureEvent::Transition { from, to });
                }
                Transition::Ignored { hint, .. } => {
                    console.on_event(&CaptureEvent::Ignored { hint });
                }
            }
        }
    }

    let exit = match (machine.state(), source_error) {
        (CaptureState::Done, _) => CaptureExit::Completed,
        (CaptureState::Aborted(AbortReason::Quit), _) => CaptureExit::Quit,
        (CaptureState::Aborted(AbortReason::Skip), _) => CaptureExit::Skipped,
        (_, Some(error)) => CaptureExit::SourceFailed(error),
        (state, None) => CaptureExit::SourceFailed(format!("capture stopped in {state:?}")),
    };

    let outcome = CaptureOutcome {
        category: item.category,
        target: item.target,
        accepted: machine.accepted(),
        frames: machine.frames(),
        low_quality: machine.low_quality(),
        write_failures,
        exit,
    };
    log_info!(
        "capture finished: {} accepted={}/{} frames={} low_quality={} write_failures={} exit={:?}",
        outcome.category,
        outcome.accepted,
        outcome.target,
        outcome.frames,
        outcome.low_quality,
        outcome.write_failures,
        outcome.exit
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Detection, Landmark};
    use crate::sensing::{Frame, FrameSource, LandmarkDetector};
    use anyhow::bail;
    use std::collections::HashMap;

    /// Frames carry a presence mask in their first payload byte.
    struct ScriptedSource {
        masks: Vec<u8>,
        next: usize,
    }

    impl FrameSource for ScriptedSource {
        fn read_frame(&mut self) -> Result<Frame> {
            let Some(mask) = self.masks.get(self.next).copied() else {
                bail!("camera unplugged");
            };
            self.next += 1;
            Ok(Frame::new(self.next as u64, vec![mask]))
        }
    }

    struct MaskDetector;

    impl LandmarkDetector for MaskDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Detection> {
            let mask = frame.payload[0];
            let group = |bit: u8, n: usize| {
                (mask & bit != 0).then(|| vec![Landmark::new(0.5, 0.5, 0.0, 1.0); n])
            };
            Ok(Detection {
                pose: group(1, 33),
                face: group(2, 478),
                left_hand: group(4, 21),
                right_hand: group(8, 21),
            })
        }
    }

    fn feed(masks: Vec<u8>) -> Feed {
        Feed::new(
            Box::new(ScriptedSource { masks, next: 0 }),
            Box::new(MaskDetector),
        )
    }

    #[derive(Default)]
    struct MemorySink {
        samples: Vec<Sample>,
        fail_on: Vec<usize>,
        calls: usize,
    }

    impl SampleSink for MemorySink {
        fn append(&mut self, sample: &Sample) -> Result<()> {
            self.calls += 1;
            if self.fail_on.contains(&self.calls) {
                bail!("disk full");
            }
            self.samples.push(sample.clone());
            Ok(())
        }
    }

    /// Commands keyed by 1-based frame number.
    #[derive(Default)]
    struct ScriptedConsole {
        commands: HashMap<u64, OperatorCommand>,
        frame: u64,
        saved: Vec<u32>,
        ignored: usize,
        low_quality_reports: Vec<u64>,
    }

    impl ScriptedConsole {
        fn with(commands: &[(u64, OperatorCommand)]) -> Self {
            Self {
                commands: commands.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    impl CaptureConsole for ScriptedConsole {
        fn poll_command(&mut self) -> Option<OperatorCommand> {
            self.commands.get(&self.frame).copied()
        }

        fn on_event(&mut self, event: &CaptureEvent<'_>) {
            match event {
                CaptureEvent::Frame { .. } => self.frame += 1,
                CaptureEvent::Saved { accepted, .. } => self.saved.push(*accepted),
                CaptureEvent::Ignored { .. } => self.ignored += 1,
                CaptureEvent::LowQuality { count, .. } => self.low_quality_reports.push(*count),
                _ => {}
            }
        }
    }

    fn ctx(threshold: u8) -> CaptureContext<'static> {
        CaptureContext {
            contributor: "alice",
            mode: SessionMode::Validation,
            threshold,
            low_quality_report_every: 2,
        }
    }

    #[test]
    fn nothing_is_persisted_before_start() {
        let item = WorkItem::new(Category::GoodPosture, 3);
        let mut feed = feed(vec![15; 5]);
        let mut sink = MemorySink::default();
        let mut console = ScriptedConsole::default();

        let outcome = run_capture(&item, &ctx(50), &mut feed, &mut sink, &mut console);

        assert!(sink.samples.is_empty());
        assert_eq!(outcome.frames, 5);
        assert_eq!(outcome.accepted, 0);
        assert!(matches!(outcome.exit, CaptureExit::SourceFailed(_)));
    }

    #[test]
    fn stops_exactly_at_target() {
        let item = WorkItem::new(Category::Slouching, 3);
        let mut feed = feed(vec![15; 20]);
        let mut sink = MemorySink::default();
        let mut console = ScriptedConsole::with(&[(1, OperatorCommand::Start)]);

        let outcome = run_capture(&item, &ctx(50), &mut feed, &mut sink, &mut console);

        assert_eq!(outcome.exit, CaptureExit::Completed);
        assert_eq!(outcome.accepted, 3);
        assert_eq!(sink.samples.len(), 3);
        // Frame 1 starts collection; frames 2-4 are saved; nothing after.
        assert_eq!(outcome.frames, 4);
        assert_eq!(console.saved, vec![1, 2, 3]);
    }

    #[test]
    fn low_quality_frames_are_not_persisted() {
        let item = WorkItem::new(Category::HeadDown, 2);
        // 1 = pose only (25), 3 = pose + face (50).
        let mut feed = feed(vec![0, 1, 1, 3, 1, 1, 3]);
        let mut sink = MemorySink::default();
        let mut console = ScriptedConsole::with(&[(1, OperatorCommand::Start)]);

        let outcome = run_capture(&item, &ctx(50), &mut feed, &mut sink, &mut console);

        assert_eq!(outcome.exit, CaptureExit::Completed);
        assert_eq!(outcome.low_quality, 4);
        assert_eq!(console.low_quality_reports, vec![2, 4]);
        assert!(sink.samples.iter().all(|s| s.score == 50));
    }

    #[test]
    fn relaxed_threshold_accepts_single_group() {
        let item = WorkItem::new(Category::GoodPosture, 2);
        let mut feed = feed(vec![0, 1, 1]);
        let mut sink = MemorySink::default();
        let mut console = ScriptedConsole::with(&[(1, OperatorCommand::Start)]);

        let outcome = run_capture(&item, &ctx(25), &mut feed, &mut sink, &mut console);
        assert_eq!(outcome.exit, CaptureExit::Completed);
        assert_eq!(outcome.low_quality, 0);
    }

    #[test]
    fn paused_frames_are_observed_only() {
        let item = WorkItem::new(Category::LeaningBack, 10);
        let mut feed = feed(vec![15; 8]);
        let mut sink = MemorySink::default();
        let mut console = ScriptedConsole::with(&[
            (1, OperatorCommand::Start),
            (3, OperatorCommand::TogglePause),
            (6, OperatorCommand::TogglePause),
        ]);

        let outcome = run_capture(&item, &ctx(50), &mut feed, &mut sink, &mut console);

        // Saved on frames 2, 3, 7, 8.
        assert_eq!(outcome.accepted, 4);
        assert_eq!(outcome.frames, 8);
        assert!(matches!(outcome.exit, CaptureExit::SourceFailed(_)));
    }

    #[test]
    fn quit_aborts_with_partial_count() {
        let item = WorkItem::new(Category::ForwardHead, 10);
        let mut feed = feed(vec![15; 10]);
        let mut sink = MemorySink::default();
        let mut console = ScriptedConsole::with(&[
            (1, OperatorCommand::Start),
            (3, OperatorCommand::Quit),
        ]);

        let outcome = run_capture(&item, &ctx(50), &mut feed, &mut sink, &mut console);

        assert_eq!(outcome.exit, CaptureExit::Quit);
        assert_eq!(outcome.accepted, 2);
        assert_eq!(outcome.frames, 3);
    }

    #[test]
    fn skip_from_preview() {
        let item = WorkItem::new(Category::ForwardHead, 10);
        let mut feed = feed(vec![15; 10]);
        let mut sink = MemorySink::default();
        let mut console = ScriptedConsole::with(&[
            (1, OperatorCommand::Pause),
            (2, OperatorCommand::Skip),
        ]);

        let outcome = run_capture(&item, &ctx(50), &mut feed, &mut sink, &mut console);

        assert_eq!(outcome.exit, CaptureExit::Skipped);
        assert_eq!(outcome.accepted, 0);
        assert_eq!(console.ignored, 1);
    }

    #[test]
    fn write_failure_drops_one_frame_and_continues() {
        let item = WorkItem::new(Category::Slouching, 3);
        let mut feed = feed(vec![15; 10]);
        let mut sink = MemorySink {
            fail_on: vec![2],
            ..MemorySink::default()
        };
        let mut console = ScriptedConsole::with(&[(1, OperatorCommand::Start)]);

        let outcome = run_capture(&item, &ctx(50), &mut feed, &mut sink, &mut console);

        assert_eq!(outcome.exit, CaptureExit::Completed);
        assert_eq!(outcome.accepted, 3);
        assert_eq!(outcome.write_failures, 1);
        assert_eq!(outcome.frames, 5);
    }

    #[test]
    fn source_failure_keeps_partial_progress() {
        let item = WorkItem::new(Category::NervousExpression, 10);
        let mut feed = feed(vec![15; 4]);
        let mut sink = MemorySink::default();
        let mut console = ScriptedConsole::with(&[(1, OperatorCommand::Start)]);

        let outcome = run_capture(&item, &ctx(50), &mut feed, &mut sink, &mut console);

        assert_eq!(outcome.accepted, 3);
        assert!(outcome.is_short());
        match outcome.exit {
            CaptureExit::SourceFailed(message) => assert!(message.contains("unplugged")),
            other => panic!("unexpected exit {other:?}"),
        }
    }

    #[test]
    fn samples_carry_session_metadata() {
        let item = WorkItem::new(Category::FidgetingHands, 1);
        let mut feed = feed(vec![0, 5]);
        let mut sink = MemorySink::default();
        let mut console = ScriptedConsole::with(&[(1, OperatorCommand::Start)]);

        run_capture(&item, &ctx(50), &mut feed, &mut sink, &mut console);

        let sample = &sink.samples[0];
        assert_eq!(sample.category, Category::FidgetingHands);
        assert_eq!(sample.contributor, "alice");
        assert_eq!(sample.mode, SessionMode::Validation);
        assert_eq!(sample.score, 50);
    }
}
