//! Frame and landmark collaborators consumed by the capture loop.
//!
//! A camera plus a holistic landmark model would implement [`FrameSource`]
//! and [`LandmarkDetector`]. The crate ships two feeds: a JSON-lines replay of
//! detections produced by an external landmarker, and a synthetic feed for
//! exercising the pipeline without hardware.

pub mod replay;
pub mod synthetic;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::thread;
use std::time::{Duration, Instant};

use crate::models::Detection;
use crate::settings::FeedSpec;

pub use replay::{ReplayDetector, ReplaySource};
pub use synthetic::{SyntheticCamera, SyntheticDetector};

/// One frame handed from the source to the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub sequence: u64,
    /// Local wall-clock time the frame was read.
    pub captured_at: NaiveDateTime,
    /// Source-specific bytes; opaque to the capture loop.
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(sequence: u64, payload: Vec<u8>) -> Self {
        Self {
            sequence,
            captured_at: Local::now().naive_local(),
            payload,
        }
    }
}

pub trait FrameSource {
    /// Block until the next frame. An error ends the current capture loop.
    fn read_frame(&mut self) -> Result<Frame>;
}

pub trait LandmarkDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Detection>;
}

/// A source paired with the detector that understands its frames.
pub struct Feed {
    pub source: Box<dyn FrameSource>,
    pub detector: Box<dyn LandmarkDetector>,
}

impl Feed {
    pub fn new(source: Box<dyn FrameSource>, detector: Box<dyn LandmarkDetector>) -> Self {
        Self { source, detector }
    }
}

/// Open the feed described by `spec`. Sources that are not paced by hardware
/// deliver at most one frame per `frame_interval`.
pub fn open_feed(spec: &FeedSpec, frame_interval: Duration) -> Result<Feed> {
    let feed = match spec {
        FeedSpec::Synthetic { presence, seed } => Feed::new(
            Box::new(SyntheticCamera::new(frame_interval)),
            Box::new(SyntheticDetector::new(*presence, *seed)),
        ),
        FeedSpec::File { path } => Feed::new(
            Box::new(ReplaySource::from_path(path, frame_interval)?),
            Box::new(ReplayDetector),
        ),
        FeedSpec::Command { program, args } => Feed::new(
            Box::new(ReplaySource::from_command(program, args, frame_interval)?),
            Box::new(ReplayDetector),
        ),
    };
    Ok(feed)
}

/// Spaces successive frames at least `interval` apart.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}
