use anyhow::{anyhow, bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use crate::models::Detection;

use super::{Frame, FrameSource, LandmarkDetector, Pacer};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Reads one JSON detection record per line, either from a file or from the
/// stdout of an external landmarker process. Blank lines are skipped; end of
/// stream is a read failure.
pub struct ReplaySource {
    reader: Box<dyn BufRead>,
    child: Option<Child>,
    sequence: u64,
    pacer: Pacer,
}

impl ReplaySource {
    pub fn from_reader(reader: Box<dyn BufRead>, frame_interval: Duration) -> Self {
        Self {
            reader,
            child: None,
            sequence: 0,
            pacer: Pacer::new(frame_interval),
        }
    }

    pub fn from_path(path: &Path, frame_interval: Duration) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open landmark feed {}", path.display()))?;
        log_info!("replaying landmark feed from {}", path.display());
        Ok(Self::from_reader(Box::new(BufReader::new(file)), frame_interval))
    }

    /// Spawn `program` and read its stdout. The process is killed when the
    /// source is dropped.
    pub fn from_command(program: &str, args: &[String], frame_interval: Duration) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start landmarker '{program}'"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("landmarker '{program}' has no stdout"))?;
        log_info!("reading landmarks from '{program}' (pid {})", child.id());

        let mut source = Self::from_reader(Box::new(BufReader::new(stdout)), frame_interval);
        source.child = Some(child);
        Ok(source)
    }
}

impl FrameSource for ReplaySource {
    fn read_frame(&mut self) -> Result<Frame> {
        self.pacer.wait();
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .context("failed to read landmark feed")?;
            if read == 0 {
                bail!("landmark feed ended after {} frames", self.sequence);
            }
            if !line.trim().is_empty() {
                break;
            }
        }

        self.sequence += 1;
        Ok(Frame::new(self.sequence, line.trim_end().as_bytes().to_vec()))
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                log_warn!("failed to stop landmarker (pid {}): {err}", child.id());
            }
            let _ = child.wait();
        }
    }
}

/// Decodes the detection record carried in a [`ReplaySource`] frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayDetector;

impl LandmarkDetector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Detection> {
        serde_json::from_slice(&frame.payload)
            .with_context(|| format!("frame {} is not a detection record", frame.sequence))
    }
}
