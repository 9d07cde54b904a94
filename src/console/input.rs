use anyhow::{Context, Result};
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::capture::OperatorCommand;

const ENABLE_LOGS: bool = false;

use crate::log_info;

/// Map one line of operator input to a capture command. An empty line (just
/// Enter) starts collection.
pub fn parse_command(line: &str) -> Option<OperatorCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "start" => Some(OperatorCommand::Start),
        "p" => Some(OperatorCommand::TogglePause),
        "pause" => Some(OperatorCommand::Pause),
        "r" | "resume" => Some(OperatorCommand::Resume),
        "q" | "quit" => Some(OperatorCommand::Quit),
        "n" | "skip" | "next" => Some(OperatorCommand::Skip),
        _ => None,
    }
}

/// Operator input lines delivered over a channel, so the capture loop can
/// poll without blocking while menus can still wait for an answer.
pub struct InputChannel {
    lines: Receiver<String>,
}

impl InputChannel {
    /// Start a background thread that forwards stdin line by line.
    pub fn spawn_stdin() -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("collector-stdin".into())
            .spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                log_info!("stdin closed");
            })
            .context("failed to start stdin reader")?;
        Ok(Self { lines: rx })
    }

    pub fn from_receiver(lines: Receiver<String>) -> Self {
        Self { lines }
    }

    /// Block for the next line. `None` once input is closed.
    pub fn read_line(&self) -> Option<String> {
        self.lines.recv().ok()
    }

    /// Drop input typed before a prompt was shown.
    pub fn discard_pending(&self) {
        while self.lines.try_recv().is_ok() {}
    }

    /// Drain everything typed since the last poll; the last recognised
    /// command wins.
    pub fn poll_command(&self) -> Option<OperatorCommand> {
        let mut latest = None;
        loop {
            match self.lines.try_recv() {
                Ok(line) => {
                    if let Some(command) = parse_command(&line) {
                        latest = Some(command);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        latest
    }
}
