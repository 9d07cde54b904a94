//! Terminal front end: menus, prompts and the live capture status.

pub mod input;
pub mod menu;
pub mod report;

use anyhow::Result;
use std::io::{self, Write};

use crate::capture::{CaptureConsole, CaptureEvent, CaptureExit, CaptureOutcome, OperatorCommand};
use crate::models::{Category, WorkItem};
use crate::session::{ItemDecision, SessionConsole};

pub use input::{parse_command, InputChannel};
pub use menu::MenuChoice;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Interactive console over an [`InputChannel`] and any writer (stdout in
/// the binary).
pub struct Console<W: Write = io::Stdout> {
    input: InputChannel,
    out: W,
    contributor: String,
    /// A `\r` status line is currently on screen.
    status_open: bool,
}

impl Console<io::Stdout> {
    pub fn stdio(input: InputChannel) -> Self {
        Self::new(input, io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(input: InputChannel, out: W) -> Self {
        Self {
            input,
            out,
            contributor: String::new(),
            status_open: false,
        }
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    pub fn ask_contributor(&mut self) -> Result<Option<String>> {
        self.close_status();
        menu::ask_contributor(&self.input, &mut self.out)
    }

    pub fn ask_menu(&mut self) -> Result<Option<MenuChoice>> {
        self.close_status();
        menu::ask_menu(&self.input, &mut self.out)
    }

    pub fn ask_category(
        &mut self,
        counts: &[(Category, u64)],
        per_category: u32,
    ) -> Result<Option<Category>> {
        self.close_status();
        menu::ask_category(&self.input, &mut self.out, counts, per_category)
    }

    pub fn wait_for_enter(&mut self, message: &str) -> Result<()> {
        self.close_status();
        menu::wait_for_enter(&self.input, &mut self.out, message)
    }

    /// Print a block of text on its own lines.
    pub fn print(&mut self, text: &str) {
        self.close_status();
        if let Err(err) = write!(self.out, "{text}").and_then(|_| self.out.flush()) {
            log_warn!("console write failed: {err}");
        }
    }

    pub fn line(&mut self, text: &str) {
        self.print(&format!("{text}\n"));
    }

    fn close_status(&mut self) {
        if self.status_open {
            self.status_open = false;
            let _ = writeln!(self.out);
        }
    }

    fn status(&mut self, text: &str) {
        self.status_open = true;
        if let Err(err) = write!(self.out, "\r{text}").and_then(|_| self.out.flush()) {
            log_warn!("console write failed: {err}");
        }
    }
}

impl<W: Write> CaptureConsole for Console<W> {
    fn poll_command(&mut self) -> Option<OperatorCommand> {
        self.input.poll_command()
    }

    fn on_event(&mut self, event: &CaptureEvent<'_>) {
        match event {
            CaptureEvent::Frame {
                item,
                state,
                accepted,
                threshold,
                report: quality,
            } => {
                let text = report::format_status_line(
                    item,
                    *state,
                    *accepted,
                    quality.score,
                    *threshold,
                    &quality.presence,
                );
                self.status(&text);
            }
            CaptureEvent::Saved {
                accepted,
                target,
                score,
            } => {
                if accepted % 10 == 0 || accepted == target {
                    self.line(&format!("Saved {accepted}/{target} (quality {score}%)"));
                }
            }
            CaptureEvent::LowQuality {
                count,
                report: quality,
            } => self.line(&format!(
                "Low quality frames: {count} (latest {}%: {})",
                quality.score,
                report::format_presence(&quality.presence)
            )),
            CaptureEvent::Transition { to, .. } => {
                self.line(&format!("-> {}", to.label()));
            }
            CaptureEvent::Ignored { hint } => self.line(hint),
            CaptureEvent::WriteFailed { error } => {
                self.line(&format!("Could not save sample: {error:#}"));
            }
            CaptureEvent::SourceFailed { error } => {
                self.line(&format!("ERROR: frame source stopped: {error:#}"));
            }
        }
    }
}

impl<W: Write> SessionConsole for Console<W> {
    fn confirm_item(&mut self, item: &WorkItem, position: usize, total: usize) -> ItemDecision {
        self.close_status();
        match menu::ask_item_decision(&self.input, &mut self.out, item, position, total) {
            Ok(decision) => {
                match decision {
                    ItemDecision::Skip => self.line(&format!("Skipping {}", item.category)),
                    ItemDecision::Stop => self.line("Session terminated by user."),
                    ItemDecision::Collect => {}
                }
                decision
            }
            Err(err) => {
                log_warn!("console prompt failed: {err:#}");
                ItemDecision::Stop
            }
        }
    }

    fn announce_item(&mut self, item: &WorkItem, contributor: &str, threshold: u8) {
        self.contributor = contributor.to_string();
        self.print(&report::format_instructions(item.category));
        self.line(&format!("\nCAPTURE SETUP: {}", item.category));
        self.line(&format!("Target: {} samples", item.target));
        self.line(&format!("User: {contributor}"));
        self.line(&format!("Quality threshold: {threshold}%"));
        self.line("Commands: Enter=start  p=pause/resume  n=skip class  q=quit session");
        if let Err(err) = menu::wait_for_enter(
            &self.input,
            &mut self.out,
            "\nPress Enter to open the preview...",
        ) {
            log_warn!("console prompt failed: {err:#}");
        }
    }

    fn report_outcome(&mut self, outcome: &CaptureOutcome) {
        let contributor = self.contributor.clone();
        self.print(&report::format_outcome(outcome, &contributor));
    }

    fn continue_after_shortfall(&mut self, outcome: &CaptureOutcome) -> bool {
        self.close_status();
        if matches!(outcome.exit, CaptureExit::SourceFailed(_) | CaptureExit::NotStarted(_)) {
            self.line(&format!(
                "Only collected {}/{} samples for {}",
                outcome.accepted, outcome.target, outcome.category
            ));
        }
        match menu::ask_yes_no(
            &self.input,
            &mut self.out,
            "Continue to next class anyway? (y/n): ",
        ) {
            Ok(true) => true,
            Ok(false) => {
                self.line("Session terminated by user.");
                false
            }
            Err(err) => {
                log_warn!("console prompt failed: {err:#}");
                false
            }
        }
    }
}
