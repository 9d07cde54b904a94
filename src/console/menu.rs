use anyhow::Result;
use std::io::Write;

use crate::models::error::validate_contributor;
use crate::models::{Category, ConfigError, WorkItem};
use crate::planner::SessionRequest;
use crate::session::ItemDecision;

use super::input::InputChannel;

/// Top-level menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Collect(SessionRequest),
    Statistics,
}

impl MenuChoice {
    /// Options 1-4 pick a session; option 5 shows statistics.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim() {
            "1" => Ok(MenuChoice::Collect(SessionRequest::Balanced)),
            "2" => Ok(MenuChoice::Collect(SessionRequest::Single(Category::GoodPosture))),
            "3" => Ok(MenuChoice::Collect(SessionRequest::Validation)),
            "4" => Ok(MenuChoice::Collect(SessionRequest::Debug)),
            "5" => Ok(MenuChoice::Statistics),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

fn prompt(input: &InputChannel, out: &mut dyn Write, question: &str) -> Result<Option<String>> {
    input.discard_pending();
    write!(out, "{question}")?;
    out.flush()?;
    Ok(input.read_line())
}

/// Ask until a valid contributor id is given. `None` when input closes.
pub fn ask_contributor(input: &InputChannel, out: &mut dyn Write) -> Result<Option<String>> {
    loop {
        let Some(line) = prompt(input, out, "\nEnter username for this data collection session: ")?
        else {
            return Ok(None);
        };
        match validate_contributor(&line) {
            Ok(id) => return Ok(Some(id)),
            Err(err) => writeln!(out, "{err}. Please enter a valid username.")?,
        }
    }
}

pub fn ask_menu(input: &InputChannel, out: &mut dyn Write) -> Result<Option<MenuChoice>> {
    writeln!(out, "\nSESSION OPTIONS:")?;
    writeln!(out, "1. Balanced collection session (recommended)")?;
    writeln!(out, "2. Collect specific class data")?;
    writeln!(out, "3. Quick validation session")?;
    writeln!(out, "4. Debug mode (low quality threshold)")?;
    writeln!(out, "5. Show detailed dataset statistics")?;
    loop {
        let Some(line) = prompt(input, out, "Choose option (1-5): ")? else {
            return Ok(None);
        };
        match MenuChoice::parse(&line) {
            Ok(choice) => return Ok(Some(choice)),
            Err(err) => writeln!(out, "{err}")?,
        }
    }
}

/// List categories with the contributor's counts and ask for one.
pub fn ask_category(
    input: &InputChannel,
    out: &mut dyn Write,
    counts: &[(Category, u64)],
    per_category: u32,
) -> Result<Option<Category>> {
    writeln!(out, "\nAvailable classes:")?;
    for (i, (category, have)) in counts.iter().enumerate() {
        writeln!(out, "  {}. {category} (you have {have}/{per_category})", i + 1)?;
    }
    let question = format!("Select class (1-{}): ", Category::COUNT);
    loop {
        let Some(line) = prompt(input, out, &question)? else {
            return Ok(None);
        };
        match Category::from_menu_choice(&line) {
            Ok(category) => return Ok(Some(category)),
            Err(err) => writeln!(out, "{err}")?,
        }
    }
}

pub fn parse_decision(raw: &str) -> Option<ItemDecision> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "y" | "yes" => Some(ItemDecision::Collect),
        "skip" | "s" => Some(ItemDecision::Skip),
        "n" | "no" => Some(ItemDecision::Stop),
        _ => None,
    }
}

/// Continue, skip or stop before a work item. Closed input stops the session.
pub fn ask_item_decision(
    input: &InputChannel,
    out: &mut dyn Write,
    item: &WorkItem,
    position: usize,
    total: usize,
) -> Result<ItemDecision> {
    writeln!(out, "\nNEXT CLASS ({position}/{total}): {}", item.category)?;
    writeln!(out, "Target: {} samples", item.target)?;
    loop {
        let Some(line) = prompt(input, out, "Continue with this class? (y/n/skip): ")? else {
            return Ok(ItemDecision::Stop);
        };
        match parse_decision(&line) {
            Some(decision) => return Ok(decision),
            None => writeln!(out, "Please answer y, n or skip.")?,
        }
    }
}

/// Yes/no question; anything but "n"/"no" counts as yes. Closed input is no.
pub fn ask_yes_no(input: &InputChannel, out: &mut dyn Write, question: &str) -> Result<bool> {
    let Some(line) = prompt(input, out, question)? else {
        return Ok(false);
    };
    Ok(!matches!(line.trim().to_ascii_lowercase().as_str(), "n" | "no"))
}

/// Block until Enter (or closed input).
pub fn wait_for_enter(input: &InputChannel, out: &mut dyn Write, message: &str) -> Result<()> {
    prompt(input, out, message)?;
    Ok(())
}
