//! Plain-text renderings shown to the operator.

use std::fmt::Write as _;

use crate::capture::{CaptureExit, CaptureOutcome, CaptureState, Presence};
use crate::dataset::{ContributorProgress, DatasetSnapshot, StoreStatus};
use crate::models::{Category, WorkItem};
use crate::planner::SessionPlan;
use crate::session::Session;
use crate::settings::Targets;

pub const RULE: &str =
    "======================================================================";

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "YES"
    } else {
        "NO"
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn format_presence(presence: &Presence) -> String {
    format!(
        "Pose:{} Face:{} L.Hand:{} R.Hand:{}",
        yes_no(presence.pose),
        yes_no(presence.face),
        yes_no(presence.left_hand),
        yes_no(presence.right_hand)
    )
}

/// Single-line live status for the current frame.
pub fn format_status_line(
    item: &WorkItem,
    state: CaptureState,
    accepted: u32,
    score: u8,
    threshold: u8,
    presence: &Presence,
) -> String {
    let progress = percent(u64::from(accepted), u64::from(item.target));
    let head = match state {
        CaptureState::Preview => format!("PREVIEW {} | Enter = start", item.category),
        _ => format!(
            "{} {} | {}/{} ({progress:.1}%)",
            state.label(),
            item.category,
            accepted,
            item.target
        ),
    };
    format!(
        "{head} | Quality: {score}% (need >={threshold}%) | {}",
        format_presence(presence)
    )
}

/// Dataset status from one contributor's point of view.
pub fn format_dataset_status(
    progress: &ContributorProgress,
    snapshot: &DatasetSnapshot,
    targets: &Targets,
) -> String {
    let mut out = String::new();
    let per_category = u64::from(targets.per_category);
    let per_contributor = u64::from(targets.per_contributor);
    let who = &progress.contributor;

    let _ = writeln!(out, "\nCURRENT DATASET STATUS:");
    for count in &progress.categories {
        let line = match count.status {
            StoreStatus::Unreadable => format!("  {}: store unreadable (counted as 0)", count.category),
            _ => {
                let have = count.contributor_count;
                let status = if have >= per_category {
                    "Complete".to_string()
                } else {
                    format!("Need {} more", per_category - have)
                };
                format!("  {}: {have}/{per_category} for {who} ({status})", count.category)
            }
        };
        let _ = writeln!(out, "{line}");
    }

    let totals = snapshot.contributor_totals();
    let _ = writeln!(out, "\nUSER PROGRESS:");
    if totals.is_empty() {
        let _ = writeln!(out, "  (no samples yet)");
    }
    for (user, count) in &totals {
        let status = if *count >= per_contributor {
            "Complete".to_string()
        } else {
            format!("({:.1}%)", percent(*count, per_contributor))
        };
        let _ = writeln!(out, "  {user}: {count}/{per_contributor} samples {status}");
    }

    let _ = writeln!(
        out,
        "\nYOUR PROGRESS ({who}): {}/{per_contributor} samples",
        progress.contributor_total
    );

    let project = u64::from(targets.project);
    let _ = writeln!(out, "\nPROJECT PROGRESS:");
    let _ = writeln!(out, "  Total samples collected: {}", progress.project_total);
    let _ = writeln!(out, "  Project target: {project}");
    let _ = writeln!(
        out,
        "  Overall progress: {:.1}%",
        percent(progress.project_total, project)
    );
    let _ = writeln!(out, "  Active contributors: {} users", totals.len());

    if !progress.diagnostics.is_empty() {
        let _ = writeln!(out, "\nUNREADABLE STORES:");
        for diagnostic in &progress.diagnostics {
            let _ = writeln!(
                out,
                "  {} ({}): {}",
                diagnostic.category,
                diagnostic.path.display(),
                diagnostic.message
            );
        }
    }
    out
}

/// Contributor × category table with totals.
pub fn format_statistics(snapshot: &DatasetSnapshot) -> String {
    let mut out = String::new();
    let matrix = snapshot.matrix();
    let width = 15 + 9 * Category::COUNT + 5;

    let _ = writeln!(out, "\nSAMPLES BY USER AND CLASS:");
    let _ = write!(out, "{:<15}", "User");
    for category in Category::ALL {
        let short: String = category.as_str().chars().take(8).collect();
        let _ = write!(out, "{short:<9}");
    }
    let _ = writeln!(out, "Total");
    let _ = writeln!(out, "{}", "-".repeat(width));

    for (user, row) in &matrix {
        let _ = write!(out, "{user:<15}");
        for count in row {
            let _ = write!(out, "{count:<9}");
        }
        let _ = writeln!(out, "{}", row.iter().sum::<u64>());
    }

    let _ = writeln!(out, "{}", "-".repeat(width));
    let _ = write!(out, "{:<15}", "TOTAL");
    for store in &snapshot.stores {
        let _ = write!(out, "{:<9}", store.total);
    }
    let _ = writeln!(out, "{}", snapshot.project_total());
    out
}

/// Priority list shown before a balanced session.
pub fn format_balanced_plan(plan: &SessionPlan, progress: &ContributorProgress, targets: &Targets) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nYOUR PRIORITY CLASSES (most needed first):");
    for (i, item) in plan.items.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}: need {} more samples", i + 1, item.category, item.target);
    }
    let remaining = plan.total_target();
    let per_contributor = u64::from(targets.per_contributor);
    let _ = writeln!(
        out,
        "\nTotal remaining for {}: {remaining} samples",
        progress.contributor
    );
    let _ = writeln!(
        out,
        "Progress: {:.1}% complete",
        (100.0 - percent(remaining, per_contributor)).max(0.0)
    );
    out
}

pub fn format_instructions(category: Category) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nDETAILED INSTRUCTIONS FOR {category}:");
    let _ = writeln!(out, "{}", &RULE[..50]);
    for line in category.instructions() {
        let _ = writeln!(out, "  - {line}");
    }
    let _ = writeln!(out, "\nSETUP TIPS:");
    for tip in [
        "Take time to get into the correct posture",
        "Ensure good lighting on your face and upper body",
        "Keep hands visible when relevant to the pose",
        "Get comfortable - you'll hold this pose for several minutes",
        "The feed opens in PREVIEW mode first",
        "Press Enter only when you're properly positioned",
    ] {
        let _ = writeln!(out, "  - {tip}");
    }
    out
}

pub fn format_outcome(outcome: &CaptureOutcome, contributor: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nCOLLECTION SUMMARY FOR {} ({contributor}):",
        outcome.category
    );
    let _ = writeln!(out, "   High-quality samples saved: {}", outcome.accepted);
    let _ = writeln!(out, "   Total frames processed: {}", outcome.frames);
    let _ = writeln!(out, "   Low-quality frames skipped: {}", outcome.low_quality);
    if outcome.write_failures > 0 {
        let _ = writeln!(out, "   Samples dropped on write errors: {}", outcome.write_failures);
    }
    if let Some(rate) = outcome.success_rate() {
        let _ = writeln!(out, "   Success rate: {rate:.1}%");
    }
    let reason = match &outcome.exit {
        CaptureExit::Completed => "target reached".to_string(),
        CaptureExit::Quit => "quit by operator".to_string(),
        CaptureExit::Skipped => "skipped by operator".to_string(),
        CaptureExit::SourceFailed(error) => format!("frame source failed: {error}"),
        CaptureExit::NotStarted(error) => format!("not started: {error}"),
    };
    let _ = writeln!(out, "   Ended: {reason}");
    out
}

pub fn format_session_summary(session: &Session) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nSESSION COMPLETED!");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "User: {}", session.contributor);
    let _ = writeln!(out, "Mode: {}", session.mode);
    let _ = writeln!(
        out,
        "Total samples collected this session: {}",
        session.accepted_total
    );
    for outcome in &session.outcomes {
        let _ = writeln!(
            out,
            "  {}: {}/{}",
            outcome.category, outcome.accepted, outcome.target
        );
    }
    if session.stopped_early {
        let _ = writeln!(out, "Session ended before all classes were collected.");
    }
    let _ = writeln!(
        out,
        "Session started: {}",
        session.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "{RULE}");
    out
}
