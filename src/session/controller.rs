use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::capture::{
    run_capture, CaptureConsole, CaptureContext, CaptureExit, CaptureOutcome,
};
use crate::dataset::CategoryStore;
use crate::models::{SessionMode, WorkItem};
use crate::planner::SessionPlan;
use crate::sensing::Feed;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Operator's answer before a work item starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDecision {
    Collect,
    Skip,
    Stop,
}

/// Console capabilities needed to drive a whole session.
pub trait SessionConsole: CaptureConsole {
    fn confirm_item(&mut self, item: &WorkItem, position: usize, total: usize) -> ItemDecision;
    /// Called once the item is confirmed, before the feed opens.
    fn announce_item(&mut self, item: &WorkItem, contributor: &str, threshold: u8);
    fn report_outcome(&mut self, outcome: &CaptureOutcome);
    /// Whether to carry on after an item ended short of its target.
    fn continue_after_shortfall(&mut self, outcome: &CaptureOutcome) -> bool;
}

/// One interactive run for a single contributor and mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub contributor: String,
    pub mode: SessionMode,
    pub quality_threshold: u8,
    pub items: Vec<WorkItem>,
    pub started_at: DateTime<Local>,
    pub accepted_total: u64,
    pub outcomes: Vec<CaptureOutcome>,
    pub stopped_early: bool,
}

impl Session {
    pub fn new(contributor: &str, plan: SessionPlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            contributor: contributor.to_string(),
            mode: plan.mode,
            quality_threshold: plan.quality_threshold,
            items: plan.items,
            started_at: Local::now(),
            accepted_total: 0,
            outcomes: Vec::new(),
            stopped_early: false,
        }
    }

    fn record(&mut self, outcome: CaptureOutcome) {
        self.accepted_total += u64::from(outcome.accepted);
        self.outcomes.push(outcome);
    }
}

/// Execute every work item of `session` in order.
///
/// `open_feed` is called once per item; failing to open counts as a frame
/// source failure for that item only. Quit ends the session, skip moves to
/// the next item, and any other shortfall asks the operator whether to go on.
pub fn run_session<C, F>(
    session: &mut Session,
    dataset_dir: &Path,
    low_quality_report_every: u64,
    mut open_feed: F,
    console: &mut C,
) where
    C: SessionConsole,
    F: FnMut(&WorkItem) -> Result<Feed>,
{
    log_info!(
        "session {} started: contributor={} mode={} items={}",
        session.id,
        session.contributor,
        session.mode,
        session.items.len()
    );

    let items = session.items.clone();
    let total = items.len();

    for (position, item) in items.iter().enumerate() {
        match console.confirm_item(item, position + 1, total) {
            ItemDecision::Collect => {}
            ItemDecision::Skip => {
                log_info!("session {}: operator skipped {}", session.id, item.category);
                continue;
            }
            ItemDecision::Stop => {
                session.stopped_early = true;
                break;
            }
        }

        let mut store = CategoryStore::new(dataset_dir, item.category);
        let outcome = match store.verify_schema() {
            Err(err) => {
                log_error!("session {}: not collecting {}: {err:#}", session.id, item.category);
                CaptureOutcome::not_started(item, CaptureExit::NotStarted(format!("{err:#}")))
            }
            Ok(()) => {
                console.announce_item(item, &session.contributor, session.quality_threshold);
                match open_feed(item) {
                    Err(err) => {
                        log_error!("session {}: could not open feed: {err:#}", session.id);
                        CaptureOutcome::not_started(
                            item,
                            CaptureExit::SourceFailed(format!("{err:#}")),
                        )
                    }
                    Ok(mut feed) => {
                        let ctx = CaptureContext {
                            contributor: &session.contributor,
                            mode: session.mode,
                            threshold: session.quality_threshold,
                            low_quality_report_every,
                        };
                        run_capture(item, &ctx, &mut feed, &mut store, console)
                    }
                }
            }
        };

        console.report_outcome(&outcome);
        let quit = outcome.exit == CaptureExit::Quit;
        let ask_to_continue = matches!(
            outcome.exit,
            CaptureExit::SourceFailed(_) | CaptureExit::NotStarted(_)
        ) && outcome.is_short()
            && position + 1 < total;
        let carry_on = !ask_to_continue || console.continue_after_shortfall(&outcome);
        session.record(outcome);

        if quit || !carry_on {
            session.stopped_early = true;
            break;
        }
    }

    log_info!(
        "session {} finished: accepted={} items_run={} stopped_early={}",
        session.id,
        session.accepted_total,
        session.outcomes.len(),
        session.stopped_early
    );
}
