pub mod capture;
pub mod console;
pub mod dataset;
pub mod models;
pub mod planner;
pub mod sensing;
pub mod session;
pub mod settings;
pub mod utils;

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use console::report::{self, RULE};
use console::{Console, InputChannel, MenuChoice};
use dataset::DatasetSnapshot;
use models::error::validate_contributor;
use models::{Category, WorkItem};
use planner::{plan_session, SessionRequest};
use sensing::Feed;
use session::{run_session, Session};
use settings::{CollectorSettings, FeedSpec, SettingsStore};

/// Startup options resolved from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dataset_dir: PathBuf,
    pub settings_path: Option<PathBuf>,
    /// Replaces the feed from the settings file for this run.
    pub feed: Option<FeedSpec>,
    /// Use random detections, keeping a configured synthetic generator.
    pub synthetic: bool,
    pub debug_category: Option<Category>,
    pub contributor: Option<String>,
    pub write_settings: bool,
}

pub fn run(options: RunOptions) -> Result<()> {
    log::info!("Posture collector starting up...");

    std::fs::create_dir_all(&options.dataset_dir).with_context(|| {
        format!(
            "failed to create dataset directory {}",
            options.dataset_dir.display()
        )
    })?;

    let settings = resolve_settings(&options)?;

    let mut console = Console::stdio(InputChannel::spawn_stdin()?);
    let frame_interval = Duration::from_millis(settings.frame_interval_ms);
    let feed_spec = settings.feed.clone();

    collect(
        &options.dataset_dir,
        &settings,
        options.contributor.as_deref(),
        &mut console,
        |_item: &WorkItem| sensing::open_feed(&feed_spec, frame_interval),
    )?;
    Ok(())
}

/// Load the settings file and apply the command-line overrides, saving the
/// result when asked to.
pub fn resolve_settings(options: &RunOptions) -> Result<CollectorSettings> {
    let settings_path = options
        .settings_path
        .clone()
        .unwrap_or_else(|| SettingsStore::default_path(&options.dataset_dir));
    let mut store = SettingsStore::new(settings_path)?;
    if let Some(feed) = options.feed.clone() {
        store.settings_mut().feed = feed;
    } else if options.synthetic {
        store.settings_mut().use_synthetic_feed();
    }
    if let Some(category) = options.debug_category {
        store.settings_mut().debug_category = category;
    }
    if options.write_settings {
        store.persist()?;
        log::info!("settings written to {}", store.path().display());
    }
    Ok(store.into_settings())
}

/// The interactive flow: identify the contributor, pick a session from the
/// menu, run it and report. Returns the finished session, or `None` when
/// the operator left before one started.
pub fn collect<W, F>(
    dataset_dir: &Path,
    settings: &CollectorSettings,
    contributor: Option<&str>,
    console: &mut Console<W>,
    open_feed: F,
) -> Result<Option<Session>>
where
    W: Write,
    F: FnMut(&WorkItem) -> Result<Feed>,
{
    let targets = &settings.targets;
    console.line(RULE);
    console.line("POSTURE DATASET COLLECTOR");
    console.line(&format!(
        "Target: {} samples per user ({} per class)",
        targets.per_contributor, targets.per_category
    ));
    console.line(&format!("Project Goal: {} total samples", targets.project));
    console.line(RULE);

    let preset = match contributor.map(validate_contributor) {
        Some(Ok(id)) => Some(id),
        Some(Err(err)) => {
            console.line(&format!("{err}"));
            None
        }
        None => None,
    };
    let contributor = match preset {
        Some(id) => id,
        None => match console.ask_contributor()? {
            Some(id) => id,
            None => return Ok(None),
        },
    };
    console.line(&format!("\nWelcome, {contributor}!"));
    console.line(&format!(
        "You'll be collecting {} samples total",
        targets.per_contributor
    ));

    let (request, progress) = loop {
        let snapshot = DatasetSnapshot::scan(dataset_dir);
        let progress = snapshot.progress_for(&contributor);
        console.print(&report::format_dataset_status(&progress, &snapshot, targets));

        match console.ask_menu()? {
            None => return Ok(None),
            Some(MenuChoice::Statistics) => {
                console.print(&report::format_statistics(&snapshot));
                console.wait_for_enter("\nPress Enter to continue...")?;
            }
            Some(MenuChoice::Collect(SessionRequest::Single(_))) => {
                let counts: Vec<_> = progress
                    .categories
                    .iter()
                    .map(|c| (c.category, c.contributor_count))
                    .collect();
                match console.ask_category(&counts, targets.per_category)? {
                    Some(category) => break (SessionRequest::Single(category), progress),
                    None => return Ok(None),
                }
            }
            Some(MenuChoice::Collect(request)) => break (request, progress),
        }
    };

    let plan = plan_session(request, &progress, settings);
    if request == SessionRequest::Balanced {
        if plan.is_complete() {
            console.line("\nYou've completed all your targets! Great job!");
            return Ok(None);
        }
        console.print(&report::format_balanced_plan(&plan, &progress, targets));
    }

    let mut session = Session::new(&contributor, plan);
    console.line(&format!(
        "\nSTARTING {} SESSION",
        session.mode.as_str().to_uppercase()
    ));
    console.line(&format!("User: {contributor}"));
    console.line(&format!(
        "Date: {}",
        session.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    console.line(RULE);
    console.line("The feed opens in PREVIEW mode. Press Enter when you are ready to collect.");
    console.line(RULE);

    run_session(
        &mut session,
        dataset_dir,
        settings.low_quality_report_every,
        open_feed,
        console,
    );

    console.print(&report::format_session_summary(&session));
    console.line("Updated dataset status:");
    let snapshot = DatasetSnapshot::scan(dataset_dir);
    let refreshed = snapshot.progress_for(&contributor);
    console.print(&report::format_dataset_status(&refreshed, &snapshot, targets));

    match serde_json::to_string(&session) {
        Ok(json) => log::debug!("session record: {json}"),
        Err(err) => log::warn!("could not serialise session {}: {err}", session.id),
    }
    Ok(Some(session))
}
