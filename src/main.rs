use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use posture_collector_lib::models::Category;
use posture_collector_lib::settings::FeedSpec;
use posture_collector_lib::{run, utils, RunOptions};

/// Collect posture landmark samples into per-class CSV stores.
#[derive(Parser, Debug)]
#[command(name = "posture-collector", version, about)]
struct Cli {
    /// Directory holding the per-class stores and the settings file.
    #[arg(default_value = ".")]
    dataset_dir: PathBuf,

    /// Settings file to use instead of <DATASET_DIR>/collector_settings.json.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Replay JSON-lines detections from a file.
    #[arg(long, conflicts_with_all = ["feed_cmd", "synthetic"])]
    feed_file: Option<PathBuf>,

    /// Read JSON-lines detections from an external landmarker's stdout.
    #[arg(
        long,
        num_args = 1..,
        allow_hyphen_values = true,
        value_name = "PROGRAM [ARGS]...",
        conflicts_with = "synthetic"
    )]
    feed_cmd: Option<Vec<String>>,

    /// Use random detections instead of a real feed.
    #[arg(long)]
    synthetic: bool,

    /// Class collected by debug sessions, e.g. Head_Down.
    #[arg(long, value_name = "CLASS")]
    debug_category: Option<Category>,

    /// Skip the username prompt.
    #[arg(long, short = 'u')]
    contributor: Option<String>,

    /// Save the effective settings before starting.
    #[arg(long)]
    write_settings: bool,
}

impl Cli {
    fn feed(&self) -> Option<FeedSpec> {
        if let Some(path) = &self.feed_file {
            return Some(FeedSpec::File { path: path.clone() });
        }
        if let Some((program, args)) = self.feed_cmd.as_deref().and_then(|cmd| cmd.split_first()) {
            return Some(FeedSpec::Command {
                program: program.clone(),
                args: args.to_vec(),
            });
        }
        None
    }

    fn into_options(self) -> RunOptions {
        RunOptions {
            feed: self.feed(),
            synthetic: self.synthetic,
            debug_category: self.debug_category,
            dataset_dir: self.dataset_dir,
            settings_path: self.settings,
            contributor: self.contributor,
            write_settings: self.write_settings,
        }
    }
}

fn main() -> Result<()> {
    utils::init_logging();
    run(Cli::parse().into_options())
}
