// Wiring for a full exploration run against a live application

use crate::ai::{Completion, ModelProfile};
use crate::explore::{ExplorationOutcome, ExploreProgressCallback, Explorer, Operator};
use crate::filter::NavigationFilter;
use crate::map::{DEFAULT_MAP_FILE, MapStore};
use crate::planner::TestCasePlanner;
use anyhow::Result;
use sitewalk_scanner::Scanner;
use sitewalk_scanner::scanner::DEFAULT_TIMEOUT_SECS;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_DOCS_DIR: &str = "docs";

/// Options for an exploration run
#[derive(Debug, Clone)]
pub struct ExploreOptions {
    pub start_url: String,
    pub map_file: PathBuf,
    pub docs_dir: PathBuf,
    /// Page-load timeout in seconds.
    pub timeout_secs: u64,
    pub filter_profile: ModelProfile,
    pub planner_profile: ModelProfile,
}

impl ExploreOptions {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            map_file: PathBuf::from(DEFAULT_MAP_FILE),
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            filter_profile: ModelProfile::Haiku,
            planner_profile: ModelProfile::Sonnet,
        }
    }
}

/// Build the scanner, planner and filter for `options` and run one
/// interactive session to completion.
pub async fn execute_exploration(
    options: ExploreOptions,
    completion: Arc<dyn Completion>,
    operator: &mut dyn Operator,
    progress_callback: Option<ExploreProgressCallback>,
) -> Result<ExplorationOutcome> {
    let ExploreOptions {
        start_url,
        map_file,
        docs_dir,
        timeout_secs,
        filter_profile,
        planner_profile,
    } = options;

    let scanner = Scanner::with_timeout(timeout_secs)?;
    let planner = TestCasePlanner::new(completion.clone(), scanner.clone(), docs_dir)
        .with_profile(planner_profile);
    let filter = NavigationFilter::with_completion(completion, filter_profile);

    info!(
        "Exploring {} (map: {}, filter: {}, planner: {})",
        start_url,
        map_file.display(),
        filter_profile.model_id(),
        planner_profile.model_id()
    );

    let mut explorer = Explorer::new(
        MapStore::load(map_file),
        Arc::new(planner),
        Arc::new(scanner),
        filter,
    );
    if let Some(callback) = progress_callback {
        explorer = explorer.with_progress_callback(callback);
    }

    Ok(explorer.explore(&start_url, operator).await?)
}
