use colored::Colorize;

pub mod ai;
pub mod explore;
pub mod filter;
pub mod health;
pub mod map;
pub mod model;
pub mod planner;
pub mod report;
pub mod session;
pub mod url_identity;

pub use explore::{
    Choice, DoneReason, ExplorationOutcome, ExplorationSummary, ExploreError, ExploreEvent,
    ExploreProgressCallback, Explorer, LinkSource, Operator, parse_choice,
};
pub use filter::NavigationFilter;
pub use map::{DEFAULT_MAP_FILE, MapStore};
pub use model::{ExplorationMap, ExploredPage, Link, LinkKind};
pub use session::{ExploreOptions, execute_exploration};

pub fn print_banner() {
    let banner = r#"
     _ _                      _ _
 ___(_) |_ _____      ____ _| | | __
/ __| | __/ _ \ \ /\ / / _` | | |/ /
\__ \ | ||  __/\ V  V / (_| | |   <
|___/_|\__\___| \_/\_/ \__,_|_|_|\_\
"#;
    println!("{}", banner.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "interactive web app explorer".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
