use async_trait::async_trait;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sitewalk_core::ai::{AnthropicClient, ModelProfile};
use sitewalk_core::explore::QUIT_TOKENS;
use sitewalk_core::health::{ModelCheck, ModelStatus, check_models};
use sitewalk_core::report::{format_link_list, generate_status_report, generate_summary_report};
use sitewalk_core::{
    Choice, DoneReason, ExploreEvent, ExploreOptions, ExploreProgressCallback, Link, MapStore,
    Operator, execute_exploration, parse_choice,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

const CHECK_PAUSE: Duration = Duration::from_secs(1);
const NAVIGATION_PROMPT: &str = "? Which page to explore next? (Enter number or \"quit\"):";

// Helper functions for the explore handler

/// Only absolute http(s) URLs can be explored
pub fn check_start_url(url: &Url) -> Result<(), String> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!(
            "Invalid URL '{}': scheme '{}' is not supported, use http or https",
            url, other
        )),
    }
}

/// Expand `~` in a user supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// What each profile is used for by default
pub fn profile_role(profile: ModelProfile) -> &'static str {
    match profile {
        ModelProfile::Haiku => "navigation link filtering (default)",
        ModelProfile::Sonnet => "test case generation (default)",
        ModelProfile::Opus => "available for either role",
    }
}

pub fn format_model_table() -> String {
    let mut table = String::new();
    for profile in ModelProfile::ALL {
        table.push_str(&format!(
            "  {:<8} {:<20} {}\n",
            profile.as_str(),
            profile.family(),
            profile.model_id()
        ));
        table.push_str(&format!("  {:<8} {}\n", "", profile_role(profile)));
    }
    table
}

/// One result of `models --check`, without colors.
pub fn format_model_check(check: &ModelCheck) -> String {
    let latency = check.latency.as_millis();
    let mut line = format!(
        "{} ({}) - {}ms",
        check.profile.family(),
        check.profile.model_id(),
        latency
    );
    match &check.status {
        ModelStatus::Available { reply } => line.push_str(&format!(", replied \"{}\"", reply)),
        ModelStatus::Overloaded => line.push_str(", servers overloaded but the model is valid"),
        ModelStatus::Failed { reason } => line.push_str(&format!("\n    Error: {}", reason)),
    }
    line
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn init_tracing(verbose: bool) {
    let default_directives = if verbose {
        "warn,sitewalk=debug,sitewalk_core=debug,sitewalk_scanner=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Reads navigation choices from a line-oriented input, stdin by default.
pub struct ConsoleOperator<R> {
    reader: R,
}

impl ConsoleOperator<BufReader<Stdin>> {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
        }
    }
}

impl Default for ConsoleOperator<BufReader<Stdin>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ConsoleOperator<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn from_reader(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R> Operator for ConsoleOperator<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn choose(&mut self, links: &[Link]) -> Choice {
        println!("\n{}", "🔗 Available navigation links:".bright_white().bold());
        print!("{}", format_link_list(links));
        print!("\n{} ", NAVIGATION_PROMPT.bright_cyan().bold());
        let _ = io::stdout().flush();

        let mut answer = String::new();
        match self.reader.read_line(&mut answer).await {
            Ok(0) | Err(_) => {
                println!();
                return Choice::Quit;
            }
            Ok(_) => {}
        }

        let choice = parse_choice(&answer, links.len());
        let typed_quit = QUIT_TOKENS.contains(&answer.trim().to_lowercase().as_str());
        if choice == Choice::Quit && !typed_quit {
            println!(
                "{} Invalid choice. Please enter a valid number or \"quit\".",
                "✗".red().bold()
            );
        }
        choice
    }
}

/// Console feedback for engine events; a spinner runs while a page is analyzed.
fn progress_reporter() -> ExploreProgressCallback {
    let spinner: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));

    Arc::new(move |event: &ExploreEvent| {
        let Ok(mut slot) = spinner.lock() else {
            return;
        };
        match event {
            ExploreEvent::AnalysisStarted { url } => {
                println!("\n{} Analyzing: {}", "📋".bold(), url.bright_white());
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.cyan} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb.enable_steady_tick(Duration::from_millis(100));
                pb.set_message("Generating test cases and discovering links...");
                *slot = Some(pb);
            }
            ExploreEvent::AnalysisFinished { doc, links, .. } => {
                if let Some(pb) = slot.take() {
                    pb.finish_and_clear();
                }
                println!("{} Test cases generated: {}", "✓".green().bold(), doc);
                println!("{} Found {} navigation link(s)", "→".blue(), links);
            }
            ExploreEvent::AnalysisFailed { url, error } => {
                if let Some(pb) = slot.take() {
                    pb.finish_and_clear();
                }
                println!("{} Error analyzing page {}: {}", "✗".red().bold(), url, error);
                println!("{} Skipping to next page...", "→".yellow());
            }
            ExploreEvent::AlreadyExplored { url } => {
                println!("{} Page already explored: {}", "⏭".yellow(), url);
            }
            ExploreEvent::ShowingPending { count } => {
                println!(
                    "\n{} Found {} unexplored link(s) from previous pages.",
                    "📋".bold(),
                    count
                );
            }
        }
    })
}

pub async fn handle_explore(sub_matches: &ArgMatches) {
    init_tracing(sub_matches.get_flag("verbose"));

    let Some(url) = sub_matches.get_one::<Url>("URL") else {
        eprintln!("{} A start URL is required", "✗".red().bold());
        std::process::exit(1);
    };
    if let Err(e) = check_start_url(url) {
        eprintln!("{} {}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    let client = match AnthropicClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            eprintln!("  Set ANTHROPIC_API_KEY in your environment and try again.");
            std::process::exit(1);
        }
    };

    let mut options = ExploreOptions::new(url.as_str());
    if let Some(map_file) = sub_matches.get_one::<String>("map-file") {
        options.map_file = expand_path(map_file);
    }
    if let Some(docs_dir) = sub_matches.get_one::<String>("docs-dir") {
        options.docs_dir = expand_path(docs_dir);
    }
    if let Some(timeout) = sub_matches.get_one::<u64>("timeout") {
        options.timeout_secs = *timeout;
    }
    if let Some(profile) = parse_profile_arg(sub_matches, "filter-model") {
        options.filter_profile = profile;
    }
    if let Some(profile) = parse_profile_arg(sub_matches, "planner-model") {
        options.planner_profile = profile;
    }

    debug!("Explore options: {:?}", options);

    print_divider();
    println!("{}", "  🗺️  INTERACTIVE SITE EXPLORER".bright_white().bold());
    print_divider();
    println!("{} Start: {}", "→".blue(), url.as_str().bright_white());
    println!(
        "{} Map: {}",
        "→".blue(),
        options.map_file.display().to_string().bright_white()
    );
    println!(
        "{} Docs: {}",
        "→".blue(),
        options.docs_dir.display().to_string().bright_white()
    );
    println!(
        "{} Type \"quit\" at any prompt to end exploration",
        "ℹ".blue()
    );

    let mut operator = ConsoleOperator::new();
    match execute_exploration(options, Arc::new(client), &mut operator, Some(progress_reporter())).await {
        Ok(outcome) => {
            match outcome.reason {
                DoneReason::Quit => println!("\n{} Exploration ended by user.", "👋".bold()),
                DoneReason::Exhausted => {
                    println!("\n{} No more pages to explore.", "✓".green().bold())
                }
            }
            println!();
            println!("{}", generate_summary_report(&outcome.summary));
        }
        Err(e) => {
            eprintln!("{} Exploration failed: {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn parse_profile_arg(sub_matches: &ArgMatches, id: &str) -> Option<ModelProfile> {
    sub_matches
        .get_one::<String>(id)
        .and_then(|name| name.parse().ok())
}

pub fn handle_status(sub_matches: &ArgMatches) {
    let map_file = sub_matches
        .get_one::<String>("map-file")
        .map(|p| expand_path(p))
        .unwrap_or_else(|| PathBuf::from(sitewalk_core::DEFAULT_MAP_FILE));

    if !map_file.exists() {
        eprintln!(
            "{} No exploration map at {}",
            "✗".red().bold(),
            map_file.display().to_string().bright_white()
        );
        eprintln!("  Run `sitewalk explore <URL>` to start one.");
        std::process::exit(1);
    }

    let store = MapStore::load(&map_file);
    println!("{}", generate_status_report(&store));
}

pub async fn handle_models(sub_matches: &ArgMatches) {
    print_divider();
    println!("{}", "  MODEL PROFILES".bright_white().bold());
    print_divider();
    print!("{}", format_model_table());
    println!();

    if !sub_matches.get_flag("check") {
        println!(
            "{} Select with --filter-model and --planner-model, verify with --check",
            "ℹ".blue()
        );
        return;
    }

    let client = match AnthropicClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            eprintln!("  Set ANTHROPIC_API_KEY in your environment and try again.");
            std::process::exit(1);
        }
    };

    println!("{} Checking model availability...", "🔍".bold());
    let checks = check_models(&client, CHECK_PAUSE).await;

    for check in &checks {
        let marker = match check.status {
            ModelStatus::Available { .. } => "✓".green().bold(),
            ModelStatus::Overloaded => "!".yellow().bold(),
            ModelStatus::Failed { .. } => "✗".red().bold(),
        };
        println!("{} {}", marker, format_model_check(check));
    }

    let failed = checks.iter().filter(|c| !c.is_usable()).count();
    println!();
    if failed == 0 {
        println!("{} All models are valid and accessible", "✓".green().bold());
    } else {
        println!(
            "{} {} of {} model(s) failed",
            "✗".red().bold(),
            failed,
            checks.len()
        );
        std::process::exit(1);
    }
}
