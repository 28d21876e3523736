//! Interactive exploration engine.
//!
//! One page is analyzed at a time. Each analyzed page is merged into the
//! [`MapStore`] and persisted before the operator is asked where to go next,
//! so an interruption loses at most the page in flight.

use crate::filter::NavigationFilter;
use crate::map::{MapError, MapStore};
use crate::model::{ExploredPage, Link};
use crate::planner::PageAnalyzer;
use crate::url_identity::{canonicalize, screen_name};
use async_trait::async_trait;
use sitewalk_scanner::{RawLink, Scanner};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Tokens that end the session when typed at the prompt.
pub const QUIT_TOKENS: [&str; 3] = ["quit", "q", "exit"];

#[derive(Error, Debug)]
pub enum ExploreError {
    #[error("Invalid start URL '{0}': must be an absolute http(s) URL")]
    InvalidStartUrl(String),

    #[error(transparent)]
    Store(#[from] MapError),
}

pub type Result<T> = std::result::Result<T, ExploreError>;

/// Title and raw navigation candidates of one loaded page.
#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    pub title: String,
    pub raw_links: Vec<RawLink>,
}

/// Loads a page and extracts its raw navigation candidates.
#[async_trait]
pub trait LinkSource: Send + Sync {
    async fn discover(&self, url: &str) -> anyhow::Result<PageLinks>;
}

#[async_trait]
impl LinkSource for Scanner {
    async fn discover(&self, url: &str) -> anyhow::Result<PageLinks> {
        let (page, raw_links) = self.scan(url).await?;
        Ok(PageLinks {
            title: page.title,
            raw_links,
        })
    }
}

/// The operator's answer to a list of candidate links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Zero-based index into the presented list.
    Index(usize),
    Quit,
}

/// Interpret prompt input against a list of `count` links.
///
/// Input that is neither a quit token nor a 1-based index within the list
/// is treated as quit rather than re-prompting.
pub fn parse_choice(input: &str, count: usize) -> Choice {
    let trimmed = input.trim().to_lowercase();
    if QUIT_TOKENS.contains(&trimmed.as_str()) {
        return Choice::Quit;
    }
    match trimmed.parse::<usize>() {
        Ok(n) if n >= 1 && n <= count => Choice::Index(n - 1),
        _ => Choice::Quit,
    }
}

/// Where navigation decisions come from.
#[async_trait]
pub trait Operator: Send {
    async fn choose(&mut self, links: &[Link]) -> Choice;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExploreEvent {
    AnalysisStarted { url: String },
    AnalysisFinished { url: String, doc: String, links: usize },
    AnalysisFailed { url: String, error: String },
    AlreadyExplored { url: String },
    /// The current page has nothing left; showing links from earlier pages.
    ShowingPending { count: usize },
}

pub type ExploreProgressCallback = Arc<dyn Fn(&ExploreEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    Quit,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDoc {
    pub url: String,
    pub title: String,
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationSummary {
    pub pages_explored: usize,
    pub links_discovered: usize,
    pub links_pending: usize,
    pub map_path: PathBuf,
    pub documents: Vec<GeneratedDoc>,
}

impl ExplorationSummary {
    pub fn from_store(store: &MapStore) -> Self {
        let stats = store.stats();
        let documents = store
            .map()
            .explored
            .iter()
            .map(|page| GeneratedDoc {
                url: page.url.clone(),
                title: if page.page_title.is_empty() {
                    screen_name(&page.url)
                } else {
                    page.page_title.clone()
                },
                doc: page.test_cases_doc.clone(),
            })
            .collect();

        Self {
            pages_explored: stats.pages_explored,
            links_discovered: stats.links_discovered,
            links_pending: stats.links_pending,
            map_path: store.path().to_path_buf(),
            documents,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationOutcome {
    pub reason: DoneReason,
    /// Pages analyzed during this run.
    pub pages_analyzed: usize,
    pub summary: ExplorationSummary,
}

/// Which links a presentation starts from.
#[derive(Debug)]
enum Scope {
    /// Pending links of one page (canonical URL), falling back to the map.
    Page(String),
    Global,
}

#[derive(Debug)]
enum ExploreState {
    Analyzing { url: String },
    Presenting { scope: Scope },
    Navigating { url: String },
    Recovering { url: String, error: anyhow::Error },
    Done(DoneReason),
}

pub struct Explorer {
    store: MapStore,
    analyzer: Arc<dyn PageAnalyzer>,
    source: Arc<dyn LinkSource>,
    filter: NavigationFilter,
    progress_callback: Option<ExploreProgressCallback>,
}

impl Explorer {
    pub fn new(
        store: MapStore,
        analyzer: Arc<dyn PageAnalyzer>,
        source: Arc<dyn LinkSource>,
        filter: NavigationFilter,
    ) -> Self {
        Self {
            store,
            analyzer,
            source,
            filter,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ExploreProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn store(&self) -> &MapStore {
        &self.store
    }

    pub fn into_store(self) -> MapStore {
        self.store
    }

    fn emit(&self, event: ExploreEvent) {
        if let Some(ref callback) = self.progress_callback {
            callback(&event);
        }
    }

    /// Run the interactive loop from `start_url` until the operator quits or
    /// nothing is left to explore.
    pub async fn explore(&mut self, start_url: &str, operator: &mut dyn Operator) -> Result<ExplorationOutcome> {
        match Url::parse(start_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ExploreError::InvalidStartUrl(start_url.to_string())),
        }

        info!("Starting interactive exploration from {}", start_url);
        self.store.ensure_base_url(start_url);

        // Pages already in the map count as handled for this session
        let mut visited: HashSet<String> = self
            .store
            .map()
            .explored
            .iter()
            .map(|p| canonicalize(&p.url))
            .collect();
        let mut pages_analyzed = 0;

        let mut state = ExploreState::Analyzing {
            url: start_url.to_string(),
        };

        let reason = loop {
            debug!("Exploration state: {:?}", state);
            state = match state {
                ExploreState::Analyzing { url } => {
                    let canonical = canonicalize(&url);
                    if visited.contains(&canonical) {
                        info!("Page already explored: {}", url);
                        self.emit(ExploreEvent::AlreadyExplored { url });
                        ExploreState::Presenting {
                            scope: Scope::Page(canonical),
                        }
                    } else {
                        match self.analyze_page(&url).await {
                            Ok(page) => {
                                visited.insert(canonical.clone());
                                self.store.add_explored_page(page);
                                self.store.save()?;
                                pages_analyzed += 1;
                                ExploreState::Presenting {
                                    scope: Scope::Page(canonical),
                                }
                            }
                            Err(error) => ExploreState::Recovering { url, error },
                        }
                    }
                }
                ExploreState::Presenting { scope } => {
                    let candidates = self.pending_links(&scope, &visited);
                    if candidates.is_empty() {
                        info!("No more unexplored links");
                        ExploreState::Done(DoneReason::Exhausted)
                    } else {
                        self.offer(candidates, operator).await
                    }
                }
                ExploreState::Navigating { url } => ExploreState::Analyzing { url },
                ExploreState::Recovering { url, error } => {
                    warn!("Error analyzing page {}: {:#}", url, error);
                    self.emit(ExploreEvent::AnalysisFailed {
                        url: url.clone(),
                        error: format!("{:#}", error),
                    });
                    // Not persisted, but not offered again this session
                    visited.insert(canonicalize(&url));
                    ExploreState::Presenting {
                        scope: Scope::Global,
                    }
                }
                ExploreState::Done(reason) => break reason,
            };
        };

        info!(
            "Exploration finished ({:?}), {} page(s) analyzed this session",
            reason, pages_analyzed
        );

        Ok(ExplorationOutcome {
            reason,
            pages_analyzed,
            summary: ExplorationSummary::from_store(&self.store),
        })
    }

    async fn offer(&self, candidates: Vec<Link>, operator: &mut dyn Operator) -> ExploreState {
        match operator.choose(&candidates).await {
            Choice::Index(i) if i < candidates.len() => {
                let url = candidates[i].url.clone();
                debug!("Operator chose [{}] {}", i + 1, url);
                ExploreState::Navigating { url }
            }
            _ => {
                info!("Exploration ended by user");
                ExploreState::Done(DoneReason::Quit)
            }
        }
    }

    fn pending_links(&self, scope: &Scope, visited: &HashSet<String>) -> Vec<Link> {
        let unvisited = |link: &Link| !visited.contains(&canonicalize(&link.url));

        if let Scope::Page(canonical) = scope {
            let local: Vec<Link> = self
                .store
                .page(canonical)
                .map(|page| {
                    page.discovered_links
                        .iter()
                        .filter(|l| l.is_pending() && unvisited(*l))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            if !local.is_empty() {
                return local;
            }
        }

        let global: Vec<Link> = self
            .store
            .unexplored_links()
            .into_iter()
            .filter(|l| unvisited(l))
            .collect();
        if !global.is_empty() {
            self.emit(ExploreEvent::ShowingPending {
                count: global.len(),
            });
        }
        global
    }

    async fn analyze_page(&self, url: &str) -> anyhow::Result<ExploredPage> {
        info!("Analyzing: {}", url);
        self.emit(ExploreEvent::AnalysisStarted {
            url: url.to_string(),
        });

        let screen = screen_name(url);
        let doc = self.analyzer.generate_docs(url, &screen).await?;
        let discovered = self.source.discover(url).await?;
        let links = self.filter.filter(&discovered.raw_links, url).await;

        info!("Found {} navigation link(s) on {}", links.len(), url);
        self.emit(ExploreEvent::AnalysisFinished {
            url: url.to_string(),
            doc: doc.clone(),
            links: links.len(),
        });

        Ok(ExploredPage::new(url, doc, discovered.title, links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice_indices() {
        assert_eq!(parse_choice("1", 3), Choice::Index(0));
        assert_eq!(parse_choice(" 3 \n", 3), Choice::Index(2));
    }

    #[test]
    fn test_parse_choice_quit_tokens() {
        for input in ["quit", "Q", "EXIT", "  quit  "] {
            assert_eq!(parse_choice(input, 3), Choice::Quit, "input {:?}", input);
        }
    }

    #[test]
    fn test_parse_choice_invalid_is_quit() {
        for input in ["abc", "0", "4", "-1", "", "1.5"] {
            assert_eq!(parse_choice(input, 3), Choice::Quit, "input {:?}", input);
        }
    }
}
