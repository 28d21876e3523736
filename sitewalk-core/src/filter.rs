// Navigation filter: reduce raw candidates to real page-to-page navigation

use crate::ai::{Completion, CompletionRequest, ModelProfile, json_arrays};
use crate::model::{Link, LinkKind};
use async_trait::async_trait;
use serde::Deserialize;
use sitewalk_scanner::RawLink;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Lists at or below this size skip classification.
pub const PASS_THROUGH_THRESHOLD: usize = 5;
/// At most this many raw links are sent for classification.
pub const MAX_CLASSIFIED_LINKS: usize = 30;
const CLASSIFIER_MAX_TOKENS: u32 = 2048;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("classification call failed: {0}")]
    Classifier(#[from] crate::ai::AiError),

    #[error("classification reply contained no JSON array")]
    NoArray,

    #[error("classification reply was not a list of links: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[async_trait]
pub trait LinkFilter: Send + Sync {
    async fn filter(&self, raw_links: &[RawLink], page_url: &str) -> Result<Vec<Link>, FilterError>;
}

/// Keeps every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughFilter;

impl PassThroughFilter {
    pub fn apply(raw_links: &[RawLink]) -> Vec<Link> {
        unique_destinations(raw_links.iter().cloned().map(Link::from))
    }
}

#[async_trait]
impl LinkFilter for PassThroughFilter {
    async fn filter(&self, raw_links: &[RawLink], _page_url: &str) -> Result<Vec<Link>, FilterError> {
        Ok(Self::apply(raw_links))
    }
}

/// Asks a model which candidates are genuine navigation.
pub struct ClassifierFilter {
    completion: Arc<dyn Completion>,
    profile: ModelProfile,
}

/// One entry of the model's reply. `href` is accepted for older prompts.
#[derive(Debug, Deserialize)]
struct ClassifiedLink {
    url: Option<String>,
    href: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
    selector: Option<String>,
}

impl ClassifiedLink {
    fn into_link(self) -> Option<Link> {
        let destination = self
            .url
            .filter(|u| !u.trim().is_empty())
            .or(self.href)?
            .trim()
            .to_string();

        if Url::parse(&destination).is_err() {
            debug!("Dropping classified link with invalid URL: {}", destination);
            return None;
        }

        let kind = self
            .kind
            .as_deref()
            .and_then(LinkKind::parse)
            .unwrap_or(LinkKind::Link);

        Some(Link::new(
            destination,
            kind,
            self.text.unwrap_or_default(),
            self.selector.unwrap_or_default(),
        ))
    }
}

impl ClassifierFilter {
    pub fn new(completion: Arc<dyn Completion>) -> Self {
        Self {
            completion,
            profile: ModelProfile::Haiku,
        }
    }

    pub fn with_profile(mut self, profile: ModelProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Parse a classification reply into links.
    ///
    /// The first array in the reply shaped like a list of links is used;
    /// arrays of anything else (footnote markers, say) are skipped.
    pub fn parse_reply(reply: &str) -> Result<Vec<Link>, FilterError> {
        let mut malformed = None;
        for array in json_arrays(reply) {
            match serde_json::from_value::<Vec<ClassifiedLink>>(array) {
                Ok(entries) => {
                    return Ok(unique_destinations(
                        entries.into_iter().filter_map(ClassifiedLink::into_link),
                    ));
                }
                Err(e) => {
                    malformed.get_or_insert(e);
                }
            }
        }
        Err(malformed.map_or(FilterError::NoArray, FilterError::Malformed))
    }
}

/// Drop links whose destination was already seen; the first one wins.
fn unique_destinations(links: impl IntoIterator<Item = Link>) -> Vec<Link> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.url.clone()))
        .collect()
}

#[async_trait]
impl LinkFilter for ClassifierFilter {
    async fn filter(&self, raw_links: &[RawLink], page_url: &str) -> Result<Vec<Link>, FilterError> {
        let prompt = build_filter_prompt(raw_links, page_url)?;
        let reply = self
            .completion
            .complete(&prompt, CompletionRequest::new(self.profile, CLASSIFIER_MAX_TOKENS))
            .await?;
        Self::parse_reply(&reply)
    }
}

/// Chooses pass-through for small lists and falls back to it whenever
/// classification fails.
pub struct NavigationFilter {
    classifier: Option<Box<dyn LinkFilter>>,
}

impl NavigationFilter {
    pub fn new(classifier: Box<dyn LinkFilter>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    pub fn with_completion(completion: Arc<dyn Completion>, profile: ModelProfile) -> Self {
        Self::new(Box::new(ClassifierFilter::new(completion).with_profile(profile)))
    }

    /// A filter that never classifies.
    pub fn pass_through() -> Self {
        Self { classifier: None }
    }

    pub async fn filter(&self, raw_links: &[RawLink], page_url: &str) -> Vec<Link> {
        let classifier = match self.classifier.as_ref() {
            Some(classifier) if raw_links.len() > PASS_THROUGH_THRESHOLD => classifier,
            _ => return PassThroughFilter::apply(raw_links),
        };

        match classifier.filter(raw_links, page_url).await {
            Ok(links) => {
                info!(
                    "Navigation filter kept {} of {} link(s) on {}",
                    links.len(),
                    raw_links.len(),
                    page_url
                );
                links
            }
            Err(e) => {
                warn!("Link filtering failed, showing all links: {}", e);
                PassThroughFilter::apply(raw_links)
            }
        }
    }
}

pub fn build_filter_prompt(raw_links: &[RawLink], page_url: &str) -> Result<String, FilterError> {
    let sample = &raw_links[..raw_links.len().min(MAX_CLASSIFIED_LINKS)];
    let elements = serde_json::to_string_pretty(sample)?;

    Ok(format!(
        r#"Given this list of interactive elements from a web page at {page_url}, identify which ones represent SIGNIFICANT NAVIGATION (pages/screens user can navigate to).

Elements found:
{elements}

Filter OUT:
- Tooltips, popovers, modals
- Anchor links (same page, #sections)
- External links to other domains (keep same-origin only)
- Duplicate links to same destination
- Non-navigation actions (delete, save, download, etc.)
- Footer links (terms, privacy, contact)
- Social media links

Filter IN:
- Main navigation menu items
- Primary action buttons that navigate to new pages
- Form submissions that go to different pages
- Section/module navigation within the application
- Authentication links (login, register, logout)

Return ONLY a JSON array of filtered links with this structure:
[
  {{
    "url": "full URL",
    "type": "button|link|nav|form-action",
    "text": "display text",
    "selector": "css selector"
  }}
]

Return ONLY the JSON array, no explanation. If no significant navigation links found, return empty array []."#
    ))
}
