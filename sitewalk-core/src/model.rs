use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use sitewalk_scanner::LinkKind;
use sitewalk_scanner::RawLink;

/// A navigation target discovered on an explored page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: LinkKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub explored: bool,
    #[serde(default)]
    pub ignored: bool,
}

impl Link {
    pub fn new(url: impl Into<String>, kind: LinkKind, text: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            text: text.into(),
            selector: selector.into(),
            explored: false,
            ignored: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.explored && !self.ignored
    }
}

impl From<RawLink> for Link {
    fn from(raw: RawLink) -> Self {
        Link::new(raw.href, raw.kind, raw.text, raw.selector)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploredPage {
    /// URL as navigated, query and fragment included.
    pub url: String,
    pub explored_at: DateTime<Utc>,
    /// Reference to the generated test-case document.
    pub test_cases_doc: String,
    #[serde(default)]
    pub page_title: String,
    #[serde(default)]
    pub discovered_links: Vec<Link>,
}

impl ExploredPage {
    pub fn new(
        url: impl Into<String>,
        test_cases_doc: impl Into<String>,
        page_title: impl Into<String>,
        discovered_links: Vec<Link>,
    ) -> Self {
        Self {
            url: url.into(),
            explored_at: Utc::now(),
            test_cases_doc: test_cases_doc.into(),
            page_title: page_title.into(),
            discovered_links,
        }
    }
}

/// Persistent crawl state. Serialized as a single JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorationMap {
    /// Origin of the first URL explored; empty until then.
    #[serde(default)]
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub explored: Vec<ExploredPage>,
    #[serde(default)]
    pub queue: Vec<String>,
    #[serde(default)]
    pub ignored: Vec<String>,
}

impl ExplorationMap {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            base_url: String::new(),
            started_at: now,
            last_updated_at: now,
            explored: Vec::new(),
            queue: Vec::new(),
            ignored: Vec::new(),
        }
    }

    pub fn total_links(&self) -> usize {
        self.explored.iter().map(|p| p.discovered_links.len()).sum()
    }
}

impl Default for ExplorationMap {
    fn default() -> Self {
        Self::new()
    }
}
