use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// How a navigation candidate was found on the page.
///
/// Deserializing never fails on an unknown or missing kind: anything
/// [`LinkKind::parse`] does not recognize reads as [`LinkKind::Link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    Button,
    #[default]
    Link,
    Nav,
    FormAction,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Button => "button",
            LinkKind::Link => "link",
            LinkKind::Nav => "nav",
            LinkKind::FormAction => "form-action",
        }
    }

    /// Lenient parse used for model output; unknown kinds map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "button" => Some(LinkKind::Button),
            "link" => Some(LinkKind::Link),
            "nav" => Some(LinkKind::Nav),
            "form-action" | "form_action" | "form" => Some(LinkKind::FormAction),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for LinkKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let kind = Option::<String>::deserialize(deserializer)?;
        Ok(kind.as_deref().and_then(LinkKind::parse).unwrap_or_default())
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interactive element extracted from a page before any filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLink {
    #[serde(rename = "type")]
    pub kind: LinkKind,
    pub text: String,
    /// Absolute destination URL.
    pub href: String,
    pub selector: String,
}

impl RawLink {
    pub fn new(kind: LinkKind, text: impl Into<String>, href: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            href: href.into(),
            selector: selector.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// URL as requested.
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub response_time: Duration,
    pub title: String,
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&LinkKind::FormAction).unwrap(), "\"form-action\"");
        assert_eq!(LinkKind::Nav.to_string(), "nav");
    }

    #[test]
    fn test_unknown_kind_reads_as_link() {
        let kinds: Vec<LinkKind> = serde_json::from_str(r#"["nav", "menu", null, "FORM_ACTION"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![LinkKind::Nav, LinkKind::Link, LinkKind::Link, LinkKind::FormAction]
        );
    }
}
