// Navigation candidate extraction from a parsed HTML document

use crate::result::{LinkKind, RawLink};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static BUTTON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button").unwrap());
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form[action]").unwrap());
static NAV_ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("nav a[href]").unwrap());
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

/// Collects links in extraction order, suppressing repeated destinations.
struct LinkCollector {
    links: Vec<RawLink>,
    seen: HashSet<String>,
}

impl LinkCollector {
    fn new() -> Self {
        Self {
            links: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn add(&mut self, kind: LinkKind, text: String, href: String, selector: String) {
        if href.is_empty() || !self.seen.insert(href.clone()) {
            return;
        }
        debug!("Found {} candidate: {}", kind, href);
        self.links.push(RawLink {
            kind,
            text,
            href,
            selector,
        });
    }
}

/// Extract raw navigation candidates from `html`, resolving every
/// destination against `page_url`.
///
/// Rules are applied as an ordered union: buttons with navigation intent,
/// anchors, form actions, then anchors inside `<nav>`. The first rule to
/// produce a destination wins.
pub fn extract_links(html: &str, page_url: &str) -> Vec<RawLink> {
    let Ok(base) = Url::parse(page_url) else {
        debug!("Cannot extract links, page URL does not parse: {}", page_url);
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut collector = LinkCollector::new();

    for (index, button) in document.select(&BUTTON_SELECTOR).enumerate() {
        let onclick = button.value().attr("onclick").unwrap_or("");
        let destination = match enclosing_form(button) {
            Some(form) => match form.value().attr("action").map(str::trim) {
                Some(action) if !action.is_empty() => resolve(&base, action),
                // A form without an action submits to the page itself
                _ => Some(page_url_without_fragment(&base)),
            },
            None if onclick.contains("location") => Some(page_url_without_fragment(&base)),
            None => None,
        };

        if let Some(href) = destination {
            collector.add(
                LinkKind::Button,
                element_text(button),
                href,
                format!("button:nth-of-type({})", index + 1),
            );
        }
    }

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let raw_href = anchor.value().attr("href").unwrap_or("").trim();
        if is_non_navigation_href(raw_href) {
            continue;
        }
        if let Some(href) = resolve(&base, raw_href) {
            collector.add(
                LinkKind::Link,
                element_text(anchor),
                href,
                format!("a[href=\"{}\"]", raw_href),
            );
        }
    }

    for form in document.select(&FORM_SELECTOR) {
        let raw_action = form.value().attr("action").unwrap_or("").trim();
        if raw_action.is_empty() || raw_action.starts_with('#') {
            continue;
        }
        if let Some(href) = resolve(&base, raw_action) {
            collector.add(
                LinkKind::FormAction,
                "Form submission".to_string(),
                href,
                format!("form[action=\"{}\"]", raw_action),
            );
        }
    }

    for anchor in document.select(&NAV_ANCHOR_SELECTOR) {
        let raw_href = anchor.value().attr("href").unwrap_or("").trim();
        if raw_href.starts_with('#') || raw_href.starts_with("javascript:") {
            continue;
        }
        if let Some(href) = resolve(&base, raw_href) {
            collector.add(
                LinkKind::Nav,
                element_text(anchor),
                href,
                format!("nav a[href=\"{}\"]", raw_href),
            );
        }
    }

    collector.links
}

/// Text of the document's `<title>`, trimmed. Empty when absent.
pub fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn is_non_navigation_href(href: &str) -> bool {
    href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
}

fn enclosing_form(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "form")
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(|chunk| chunk.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

fn page_url_without_fragment(base: &Url) -> String {
    let mut url = base.clone();
    url.set_fragment(None);
    url.to_string()
}
