// Console reports for exploration sessions and saved maps

use crate::explore::ExplorationSummary;
use crate::map::MapStore;
use crate::model::Link;
use crate::url_identity::{canonicalize, screen_name};
use std::path::Path;

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
/// Link text longer than this is cut in listings.
pub const MAX_LINK_TEXT: usize = 50;

fn display_path(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn truncate_text(text: &str) -> String {
    text.chars().take(MAX_LINK_TEXT).collect()
}

/// Numbered list of candidate links, as shown at the navigation prompt.
///
/// Entries are 1-based so the numbers match what the operator types.
pub fn format_link_list(links: &[Link]) -> String {
    let mut out = String::new();
    for (i, link) in links.iter().enumerate() {
        out.push_str(&format!("  [{}] {}\n", i + 1, link.url));
        out.push_str(&format!(
            "      {}: \"{}\"\n",
            link.kind,
            truncate_text(&link.text)
        ));
    }
    out
}

pub fn generate_summary_report(summary: &ExplorationSummary) -> String {
    let mut report = String::new();
    report.push_str(DIVIDER);
    report.push_str("\n\n# Exploration Summary:\n");
    report.push_str(&format!("  Pages explored: {}\n", summary.pages_explored));
    report.push_str(&format!(
        "  Total links discovered: {}\n",
        summary.links_discovered
    ));
    report.push_str(&format!(
        "  Test case docs generated: {}\n",
        summary.documents.len()
    ));
    report.push_str(&format!(
        "  Unexplored links remaining: {}\n",
        summary.links_pending
    ));
    report.push_str(&format!(
        "\n  Exploration map saved: {}\n",
        display_path(&summary.map_path)
    ));

    if !summary.documents.is_empty() {
        report.push_str("\n## Generated test case documentation\n");
        for (i, doc) in summary.documents.iter().enumerate() {
            report.push_str(&format!("  {}. {}\n", i + 1, doc.title));
            report.push_str(&format!("     {}\n", doc.doc));
        }
    }

    report.push_str("\n## Next steps\n");
    report.push_str("  1. Review the generated test case documents\n");
    report.push_str("  2. Automate the P1 test cases\n");
    report.push_str("  3. Run `sitewalk explore <URL>` again to explore more pages\n");
    report.push('\n');
    report.push_str(DIVIDER);
    report.push('\n');
    report
}

/// Offline view of a saved map: explored pages and what is still pending.
pub fn generate_status_report(store: &MapStore) -> String {
    let map = store.map();
    let stats = store.stats();
    let mut report = String::new();

    report.push_str(DIVIDER);
    report.push_str("\n\n# Exploration Map:\n");
    report.push_str(&format!("  File: {}\n", display_path(store.path())));

    if map.explored.is_empty() {
        report.push_str("  No pages explored yet\n\n");
        report.push_str(DIVIDER);
        report.push('\n');
        return report;
    }

    report.push_str(&format!("  Base URL: {}\n", map.base_url));
    report.push_str(&format!(
        "  Started: {}\n",
        map.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!(
        "  Last updated: {}\n",
        map.last_updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("  Pages explored: {}\n", stats.pages_explored));
    report.push_str(&format!("  Links discovered: {}\n", stats.links_discovered));
    report.push_str(&format!("  Links pending: {}\n", stats.links_pending));

    report.push_str("\n## Explored pages\n");
    for page in &map.explored {
        let pending = page
            .discovered_links
            .iter()
            .filter(|l| l.is_pending())
            .count();
        let title = if page.page_title.is_empty() {
            screen_name(&page.url)
        } else {
            page.page_title.clone()
        };
        report.push_str(&format!(
            "  {} ({}) - {} link(s), {} pending\n",
            canonicalize(&page.url),
            title,
            page.discovered_links.len(),
            pending
        ));
        report.push_str(&format!("     {}\n", page.test_cases_doc));
    }

    let pending = store.unexplored_links();
    if !pending.is_empty() {
        report.push_str("\n## Pending links\n");
        report.push_str(&format_link_list(&pending));
    }

    report.push('\n');
    report.push_str(DIVIDER);
    report.push('\n');
    report
}
