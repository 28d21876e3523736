// Tests for exploration map persistence

use sitewalk_core::model::ExplorationMap;
use sitewalk_core::{ExploredPage, Link, LinkKind, MapStore};
use std::fs;
use tempfile::TempDir;

fn link(url: &str) -> Link {
    Link::new(url, LinkKind::Link, "text", format!("a[href=\"{}\"]", url))
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_and_reload_preserves_map() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(".exploration-map.json");

    let mut store = MapStore::load(&path);
    store.ensure_base_url("http://localhost:3000/login");
    let mut ignored = link("http://localhost:3000/logout");
    ignored.ignored = true;
    store.add_explored_page(ExploredPage::new(
        "http://localhost:3000/login?next=/home",
        "docs/LOGIN-TEST-CASES.md",
        "Login",
        vec![link("http://localhost:3000/register"), ignored],
    ));
    store.save().unwrap();

    let reloaded = MapStore::load(&path);
    let original = store.map();
    let map = reloaded.map();

    assert_eq!(map.base_url, "http://localhost:3000");
    assert_eq!(map.explored, original.explored);
    assert_eq!(map.started_at, original.started_at);
    assert_eq!(map.explored[0].url, "http://localhost:3000/login?next=/home");
    assert!(map.explored[0].discovered_links[1].ignored);
}

#[test]
fn test_saved_json_uses_camel_case_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("map.json");

    let mut store = MapStore::load(&path);
    store.ensure_base_url("http://x/");
    store.add_explored_page(ExploredPage::new(
        "http://x/",
        "docs/HOME-TEST-CASES.md",
        "",
        vec![Link::new("http://x/a", LinkKind::FormAction, "Send", "form[action=\"/a\"]")],
    ));
    store.save().unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["baseUrl"], "http://x");
    assert!(value["startedAt"].is_string());
    assert!(value["lastUpdatedAt"].is_string());
    assert!(value["queue"].as_array().unwrap().is_empty());
    assert!(value["ignored"].as_array().unwrap().is_empty());

    let page = &value["explored"][0];
    assert_eq!(page["testCasesDoc"], "docs/HOME-TEST-CASES.md");
    assert!(page["exploredAt"].is_string());
    assert_eq!(page["discoveredLinks"][0]["type"], "form-action");
    assert_eq!(page["discoveredLinks"][0]["explored"], false);
}

#[test]
fn test_loads_map_written_by_other_tools() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("map.json");
    fs::write(
        &path,
        r#"{
  "baseUrl": "http://localhost:3000",
  "startedAt": "2025-01-10T09:00:00.000Z",
  "lastUpdatedAt": "2025-01-10T09:05:00.000Z",
  "explored": [
    {
      "url": "http://localhost:3000/login",
      "exploredAt": "2025-01-10T09:01:00.000Z",
      "testCasesDoc": "docs/LOGIN-TEST-CASES.md",
      "pageTitle": "Login",
      "discoveredLinks": [
        {"url": "http://localhost:3000/dashboard", "type": "button", "text": "Sign In", "selector": "button:nth-of-type(1)", "explored": false}
      ]
    }
  ],
  "queue": [],
  "ignored": []
}"#,
    )
    .unwrap();

    let store = MapStore::load(&path);

    assert_eq!(store.map().explored.len(), 1);
    assert!(store.is_explored("http://localhost:3000/login"));
    let pending = store.unexplored_links();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, LinkKind::Button);
    assert!(!pending[0].ignored);
}

#[test]
fn test_unrecognized_link_type_keeps_map() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("map.json");
    fs::write(
        &path,
        r#"{
  "baseUrl": "http://x",
  "startedAt": "2025-01-10T09:00:00.000Z",
  "lastUpdatedAt": "2025-01-10T09:05:00.000Z",
  "explored": [
    {
      "url": "http://x/login",
      "exploredAt": "2025-01-10T09:01:00.000Z",
      "testCasesDoc": "docs/LOGIN-TEST-CASES.md",
      "discoveredLinks": [
        {"url": "http://x/dashboard", "type": "menu", "text": "Dashboard", "selector": "li > a", "explored": true}
      ]
    },
    {
      "url": "http://x/dashboard",
      "exploredAt": "2025-01-10T09:02:00.000Z",
      "testCasesDoc": "docs/DASHBOARD-TEST-CASES.md",
      "discoveredLinks": [
        {"url": "http://x/settings", "text": "Settings", "selector": "a", "explored": false}
      ]
    }
  ],
  "queue": [],
  "ignored": []
}"#,
    )
    .unwrap();

    let mut store = MapStore::load(&path);

    assert_eq!(store.map().explored.len(), 2);
    assert_eq!(store.map().explored[0].discovered_links[0].kind, LinkKind::Link);
    let pending = store.unexplored_links();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url, "http://x/settings");

    store.save().unwrap();
    assert_eq!(MapStore::load(&path).map().explored.len(), 2);
}

#[test]
fn test_corrupt_map_starts_fresh_and_is_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("map.json");
    fs::write(&path, "{\"baseUrl\": 42").unwrap();

    let mut store = MapStore::load(&path);
    assert!(store.map().explored.is_empty());

    store.add_explored_page(ExploredPage::new("http://x/a", "doc", "A", vec![]));
    store.save().unwrap();

    assert_eq!(MapStore::load(&path).map().explored.len(), 1);
}

// ============================================================================
// Page identity and link state
// ============================================================================

#[test]
fn test_re_exploring_replaces_entry() {
    let mut store = MapStore::with_map("unused.json", ExplorationMap::new());
    store.add_explored_page(ExploredPage::new("http://x/a?v=1", "doc-1", "A", vec![link("http://x/b")]));
    store.add_explored_page(ExploredPage::new("http://x/a#top", "doc-2", "A", vec![]));

    assert_eq!(store.map().explored.len(), 1);
    assert_eq!(store.map().explored[0].test_cases_doc, "doc-2");
    assert!(store.unexplored_links().is_empty());
}

#[test]
fn test_exploring_page_marks_links_to_it() {
    let mut store = MapStore::with_map("unused.json", ExplorationMap::new());
    store.add_explored_page(ExploredPage::new(
        "http://x/a",
        "doc-a",
        "A",
        vec![link("http://x/b?x=1"), link("http://x/c")],
    ));

    store.add_explored_page(ExploredPage::new("http://x/b", "doc-b", "B", vec![link("http://x/a#back")]));

    let a = store.page("http://x/a").unwrap();
    assert!(a.discovered_links[0].explored);
    assert!(!a.discovered_links[1].explored);
    // B's link back to an explored page is not pending either
    let b = store.page("http://x/b").unwrap();
    assert!(b.discovered_links[0].explored);

    let pending: Vec<String> = store.unexplored_links().into_iter().map(|l| l.url).collect();
    assert_eq!(pending, vec!["http://x/c"]);
}

#[test]
fn test_stats_count_links_and_pending() {
    let mut store = MapStore::with_map("unused.json", ExplorationMap::new());
    store.add_explored_page(ExploredPage::new(
        "http://x/a",
        "doc-a",
        "A",
        vec![link("http://x/b"), link("http://x/c")],
    ));
    store.add_explored_page(ExploredPage::new("http://x/b", "doc-b", "B", vec![link("http://x/c")]));

    let stats = store.stats();
    assert_eq!(stats.pages_explored, 2);
    assert_eq!(stats.links_discovered, 3);
    assert_eq!(stats.links_pending, 1);
}
