// End-to-end exploration against a mocked application and model

use async_trait::async_trait;
use sitewalk_core::ai::{AiError, Completion, CompletionRequest, ModelProfile};
use sitewalk_core::{
    Choice, DoneReason, ExploreOptions, Link, MapStore, Operator, execute_exploration,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Answers planner prompts with a fixed plan; never asked to classify
/// because every page here has few links.
struct PlanWriter {
    profiles: Mutex<Vec<ModelProfile>>,
}

#[async_trait]
impl Completion for PlanWriter {
    async fn complete(&self, _prompt: &str, request: CompletionRequest) -> Result<String, AiError> {
        self.profiles.lock().unwrap().push(request.profile);
        Ok("# Plan\n\n## P1\n- TC-001 loads".to_string())
    }
}

struct PickFirstThenQuit {
    picked: bool,
}

#[async_trait]
impl Operator for PickFirstThenQuit {
    async fn choose(&mut self, _links: &[Link]) -> Choice {
        if self.picked {
            Choice::Quit
        } else {
            self.picked = true;
            Choice::Index(0)
        }
    }
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.to_owned(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_session_writes_docs_and_map() {
    let app = MockServer::start().await;
    mount_page(
        &app,
        "/login",
        r#"<html><head><title>Login</title></head><body>
            <a href="/register">Create account</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &app,
        "/register",
        r#"<html><head><title>Register</title></head><body>
            <a href="/login">Back to login</a>
            <a href="/terms">Terms</a>
        </body></html>"#,
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let mut options = ExploreOptions::new(format!("{}/login", app.uri()));
    options.map_file = temp_dir.path().join(".exploration-map.json");
    options.docs_dir = temp_dir.path().join("docs");
    options.timeout_secs = 5;

    let completion = Arc::new(PlanWriter {
        profiles: Mutex::new(Vec::new()),
    });
    let mut operator = PickFirstThenQuit { picked: false };

    let outcome = execute_exploration(options.clone(), completion.clone(), &mut operator, None)
        .await
        .unwrap();

    assert_eq!(outcome.reason, DoneReason::Quit);
    assert_eq!(outcome.pages_analyzed, 2);
    assert!(options.docs_dir.join("LOGIN-TEST-CASES.md").exists());
    assert!(options.docs_dir.join("REGISTER-TEST-CASES.md").exists());
    assert!(
        completion
            .profiles
            .lock()
            .unwrap()
            .iter()
            .all(|p| *p == ModelProfile::Sonnet)
    );

    let saved = MapStore::load(&options.map_file);
    assert_eq!(saved.map().explored.len(), 2);
    assert_eq!(saved.map().explored[1].page_title, "Register");
    let pending: Vec<String> = saved.unexplored_links().into_iter().map(|l| l.url).collect();
    assert_eq!(pending, vec![format!("{}/terms", app.uri())]);
}

#[tokio::test]
async fn test_session_recovers_from_missing_page() {
    let app = MockServer::start().await;
    mount_page(
        &app,
        "/",
        r#"<html><body><a href="/gone">Gone</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut options = ExploreOptions::new(format!("{}/", app.uri()));
    options.map_file = temp_dir.path().join("map.json");
    options.docs_dir = temp_dir.path().join("docs");

    let completion = Arc::new(PlanWriter {
        profiles: Mutex::new(Vec::new()),
    });
    let mut operator = PickFirstThenQuit { picked: false };

    let outcome = execute_exploration(options, completion, &mut operator, None)
        .await
        .unwrap();

    // The failed page is skipped and nothing else is pending
    assert_eq!(outcome.reason, DoneReason::Exhausted);
    assert_eq!(outcome.pages_analyzed, 1);
    assert_eq!(outcome.summary.links_pending, 1);
}
