//! Test-case documentation for explored pages.
//!
//! The explorer only needs a reference to the generated document; how it is
//! produced is behind [`PageAnalyzer`].

use crate::ai::{Completion, CompletionRequest, ModelProfile, strip_code_fence};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sitewalk_scanner::Scanner;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const PLANNER_MAX_TOKENS: u32 = 4096;
/// Page markup beyond this many bytes is not sent to the model.
const MAX_HTML_BYTES: usize = 60_000;

#[async_trait]
pub trait PageAnalyzer: Send + Sync {
    /// Generate documentation for `url` and return a reference to it.
    async fn generate_docs(&self, url: &str, screen_name: &str) -> Result<String>;
}

/// Writes `<docs_dir>/<SCREEN>-TEST-CASES.md` using a model.
pub struct TestCasePlanner {
    completion: Arc<dyn Completion>,
    scanner: Scanner,
    docs_dir: PathBuf,
    profile: ModelProfile,
}

impl TestCasePlanner {
    pub fn new(completion: Arc<dyn Completion>, scanner: Scanner, docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            completion,
            scanner,
            docs_dir: docs_dir.into(),
            profile: ModelProfile::Sonnet,
        }
    }

    pub fn with_profile(mut self, profile: ModelProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn doc_path(&self, screen_name: &str) -> PathBuf {
        self.docs_dir
            .join(format!("{}-TEST-CASES.md", screen_name.to_uppercase()))
    }
}

#[async_trait]
impl PageAnalyzer for TestCasePlanner {
    async fn generate_docs(&self, url: &str, screen_name: &str) -> Result<String> {
        let page = self
            .scanner
            .load(url)
            .await
            .with_context(|| format!("Failed to load {}", url))?;

        let prompt = build_planner_prompt(url, screen_name, &page.title, &page.html);
        let reply = self
            .completion
            .complete(&prompt, CompletionRequest::new(self.profile, PLANNER_MAX_TOKENS))
            .await
            .context("Test case generation failed")?;

        let path = self.doc_path(screen_name);
        tokio::fs::create_dir_all(&self.docs_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.docs_dir.display()))?;
        tokio::fs::write(&path, format!("{}\n", strip_code_fence(&reply)))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Test cases written to {}", path.display());
        Ok(path.display().to_string())
    }
}

fn truncate_html(html: &str) -> &str {
    if html.len() <= MAX_HTML_BYTES {
        return html;
    }
    let mut end = MAX_HTML_BYTES;
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    &html[..end]
}

pub fn build_planner_prompt(url: &str, screen_name: &str, title: &str, html: &str) -> String {
    format!(
        r#"You are a senior QA engineer. Write a test case plan for the "{screen_name}" screen of a web application.

URL: {url}
Page title: {title}

Page markup:
```html
{markup}
```

Write the plan in Markdown:
- Start with a level-1 heading naming the screen.
- Group test cases by priority: P1 (critical path), P2 (important), P3 (edge cases).
- For each test case give an ID, a title, preconditions, numbered steps and the expected result.
- Only describe behaviour that is visible in the markup above.

Return ONLY the Markdown document."#,
        markup = truncate_html(html)
    )
}
