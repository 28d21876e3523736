use crate::error::{Result, ScanError};
use crate::extract::{extract_links, extract_title};
use crate::result::{LoadedPage, RawLink};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Loads pages one at a time and extracts their navigation candidates.
#[derive(Clone)]
pub struct Scanner {
    client: Client,
    timeout_secs: u64,
}

impl Scanner {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("Sitewalk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Fetch `url` and return the page body. Non-success statuses and
    /// non-HTML responses are errors.
    pub async fn load(&self, url: &str) -> Result<LoadedPage> {
        let parsed = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        debug!("Fetching {}", parsed);

        let start = Instant::now();
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let response_time = start.elapsed();

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if !response.status().is_success() {
            return Err(ScanError::HttpStatus {
                url: url.to_string(),
                status: status_code,
            });
        }

        if let Some(ct) = content_type.as_ref()
            && !ct.contains("text/html")
            && !ct.contains("application/xhtml")
        {
            return Err(ScanError::NotHtml {
                url: url.to_string(),
                content_type: ct.clone(),
            });
        }

        let html = response.text().await.map_err(|e| self.classify(e))?;
        let title = extract_title(&html);

        Ok(LoadedPage {
            url: url.to_string(),
            final_url,
            status_code,
            content_type,
            response_time,
            title,
            html,
        })
    }

    /// Load `url` and extract its raw navigation candidates.
    pub async fn scan(&self, url: &str) -> Result<(LoadedPage, Vec<RawLink>)> {
        let page = self.load(url).await?;
        let links = extract_links(&page.html, &page.final_url);
        info!(
            "Scanned {} ({} ms): {} candidate link(s)",
            page.final_url,
            page.response_time.as_millis(),
            links.len()
        );
        Ok((page, links))
    }

    fn classify(&self, error: reqwest::Error) -> ScanError {
        if error.is_timeout() {
            ScanError::Timeout(self.timeout_secs)
        } else {
            ScanError::HttpError(error)
        }
    }
}
