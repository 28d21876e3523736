// Exploration map store: single owner of the persisted crawl state

use crate::model::{ExplorationMap, ExploredPage, Link};
use crate::url_identity::{canonicalize, origin};
use chrono::Utc;
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_MAP_FILE: &str = ".exploration-map.json";

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Failed to write exploration map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize exploration map: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;

/// Counts reported in summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapStats {
    pub pages_explored: usize,
    pub links_discovered: usize,
    pub links_pending: usize,
}

/// Owns an [`ExplorationMap`] bound to one file path.
pub struct MapStore {
    path: PathBuf,
    map: ExplorationMap,
}

impl MapStore {
    /// Load the map at `path`. A missing or unreadable file yields a fresh
    /// empty map; this never fails.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = Self::read(&path).unwrap_or_default();
        Self { path, map }
    }

    fn read(path: &Path) -> Option<ExplorationMap> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No exploration map at {}, starting fresh", path.display());
                return None;
            }
            Err(e) => {
                warn!(
                    "Failed to read exploration map {}, creating new one: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        match serde_json::from_str::<ExplorationMap>(&data) {
            Ok(map) => {
                info!(
                    "Loaded existing exploration map: {} ({} page(s))",
                    path.display(),
                    map.explored.len()
                );
                Some(map)
            }
            Err(e) => {
                warn!(
                    "Failed to parse exploration map {}, creating new one: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Wrap an in-memory map; nothing is read from `path`.
    pub fn with_map(path: impl Into<PathBuf>, map: ExplorationMap) -> Self {
        Self {
            path: path.into(),
            map,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn map(&self) -> &ExplorationMap {
        &self.map
    }

    /// Record the base origin from `url` if none is set yet.
    pub fn ensure_base_url(&mut self, url: &str) {
        if self.map.base_url.is_empty()
            && let Some(origin) = origin(url)
        {
            debug!("Exploration base URL set to {}", origin);
            self.map.base_url = origin;
        }
    }

    /// Whether a page with this canonical URL has been explored.
    pub fn is_explored(&self, canonical: &str) -> bool {
        self.page(canonical).is_some()
    }

    pub fn page(&self, canonical: &str) -> Option<&ExploredPage> {
        self.map
            .explored
            .iter()
            .find(|p| canonicalize(&p.url) == canonical)
    }

    /// Insert `page`, replacing any entry with the same canonical URL, then
    /// mark every link in the map pointing at an explored page as explored.
    ///
    /// This covers links on older pages that point at the new page as well as
    /// links on the new page that point at pages explored earlier.
    pub fn add_explored_page(&mut self, page: ExploredPage) {
        let canonical = canonicalize(&page.url);

        let before = self.map.explored.len();
        self.map
            .explored
            .retain(|p| canonicalize(&p.url) != canonical);
        if self.map.explored.len() != before {
            debug!("Replacing existing entry for {}", canonical);
        }

        self.map.explored.push(page);

        let explored: HashSet<String> = self
            .map
            .explored
            .iter()
            .map(|p| canonicalize(&p.url))
            .collect();

        let mut marked = 0;
        for link in self
            .map
            .explored
            .iter_mut()
            .flat_map(|p| p.discovered_links.iter_mut())
        {
            if !link.explored && explored.contains(&canonicalize(&link.url)) {
                link.explored = true;
                marked += 1;
            }
        }
        debug!("Marked {} link(s) as explored after adding {}", marked, canonical);
    }

    /// Persist the map. The file is replaced atomically so an interrupted
    /// write leaves the previous version intact.
    pub fn save(&mut self) -> Result<()> {
        self.map.last_updated_at = Utc::now();
        let json = serde_json::to_string_pretty(&self.map)?;

        let io_err = |source: io::Error| MapError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        debug!("Saved exploration map to {}", self.path.display());
        Ok(())
    }

    /// Pending links across every page, first occurrence per canonical URL.
    pub fn unexplored_links(&self) -> Vec<Link> {
        let mut seen = HashSet::new();
        self.map
            .explored
            .iter()
            .flat_map(|p| p.discovered_links.iter())
            .filter(|link| link.is_pending())
            .filter(|link| seen.insert(canonicalize(&link.url)))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> MapStats {
        MapStats {
            pages_explored: self.map.explored.len(),
            links_discovered: self.map.total_links(),
            links_pending: self.unexplored_links().len(),
        }
    }
}
