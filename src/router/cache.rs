//! On-disk route cache.
//!
//! The compiled route table serializes to a versioned JSON document. When
//! the cache file exists on boot, routes are restored from it instead of
//! being re-registered, and the restored collection is locked against
//! further additions. A version mismatch or an unreadable document is
//! treated as a miss and the file is rewritten.
//!
//! Writes go through a tempfile in the destination directory followed by
//! an atomic rename. Two processes racing to write the first cache each
//! produce a complete file and the last rename wins; a reader never
//! observes a partial document.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::errors::ConfigurationError;
use crate::route::Route;
use crate::routing::RouteCollection;

/// Bumped whenever the serialized route layout changes shape.
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CacheDocument {
    version: u32,
    routes: Vec<Route>,
}

/// Loads and stores the serialized route table.
pub struct RouteCache {
    path: PathBuf,
}

impl RouteCache {
    /// A cache backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the cache file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Restore the collection from cache, or register routes through the
    /// builder and persist the result.
    ///
    /// A collection restored from cache is locked; a freshly built one is
    /// returned exactly as the builder produced it.
    pub fn load_or_build<F>(&self, build: F) -> anyhow::Result<RouteCollection>
    where
        F: FnOnce() -> Result<RouteCollection, ConfigurationError>,
    {
        if let Some(collection) = self.try_load()? {
            return Ok(collection);
        }
        let collection = build()?;
        self.store(&collection)?;
        Ok(collection)
    }

    /// Load the cached collection, treating a missing file, a stale
    /// format version or an unreadable document as a miss.
    pub fn try_load(&self) -> anyhow::Result<Option<RouteCollection>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read(&self.path)
            .with_context(|| format!("failed to read route cache {}", self.path.display()))?;
        let document: CacheDocument = match serde_json::from_slice(&raw) {
            Ok(document) => document,
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    error = %error,
                    "route cache unreadable; rebuilding"
                );
                return Ok(None);
            }
        };
        if document.version != CACHE_FORMAT_VERSION {
            info!(
                path = %self.path.display(),
                found = document.version,
                expected = CACHE_FORMAT_VERSION,
                "route cache format version mismatch; rebuilding"
            );
            return Ok(None);
        }
        let collection = RouteCollection::from_cached(document.routes)?;
        Ok(Some(collection))
    }

    /// Persist the collection atomically.
    pub fn store(&self, collection: &RouteCollection) -> anyhow::Result<()> {
        let document = CacheDocument {
            version: CACHE_FORMAT_VERSION,
            routes: collection.snapshot(),
        };
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create cache directory {}", parent.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .context("failed to create route cache tempfile")?;
        serde_json::to_writer(&mut tmp, &document).context("failed to serialize route cache")?;
        tmp.flush().context("failed to flush route cache")?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to persist route cache {}", self.path.display()))?;
        info!(
            path = %self.path.display(),
            routes_count = document.routes.len(),
            "route cache written"
        );
        Ok(())
    }
}
