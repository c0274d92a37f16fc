//! Account name resolution
//!
//! Translates tenancy ids found in cost reports into display names through a
//! `DirectoryLookup` collaborator, memoizing every answer for the lifetime of
//! the resolver. Failed lookups are remembered as an empty name.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Directory service able to name a tenancy
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    /// Display name of the tenancy `id`
    async fn tenancy_name(&self, id: &str) -> Result<String>;
}

/// Lookup backed by a fixed table of tenancy names
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    names: HashMap<String, String>,
}

impl StaticDirectory {
    /// Create an empty directory (every lookup fails)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory from an id -> name table
    pub fn from_map(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    /// Add an entry
    #[must_use]
    pub fn with_name(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(id.into(), name.into());
        self
    }

    /// Number of known tenancies
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[async_trait]
impl DirectoryLookup for StaticDirectory {
    async fn tenancy_name(&self, id: &str) -> Result<String> {
        self.names
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(id))
    }
}

/// Memoizing resolver in front of a `DirectoryLookup`
///
/// Built once per run. Entries never expire.
pub struct AccountNameResolver<'a> {
    lookup: &'a dyn DirectoryLookup,
    cache: HashMap<String, String>,
    lookups: usize,
}

impl<'a> AccountNameResolver<'a> {
    /// Create a resolver with an empty cache
    pub fn new(lookup: &'a dyn DirectoryLookup) -> Self {
        Self {
            lookup,
            cache: HashMap::new(),
            lookups: 0,
        }
    }

    /// Name for `account_id`, or an empty string when the lookup fails
    pub async fn resolve(&mut self, account_id: &str) -> String {
        if let Some(name) = self.cache.get(account_id) {
            return name.clone();
        }

        self.lookups += 1;
        let name = match self.lookup.tenancy_name(account_id).await {
            Ok(name) => {
                debug!("Resolved tenancy {} to '{}'", account_id, name);
                name
            }
            Err(e) => {
                warn!("Tenancy name lookup failed, using empty name: {e}");
                String::new()
            }
        };

        self.cache.insert(account_id.to_string(), name.clone());
        name
    }

    /// Number of calls made to the directory so far
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    /// Number of cached ids
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests;
