//! Collection cache policy
//!
//! A parent entity (a project) keeps the last fetched copy of one child
//! collection (its stories). Callers choose per call whether to refresh that
//! snapshot, read from it, or bypass it.

use crate::error::Result;
use std::future::Future;

/// Cache intent for a collection fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Answer from the stored snapshot
    pub use_cached: bool,
    /// Fetch first and replace the stored snapshot
    pub refresh_cache: bool,
}

impl FetchOptions {
    /// Always go to the network, leave the snapshot alone
    pub fn live() -> Self {
        Self::default()
    }

    /// Answer from the snapshot without fetching
    pub fn cached() -> Self {
        Self {
            use_cached: true,
            refresh_cache: false,
        }
    }

    /// Refresh the snapshot and answer from it
    pub fn refreshed() -> Self {
        Self {
            use_cached: true,
            refresh_cache: true,
        }
    }
}

/// Last fetched snapshot of a child collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionCache<T> {
    snapshot: Vec<T>,
}

impl<T> Default for CollectionCache<T> {
    fn default() -> Self {
        Self {
            snapshot: Vec::new(),
        }
    }
}

impl<T: Clone> CollectionCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &[T] {
        &self.snapshot
    }

    /// Replace the snapshot wholesale
    pub fn replace(&mut self, items: Vec<T>) {
        self.snapshot = items;
    }

    /// Resolve a fetch according to `options`.
    ///
    /// * `refresh` loads the full, unfiltered collection; it runs only when
    ///   `refresh_cache` is set and its result replaces the snapshot.
    /// * `keep` selects which snapshot entries to return when answering
    ///   from the cache.
    /// * `live` is the network fetch used when not answering from the cache.
    ///
    /// With `refresh_cache` set and `use_cached` unset, both `refresh` and
    /// `live` run, one after the other. A failed refresh leaves the snapshot
    /// unchanged.
    pub async fn resolve<R, RF, L, LF, P>(
        &mut self,
        options: FetchOptions,
        refresh: R,
        live: L,
        keep: P,
    ) -> Result<Vec<T>>
    where
        R: FnOnce() -> RF,
        RF: Future<Output = Result<Vec<T>>>,
        L: FnOnce() -> LF,
        LF: Future<Output = Result<Vec<T>>>,
        P: Fn(&T) -> bool,
    {
        if options.refresh_cache {
            let items = refresh().await?;
            tracing::debug!("Collection cache refreshed with {} items", items.len());
            self.snapshot = items;
        }

        if options.use_cached {
            return Ok(self.snapshot.iter().filter(|item| keep(item)).cloned().collect());
        }

        live().await
    }
}
