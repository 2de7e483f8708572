//! Index Source Trait
//!
//! This module defines the `IndexSource` trait, the uniform contract every
//! index adapter implements, whatever the index's underlying nature (scraped
//! page, HTTP API, cached database value).
//!
//! ## Contract
//! - One logical request per index per estimate
//! - Failures are independent and reported as `SourceError`
//! - `search_fallback` is the secondary, lower-trust lookup path tried once
//!   when the primary fetch fails or returns nothing usable

use async_trait::async_trait;

use crate::domain::entities::index::{IndexId, IndexReading};
use crate::domain::errors::SourceError;

/// Common result type for index source operations
pub type SourceResult<T> = Result<T, SourceError>;

#[async_trait]
pub trait IndexSource: Send + Sync {
    /// Human-readable adapter name, used in logs
    fn name(&self) -> &str;

    /// Fetch the current value of `index` through the primary path
    async fn fetch_current(&self, index: IndexId) -> SourceResult<IndexReading>;

    /// Alternate lookup strategy. Adapters without one keep the default.
    async fn search_fallback(&self, _index: IndexId) -> SourceResult<IndexReading> {
        Err(SourceError::Unsupported)
    }
}
