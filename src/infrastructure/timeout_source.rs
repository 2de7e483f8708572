use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::warn;

use crate::domain::entities::index::{IndexId, IndexReading};
use crate::domain::errors::SourceError;
use crate::domain::repositories::index_source::IndexSource;

/// Bounds every call of the wrapped source by `limit`
pub struct TimeoutIndexSource {
    inner: Arc<dyn IndexSource>,
    limit: Duration,
}

impl TimeoutIndexSource {
    pub fn new(inner: Arc<dyn IndexSource>, limit: Duration) -> Self {
        TimeoutIndexSource { inner, limit }
    }
}

#[async_trait]
impl IndexSource for TimeoutIndexSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_current(&self, index: IndexId) -> Result<IndexReading, SourceError> {
        match timeout(self.limit, self.inner.fetch_current(index)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(index = %index, source = self.inner.name(), limit = ?self.limit, "Index fetch timed out");
                Err(SourceError::Timeout(self.limit))
            }
        }
    }

    async fn search_fallback(&self, index: IndexId) -> Result<IndexReading, SourceError> {
        match timeout(self.limit, self.inner.search_fallback(index)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(index = %index, source = self.inner.name(), limit = ?self.limit, "Index search timed out");
                Err(SourceError::Timeout(self.limit))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct SlowSource {
        delay: Duration,
    }

    #[async_trait]
    impl IndexSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch_current(&self, index: IndexId) -> Result<IndexReading, SourceError> {
            tokio::time::sleep(self.delay).await;
            Ok(IndexReading::new(
                index,
                1000.0,
                None,
                NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            ))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        let source = TimeoutIndexSource::new(
            Arc::new(SlowSource {
                delay: Duration::from_secs(30),
            }),
            Duration::from_secs(10),
        );
        assert_eq!(
            source.fetch_current(IndexId::Scfi).await,
            Err(SourceError::Timeout(Duration::from_secs(10)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_source_passes_through() {
        let source = TimeoutIndexSource::new(
            Arc::new(SlowSource {
                delay: Duration::from_millis(50),
            }),
            Duration::from_secs(10),
        );
        let reading = source.fetch_current(IndexId::Ccfi).await.unwrap();
        assert_eq!(reading.index, IndexId::Ccfi);
        assert_eq!(source.name(), "slow");
    }

    #[tokio::test]
    async fn test_unsupported_search_passes_through() {
        let source = TimeoutIndexSource::new(
            Arc::new(SlowSource {
                delay: Duration::ZERO,
            }),
            Duration::from_secs(1),
        );
        assert_eq!(source.search_fallback(IndexId::Wci).await, Err(SourceError::Unsupported));
    }
}
