use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::catalog::IndexCatalog;
use crate::domain::entities::index::IndexId;
use crate::domain::repositories::index_source::IndexSource;

/// Adapters keyed by index. Completeness against the catalog is checked
/// when the engine is assembled.
#[derive(Clone)]
pub struct SourceRegistry {
    sources: HashMap<IndexId, Arc<dyn IndexSource>>,
}

impl SourceRegistry {
    /// Register the same adapter for every catalogued index
    pub fn uniform(catalog: &IndexCatalog, source: Arc<dyn IndexSource>) -> Self {
        let sources = catalog
            .all_indices()
            .into_iter()
            .map(|index| (index, source.clone()))
            .collect();
        SourceRegistry { sources }
    }

    pub fn get(&self, index: IndexId) -> Option<&Arc<dyn IndexSource>> {
        self.sources.get(&index)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
