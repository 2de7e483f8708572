//! Region Resolver
//!
//! Maps a port identifier to a coarse region. The persisted ports table is
//! consulted first; well-known UN/LOCODEs are covered by a compiled-in table
//! so the gate and seasonality lookups still work without a database.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use once_cell::sync::Lazy;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::entities::region::Region;
use crate::domain::repositories::route_data::PortRegionLookup;

static WELL_KNOWN_PORTS: Lazy<HashMap<&'static str, Region>> = Lazy::new(|| {
    HashMap::from([
        // Greater China
        ("CNSHA", Region::China),
        ("CNNGB", Region::China),
        ("CNSZX", Region::China),
        ("CNYTN", Region::China),
        ("CNTAO", Region::China),
        ("CNTXG", Region::China),
        ("CNXMN", Region::China),
        ("CNDLC", Region::China),
        ("CNCAN", Region::China),
        ("HKHKG", Region::China),
        // Rest of Asia
        ("SGSIN", Region::Asia),
        ("KRPUS", Region::Asia),
        ("JPTYO", Region::Asia),
        ("JPYOK", Region::Asia),
        ("JPUKB", Region::Asia),
        ("TWKHH", Region::Asia),
        ("MYPKG", Region::Asia),
        ("MYTPP", Region::Asia),
        ("VNSGN", Region::Asia),
        ("VNHPH", Region::Asia),
        ("THLCH", Region::Asia),
        ("IDTPP", Region::Asia),
        ("PHMNL", Region::Asia),
        ("INNSA", Region::Asia),
        ("INMUN", Region::Asia),
        ("LKCMB", Region::Asia),
        // Europe
        ("NLRTM", Region::Europe),
        ("BEANR", Region::Europe),
        ("DEHAM", Region::Europe),
        ("DEBRV", Region::Europe),
        ("GBFXT", Region::Europe),
        ("GBSOU", Region::Europe),
        ("FRLEH", Region::Europe),
        ("ESVLC", Region::Europe),
        ("ESALG", Region::Europe),
        ("ITGOA", Region::Europe),
        ("GRPIR", Region::Europe),
        ("PLGDN", Region::Europe),
        // North America
        ("USLAX", Region::NorthAmerica),
        ("USLGB", Region::NorthAmerica),
        ("USOAK", Region::NorthAmerica),
        ("USSEA", Region::NorthAmerica),
        ("USNYC", Region::NorthAmerica),
        ("USSAV", Region::NorthAmerica),
        ("USHOU", Region::NorthAmerica),
        ("CAVAN", Region::NorthAmerica),
        ("CAMTR", Region::NorthAmerica),
        ("MXZLO", Region::NorthAmerica),
        // South America
        ("BRSSZ", Region::SouthAmerica),
        ("ARBUE", Region::SouthAmerica),
        ("CLSAI", Region::SouthAmerica),
        ("PECLL", Region::SouthAmerica),
        ("COCTG", Region::SouthAmerica),
        // Middle East
        ("AEJEA", Region::MiddleEast),
        ("SAJED", Region::MiddleEast),
        ("OMSLL", Region::MiddleEast),
        // Africa
        ("ZADUR", Region::Africa),
        ("EGPSD", Region::Africa),
        ("MAPTM", Region::Africa),
        ("NGAPP", Region::Africa),
        ("KEMBA", Region::Africa),
        // Oceania
        ("AUSYD", Region::Oceania),
        ("AUMEL", Region::Oceania),
        ("NZAKL", Region::Oceania),
    ])
});

/// Region of a well-known port code, without any I/O
pub fn static_region_of(port_id: &str) -> Option<Region> {
    WELL_KNOWN_PORTS
        .get(port_id.trim().to_uppercase().as_str())
        .copied()
}

pub struct RegionResolver {
    lookup: Option<Arc<dyn PortRegionLookup>>,
    cache: Mutex<LruCache<String, Region>>,
}

impl RegionResolver {
    pub fn new(lookup: Option<Arc<dyn PortRegionLookup>>, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        RegionResolver {
            lookup,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Resolver backed only by the compiled-in table
    pub fn static_only() -> Self {
        Self::new(None, 1)
    }

    /// Resolve a port to its region: database, then static table, then `Unknown`.
    ///
    /// Port ids are case-sensitive in the ports table, so the cache is keyed by
    /// the id exactly as queried.
    pub async fn region_of(&self, port_id: &str) -> Region {
        let key = port_id.trim();

        if let Some(region) = self.cache.lock().await.get(key).copied() {
            return region;
        }

        if let Some(lookup) = &self.lookup {
            match lookup.region_of(key).await {
                Ok(Some(region)) if region.is_known() => {
                    debug!(port = %port_id, region = %region, "Region resolved from ports table");
                    self.cache.lock().await.put(key.to_string(), region);
                    return region;
                }
                Ok(_) => {
                    debug!(port = %port_id, "Port not placed by ports table, trying static table");
                }
                Err(e) => {
                    warn!(port = %port_id, error = %e, "Ports table lookup failed, trying static table");
                }
            }
        }

        match static_region_of(key) {
            Some(region) => {
                debug!(port = %port_id, region = %region, "Region resolved from static table");
                region
            }
            None => {
                debug!(port = %port_id, "Region unknown");
                Region::Unknown
            }
        }
    }
}
