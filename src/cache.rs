use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Article sub-resources served by the coverage API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubResource {
    HcpcCode,
    HcpcCodeGroup,
    Icd10Covered,
    Icd10CoveredGroup,
    Icd10Noncovered,
    Icd10NoncoveredGroup,
}

impl SubResource {
    pub fn path(self) -> &'static str {
        match self {
            Self::HcpcCode => "hcpc-code",
            Self::HcpcCodeGroup => "hcpc-code-group",
            Self::Icd10Covered => "icd10-covered",
            Self::Icd10CoveredGroup => "icd10-covered-group",
            Self::Icd10Noncovered => "icd10-noncovered",
            Self::Icd10NoncoveredGroup => "icd10-noncovered-group",
        }
    }
}

/// Cache key for one sub-resource of one article version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleKey {
    pub resource: SubResource,
    pub article_id: String,
    pub version: String,
}

impl ArticleKey {
    pub fn new(resource: SubResource, article_id: &str, version: &str) -> Self {
        Self {
            resource,
            article_id: article_id.trim().to_string(),
            version: version.trim().to_string(),
        }
    }
}

/// Entries expire `ttl` after insertion. Expired entries are dropped when read
/// and swept on every insert.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let fresh = entries
            .get(key)
            .is_some_and(|(stored_at, _)| stored_at.elapsed() < self.ttl);
        if !fresh {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|(_, v)| v.clone())
    }

    /// Stores `value` and sweeps every entry that has outlived the TTL.
    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().await;
        let ttl = self.ttl;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        entries.insert(key, (Instant::now(), value));
    }
}
