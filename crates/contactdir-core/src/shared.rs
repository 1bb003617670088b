use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::{EntryDetail, EntryLink, EntryView, Result, ServiceDirectory};

/// Result of a successful append through the shared handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppendOutcome {
    pub service: EntryLink,
    pub total_services: usize,
}

/// Cheap-to-clone handle to a single directory guarded by a reader/writer
/// lock. Every method holds the lock for exactly one directory operation and
/// hands back owned data, so no guard outlives the call.
#[derive(Debug, Clone, Default)]
pub struct SharedDirectory {
    inner: Arc<RwLock<ServiceDirectory>>,
}

impl SharedDirectory {
    pub fn new(directory: ServiceDirectory) -> Self {
        Self {
            inner: Arc::new(RwLock::new(directory)),
        }
    }

    pub fn append(
        &self,
        id: impl Into<String>,
        endpoint: impl Into<String>,
        payload: Value,
    ) -> Result<AppendOutcome> {
        let mut dir = self.inner.write();
        let service = dir.append(id, endpoint, payload)?.link();
        Ok(AppendOutcome {
            service,
            total_services: dir.size(),
        })
    }

    pub fn find(&self, id: &str) -> Option<EntryView> {
        self.inner.read().find(id).map(|entry| entry.view())
    }

    pub fn neighbors(&self, id: &str) -> (Option<EntryLink>, Option<EntryLink>) {
        self.inner.read().neighbors(id).links()
    }

    /// Entry plus navigation links, resolved under a single read lock.
    pub fn detail(&self, id: &str) -> Option<EntryDetail> {
        let dir = self.inner.read();
        let service = dir.find(id)?.view();
        let (prev_service, next_service) = dir.neighbors(id).links();
        Some(EntryDetail {
            service,
            prev_service,
            next_service,
        })
    }

    /// Replace the payload of an existing entry; returns its link, or `None`
    /// when the id is unknown.
    pub fn replace_payload(&self, id: &str, payload: Value) -> Option<EntryLink> {
        let mut dir = self.inner.write();
        dir.replace_payload(id, payload)?;
        dir.find(id).map(|entry| entry.link())
    }

    pub fn to_sequence(&self) -> Vec<EntryView> {
        self.inner.read().to_sequence()
    }

    pub fn len(&self) -> usize {
        self.inner.read().size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a read-only closure against the directory.
    pub fn read<R>(&self, f: impl FnOnce(&ServiceDirectory) -> R) -> R {
        f(&self.inner.read())
    }
}

impl From<ServiceDirectory> for SharedDirectory {
    fn from(directory: ServiceDirectory) -> Self {
        Self::new(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;

    fn sample() -> SharedDirectory {
        let shared = SharedDirectory::default();
        shared
            .append("research", "/api/contact/research", json!({"a": 1}))
            .unwrap();
        shared
            .append("speaking", "/api/contact/speaking", json!({"b": 2}))
            .unwrap();
        shared
            .append("consulting", "/api/contact/consulting", json!({"c": 3}))
            .unwrap();
        shared
    }

    #[test]
    fn test_append_reports_total() {
        let shared = sample();
        let outcome = shared
            .append("collaboration", "/api/contact/collaboration", json!({}))
            .unwrap();
        assert_eq!(outcome.service.id, "collaboration");
        assert_eq!(outcome.total_services, 4);
        assert_eq!(shared.len(), 4);
    }

    #[test]
    fn test_detail() {
        let shared = sample();
        let detail = shared.detail("speaking").unwrap();
        assert_eq!(detail.service.payload, json!({"b": 2}));
        assert_eq!(detail.prev_service.unwrap().id, "research");
        assert_eq!(detail.next_service.unwrap().id, "consulting");
        assert!(shared.detail("unknown").is_none());
    }

    #[test]
    fn test_replace_payload_visible_to_clones() {
        let shared = sample();
        let other = shared.clone();
        let link = other.replace_payload("research", json!({"a": 2})).unwrap();
        assert_eq!(link.endpoint, "/api/contact/research");
        assert_eq!(shared.find("research").unwrap().payload, json!({"a": 2}));
        assert!(other.replace_payload("unknown", json!({})).is_none());
    }

    #[test]
    fn test_concurrent_appends() {
        let shared = SharedDirectory::default();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("svc-{}-{}", t, i);
                        let endpoint = format!("/api/contact/{}", id);
                        shared.append(id, endpoint, json!({"i": i})).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(shared.len(), 400);
        assert_eq!(shared.to_sequence().len(), 400);
        // Per-thread order survives interleaving.
        let seq = shared.to_sequence();
        let positions: Vec<usize> = (0..50)
            .map(|i| {
                seq.iter()
                    .position(|e| e.id == format!("svc-3-{}", i))
                    .unwrap()
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
