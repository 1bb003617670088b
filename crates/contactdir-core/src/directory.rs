//! Insertion-ordered directory of contact microservices.
//!
//! Entries live in an index arena and are chained by forward links only:
//! each node knows its successor, the directory knows head and tail. The
//! predecessor of an entry is recovered by re-scanning from the head, which
//! keeps nodes free of a back link for these small, append-only directories.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{DirectoryEntry, DirectoryError, EntryView, Neighbors, Result};

/// What `append` does when the id is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Store the new entry after the existing one; lookups keep resolving to
    /// the first occurrence.
    #[default]
    Allow,
    /// Refuse the append with `DirectoryError::DuplicateId`.
    Reject,
    /// Replace endpoint and payload of the existing entry in place.
    Overwrite,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryOptions {
    pub duplicate_policy: DuplicatePolicy,
    /// Reject blank ids and endpoints.
    pub validate_ids: bool,
}

#[derive(Debug, Clone)]
struct Node {
    entry: DirectoryEntry,
    next: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceDirectory {
    nodes: Vec<Node>,
    head: Option<usize>,
    tail: Option<usize>,
    size: usize,
    options: DirectoryOptions,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DirectoryOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> DirectoryOptions {
        self.options
    }

    /// Add an entry after the current tail.
    ///
    /// Under the default options this never fails. `DuplicateId` and
    /// `InvalidEntry` are only produced when the directory was configured to
    /// reject duplicates or to validate ids.
    pub fn append(
        &mut self,
        id: impl Into<String>,
        endpoint: impl Into<String>,
        payload: Value,
    ) -> Result<&DirectoryEntry> {
        let id = id.into();
        let endpoint = endpoint.into();

        if self.options.validate_ids {
            if id.trim().is_empty() {
                warn!("Rejected entry with blank id");
                return Err(DirectoryError::InvalidEntry("id must not be empty".into()));
            }
            if endpoint.trim().is_empty() {
                warn!("Rejected entry {} with blank endpoint", id);
                return Err(DirectoryError::InvalidEntry(format!(
                    "endpoint for {} must not be empty",
                    id
                )));
            }
        }

        let existing = match self.options.duplicate_policy {
            DuplicatePolicy::Allow => None,
            DuplicatePolicy::Reject | DuplicatePolicy::Overwrite => self.position(&id),
        };
        if let Some(index) = existing {
            if self.options.duplicate_policy == DuplicatePolicy::Reject {
                warn!("Rejected duplicate entry id: {}", id);
                return Err(DirectoryError::DuplicateId(id));
            }
            let entry = &mut self.nodes[index].entry;
            entry.endpoint = endpoint;
            entry.payload = payload;
            debug!("Overwrote entry {} in place", id);
            return Ok(&self.nodes[index].entry);
        }

        let index = self.nodes.len();
        self.nodes.push(Node {
            entry: DirectoryEntry::new(id, endpoint, payload),
            next: None,
        });
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.size += 1;

        let entry = &self.nodes[index].entry;
        debug!(size = self.size, "Appended entry {} ({})", entry.id(), entry.endpoint);
        Ok(entry)
    }

    /// First entry with the given id, scanning from the head.
    pub fn find(&self, id: &str) -> Option<&DirectoryEntry> {
        self.position(id).map(|index| &self.nodes[index].entry)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut DirectoryEntry> {
        self.position(id).map(|index| &mut self.nodes[index].entry)
    }

    /// Predecessor and successor of the entry with the given id.
    ///
    /// The successor comes from the matched node's link. The predecessor is
    /// the first node, scanning again from the head, whose successor carries
    /// `id`. Both are `None` for an unknown id.
    pub fn neighbors(&self, id: &str) -> Neighbors<'_> {
        let Some(index) = self.position(id) else {
            return Neighbors::default();
        };
        let next = self.nodes[index].next.map(|n| &self.nodes[n].entry);

        let mut previous = None;
        let mut cursor = self.head;
        while let Some(current) = cursor {
            let node = &self.nodes[current];
            match node.next {
                Some(successor) if self.nodes[successor].entry.id() == id => {
                    previous = Some(&node.entry);
                    break;
                }
                successor => cursor = successor,
            }
        }

        Neighbors { previous, next }
    }

    /// Replace the payload of the first entry with `id`, returning the old one.
    pub fn replace_payload(&mut self, id: &str, payload: Value) -> Option<Value> {
        let entry = self.find_mut(id)?;
        debug!("Replaced payload of entry {}", id);
        Some(std::mem::replace(&mut entry.payload, payload))
    }

    pub fn to_sequence(&self) -> Vec<EntryView> {
        self.iter().map(DirectoryEntry::view).collect()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let node = &self.nodes[index];
            if node.entry.id() == id {
                return Some(index);
            }
            cursor = node.next;
        }
        None
    }
}

impl fmt::Display for ServiceDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContactDirectory(")?;
        for (i, entry) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(entry.id())?;
        }
        f.write_str(")")
    }
}

/// Forward traversal following the stored links.
pub struct Iter<'a> {
    nodes: &'a [Node],
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a DirectoryEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.nodes[self.cursor?];
        self.cursor = node.next;
        Some(&node.entry)
    }
}

impl<'a> IntoIterator for &'a ServiceDirectory {
    type Item = &'a DirectoryEntry;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ServiceDirectory {
        let mut dir = ServiceDirectory::new();
        dir.append("research", "/api/contact/research", json!({"a": 1}))
            .unwrap();
        dir.append("speaking", "/api/contact/speaking", json!({"b": 2}))
            .unwrap();
        dir.append("consulting", "/api/contact/consulting", json!({"c": 3}))
            .unwrap();
        dir
    }

    fn ids(dir: &ServiceDirectory) -> Vec<&str> {
        dir.iter().map(DirectoryEntry::id).collect()
    }

    #[test]
    fn test_empty_directory() {
        let dir = ServiceDirectory::new();
        assert_eq!(dir.size(), 0);
        assert!(dir.is_empty());
        assert!(dir.to_sequence().is_empty());
        assert!(dir.find("research").is_none());
        assert_eq!(dir.neighbors("research"), Neighbors::default());
        assert_eq!(dir.to_string(), "ContactDirectory()");
    }

    #[test]
    fn test_sequence_preserves_insertion_order() {
        let dir = sample();
        let seq = dir.to_sequence();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq[0].id, "research");
        assert_eq!(seq[0].endpoint, "/api/contact/research");
        assert_eq!(seq[0].payload, json!({"a": 1}));
        assert_eq!(seq[1].id, "speaking");
        assert_eq!(seq[2].id, "consulting");
        assert_eq!(seq[2].payload, json!({"c": 3}));
        assert_eq!(dir.size(), 3);
    }

    #[test]
    fn test_find() {
        let dir = sample();
        let entry = dir.find("speaking").unwrap();
        assert_eq!(entry.endpoint, "/api/contact/speaking");
        assert_eq!(entry.payload, json!({"b": 2}));
        assert!(dir.find("collaboration").is_none());
    }

    #[test]
    fn test_neighbors() {
        let dir = sample();

        let middle = dir.neighbors("speaking");
        assert_eq!(middle.previous.map(DirectoryEntry::id), Some("research"));
        assert_eq!(middle.next.map(DirectoryEntry::id), Some("consulting"));

        let first = dir.neighbors("research");
        assert!(first.previous.is_none());
        assert_eq!(first.next.map(DirectoryEntry::id), Some("speaking"));

        let last = dir.neighbors("consulting");
        assert_eq!(last.previous.map(DirectoryEntry::id), Some("speaking"));
        assert!(last.next.is_none());

        let unknown = dir.neighbors("unknown");
        assert!(unknown.previous.is_none());
        assert!(unknown.next.is_none());
    }

    #[test]
    fn test_single_entry_has_no_neighbors() {
        let mut dir = ServiceDirectory::new();
        dir.append("solo", "/api/contact/solo", json!(null)).unwrap();
        assert_eq!(dir.neighbors("solo"), Neighbors::default());
    }

    #[test]
    fn test_replace_payload_keeps_position() {
        let mut dir = sample();
        let old = dir.replace_payload("speaking", json!({"b": 20}));
        assert_eq!(old, Some(json!({"b": 2})));

        assert_eq!(ids(&dir), ["research", "speaking", "consulting"]);
        let entry = dir.find("speaking").unwrap();
        assert_eq!(entry.endpoint, "/api/contact/speaking");
        assert_eq!(entry.payload, json!({"b": 20}));
        assert_eq!(dir.size(), 3);

        assert!(dir.replace_payload("missing", json!({})).is_none());
    }

    #[test]
    fn test_payload_mutation_through_find_mut() {
        let mut dir = sample();
        dir.find_mut("research").unwrap().payload["extra"] = json!(true);
        assert_eq!(
            dir.find("research").unwrap().payload,
            json!({"a": 1, "extra": true})
        );
    }

    #[test]
    fn test_allow_policy_shadows_duplicates() {
        let mut dir = sample();
        dir.append("speaking", "/api/contact/speaking-v2", json!({"b": 3}))
            .unwrap();
        assert_eq!(dir.size(), 4);
        assert_eq!(
            dir.find("speaking").unwrap().endpoint,
            "/api/contact/speaking"
        );
        assert_eq!(
            ids(&dir),
            ["research", "speaking", "consulting", "speaking"]
        );
    }

    #[test]
    fn test_neighbors_with_shadow_entry() {
        let mut dir = ServiceDirectory::new();
        dir.append("A", "/a", json!(1)).unwrap();
        dir.append("B", "/b", json!(2)).unwrap();
        dir.append("A", "/a2", json!(3)).unwrap();

        // next follows the first A; previous is the node before the shadow A
        let n = dir.neighbors("A");
        assert_eq!(n.next.map(DirectoryEntry::id), Some("B"));
        assert_eq!(n.previous.map(DirectoryEntry::id), Some("B"));
        assert_eq!(n.previous.map(|e| e.endpoint.as_str()), Some("/b"));

        let n = dir.neighbors("B");
        assert_eq!(n.previous.map(|e| e.endpoint.as_str()), Some("/a"));
        assert_eq!(n.next.map(|e| e.endpoint.as_str()), Some("/a2"));
    }

    #[test]
    fn test_reject_policy() {
        let mut dir = ServiceDirectory::with_options(DirectoryOptions {
            duplicate_policy: DuplicatePolicy::Reject,
            validate_ids: false,
        });
        dir.append("research", "/a", json!({})).unwrap();
        let err = dir.append("research", "/b", json!({})).unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateId(ref id) if id == "research"));
        assert_eq!(dir.size(), 1);
        assert_eq!(dir.find("research").unwrap().endpoint, "/a");
    }

    #[test]
    fn test_overwrite_policy() {
        let mut dir = ServiceDirectory::with_options(DirectoryOptions {
            duplicate_policy: DuplicatePolicy::Overwrite,
            validate_ids: false,
        });
        dir.append("research", "/a", json!({"v": 1})).unwrap();
        dir.append("speaking", "/s", json!({})).unwrap();
        dir.append("research", "/b", json!({"v": 2})).unwrap();

        assert_eq!(dir.size(), 2);
        assert_eq!(ids(&dir), ["research", "speaking"]);
        let entry = dir.find("research").unwrap();
        assert_eq!(entry.endpoint, "/b");
        assert_eq!(entry.payload, json!({"v": 2}));
    }

    #[test]
    fn test_validation_is_opt_in() {
        let mut lenient = ServiceDirectory::new();
        assert!(lenient.append("", "", json!({})).is_ok());

        let mut strict = ServiceDirectory::with_options(DirectoryOptions {
            duplicate_policy: DuplicatePolicy::Allow,
            validate_ids: true,
        });
        assert!(matches!(
            strict.append("  ", "/x", json!({})),
            Err(DirectoryError::InvalidEntry(_))
        ));
        assert!(matches!(
            strict.append("x", "", json!({})),
            Err(DirectoryError::InvalidEntry(_))
        ));
        assert!(strict.is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            sample().to_string(),
            "ContactDirectory(research -> speaking -> consulting)"
        );
    }
}
