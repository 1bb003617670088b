use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named contact microservice: identifier, routing endpoint and an opaque
/// JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    id: String,
    pub endpoint: String,
    pub payload: Value,
}

impl DirectoryEntry {
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            payload,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn view(&self) -> EntryView {
        EntryView {
            id: self.id.clone(),
            endpoint: self.endpoint.clone(),
            payload: self.payload.clone(),
        }
    }

    pub fn link(&self) -> EntryLink {
        EntryLink {
            id: self.id.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

/// Owned, serializable snapshot of an entry as it appears in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryView {
    pub id: String,
    pub endpoint: String,
    #[serde(alias = "data")]
    pub payload: Value,
}

/// Navigation reference to a neighboring entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLink {
    pub id: String,
    pub endpoint: String,
}

/// Predecessor and successor of an entry in insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Neighbors<'a> {
    pub previous: Option<&'a DirectoryEntry>,
    pub next: Option<&'a DirectoryEntry>,
}

impl Neighbors<'_> {
    pub fn links(&self) -> (Option<EntryLink>, Option<EntryLink>) {
        (
            self.previous.map(DirectoryEntry::link),
            self.next.map(DirectoryEntry::link),
        )
    }
}

/// An entry together with its navigation links, detached from the directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryDetail {
    pub service: EntryView,
    pub prev_service: Option<EntryLink>,
    pub next_service: Option<EntryLink>,
}
