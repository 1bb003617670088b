//! Start-up population of the directory from static configuration.

use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{DirectoryConfig, Result, ServiceDirectory};

/// One statically configured directory entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SeedEntry {
    pub id: String,
    /// Defaults to `/api/contact/<id>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Inline payload; takes precedence over `payload_file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// JSON file holding the payload, relative to `directory.data_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_file: Option<PathBuf>,
}

impl SeedEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: None,
            payload: None,
            payload_file: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_payload_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.payload_file = Some(path.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn resolved_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| default_endpoint(&self.id))
    }

    fn resolve_payload(&self, data_dir: &Path) -> Result<Value> {
        if let Some(payload) = &self.payload {
            return Ok(payload.clone());
        }
        match &self.payload_file {
            Some(file) => load_json(&data_dir.join(file)),
            None => Ok(Value::Object(Default::default())),
        }
    }
}

pub fn default_endpoint(id: &str) -> String {
    format!("/api/contact/{}", id)
}

fn load_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .inspect_err(|e| warn!("Cannot read payload file {:?}: {}", path, e))?;
    Ok(serde_json::from_str(&raw)?)
}

impl ServiceDirectory {
    /// Build a directory from configuration, appending seed entries in order.
    pub fn from_config(config: &DirectoryConfig) -> Result<Self> {
        let mut directory = Self::with_options(config.options());
        for seed in &config.seed {
            let payload = seed.resolve_payload(&config.data_dir)?;
            directory.append(seed.id.clone(), seed.resolved_endpoint(), payload)?;
        }
        info!(
            entries = directory.size(),
            "Seeded directory: {}", directory
        );
        Ok(directory)
    }
}
