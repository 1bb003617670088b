use std::sync::Arc;

use contactdir_core::{ServiceDirectory, Settings, SharedDirectory};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

#[derive(Clone)]
pub struct AppState {
    pub directory: SharedDirectory,
    pub settings: Arc<Settings>,
    token_digest: Option<Arc<[u8]>>,
}

impl AppState {
    /// Build the directory from `settings.directory` and wrap it for sharing.
    pub fn new(settings: Settings) -> contactdir_core::Result<Self> {
        let directory = ServiceDirectory::from_config(&settings.directory)?;
        Ok(Self::with_directory(SharedDirectory::new(directory), settings))
    }

    pub fn with_directory(directory: SharedDirectory, settings: Settings) -> Self {
        let token_digest = settings
            .security
            .api_token
            .as_ref()
            .map(|token| Arc::from(digest_token(token.expose_secret()).as_slice()));
        Self {
            directory,
            settings: Arc::new(settings),
            token_digest,
        }
    }

    /// SHA-256 of the configured bearer token, if one is required.
    pub fn token_digest(&self) -> Option<&[u8]> {
        self.token_digest.as_deref()
    }
}

pub fn digest_token(token: &str) -> Vec<u8> {
    Sha256::digest(token.as_bytes()).to_vec()
}
