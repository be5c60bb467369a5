//! Error kinds of the layout engine.
//!
//! Nothing here is fatal. Placement errors only reach callers of the direct
//! surface API; during a gesture an invalid placement is a rollback. Read
//! failures and payload failures are logged by the loader, which falls back to
//! the default population or skips the entry.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::geometry::Rect;
use crate::payload::{PayloadError, PayloadRef};
use crate::tile::TileId;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("tile {id} cannot be placed at {geometry:?}")]
    InvalidPlacement { id: TileId, geometry: Rect },
    #[error("tile not found: {0}")]
    TileNotFound(TileId),
    #[error("failed to read layout file {path}: {source}")]
    PersistenceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed layout file {path}: {source}")]
    MalformedRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write layout file {path}: {source}")]
    PersistenceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot rebuild payload {kind}/{key}: {source}")]
    PayloadReconstruction {
        kind: String,
        key: String,
        #[source]
        source: PayloadError,
    },
    #[error("failed to encode layout: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LayoutError {
    /// Wrap a factory failure for the entry described by `payload`.
    #[must_use]
    pub fn payload(payload: &PayloadRef, source: PayloadError) -> Self {
        Self::PayloadReconstruction { kind: payload.kind.clone(), key: payload.key.clone(), source }
    }
}
