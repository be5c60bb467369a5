//! Durable layout records.
//!
//! A [`LayoutRecord`] is the persisted form of a surface: one [`TileRecord`] per
//! tile in z-order with its committed geometry and payload ref. Records are
//! version tolerant. Unknown fields are ignored, missing fields default, and
//! the field names of older dashboards (`widget_type`, `core_id`, `text`) are
//! accepted on read.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::config::{ConfigError, LayoutConfig};
use crate::consts::MAX_CANVAS_EXTENT;
use crate::error::LayoutError;
use crate::geometry::Rect;
use crate::payload::{PayloadFactory, PayloadRef};
use crate::surface::LayoutSurface;
use crate::tile::Tile;

/// Persisted arrangement of one surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutRecord {
    #[serde(deserialize_with = "tiles_skipping_malformed")]
    pub tiles: Vec<TileRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_mode: Option<bool>,
}

/// Persisted form of one tile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TileRecord {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(alias = "widget_type")]
    pub payload_kind: String,
    #[serde(alias = "core_id")]
    pub payload_key: String,
    #[serde(alias = "text", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TileRecord {
    #[must_use]
    pub fn geometry(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[must_use]
    pub fn payload_ref(&self) -> PayloadRef {
        PayloadRef::new(self.payload_kind.clone(), self.payload_key.clone())
    }

    /// Whether the geometry is finite, non-negative and within the canvas limit.
    #[must_use]
    pub fn is_within_limits(&self) -> bool {
        let values = [self.x, self.y, self.width, self.height];
        values.iter().all(|v| v.is_finite() && *v >= 0.0)
            && self.x + self.width <= MAX_CANVAS_EXTENT
            && self.y + self.height <= MAX_CANVAS_EXTENT
    }
}

impl From<&Tile> for TileRecord {
    fn from(tile: &Tile) -> Self {
        let geometry = tile.committed();
        let payload = tile.payload_ref();
        Self {
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
            payload_kind: payload.kind.clone(),
            payload_key: payload.key.clone(),
            label: Some(tile.label().to_string()),
        }
    }
}

/// Parse `tiles` one entry at a time so a single malformed entry is dropped
/// instead of failing the whole record. A non-array value yields no tiles.
fn tiles_skipping_malformed<'de, D>(deserializer: D) -> Result<Vec<TileRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(entries) = raw else {
        warn!(found = %raw, "layout tiles is not a list; ignoring");
        return Ok(Vec::new());
    };
    let mut tiles = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match TileRecord::deserialize(entry) {
            Ok(tile) => tiles.push(tile),
            Err(error) => warn!(index, %error, "skipping malformed layout entry"),
        }
    }
    Ok(tiles)
}

/// Capture the committed arrangement of `surface` in z-order.
#[must_use]
pub fn serialize(surface: &LayoutSurface) -> LayoutRecord {
    LayoutRecord {
        tiles: surface.tiles().iter().map(TileRecord::from).collect(),
        edit_mode: Some(surface.is_edit_mode()),
    }
}

/// Rebuild a surface from `record`.
///
/// Geometry is re-quantized to the configured grid. Bounds grow to fit the
/// recorded extent before any tile is placed. Entries with negative, non-finite
/// or out-of-range geometry, entries whose payload cannot be built, and entries
/// that overlap an earlier one are logged and skipped.
///
/// # Errors
///
/// Returns a [`ConfigError`] when `config` is invalid.
pub fn deserialize<F>(record: &LayoutRecord, config: LayoutConfig, factory: &mut F) -> Result<LayoutSurface, ConfigError>
where
    F: PayloadFactory + ?Sized,
{
    let mut surface = LayoutSurface::new(config)?;
    let entries: Vec<&TileRecord> = record
        .tiles
        .iter()
        .filter(|t| {
            let ok = t.is_within_limits();
            if !ok {
                warn!(geometry = ?t.geometry(), kind = %t.payload_kind, "skipping layout entry outside canvas limits");
            }
            ok
        })
        .collect();
    let extent = entries
        .iter()
        .map(|t| t.geometry().quantized(config.grid_size))
        .reduce(|acc, r| acc.union(&r));
    if let Some(extent) = extent {
        surface.grow_bounds_to_fit(&extent);
    }

    for entry in entries {
        let payload_ref = entry.payload_ref();
        let payload = match factory.build(&payload_ref) {
            Ok(payload) => payload,
            Err(source) => {
                let error = LayoutError::payload(&payload_ref, source);
                warn!(%error, "skipping layout entry");
                continue;
            }
        };
        let label = entry.label.clone().unwrap_or_else(|| payload_ref.key.clone());
        let tile = Tile::new(entry.geometry(), payload_ref, payload, label);
        if let Err(error) = surface.add_tile(tile) {
            warn!(%error, "skipping layout entry");
        }
    }

    if record.edit_mode == Some(true) {
        surface.set_edit_mode(true);
    }
    info!(tiles = surface.len(), skipped = record.tiles.len() - surface.len(), "layout restored");
    Ok(surface)
}

/// Restore a surface from the outcome of a read, falling back to `populate`.
///
/// `populate` runs on a fresh surface when the read failed, found nothing, or
/// produced a record from which no tile survived.
///
/// # Errors
///
/// Returns a [`ConfigError`] when `config` is invalid.
pub fn load_or_populate<F, P>(
    loaded: Result<Option<LayoutRecord>, LayoutError>,
    config: LayoutConfig,
    factory: &mut F,
    populate: P,
) -> Result<LayoutSurface, ConfigError>
where
    F: PayloadFactory + ?Sized,
    P: FnOnce(&mut LayoutSurface, &mut F),
{
    match loaded {
        Ok(Some(record)) if !record.tiles.is_empty() => {
            let surface = deserialize(&record, config, factory)?;
            if !surface.is_empty() {
                return Ok(surface);
            }
            warn!("no layout entry could be restored; using defaults");
        }
        Ok(_) => info!("no saved layout; using defaults"),
        Err(error) => warn!(%error, "failed to load layout; using defaults"),
    }
    let mut surface = LayoutSurface::new(config)?;
    populate(&mut surface, factory);
    Ok(surface)
}
