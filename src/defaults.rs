//! Default population for a surface with no saved layout.
//!
//! One row per core: a gauge in the left column and a history graph beside
//! it, plus a single color demo tile to the right of the first row.

#[cfg(test)]
#[path = "defaults_test.rs"]
mod defaults_test;

use tracing::{info, warn};

use crate::consts::{DEFAULT_ROW_PITCH, DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH};
use crate::error::LayoutError;
use crate::geometry::Rect;
use crate::payload::{KIND_CIRCULAR_GAUGE, KIND_COLOR_DEMO, KIND_CPU_GRAPH, PayloadFactory, PayloadRef};
use crate::surface::LayoutSurface;
use crate::tile::Tile;

const GAUGE_COLUMN_X: f64 = 10.0;
const GRAPH_COLUMN_X: f64 = 220.0;
const DEMO_COLUMN_X: f64 = 450.0;
const FIRST_ROW_Y: f64 = 10.0;

/// Key of the color demo payload.
pub const DEMO_KEY: &str = "demo";

/// Payload key of the `index`th core, counting from zero (`core1`, `core2`, ...).
#[must_use]
pub fn core_key(index: usize) -> String {
    format!("core{}", index + 1)
}

/// The default tiles for `core_count` cores as `(geometry, payload, label)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn default_entries(core_count: usize) -> Vec<(Rect, PayloadRef, String)> {
    let mut entries = Vec::with_capacity(core_count * 2 + 1);
    for i in 0..core_count {
        let key = core_key(i);
        let y = FIRST_ROW_Y + i as f64 * DEFAULT_ROW_PITCH;
        entries.push((
            Rect::new(GAUGE_COLUMN_X, y, DEFAULT_TILE_WIDTH, DEFAULT_TILE_HEIGHT),
            PayloadRef::new(KIND_CIRCULAR_GAUGE, key.clone()),
            key.clone(),
        ));
        entries.push((
            Rect::new(GRAPH_COLUMN_X, y, DEFAULT_TILE_WIDTH, DEFAULT_TILE_HEIGHT),
            PayloadRef::new(KIND_CPU_GRAPH, key.clone()),
            key,
        ));
    }
    entries.push((
        Rect::new(DEMO_COLUMN_X, FIRST_ROW_Y, DEFAULT_TILE_WIDTH, DEFAULT_TILE_HEIGHT),
        PayloadRef::new(KIND_COLOR_DEMO, DEMO_KEY),
        "Color Demo".to_string(),
    ));
    entries
}

/// Fill `surface` with the default tiles, growing its bounds to fit.
///
/// Returns the number of tiles added. Entries the factory or the surface
/// reject are logged and skipped.
pub fn populate_defaults<F>(surface: &mut LayoutSurface, factory: &mut F, core_count: usize) -> usize
where
    F: PayloadFactory + ?Sized,
{
    let entries = default_entries(core_count);
    if let Some(extent) = entries.iter().map(|(r, _, _)| *r).reduce(|acc, r| acc.union(&r)) {
        surface.grow_bounds_to_fit(&extent);
    }

    let mut added = 0;
    for (geometry, payload_ref, label) in entries {
        let payload = match factory.build(&payload_ref) {
            Ok(payload) => payload,
            Err(source) => {
                let error = LayoutError::payload(&payload_ref, source);
                warn!(%error, "skipping default tile");
                continue;
            }
        };
        match surface.add_tile(Tile::new(geometry, payload_ref, payload, label)) {
            Ok(_) => added += 1,
            Err(error) => warn!(%error, "skipping default tile"),
        }
    }
    info!(core_count, tiles = added, "default layout populated");
    added
}
