//! Shared numeric constants for the layout engine.

// ── Grid ────────────────────────────────────────────────────────

/// Default grid step in canvas units.
pub const DEFAULT_GRID_SIZE: f64 = 10.0;

/// Default canvas width in canvas units.
pub const DEFAULT_CANVAS_WIDTH: f64 = 600.0;

/// Default canvas height in canvas units.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 600.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Width of the resize handle band along each tile edge, in canvas units.
pub const HANDLE_MARGIN: f64 = 10.0;

// ── Surface sizing ──────────────────────────────────────────────

/// Extra room added past the tile extent when bounds grow to fit a loaded layout.
pub const BOUNDS_GROWTH_MARGIN: f64 = 100.0;

/// Largest right/bottom edge a loaded tile may have.
pub const MAX_CANVAS_EXTENT: f64 = 100_000.0;

/// Most grid lines drawn along one axis.
pub const MAX_GRID_LINES_PER_AXIS: usize = 2_000;

/// Padding added to the tile extent when reporting the minimum view size.
pub const MIN_VIEW_MARGIN: f64 = 10.0;

/// Distance from the top edge of a tile to its label baseline box.
pub const LABEL_TOP_OFFSET: f64 = 4.0;

// ── Payloads ────────────────────────────────────────────────────

/// Number of samples retained by a rolling-history graph payload.
pub const GRAPH_HISTORY_POINTS: usize = 30;

/// Upper bound of a utilization value, in percent.
pub const MAX_UTILIZATION: f64 = 100.0;

// ── Default population ──────────────────────────────────────────

/// Number of CPU cores populated into a fresh layout.
pub const DEFAULT_CORE_COUNT: usize = 9;

/// Width of a default tile.
pub const DEFAULT_TILE_WIDTH: f64 = 200.0;

/// Height of a default tile.
pub const DEFAULT_TILE_HEIGHT: f64 = 180.0;

/// Vertical distance between consecutive default rows.
pub const DEFAULT_ROW_PITCH: f64 = 200.0;
