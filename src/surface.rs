//! The layout surface: the canvas that owns every tile.
//!
//! The surface keeps tiles in z-order (last is topmost), routes pointer events
//! to the tile under the cursor or to the tile holding the active gesture, and
//! acts as the placement oracle for tile gestures. A candidate is valid when it
//! lies inside the bounds and overlaps no other tile's *committed* geometry.
//! Because every pointer move is validated, the committed arrangement never
//! overlaps and never leaves the bounds.
//!
//! Handlers return [`Action`]s for the host to act on (cursor changes, repaint
//! requests, committed geometry to persist).

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use tracing::{debug, info};

use crate::config::{ConfigError, LayoutConfig};
use crate::consts::{BOUNDS_GROWTH_MARGIN, MIN_VIEW_MARGIN};
use crate::error::LayoutError;
use crate::geometry::{self, CursorShape, HandleKind, Point, Rect};
use crate::input::{Button, Modifiers};
use crate::payload::MetricValues;
use crate::tile::{Tile, TileId, TileResponse};

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetCursor(CursorShape),
    /// A gesture produced a valid provisional geometry.
    TileMoved { id: TileId, geometry: Rect },
    /// A gesture candidate was rejected; the tile is back at its gesture origin.
    TileRolledBack { id: TileId, geometry: Rect },
    /// Pointer-up committed a geometry. The host should persist the layout.
    TileCommitted { id: TileId, geometry: Rect },
    SelectionChanged(Vec<TileId>),
    RenderNeeded,
}

/// Surface-level gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    /// A tile holds the pointer between pointer-down and pointer-up.
    Tile(TileId),
    /// Rubber-band selection started on empty canvas.
    RubberBand { origin: Point, current: Point, additive: bool },
}

/// The canvas owning the tile set.
pub struct LayoutSurface {
    config: LayoutConfig,
    bounds: Rect,
    tiles: Vec<Tile>,
    edit_mode: bool,
    gesture: Gesture,
    hovered: Option<TileId>,
}

impl std::fmt::Debug for LayoutSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutSurface")
            .field("bounds", &self.bounds)
            .field("tiles", &self.tiles)
            .field("edit_mode", &self.edit_mode)
            .finish_non_exhaustive()
    }
}

impl Default for LayoutSurface {
    fn default() -> Self {
        let config = LayoutConfig::default();
        Self {
            config,
            bounds: config.bounds,
            tiles: Vec::new(),
            edit_mode: false,
            gesture: Gesture::Idle,
            hovered: None,
        }
    }
}

impl LayoutSurface {
    /// Create an empty surface in view mode.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `config` fails validation.
    pub fn new(config: LayoutConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, bounds: config.bounds, ..Self::default() })
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[must_use]
    pub fn grid_size(&self) -> f64 {
        self.config.grid_size
    }

    #[must_use]
    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Tiles in z-order, bottom first.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[must_use]
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Ids of all selected tiles, in z-order.
    #[must_use]
    pub fn selection(&self) -> Vec<TileId> {
        self.tiles.iter().filter(|t| t.is_selected()).map(Tile::id).collect()
    }

    /// The topmost tile whose geometry contains `pt`.
    #[must_use]
    pub fn topmost_at(&self, pt: Point) -> Option<TileId> {
        self.tiles
            .iter()
            .rev()
            .find(|t| t.geometry().contains_point(pt))
            .map(Tile::id)
    }

    /// Whether `candidate` is a valid placement for tile `id`: inside the
    /// bounds and clear of every other tile's committed geometry.
    #[must_use]
    pub fn is_placement_valid(&self, id: TileId, candidate: &Rect) -> bool {
        placement_ok(
            &self.bounds,
            self.tiles.iter().filter(|t| t.id() != id).map(Tile::committed),
            candidate,
        )
    }

    /// Bounding box of every committed tile.
    #[must_use]
    pub fn content_extent(&self) -> Option<Rect> {
        self.tiles
            .iter()
            .map(Tile::committed)
            .reduce(|acc, r| acc.union(&r))
    }

    /// Smallest view size that shows every tile, as `(width, height)`.
    #[must_use]
    pub fn minimum_size(&self) -> Option<(f64, f64)> {
        self.content_extent()
            .map(|r| (r.right() + MIN_VIEW_MARGIN, r.bottom() + MIN_VIEW_MARGIN))
    }

    /// Grid line segments to draw while editing; empty in view mode.
    #[must_use]
    pub fn grid_lines(&self) -> Vec<(Point, Point)> {
        if !self.edit_mode {
            return Vec::new();
        }
        geometry::grid_lines(&self.bounds, self.config.grid_size)
    }

    /// Handle zones of every tile to highlight while editing.
    #[must_use]
    pub fn handle_overlays(&self) -> Vec<(TileId, HandleKind, Rect)> {
        self.tiles
            .iter()
            .flat_map(|t| {
                t.handle_zones(self.config.handle_margin)
                    .into_iter()
                    .map(move |(h, z)| (t.id(), h, z))
            })
            .collect()
    }

    /// The rubber band rectangle while a band selection is in progress.
    #[must_use]
    pub fn rubber_band(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::RubberBand { origin, current, .. } => Some(band_rect(origin, current)),
            Gesture::Idle | Gesture::Tile(_) => None,
        }
    }

    // --- Tile set ---

    /// Snap `tile` to the grid and add it on top.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidPlacement`] when the snapped geometry is
    /// below the minimum size, leaves the bounds, or overlaps another tile. The
    /// rejected tile's payload is disposed.
    pub fn add_tile(&mut self, mut tile: Tile) -> Result<TileId, LayoutError> {
        let id = tile.id();
        let geometry = tile.geometry().quantized(self.config.grid_size);
        let min = self.config.min_tile_size;
        if geometry.width < min || geometry.height < min || !self.is_placement_valid(id, &geometry) {
            tile.dispose();
            return Err(LayoutError::InvalidPlacement { id, geometry });
        }
        tile.place(geometry);
        tile.set_editable(self.edit_mode);
        tile.set_selected(false);
        self.tiles.push(tile);
        Ok(id)
    }

    /// Remove and dispose tile `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TileNotFound`] for an unknown id.
    pub fn remove_tile(&mut self, id: TileId) -> Result<(), LayoutError> {
        let idx = self.index_of(id).ok_or(LayoutError::TileNotFound(id))?;
        let mut tile = self.tiles.remove(idx);
        tile.dispose();
        if self.gesture == Gesture::Tile(id) {
            self.gesture = Gesture::Idle;
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        Ok(())
    }

    /// Remove and dispose every tile.
    pub fn clear(&mut self) {
        for tile in &mut self.tiles {
            tile.dispose();
        }
        self.tiles.clear();
        self.gesture = Gesture::Idle;
        self.hovered = None;
    }

    /// Rename tile `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::TileNotFound`] for an unknown id.
    pub fn set_label(&mut self, id: TileId, label: impl Into<String>) -> Result<(), LayoutError> {
        let idx = self.index_of(id).ok_or(LayoutError::TileNotFound(id))?;
        self.tiles[idx].set_label(label);
        Ok(())
    }

    /// Move tile `id` to the top of the z-order.
    pub fn raise(&mut self, id: TileId) {
        if let Some(idx) = self.index_of(id) {
            let tile = self.tiles.remove(idx);
            self.tiles.push(tile);
        }
    }

    // --- Bounds ---

    /// Replace the canvas bounds, e.g. when the hosting view is resized.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidPlacement`] naming the first committed tile
    /// that would fall outside `bounds`; the bounds are left unchanged.
    pub fn set_bounds(&mut self, bounds: Rect) -> Result<(), LayoutError> {
        if !(bounds.width > 0.0 && bounds.height > 0.0) {
            return Err(ConfigError::EmptyBounds { width: bounds.width, height: bounds.height }.into());
        }
        if let Some(tile) = self.tiles.iter().find(|t| !geometry::contains(&bounds, &t.committed())) {
            return Err(LayoutError::InvalidPlacement { id: tile.id(), geometry: tile.committed() });
        }
        self.bounds = bounds;
        Ok(())
    }

    /// Grow the bounds so `extent` fits with a margin to spare. Never shrinks.
    pub fn grow_bounds_to_fit(&mut self, extent: &Rect) {
        let finite = [extent.x, extent.y, extent.width, extent.height].iter().all(|v| v.is_finite());
        if !finite || geometry::contains(&self.bounds, extent) {
            return;
        }
        let right = self.bounds.right().max(extent.right() + BOUNDS_GROWTH_MARGIN);
        let bottom = self.bounds.bottom().max(extent.bottom() + BOUNDS_GROWTH_MARGIN);
        let left = self.bounds.left().min(extent.left());
        let top = self.bounds.top().min(extent.top());
        self.bounds = Rect::new(left, top, right - left, bottom - top);
        info!(bounds = ?self.bounds, "canvas bounds grown to fit layout");
    }

    // --- Edit mode ---

    /// Enable or disable editing on every tile at once. Disabling aborts any
    /// gesture (rolling the tile back) and clears the selection.
    pub fn set_edit_mode(&mut self, enabled: bool) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.edit_mode == enabled {
            return actions;
        }
        self.edit_mode = enabled;
        for tile in &mut self.tiles {
            if let Some(geometry) = tile.set_editable(enabled) {
                actions.push(Action::TileRolledBack { id: tile.id(), geometry });
            }
        }
        if !enabled {
            let had_selection = self.tiles.iter().any(Tile::is_selected);
            for tile in &mut self.tiles {
                tile.set_selected(false);
            }
            if had_selection {
                actions.push(Action::SelectionChanged(Vec::new()));
            }
            actions.push(Action::SetCursor(CursorShape::Arrow));
        }
        self.gesture = Gesture::Idle;
        self.hovered = None;
        debug!(enabled, "edit mode changed");
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Selection ---

    /// Select tile `id`, replacing the selection unless `additive`.
    pub fn select(&mut self, id: TileId, additive: bool) -> Vec<Action> {
        if self.index_of(id).is_none() {
            return Vec::new();
        }
        for tile in &mut self.tiles {
            if tile.id() == id {
                tile.set_selected(true);
            } else if !additive {
                tile.set_selected(false);
            }
        }
        vec![Action::SelectionChanged(self.selection()), Action::RenderNeeded]
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        if !self.tiles.iter().any(Tile::is_selected) {
            return Vec::new();
        }
        for tile in &mut self.tiles {
            tile.set_selected(false);
        }
        vec![Action::SelectionChanged(Vec::new()), Action::RenderNeeded]
    }

    // --- Metrics ---

    /// Push one tick of metric values into every payload.
    pub fn publish(&mut self, values: &MetricValues) {
        for tile in &mut self.tiles {
            tile.publish(values);
        }
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if !self.edit_mode || button != Button::Primary || self.gesture != Gesture::Idle {
            return Vec::new();
        }
        let additive = modifiers.is_additive();

        let Some(id) = self.topmost_at(pt) else {
            let mut actions = if additive { Vec::new() } else { self.clear_selection() };
            self.gesture = Gesture::RubberBand { origin: pt, current: pt, additive };
            actions.push(Action::RenderNeeded);
            return actions;
        };

        self.raise(id);
        let already_selected = self.tile(id).is_some_and(Tile::is_selected);
        let mut actions = if additive || !already_selected { self.select(id, additive) } else { Vec::new() };

        let config = self.config;
        let Some(tile) = self.tiles.iter_mut().find(|t| t.id() == id) else {
            return actions;
        };
        if let TileResponse::GestureStarted(handle) = tile.pointer_down(pt, &config) {
            debug!(%id, ?handle, "gesture started");
            self.gesture = Gesture::Tile(id);
            self.hovered = Some(id);
            actions.push(Action::SetCursor(tile.state().cursor()));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn on_pointer_move(&mut self, pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        if !self.edit_mode {
            return Vec::new();
        }
        match self.gesture {
            Gesture::Idle => self.hover(pt),
            Gesture::Tile(id) => self.drive_gesture(id, pt),
            Gesture::RubberBand { origin, additive, .. } => {
                self.gesture = Gesture::RubberBand { origin, current: pt, additive };
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_up(&mut self, pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let gesture = std::mem::take(&mut self.gesture);
        let mut actions = match gesture {
            Gesture::Idle => return Vec::new(),
            Gesture::Tile(id) => self.commit_gesture(id),
            Gesture::RubberBand { origin, additive, .. } => self.finish_rubber_band(band_rect(origin, pt), additive),
        };
        actions.extend(self.hover(pt));
        actions
    }

    fn hover(&mut self, pt: Point) -> Vec<Action> {
        let target = self.topmost_at(pt);
        if self.hovered != target {
            if let Some(prev) = self.hovered.and_then(|id| self.index_of(id)) {
                self.tiles[prev].pointer_leave();
            }
            self.hovered = target;
        }
        let Some(idx) = target.and_then(|id| self.index_of(id)) else {
            return vec![Action::SetCursor(CursorShape::Arrow)];
        };
        let config = self.config;
        match self.tiles[idx].pointer_move(pt, &config, |_| true) {
            TileResponse::Hover(handle) => vec![Action::SetCursor(handle.cursor())],
            _ => Vec::new(),
        }
    }

    fn drive_gesture(&mut self, id: TileId, pt: Point) -> Vec<Action> {
        let obstacles: Vec<Rect> = self
            .tiles
            .iter()
            .filter(|t| t.id() != id)
            .map(Tile::committed)
            .collect();
        let bounds = self.bounds;
        let config = self.config;
        let Some(tile) = self.tiles.iter_mut().find(|t| t.id() == id) else {
            self.gesture = Gesture::Idle;
            return Vec::new();
        };
        match tile.pointer_move(pt, &config, |c| placement_ok(&bounds, obstacles.iter().copied(), c)) {
            TileResponse::Moved(geometry) => vec![Action::TileMoved { id, geometry }, Action::RenderNeeded],
            TileResponse::RolledBack(geometry) => vec![Action::TileRolledBack { id, geometry }, Action::RenderNeeded],
            _ => Vec::new(),
        }
    }

    fn commit_gesture(&mut self, id: TileId) -> Vec<Action> {
        let Some(tile) = self.tiles.iter_mut().find(|t| t.id() == id) else {
            return Vec::new();
        };
        match tile.pointer_up() {
            TileResponse::Committed(geometry) => {
                debug!(%id, ?geometry, "tile geometry committed");
                vec![Action::TileCommitted { id, geometry }, Action::RenderNeeded]
            }
            _ => Vec::new(),
        }
    }

    fn finish_rubber_band(&mut self, band: Rect, additive: bool) -> Vec<Action> {
        for tile in &mut self.tiles {
            let hit = geometry::intersects(&band, &tile.committed());
            if hit {
                tile.set_selected(true);
            } else if !additive {
                tile.set_selected(false);
            }
        }
        vec![Action::SelectionChanged(self.selection()), Action::RenderNeeded]
    }

    fn index_of(&self, id: TileId) -> Option<usize> {
        self.tiles.iter().position(|t| t.id() == id)
    }
}

fn placement_ok<I>(bounds: &Rect, mut others: I, candidate: &Rect) -> bool
where
    I: Iterator<Item = Rect>,
{
    geometry::contains(bounds, candidate) && !others.any(|other| geometry::intersects(candidate, &other))
}

fn band_rect(a: Point, b: Point) -> Rect {
    let left = a.x.min(b.x);
    let top = a.y.min(b.y);
    Rect::new(left, top, (a.x - b.x).abs(), (a.y - b.y).abs())
}
