//! A single tile: geometry, payload, and the drag/resize state machine.
//!
//! A tile moves through `Idle → Hovering(handle) → Dragging | Resizing(handle)`
//! and back to `Idle` on pointer-up. While a gesture is active every pointer
//! move produces a candidate geometry from the pointer delta. The candidate is
//! applied provisionally, checked against the placement oracle supplied by the
//! surface, and either kept or rolled back to the geometry the gesture started
//! from. The committed geometry only changes on pointer-up, so other tiles are
//! always checked against a valid arrangement.

#[cfg(test)]
#[path = "tile_test.rs"]
mod tile_test;

use tracing::debug;
use uuid::Uuid;

use crate::config::LayoutConfig;
use crate::consts::LABEL_TOP_OFFSET;
use crate::geometry::{self, CursorShape, HandleKind, Point, Rect};
use crate::payload::{MetricValues, Payload, PayloadRef};

/// Stable identity of a tile for the lifetime of a layout.
pub type TileId = Uuid;

/// Interaction state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TileState {
    /// Pointer is elsewhere.
    #[default]
    Idle,
    /// Pointer is over the tile; the handle says what a press would do.
    Hovering(HandleKind),
    /// The tile body is being dragged.
    Dragging {
        /// Canvas-space pointer position at pointer-down.
        anchor: Point,
        /// Geometry at pointer-down; the rollback target.
        origin: Rect,
    },
    /// The tile is being resized through one of its handles.
    Resizing {
        handle: HandleKind,
        /// Canvas-space pointer position at pointer-down.
        anchor: Point,
        /// Geometry at pointer-down; the rollback target.
        origin: Rect,
    },
}

impl TileState {
    /// Whether a drag or resize is in progress.
    #[must_use]
    pub fn is_gesture(&self) -> bool {
        matches!(self, Self::Dragging { .. } | Self::Resizing { .. })
    }

    /// The cursor the host should show for this state.
    #[must_use]
    pub fn cursor(&self) -> CursorShape {
        match self {
            Self::Idle => CursorShape::Arrow,
            Self::Hovering(handle) | Self::Resizing { handle, .. } => handle.cursor(),
            Self::Dragging { .. } => CursorShape::ClosedHand,
        }
    }
}

/// Outcome of feeding one pointer event to a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileResponse {
    /// The tile is not editable or has no gesture to act on.
    Ignored,
    /// Hover state updated.
    Hover(HandleKind),
    /// Pointer-down started a drag (`Body`) or a resize.
    GestureStarted(HandleKind),
    /// The candidate was valid and is now the provisional geometry.
    Moved(Rect),
    /// The candidate was invalid; geometry is back at the gesture origin.
    RolledBack(Rect),
    /// Pointer-up committed this geometry.
    Committed(Rect),
}

/// A draggable, resizable rectangle hosting one opaque payload.
pub struct Tile {
    id: TileId,
    geometry: Rect,
    committed: Rect,
    label: String,
    payload_ref: PayloadRef,
    payload: Box<dyn Payload>,
    editable: bool,
    selected: bool,
    state: TileState,
}

impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("id", &self.id)
            .field("geometry", &self.geometry)
            .field("committed", &self.committed)
            .field("label", &self.label)
            .field("payload_ref", &self.payload_ref)
            .field("editable", &self.editable)
            .field("selected", &self.selected)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Tile {
    /// Create a tile at `geometry` and size its payload to match.
    ///
    /// The geometry is taken as given; the surface quantizes and validates it
    /// when the tile is added.
    #[must_use]
    pub fn new(geometry: Rect, payload_ref: PayloadRef, mut payload: Box<dyn Payload>, label: impl Into<String>) -> Self {
        payload.resize(geometry.width, geometry.height);
        Self {
            id: Uuid::new_v4(),
            geometry,
            committed: geometry,
            label: label.into(),
            payload_ref,
            payload,
            editable: false,
            selected: false,
            state: TileState::Idle,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn id(&self) -> TileId {
        self.id
    }

    /// Current geometry; provisional while a gesture is in progress.
    #[must_use]
    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    /// Last committed geometry.
    #[must_use]
    pub fn committed(&self) -> Rect {
        self.committed
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn payload_ref(&self) -> &PayloadRef {
        &self.payload_ref
    }

    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    #[must_use]
    pub fn state(&self) -> TileState {
        self.state
    }

    /// Top-left of a label `label_width` wide, centered horizontally near the top edge.
    #[must_use]
    pub fn label_origin(&self, label_width: f64) -> Point {
        Point::new(
            self.geometry.x + (self.geometry.width - label_width) / 2.0,
            self.geometry.y + LABEL_TOP_OFFSET,
        )
    }

    /// Canvas-space handle zones for highlighting in edit mode. Empty when not editable.
    #[must_use]
    pub fn handle_zones(&self, margin: f64) -> Vec<(HandleKind, Rect)> {
        if !self.editable {
            return Vec::new();
        }
        HandleKind::RESIZE_HANDLES
            .iter()
            .filter_map(|&h| h.zone(&self.geometry, margin).map(|z| (h, z)))
            .collect()
    }

    // --- Mutations ---

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Replace both current and committed geometry. Used by the surface when
    /// placing a tile; never during a gesture.
    pub(crate) fn place(&mut self, geometry: Rect) {
        self.restore(geometry);
        self.committed = geometry;
    }

    /// Enable or disable editing. Disabling aborts any gesture, rolling back
    /// to its origin, and returns the tile to `Idle`.
    ///
    /// Returns the restored geometry when a gesture was aborted.
    pub(crate) fn set_editable(&mut self, editable: bool) -> Option<Rect> {
        self.editable = editable;
        if editable {
            return None;
        }
        let aborted = match self.state {
            TileState::Dragging { origin, .. } | TileState::Resizing { origin, .. } => {
                self.restore(origin);
                Some(origin)
            }
            TileState::Idle | TileState::Hovering(_) => None,
        };
        self.state = TileState::Idle;
        aborted
    }

    /// Forward published metric values to the payload.
    pub(crate) fn publish(&mut self, values: &MetricValues) {
        self.payload.update(values);
    }

    pub(crate) fn dispose(&mut self) {
        self.payload.dispose();
    }

    // --- Pointer protocol ---

    /// Pointer moved to `pt` (canvas space).
    ///
    /// Outside a gesture this updates the hover handle. During a gesture it
    /// computes the candidate geometry and keeps it only if `is_valid` accepts it.
    pub fn pointer_move<F>(&mut self, pt: Point, config: &LayoutConfig, is_valid: F) -> TileResponse
    where
        F: Fn(&Rect) -> bool,
    {
        if !self.editable {
            return TileResponse::Ignored;
        }
        let (candidate, origin) = match self.state {
            TileState::Idle | TileState::Hovering(_) => {
                let handle = self.classify(pt, config.handle_margin);
                self.state = TileState::Hovering(handle);
                return TileResponse::Hover(handle);
            }
            TileState::Dragging { anchor, origin } => (geometry::drag_rect(&origin, pt - anchor, config.grid_size), origin),
            TileState::Resizing { handle, anchor, origin } => (
                geometry::resize_rect(&origin, handle, pt - anchor, config.min_tile_size, config.grid_size),
                origin,
            ),
        };

        let previous = self.geometry;
        self.geometry = candidate;
        if is_valid(&candidate) {
            if !same_size(&previous, &candidate) {
                self.payload.resize(candidate.width, candidate.height);
            }
            TileResponse::Moved(candidate)
        } else {
            debug!(id = %self.id, ?candidate, ?origin, "candidate rejected; rolling back");
            self.geometry = previous;
            self.restore(origin);
            TileResponse::RolledBack(origin)
        }
    }

    /// Pointer left the tile without a gesture in progress.
    pub fn pointer_leave(&mut self) {
        if let TileState::Hovering(_) = self.state {
            self.state = TileState::Idle;
        }
    }

    /// Pointer pressed at `pt` (canvas space). Starts a drag from the body or a
    /// resize from a handle, snapshotting the current geometry.
    pub fn pointer_down(&mut self, pt: Point, config: &LayoutConfig) -> TileResponse {
        if !self.editable || self.state.is_gesture() {
            return TileResponse::Ignored;
        }
        let handle = self.classify(pt, config.handle_margin);
        let origin = self.geometry;
        self.state = if handle.is_resize() {
            TileState::Resizing { handle, anchor: pt, origin }
        } else {
            TileState::Dragging { anchor: pt, origin }
        };
        TileResponse::GestureStarted(handle)
    }

    /// Pointer released. Commits the current geometry and returns to `Idle`.
    pub fn pointer_up(&mut self) -> TileResponse {
        if !self.state.is_gesture() {
            return TileResponse::Ignored;
        }
        self.committed = self.geometry;
        self.state = TileState::Idle;
        TileResponse::Committed(self.committed)
    }

    fn classify(&self, pt: Point, margin: f64) -> HandleKind {
        let local = pt - self.geometry.origin();
        geometry::classify_handle(local, &self.geometry.local(), margin)
    }

    /// Put the tile back at `origin`, telling the payload if its size changes.
    fn restore(&mut self, origin: Rect) {
        let previous = self.geometry;
        self.geometry = origin;
        if !same_size(&previous, &origin) {
            self.payload.resize(origin.width, origin.height);
        }
    }
}

fn same_size(a: &Rect, b: &Rect) -> bool {
    a.width.to_bits() == b.width.to_bits() && a.height.to_bits() == b.height.to_bits()
}
