//! Geometry primitives for the tile canvas.
//!
//! Everything here is pure: points and rectangles in canvas units, grid
//! quantization, the open-interval overlap test used for tile collisions, and
//! the mapping from a pointer position to one of the nine handle zones of a
//! tile. The resize rule for each handle lives here too so the tile state
//! machine only has to pick the handle and supply the pointer delta.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use std::ops::Sub;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_GRID_LINES_PER_AXIS;

/// A point in canvas space (or tile-local space, depending on context).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

/// Axis-aligned rectangle in canvas units. This is the geometry of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The same size, placed at the origin. Handle classification works in this frame.
    #[must_use]
    pub fn local(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Whether `pt` lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains_point(&self, pt: Point) -> bool {
        pt.x >= self.left() && pt.x <= self.right() && pt.y >= self.top() && pt.y <= self.bottom()
    }

    /// Snap every component to the grid independently.
    #[must_use]
    pub fn quantized(&self, grid: f64) -> Rect {
        Rect {
            x: quantize(self.x, grid),
            y: quantize(self.y, grid),
            width: quantize(self.width, grid),
            height: quantize(self.height, grid),
        }
    }

    /// Whether every component is a whole multiple of `grid`.
    #[must_use]
    pub fn is_grid_aligned(&self, grid: f64) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| (v / grid).fract().abs() < 1e-9)
    }

    /// Smallest rectangle covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }
}

/// Round `v` to the nearest multiple of `grid`. A non-positive grid disables snapping.
#[must_use]
pub fn quantize(v: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return v;
    }
    (v / grid).round() * grid
}

/// Open-interval overlap test. Rectangles that only share an edge do not intersect.
#[must_use]
pub fn intersects(a: &Rect, b: &Rect) -> bool {
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}

/// Whether `inner` lies entirely within `outer`, edges included.
#[must_use]
pub fn contains(outer: &Rect, inner: &Rect) -> bool {
    inner.left() >= outer.left()
        && inner.right() <= outer.right()
        && inner.top() >= outer.top()
        && inner.bottom() <= outer.bottom()
}

/// Cursor affordance the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Arrow,
    /// Left/right edge resize.
    SizeHorizontal,
    /// Top/bottom edge resize.
    SizeVertical,
    /// Top-left / bottom-right corner resize (`\`).
    SizeForwardDiagonal,
    /// Top-right / bottom-left corner resize (`/`).
    SizeBackwardDiagonal,
    /// A tile body is being dragged.
    ClosedHand,
}

/// The zone of a tile under the pointer. `Body` means no handle: the tile is
/// dragged rather than resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleKind {
    #[default]
    Body,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl HandleKind {
    /// The eight resize handles, corners first.
    pub const RESIZE_HANDLES: [HandleKind; 8] = [
        HandleKind::TopLeft,
        HandleKind::TopRight,
        HandleKind::BottomLeft,
        HandleKind::BottomRight,
        HandleKind::Left,
        HandleKind::Right,
        HandleKind::Top,
        HandleKind::Bottom,
    ];

    #[must_use]
    pub fn is_resize(self) -> bool {
        self != HandleKind::Body
    }

    #[must_use]
    pub fn cursor(self) -> CursorShape {
        match self {
            Self::Body => CursorShape::Arrow,
            Self::Left | Self::Right => CursorShape::SizeHorizontal,
            Self::Top | Self::Bottom => CursorShape::SizeVertical,
            Self::TopLeft | Self::BottomRight => CursorShape::SizeForwardDiagonal,
            Self::TopRight | Self::BottomLeft => CursorShape::SizeBackwardDiagonal,
        }
    }

    fn moves_left(self) -> bool {
        matches!(self, Self::Left | Self::TopLeft | Self::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::Right | Self::TopRight | Self::BottomRight)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::Top | Self::TopLeft | Self::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::BottomLeft | Self::BottomRight)
    }

    /// The hit zone of this handle for `rect`, used to highlight handles in edit mode.
    /// Edge zones exclude the corner squares. Returns `None` for `Body`.
    #[must_use]
    pub fn zone(self, rect: &Rect, margin: f64) -> Option<Rect> {
        let inner_w = (rect.width - 2.0 * margin).max(0.0);
        let inner_h = (rect.height - 2.0 * margin).max(0.0);
        let (l, t, r, b) = (rect.left(), rect.top(), rect.right() - margin, rect.bottom() - margin);
        let zone = match self {
            Self::Body => return None,
            Self::TopLeft => Rect::new(l, t, margin, margin),
            Self::TopRight => Rect::new(r, t, margin, margin),
            Self::BottomLeft => Rect::new(l, b, margin, margin),
            Self::BottomRight => Rect::new(r, b, margin, margin),
            Self::Left => Rect::new(l, t + margin, margin, inner_h),
            Self::Right => Rect::new(r, t + margin, margin, inner_h),
            Self::Top => Rect::new(l + margin, t, inner_w, margin),
            Self::Bottom => Rect::new(l + margin, b, inner_w, margin),
        };
        Some(zone)
    }
}

/// The interior of `rect` left over once every handle band is removed.
/// Points inside it classify as [`HandleKind::Body`]. Returns `None` when the
/// bands cover the whole tile.
#[must_use]
pub fn body_zone(rect: &Rect, margin: f64) -> Option<Rect> {
    let width = rect.width - 2.0 * margin;
    let height = rect.height - 2.0 * margin;
    if width > 0.0 && height > 0.0 {
        Some(Rect::new(rect.x + margin, rect.y + margin, width, height))
    } else {
        None
    }
}

/// Classify `local` against the handle bands of `rect`.
///
/// A band is the strip within `margin` of an edge, on the inside of the
/// rectangle. Corners are tested before edges so a point near both the top and
/// left edges is `TopLeft`.
#[must_use]
pub fn classify_handle(local: Point, rect: &Rect, margin: f64) -> HandleKind {
    let near_left = local.x >= rect.left() && local.x <= rect.left() + margin;
    let near_right = local.x >= rect.right() - margin && local.x <= rect.right();
    let near_top = local.y >= rect.top() && local.y <= rect.top() + margin;
    let near_bottom = local.y >= rect.bottom() - margin && local.y <= rect.bottom();

    if near_left && near_top {
        HandleKind::TopLeft
    } else if near_right && near_top {
        HandleKind::TopRight
    } else if near_left && near_bottom {
        HandleKind::BottomLeft
    } else if near_right && near_bottom {
        HandleKind::BottomRight
    } else if near_left {
        HandleKind::Left
    } else if near_right {
        HandleKind::Right
    } else if near_top {
        HandleKind::Top
    } else if near_bottom {
        HandleKind::Bottom
    } else {
        HandleKind::Body
    }
}

/// Candidate geometry for dragging `origin` by `delta`, each axis snapped independently.
#[must_use]
pub fn drag_rect(origin: &Rect, delta: Point, grid: f64) -> Rect {
    Rect {
        x: quantize(origin.x + delta.x, grid),
        y: quantize(origin.y + delta.y, grid),
        width: origin.width,
        height: origin.height,
    }
}

/// Candidate geometry for resizing `origin` through `handle` by `delta`.
///
/// Right/bottom-bearing handles grow the size and keep the origin. Left/top-
/// bearing handles shrink the size and shift the origin by the same amount, so
/// the opposite edge stays put. Sizes are clamped to `min_size` before every
/// component is snapped to the grid.
///
/// When a left/top resize clamps, the origin moves by the size actually lost
/// rather than by the raw pointer delta, so the tile never slides past its
/// fixed edge.
#[must_use]
pub fn resize_rect(origin: &Rect, handle: HandleKind, delta: Point, min_size: f64, grid: f64) -> Rect {
    let mut x = origin.x;
    let mut y = origin.y;
    let mut width = origin.width;
    let mut height = origin.height;

    if handle.moves_right() {
        width = (origin.width + delta.x).max(min_size);
    } else if handle.moves_left() {
        width = (origin.width - delta.x).max(min_size);
        x = origin.x + (origin.width - width);
    }

    if handle.moves_bottom() {
        height = (origin.height + delta.y).max(min_size);
    } else if handle.moves_top() {
        height = (origin.height - delta.y).max(min_size);
        y = origin.y + (origin.height - height);
    }

    Rect::new(x, y, width, height).quantized(grid)
}

/// Grid line segments covering `bounds` at every `grid` step, verticals first.
///
/// At most [`MAX_GRID_LINES_PER_AXIS`] lines are produced per axis. Lines are
/// placed by index, so a step too small to advance a huge coordinate cannot stall.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn grid_lines(bounds: &Rect, grid: f64) -> Vec<(Point, Point)> {
    if !(grid > 0.0 && grid.is_finite()) {
        return Vec::new();
    }
    let steps = |extent: f64| -> usize {
        if !(extent > 0.0 && extent.is_finite()) {
            return 0;
        }
        let n = (extent / grid).ceil();
        if n >= MAX_GRID_LINES_PER_AXIS as f64 { MAX_GRID_LINES_PER_AXIS } else { n as usize }
    };
    let columns = steps(bounds.width);
    let rows = steps(bounds.height);

    let mut lines = Vec::with_capacity(columns + rows);
    for i in 0..columns {
        let x = bounds.left() + i as f64 * grid;
        lines.push((Point::new(x, bounds.top()), Point::new(x, bounds.bottom())));
    }
    for i in 0..rows {
        let y = bounds.top() + i as f64 * grid;
        lines.push((Point::new(bounds.left(), y), Point::new(bounds.right(), y)));
    }
    lines
}
