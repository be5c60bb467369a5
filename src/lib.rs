//! Tile layout engine for the system resource dashboard.
//!
//! The dashboard arranges live CPU visualizations (radial gauges, rolling
//! history graphs) as rectangular tiles on a freeform canvas. This crate owns
//! the arrangement: dragging tiles, resizing them through eight handles,
//! snapping to the grid, keeping tiles inside the canvas and apart from each
//! other, and saving/restoring the layout per profile and system. What a tile
//! draws is an opaque [`payload::Payload`] supplied by the host.
//!
//! The host feeds pointer events to a [`surface::LayoutSurface`] and acts on
//! the [`surface::Action`]s it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Rect/point math, grid quantization, handle hit-testing |
//! | [`tile`] | One tile and its drag/resize state machine |
//! | [`surface`] | The canvas: tile set, dispatch, placement oracle, selection |
//! | [`payload`] | Payload capability trait, factory, headless payload |
//! | [`record`] | Durable layout records and the loader with default fallback |
//! | [`defaults`] | Default population for a fresh layout |
//! | [`store`] | Profile files and the last-used profile |
//! | [`config`] | Layout and application configuration |
//! | [`input`] | Pointer buttons and modifier keys |
//! | [`error`] | Error kinds |
//! | [`consts`] | Shared numeric constants (grid, margins, default sizes) |

pub mod config;
pub mod consts;
pub mod defaults;
pub mod error;
pub mod geometry;
pub mod input;
pub mod payload;
pub mod record;
pub mod store;
pub mod surface;
pub mod tile;
