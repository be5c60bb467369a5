//! Tile payloads: the opaque visual content a tile hosts.
//!
//! The layout engine only ever talks to a payload through the [`Payload`]
//! capability trait. It tells the payload its new size after a committed or
//! provisional geometry change, disposes it when the tile is removed, and
//! forwards metric publishes. What the payload draws is its own business.
//!
//! A [`PayloadRef`] is the serializable description of a payload (`kind` plus
//! `key`, e.g. `CircularGauge` / `core3`). Layout records store only the ref;
//! a [`PayloadFactory`] turns refs back into live payloads on load.

#[cfg(test)]
#[path = "payload_test.rs"]
mod payload_test;

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::consts::{GRAPH_HISTORY_POINTS, MAX_UTILIZATION};

/// Payload kind for a radial utilization gauge.
pub const KIND_CIRCULAR_GAUGE: &str = "CircularGauge";
/// Older records name the gauge after its widget class.
pub const KIND_CIRCULAR_GAUGE_LEGACY: &str = "CircularGaugeWidget";
/// Payload kind for a rolling-history utilization graph.
pub const KIND_CPU_GRAPH: &str = "CPUGraphWidget";
/// Payload kind for the solid color demo tile.
pub const KIND_COLOR_DEMO: &str = "ColorDemo";
/// Older records name the demo tile after its widget class.
pub const KIND_COLOR_DEMO_LEGACY: &str = "ColorDemoWidget";

/// Metric values published once per tick, keyed by source (`core1` → 75.0).
pub type MetricValues = BTreeMap<String, f64>;

/// Capability interface every tile payload implements.
pub trait Payload {
    /// The tile's geometry changed; the payload should lay itself out at `width` × `height`.
    fn resize(&mut self, width: f64, height: f64);

    /// The tile is being destroyed. Release anything held.
    fn dispose(&mut self) {}

    /// A fresh set of metric values has been published.
    fn update(&mut self, _values: &MetricValues) {}
}

/// Serializable description of how to rebuild a payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadRef {
    pub kind: String,
    pub key: String,
}

impl PayloadRef {
    #[must_use]
    pub fn new(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Self { kind: kind.into(), key: key.into() }
    }
}

/// Error returned by a [`PayloadFactory`].
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("unknown payload kind: {0}")]
    UnknownKind(String),
    #[error("payload kind {kind} requires a key")]
    MissingKey { kind: String },
}

/// Builds live payloads from their persisted description.
pub trait PayloadFactory {
    /// Build the payload described by `payload`.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] when the ref cannot be turned into a payload.
    fn build(&mut self, payload: &PayloadRef) -> Result<Box<dyn Payload>, PayloadError>;
}

impl<F> PayloadFactory for F
where
    F: FnMut(&PayloadRef) -> Result<Box<dyn Payload>, PayloadError>,
{
    fn build(&mut self, payload: &PayloadRef) -> Result<Box<dyn Payload>, PayloadError> {
        self(payload)
    }
}

// =============================================================================
// HEADLESS PAYLOAD
// =============================================================================

/// Observable state of a [`HeadlessPayload`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessState {
    pub width: f64,
    pub height: f64,
    /// Number of `resize` calls received.
    pub resizes: usize,
    /// Latest value for this payload's key, clamped to `0..=100`.
    pub value: f64,
    /// Rolling history for graph payloads, oldest first.
    pub history: VecDeque<f64>,
    pub disposed: bool,
}

/// A payload that draws nothing and records what the engine told it.
///
/// Used by the command-line tool and tests. The state lives behind a shared
/// handle so the caller can observe the payload after handing it to a tile.
pub struct HeadlessPayload {
    payload: PayloadRef,
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessPayload {
    #[must_use]
    pub fn new(payload: PayloadRef) -> Self {
        let mut state = HeadlessState::default();
        if payload.kind == KIND_CPU_GRAPH {
            state.history = std::iter::repeat_n(0.0, GRAPH_HISTORY_POINTS).collect();
        }
        Self { payload, state: Rc::new(RefCell::new(state)) }
    }

    /// Shared handle to the recorded state.
    #[must_use]
    pub fn probe(&self) -> Rc<RefCell<HeadlessState>> {
        Rc::clone(&self.state)
    }
}

impl Payload for HeadlessPayload {
    fn resize(&mut self, width: f64, height: f64) {
        let mut state = self.state.borrow_mut();
        state.width = width;
        state.height = height;
        state.resizes += 1;
    }

    fn dispose(&mut self) {
        self.state.borrow_mut().disposed = true;
    }

    fn update(&mut self, values: &MetricValues) {
        let Some(&raw) = values.get(&self.payload.key) else {
            return;
        };
        let value = raw.clamp(0.0, MAX_UTILIZATION);
        let mut state = self.state.borrow_mut();
        state.value = value;
        if self.payload.kind == KIND_CPU_GRAPH {
            state.history.pop_front();
            state.history.push_back(value);
        }
    }
}

/// Factory for [`HeadlessPayload`]s that knows the dashboard's payload kinds.
///
/// Probes of every payload built are kept in build order.
#[derive(Default)]
pub struct HeadlessFactory {
    probes: Vec<(PayloadRef, Rc<RefCell<HeadlessState>>)>,
}

impl HeadlessFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn probes(&self) -> &[(PayloadRef, Rc<RefCell<HeadlessState>>)] {
        &self.probes
    }
}

impl PayloadFactory for HeadlessFactory {
    fn build(&mut self, payload: &PayloadRef) -> Result<Box<dyn Payload>, PayloadError> {
        match payload.kind.as_str() {
            KIND_CIRCULAR_GAUGE | KIND_CIRCULAR_GAUGE_LEGACY | KIND_CPU_GRAPH => {
                if payload.key.is_empty() {
                    return Err(PayloadError::MissingKey { kind: payload.kind.clone() });
                }
            }
            KIND_COLOR_DEMO | KIND_COLOR_DEMO_LEGACY => {}
            other => return Err(PayloadError::UnknownKind(other.to_string())),
        }
        let built = HeadlessPayload::new(payload.clone());
        self.probes.push((payload.clone(), built.probe()));
        Ok(Box::new(built))
    }
}
