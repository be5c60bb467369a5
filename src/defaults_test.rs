#![allow(clippy::float_cmp)]

use super::*;
use crate::config::LayoutConfig;
use crate::geometry::{contains, intersects};
use crate::payload::{HeadlessFactory, PayloadError};

// =============================================================
// default_entries
// =============================================================

#[test]
fn entries_per_core_plus_demo() {
    let entries = default_entries(9);
    assert_eq!(entries.len(), 19);
    assert_eq!(entries[0].0, Rect::new(10.0, 10.0, 200.0, 180.0));
    assert_eq!(entries[0].1, PayloadRef::new(KIND_CIRCULAR_GAUGE, "core1"));
    assert_eq!(entries[1].0, Rect::new(220.0, 10.0, 200.0, 180.0));
    assert_eq!(entries[1].1, PayloadRef::new(KIND_CPU_GRAPH, "core1"));
    assert_eq!(entries[16].0, Rect::new(10.0, 1610.0, 200.0, 180.0));
    let (demo, demo_ref, label) = entries.last().unwrap();
    assert_eq!(*demo, Rect::new(450.0, 10.0, 200.0, 180.0));
    assert_eq!(demo_ref.kind, KIND_COLOR_DEMO);
    assert_eq!(label, "Color Demo");
}

#[test]
fn entries_never_overlap() {
    let entries = default_entries(9);
    for (i, (a, _, _)) in entries.iter().enumerate() {
        for (b, _, _) in &entries[i + 1..] {
            assert!(!intersects(a, b), "{a:?} overlaps {b:?}");
        }
    }
}

#[test]
fn core_keys_count_from_one() {
    assert_eq!(core_key(0), "core1");
    assert_eq!(core_key(8), "core9");
}

// =============================================================
// populate_defaults
// =============================================================

#[test]
fn populate_grows_bounds_and_adds_everything() {
    let mut surface = LayoutSurface::new(LayoutConfig::default()).unwrap();
    let mut factory = HeadlessFactory::new();
    let added = populate_defaults(&mut surface, &mut factory, 9);
    assert_eq!(added, 19);
    assert_eq!(surface.len(), 19);
    assert_eq!(factory.probes().len(), 19);
    assert_eq!(surface.bounds(), Rect::new(0.0, 0.0, 750.0, 1890.0));
    for tile in surface.tiles() {
        assert!(contains(&surface.bounds(), &tile.committed()));
    }
}

#[test]
fn populate_with_no_cores_adds_demo_only() {
    let mut surface = LayoutSurface::new(LayoutConfig::default()).unwrap();
    let mut factory = HeadlessFactory::new();
    assert_eq!(populate_defaults(&mut surface, &mut factory, 0), 1);
    assert_eq!(surface.bounds(), Rect::new(0.0, 0.0, 750.0, 600.0));
}

#[test]
fn populate_skips_rejected_payloads() {
    let mut surface = LayoutSurface::new(LayoutConfig::default()).unwrap();
    let mut factory = |payload: &PayloadRef| -> Result<Box<dyn crate::payload::Payload>, PayloadError> {
        if payload.kind == KIND_CPU_GRAPH {
            return Err(PayloadError::UnknownKind(payload.kind.clone()));
        }
        Ok(Box::new(crate::payload::HeadlessPayload::new(payload.clone())))
    };
    assert_eq!(populate_defaults(&mut surface, &mut factory, 2), 3);
    assert!(surface.tiles().iter().all(|t| t.payload_ref().kind != KIND_CPU_GRAPH));
}
