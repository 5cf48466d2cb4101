//! Property-Based Tests for the Spatial Cache
//!
//! Uses proptest to check cell collision, TTL expiry, capacity and LRU order.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CachedPlace, SpatialCache};
use crate::clock::ManualClock;
use crate::services::PlaceRecord;

// == Test Configuration ==
const GRID: f64 = 0.0005;
const TTL: Duration = Duration::from_secs(24 * 60 * 60);

// == Strategies ==
/// Grid cell indices covering the whole globe at 0.0005°.
fn cell_strategy() -> impl Strategy<Value = (i64, i64)> {
    (-170_000i64..170_000, -350_000i64..350_000)
}

/// Offset inside a cell, kept clear of the rounding boundary.
fn offset_strategy() -> impl Strategy<Value = (f64, f64)> {
    (-0.45f64..0.45, -0.45f64..0.45)
}

fn point_in(cell: (i64, i64), offset: (f64, f64)) -> (f64, f64) {
    (
        (cell.0 as f64 + offset.0) * GRID,
        (cell.1 as f64 + offset.1) * GRID,
    )
}

fn value(tag: &str) -> CachedPlace {
    CachedPlace::Found(PlaceRecord {
        display_name: Some(tag.to_string()),
        ..Default::default()
    })
}

fn cache(capacity: usize) -> (SpatialCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    (SpatialCache::new(capacity, TTL, GRID, clock.clone()), clock)
}

fn unique_cells(cells: Vec<(i64, i64)>) -> Vec<(i64, i64)> {
    let mut seen = HashSet::new();
    cells.into_iter().filter(|c| seen.insert(*c)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Any two points in one grid cell share a cached value within the TTL.
    #[test]
    fn prop_same_cell_shares_value(
        cell in cell_strategy(),
        put_offset in offset_strategy(),
        get_offset in offset_strategy(),
        elapsed_secs in 0u64..(24 * 60 * 60),
    ) {
        let (mut cache, clock) = cache(200);
        let (put_lat, put_lon) = point_in(cell, put_offset);
        let (get_lat, get_lon) = point_in(cell, get_offset);

        cache.put(put_lat, put_lon, value("cell"));
        clock.advance(Duration::from_secs(elapsed_secs));

        prop_assert_eq!(cache.get(get_lat, get_lon), Some(value("cell")));
    }

    // After the TTL elapses the entry reads as absent without any sweep.
    #[test]
    fn prop_ttl_expiration_behavior(
        cell in cell_strategy(),
        offset in offset_strategy(),
        extra_secs in 0u64..1_000_000,
    ) {
        let (mut cache, clock) = cache(200);
        let (lat, lon) = point_in(cell, offset);

        cache.put(lat, lon, CachedPlace::NotFound);
        clock.advance(TTL + Duration::from_secs(extra_secs));

        prop_assert_eq!(cache.get(lat, lon), None);
        prop_assert!(cache.is_empty());
    }

    // The number of entries never exceeds capacity.
    #[test]
    fn prop_capacity_enforcement(cells in prop::collection::vec(cell_strategy(), 1..200)) {
        let capacity = 50;
        let (mut cache, _) = cache(capacity);

        for cell in cells {
            let (lat, lon) = point_in(cell, (0.0, 0.0));
            cache.put(lat, lon, CachedPlace::NotFound);
            prop_assert!(cache.len() <= capacity, "size {} exceeds {}", cache.len(), capacity);
        }
    }

    // capacity + 1 distinct keys leave `capacity` entries and evict the least
    // recently accessed one, honoring reads in between.
    #[test]
    fn prop_lru_eviction_order(
        cells in prop::collection::vec(cell_strategy(), 3..12),
        touched in 0usize..100,
        extra in cell_strategy(),
    ) {
        let cells = unique_cells(cells);
        prop_assume!(cells.len() >= 3);
        prop_assume!(!cells.contains(&extra));

        let capacity = cells.len();
        let (mut cache, _) = cache(capacity);
        for (i, cell) in cells.iter().enumerate() {
            let (lat, lon) = point_in(*cell, (0.0, 0.0));
            cache.put(lat, lon, value(&i.to_string()));
        }

        // Reading the oldest entry promotes it; the next oldest becomes the victim.
        let promoted = touched % 2 == 0;
        let expected_victim = if promoted {
            let (lat, lon) = point_in(cells[0], (0.0, 0.0));
            prop_assert!(cache.get(lat, lon).is_some());
            cells[1]
        } else {
            cells[0]
        };

        let (lat, lon) = point_in(extra, (0.0, 0.0));
        cache.put(lat, lon, value("extra"));

        prop_assert_eq!(cache.len(), capacity);
        let (victim_lat, victim_lon) = point_in(expected_victim, (0.0, 0.0));
        prop_assert_eq!(cache.get(victim_lat, victim_lon), None);
        for cell in cells.iter().filter(|c| **c != expected_victim) {
            let (lat, lon) = point_in(*cell, (0.0, 0.0));
            prop_assert!(cache.get(lat, lon).is_some(), "cell {:?} should survive", cell);
        }
    }
}
