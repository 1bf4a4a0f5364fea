//! Radius-order check: a planet with a larger orbit should appear farther
//! from the sun on screen than one with a smaller orbit.

use nalgebra::Point2;
use orrery_core::Marker;
use serde::{Deserialize, Serialize};

use crate::PlanetTable;

/// How the per-pair verdicts are folded into the shared flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyRule {
    /// Every compared pair overwrites the flag, so the last pair examined
    /// before a planet is drawn decides its verdict.
    #[default]
    LastPair,
    /// The flag is the AND over every pair of non-sun markers in the frame.
    AllPairs,
}

/// Order check for one pair: `(radius, distance from sun)` of A and B.
///
/// Inconsistent when the larger-radius planet is strictly nearer the sun.
/// Equal radii are always consistent.
pub fn pair_is_consistent(radius_a: f32, dist_a: f32, radius_b: f32, dist_b: f32) -> bool {
    let violated =
        (radius_a > radius_b && dist_b > dist_a) || (radius_a < radius_b && dist_b < dist_a);
    !violated
}

/// Compare the marker at `index` against every other non-sun marker,
/// overwriting `flag` with each pair's verdict.
///
/// Does nothing when the examined marker is the sun or has no partner.
pub fn check_marker_order(
    markers: &[Marker],
    index: usize,
    table: &PlanetTable,
    sun_center: Point2<f32>,
    flag: &mut bool,
) {
    let Some(examined) = markers.get(index) else {
        return;
    };
    let planet_a = table.lookup(examined.id);
    if planet_a.is_sun() {
        return;
    }
    let dist_a = examined.distance_to(sun_center);

    for (j, other) in markers.iter().enumerate() {
        if j == index {
            continue;
        }
        let planet_b = table.lookup(other.id);
        if planet_b.is_sun() {
            continue;
        }
        let dist_b = other.distance_to(sun_center);
        *flag = pair_is_consistent(planet_a.radius, dist_a, planet_b.radius, dist_b);
        log::trace!(
            "order {} vs {}: r=({}, {}) d=({:.1}, {:.1}) -> {}",
            examined.id,
            other.id,
            planet_a.radius,
            planet_b.radius,
            dist_a,
            dist_b,
            *flag
        );
    }
}

/// `true` iff every ordered pair of distinct non-sun markers is consistent.
///
/// Vacuously `true` with fewer than two non-sun markers.
pub fn all_pairs_consistent(markers: &[Marker], table: &PlanetTable, sun_center: Point2<f32>) -> bool {
    let planets: Vec<(f32, f32)> = markers
        .iter()
        .filter_map(|m| {
            let planet = table.lookup(m.id);
            (!planet.is_sun()).then(|| (planet.radius, m.distance_to(sun_center)))
        })
        .collect();

    planets.iter().enumerate().all(|(i, &(ra, da))| {
        planets
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .all(|(_, &(rb, db))| pair_is_consistent(ra, da, rb, db))
    })
}
