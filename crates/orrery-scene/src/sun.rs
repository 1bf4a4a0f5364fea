use nalgebra::Point2;
use orrery_core::{Marker, MarkerPose};
use serde::{Deserialize, Serialize};

use crate::PlanetTable;

/// Last observed sun marker: pose and on-screen center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SunSighting {
    pub pose: MarkerPose,
    pub center: Point2<f32>,
}

impl Default for SunSighting {
    fn default() -> Self {
        Self {
            pose: MarkerPose::default(),
            center: Point2::origin(),
        }
    }
}

/// Find the first marker (detector order) whose planet is the sun.
///
/// On a hit `cache` is overwritten and `true` is returned. On a miss the
/// cache keeps whatever the last sighting left there.
pub fn locate_sun(markers: &[Marker], table: &PlanetTable, cache: &mut SunSighting) -> bool {
    let Some(sun) = markers.iter().find(|m| table.lookup(m.id).is_sun()) else {
        return false;
    };
    *cache = SunSighting {
        pose: sun.pose,
        center: sun.center(),
    };
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn marker_at(id: i32, cx: f32, cy: f32) -> Marker {
        let h = 5.0;
        Marker::new(
            id,
            [
                Point2::new(cx - h, cy - h),
                Point2::new(cx + h, cy - h),
                Point2::new(cx + h, cy + h),
                Point2::new(cx - h, cy + h),
            ],
            MarkerPose::new(Vector3::zeros(), Vector3::new(cx as f64, cy as f64, 1.0)),
        )
    }

    #[test]
    fn single_sun_is_found_with_its_center() {
        let table = PlanetTable::builtin();
        let markers = [marker_at(141, 10.0, 10.0), marker_at(217, 200.0, 120.0)];
        let mut cache = SunSighting::default();
        assert!(locate_sun(&markers, &table, &mut cache));
        assert_eq!(cache.center, Point2::new(200.0, 120.0));
        assert_eq!(cache.pose, markers[1].pose);
    }

    #[test]
    fn first_sun_in_detector_order_wins() {
        let table = PlanetTable::builtin();
        let markers = [marker_at(217, 50.0, 60.0), marker_at(217, 300.0, 300.0)];
        let mut cache = SunSighting::default();
        assert!(locate_sun(&markers, &table, &mut cache));
        assert_eq!(cache.center, Point2::new(50.0, 60.0));
    }

    #[test]
    fn missing_sun_leaves_cache_stale() {
        let table = PlanetTable::builtin();
        let mut cache = SunSighting::default();
        assert!(locate_sun(&[marker_at(217, 40.0, 40.0)], &table, &mut cache));
        let previous = cache;

        assert!(!locate_sun(
            &[marker_at(141, 1.0, 1.0), marker_at(144, 2.0, 2.0)],
            &table,
            &mut cache
        ));
        assert_eq!(cache, previous);

        assert!(!locate_sun(&[], &table, &mut cache));
        assert_eq!(cache, previous);
    }
}
