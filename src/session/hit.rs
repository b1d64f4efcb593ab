//! Hit-test results and the plane-selection rule for taps.

use crate::geometry::SE3;
use crate::tracking::Plane;

/// Intersection of a tap ray with a tracked plane.
#[derive(Debug, Clone)]
pub struct PlaneHit<P> {
    pub plane: P,
    /// Intersection point, oriented like the plane.
    pub hit_pose: SE3,
    /// Distance from the camera along the ray (m).
    pub distance: f64,
}

/// One entry of a depth-ordered hit-test result.
#[derive(Debug, Clone)]
pub enum HitResult<P> {
    Plane(PlaneHit<P>),
    /// Feature point of the point cloud close to the ray.
    Point { distance: f64 },
}

impl<P> HitResult<P> {
    pub fn distance(&self) -> f64 {
        match self {
            Self::Plane(hit) => hit.distance,
            Self::Point { distance, .. } => *distance,
        }
    }
}

/// First plane hit inside its polygon, in the order the session returned.
///
/// Hits are depth sorted by the session, so this is the nearest surface the
/// tap landed on. Point hits and plane hits outside the plane's boundary are
/// skipped; a tap through several overlapping planes only ever selects one.
pub fn closest_plane_hit<P: Plane>(hits: Vec<HitResult<P>>) -> Option<PlaneHit<P>> {
    hits.into_iter().find_map(|hit| match hit {
        HitResult::Plane(plane_hit) if plane_hit.plane.is_pose_in_polygon(&plane_hit.hit_pose) => {
            Some(plane_hit)
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{PlaneId, PlaneType, TrackingState};
    use nalgebra::Vector3;

    /// Plane whose boundary check always gives the same answer.
    #[derive(Debug, Clone)]
    struct FixedPlane {
        id: u64,
        inside: bool,
    }

    impl Plane for FixedPlane {
        fn id(&self) -> PlaneId {
            PlaneId::new(self.id)
        }
        fn plane_type(&self) -> PlaneType {
            PlaneType::HorizontalUpwardFacing
        }
        fn tracking_state(&self) -> TrackingState {
            TrackingState::Tracking
        }
        fn center_pose(&self) -> SE3 {
            SE3::identity()
        }
        fn is_pose_in_polygon(&self, _pose: &SE3) -> bool {
            self.inside
        }
    }

    fn plane_hit(id: u64, distance: f64, inside: bool) -> HitResult<FixedPlane> {
        HitResult::Plane(PlaneHit {
            plane: FixedPlane { id, inside },
            hit_pose: SE3::from_translation(Vector3::new(0.0, 0.0, -distance)),
            distance,
        })
    }

    #[test]
    fn test_first_in_polygon_plane_wins() {
        let hits = vec![plane_hit(1, 1.0, true), plane_hit(2, 2.0, true)];
        let selected = closest_plane_hit(hits).unwrap();
        assert_eq!(selected.plane.id(), PlaneId::new(1));
    }

    #[test]
    fn test_skips_points_and_out_of_polygon() {
        let hits = vec![
            HitResult::Point { distance: 0.5 },
            plane_hit(1, 1.0, false),
            plane_hit(2, 2.0, true),
        ];
        let selected = closest_plane_hit(hits).unwrap();
        assert_eq!(selected.plane.id(), PlaneId::new(2));
    }

    #[test]
    fn test_no_valid_hit() {
        assert!(closest_plane_hit(vec![plane_hit(1, 1.0, false)]).is_none());
        assert!(closest_plane_hit::<FixedPlane>(Vec::new()).is_none());
    }

    #[test]
    fn test_distance_accessor() {
        assert_eq!(plane_hit(1, 1.25, true).distance(), 1.25);
        let point: HitResult<FixedPlane> = HitResult::Point { distance: 0.3 };
        assert_eq!(point.distance(), 0.3);
    }
}
