//! Ray queries against sets of oriented boxes, used for aiming and
//! line-of-sight checks.

use engine_core::{ray_box, Handle, Ray, Vec3};

use crate::collision::Obb;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The entity that was hit.
    pub handle: Handle,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
}

/// Distance along `ray` to `obb`, if it is hit at all.
pub fn ray_obb(ray: &Ray, obb: &Obb) -> Option<f32> {
    let local = Ray {
        position: obb.to_local(ray.position),
        direction: obb.rotation.transpose() * ray.direction,
    };
    ray_box(&local, &obb.local_bounds())
}

/// Closest hit within `max_distance` among the candidate boxes.
pub fn raycast<I>(ray: &Ray, max_distance: f32, candidates: I) -> Option<RaycastHit>
where
    I: IntoIterator<Item = (Handle, Obb)>,
{
    candidates
        .into_iter()
        .filter_map(|(handle, obb)| {
            ray_obb(ray, &obb)
                .filter(|&d| d <= max_distance)
                .map(|distance| RaycastHit {
                    handle,
                    distance,
                    point: ray.at(distance),
                })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// True when no blocker lies strictly between `from` and `to`.
pub fn line_of_sight<I>(from: Vec3, to: Vec3, blockers: I) -> bool
where
    I: IntoIterator<Item = (Handle, Obb)>,
{
    let delta = to - from;
    let distance = delta.length();
    if distance <= f32::EPSILON {
        return true;
    }
    raycast(&Ray::new(from, delta), distance, blockers).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall(x: f32) -> (Handle, Obb) {
        (
            Handle::static_entity(x as usize),
            Obb::axis_aligned(Vec3::new(x, 0.0, 0.0), Vec3::new(1.0, 4.0, 4.0)),
        )
    }

    #[test]
    fn nearest_box_wins() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let hit = raycast(&ray, 100.0, [wall(20.0), wall(10.0)]).unwrap();
        assert_eq!(hit.handle, Handle::static_entity(10));
        assert!((hit.distance - 9.5).abs() < 1e-5);
        assert!((hit.point.x - 9.5).abs() < 1e-5);
    }

    #[test]
    fn range_limits_hits() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert!(raycast(&ray, 5.0, [wall(10.0)]).is_none());
    }

    #[test]
    fn blocked_sight_line() {
        assert!(!line_of_sight(Vec3::ZERO, Vec3::new(30.0, 0.0, 0.0), [wall(10.0)]));
        assert!(line_of_sight(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), [wall(10.0)]));
        assert!(line_of_sight(Vec3::ZERO, Vec3::new(0.0, 0.0, 30.0), [wall(10.0)]));
    }
}
