//! Math kernel: Euler orientations, rays and axis-aligned boxes.
//!
//! Orientations are stored as plain yaw/pitch/roll channels. The one place
//! they turn into a rotation is [`rotate_xyz`], which every consumer (model
//! resolution, the collision kernel, aiming) goes through.

use std::ops::Add;

use glam::{Mat3, Vec3};

/// Tolerance for normalisation and degenerate-axis checks.
pub const EPSILON: f32 = 1e-6;

/// One rotation channel of an [`Orientation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Yaw,
    Pitch,
    Roll,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Yaw, Axis::Pitch, Axis::Roll];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::Yaw => 0,
            Axis::Pitch => 1,
            Axis::Roll => 2,
        }
    }
}

/// Euler orientation in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl Orientation {
    pub const IDENTITY: Self = Self {
        yaw: 0.0,
        pitch: 0.0,
        roll: 0.0,
    };

    pub const fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }

    pub const fn from_yaw(yaw: f32) -> Self {
        Self {
            yaw,
            pitch: 0.0,
            roll: 0.0,
        }
    }

    #[inline]
    pub fn channel(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Yaw => self.yaw,
            Axis::Pitch => self.pitch,
            Axis::Roll => self.roll,
        }
    }

    #[inline]
    pub fn set_channel(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::Yaw => self.yaw = value,
            Axis::Pitch => self.pitch = value,
            Axis::Roll => self.roll = value,
        }
    }

    /// Rotation matrix for this orientation.
    #[inline]
    pub fn matrix(&self) -> Mat3 {
        rotate_xyz(self.pitch, self.yaw, self.roll)
    }

    /// Unit forward vector (-Z at identity).
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.matrix() * Vec3::NEG_Z
    }
}

impl Add for Orientation {
    type Output = Orientation;

    fn add(self, rhs: Orientation) -> Orientation {
        Orientation {
            yaw: self.yaw + rhs.yaw,
            pitch: self.pitch + rhs.pitch,
            roll: self.roll + rhs.roll,
        }
    }
}

/// Intrinsic rotation: yaw about Y first, then pitch about X, then roll about Z.
///
/// Yaw is negated here and nowhere else, so a positive yaw turns the -Z
/// forward vector towards +X.
#[inline]
pub fn rotate_xyz(pitch: f32, yaw: f32, roll: f32) -> Mat3 {
    Mat3::from_rotation_y(-yaw) * Mat3::from_rotation_x(pitch) * Mat3::from_rotation_z(roll)
}

/// Yaw that makes [`Orientation::forward`] point from `from` towards `to` in the XZ plane.
#[inline]
pub fn yaw_towards(from: Vec3, to: Vec3) -> f32 {
    let d = to - from;
    d.x.atan2(-d.z)
}

/// Drop the vertical component.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Normalise, or return zero when the vector is shorter than [`EPSILON`].
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len = v.length();
    if len < EPSILON {
        Vec3::ZERO
    } else {
        v / len
    }
}

/// Half-line from `position` along `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub position: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray; the direction is normalised (zero stays zero).
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            direction: normalize_or_zero(direction),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.position + self.direction * distance
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self::new(center - half, center + half)
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

/// Ray against an axis-aligned box (slab test).
///
/// Returns the distance along the ray to the entry point, or `0.0` when the
/// ray starts inside the box. A zero-direction ray only hits when its origin
/// is inside.
pub fn ray_box(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for i in 0..3 {
        let origin = ray.position[i];
        let dir = ray.direction[i];
        let (lo, hi) = (aabb.min[i], aabb.max[i]);

        if dir.abs() < EPSILON {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / dir;
        let mut t0 = (lo - origin) * inv;
        let mut t1 = (hi - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_far < 0.0 {
        return None;
    }
    Some(t_near.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn rotate_xyz_is_orthonormal() {
        let m = rotate_xyz(0.3, 1.2, -0.7);
        let should_be_identity = m * m.transpose();
        assert!(should_be_identity.abs_diff_eq(Mat3::IDENTITY, 1e-5));
        assert!((m.determinant() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn positive_yaw_turns_forward_towards_plus_x() {
        let f = Orientation::from_yaw(FRAC_PI_2).forward();
        assert!((f - Vec3::X).length() < 1e-5, "forward was {f:?}");
    }

    #[test]
    fn positive_pitch_looks_up() {
        let f = Orientation::new(0.0, 0.5, 0.0).forward();
        assert!(f.y > 0.0);
        assert!(f.z < 0.0);
    }

    #[test]
    fn yaw_towards_matches_forward() {
        let from = Vec3::new(1.0, 0.0, 1.0);
        let to = Vec3::new(-4.0, 3.0, 6.0);
        let f = Orientation::from_yaw(yaw_towards(from, to)).forward();
        let expected = horizontal(to - from).normalize();
        assert!((f - expected).length() < 1e-5);
    }

    #[test]
    fn ray_box_hits_front_face() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let d = ray_box(&ray, &aabb).expect("should hit");
        assert!((d - 9.0).abs() < 1e-5);
    }

    #[test]
    fn ray_box_misses_when_pointing_away() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(ray_box(&ray, &aabb).is_none());
    }

    #[test]
    fn ray_box_parallel_outside_slab_misses() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 5.0, 10.0), Vec3::NEG_Z);
        assert!(ray_box(&ray, &aabb).is_none());
    }

    #[test]
    fn ray_starting_inside_reports_zero() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray_box(&ray, &aabb), Some(0.0));
    }

    #[test]
    fn zero_direction_ray_is_kept_zero() {
        let ray = Ray::new(Vec3::ONE, Vec3::ZERO);
        assert_eq!(ray.direction, Vec3::ZERO);
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
        assert!(ray_box(&ray, &aabb).is_none());
    }
}
