//! Oriented-box collision kernel.
//!
//! Boxes come from resolved model parts: the part's world position and Euler
//! orientation, plus the local bounds of its model. All tests are discrete;
//! there is no contact manifold and no rotational response.

use engine_core::{ray_box, Aabb, Mat3, ModelPart, Ray, Vec3, EPSILON};

/// Oriented bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    pub center: Vec3,
    pub half_extents: Vec3,
    /// Columns are the box's local axes.
    pub rotation: Mat3,
}

impl Obb {
    pub fn new(center: Vec3, half_extents: Vec3, rotation: Mat3) -> Self {
        Self {
            center,
            half_extents,
            rotation,
        }
    }

    /// Axis-aligned box of the given full size.
    pub fn axis_aligned(center: Vec3, size: Vec3) -> Self {
        Self::new(center, size * 0.5, Mat3::IDENTITY)
    }

    /// Box of a resolved part. The model bounds may be off-centre.
    pub fn from_part(part: &ModelPart) -> Self {
        let rotation = part.global_orientation.matrix();
        let bounds = part.model.bounds;
        Self {
            center: part.global_position + rotation * bounds.center(),
            half_extents: bounds.half_extents(),
            rotation,
        }
    }

    /// Same box grown by `margin` on every face, for swept spheres.
    pub fn inflated(&self, margin: f32) -> Self {
        Self {
            half_extents: self.half_extents + Vec3::splat(margin.max(0.0)),
            ..*self
        }
    }

    pub fn axes(&self) -> [Vec3; 3] {
        [
            self.rotation.x_axis,
            self.rotation.y_axis,
            self.rotation.z_axis,
        ]
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let [ax, ay, az] = self.axes();
        let h = self.half_extents;
        let mut out = [Vec3::ZERO; 8];
        for (i, corner) in out.iter_mut().enumerate() {
            let sx = if i & 1 == 0 { -h.x } else { h.x };
            let sy = if i & 2 == 0 { -h.y } else { h.y };
            let sz = if i & 4 == 0 { -h.z } else { h.z };
            *corner = self.center + ax * sx + ay * sy + az * sz;
        }
        out
    }

    /// World point to box-local coordinates (centre at origin).
    #[inline]
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.transpose() * (point - self.center)
    }

    pub fn local_bounds(&self) -> Aabb {
        Aabb::new(-self.half_extents, self.half_extents)
    }

    fn project(&self, axis: Vec3) -> (f32, f32) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for corner in self.corners() {
            let d = corner.dot(axis);
            min = min.min(d);
            max = max.max(d);
        }
        (min, max)
    }
}

/// Minimum translation vector. `axis` points from box `a` towards box `b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mtv {
    pub axis: Vec3,
    pub depth: f32,
}

impl Mtv {
    /// Displacement that separates `a` from `b` when only `a` moves.
    #[inline]
    pub fn push_a(&self) -> Vec3 {
        -self.axis * self.depth
    }
}

/// Separating-axis test over the 15 candidate axes. Returns the MTV when
/// every axis shows strictly positive overlap.
pub fn obb_overlap(a: &Obb, b: &Obb) -> Option<Mtv> {
    let a_axes = a.axes();
    let b_axes = b.axes();

    let mut candidates = [Vec3::ZERO; 15];
    candidates[..3].copy_from_slice(&a_axes);
    candidates[3..6].copy_from_slice(&b_axes);
    for (i, ua) in a_axes.iter().enumerate() {
        for (j, ub) in b_axes.iter().enumerate() {
            candidates[6 + i * 3 + j] = ua.cross(*ub);
        }
    }

    let mut best: Option<Mtv> = None;
    for axis in candidates {
        let len = axis.length();
        // Parallel edges produce near-zero cross products.
        if len < EPSILON {
            continue;
        }
        let axis = axis / len;
        let (a_min, a_max) = a.project(axis);
        let (b_min, b_max) = b.project(axis);
        let overlap = a_max.min(b_max) - a_min.max(b_min);
        if overlap <= 0.0 {
            return None;
        }
        if best.map_or(true, |m| overlap < m.depth) {
            best = Some(Mtv {
                axis,
                depth: overlap,
            });
        }
    }

    best.map(|mut mtv| {
        if (b.center - a.center).dot(mtv.axis) < 0.0 {
            mtv.axis = -mtv.axis;
        }
        mtv
    })
}

/// Sphere against box: the closest point of the box lies within `radius`.
pub fn sphere_obb(center: Vec3, radius: f32, obb: &Obb) -> bool {
    let local = obb.to_local(center);
    let clamped = local.clamp(-obb.half_extents, obb.half_extents);
    (local - clamped).length_squared() <= radius * radius
}

/// Segment against box via a local-space ray test. Returns the distance from
/// `start` to the first contact.
pub fn segment_obb(start: Vec3, end: Vec3, obb: &Obb) -> Option<f32> {
    let local_start = obb.to_local(start);
    let local_end = obb.to_local(end);
    let delta = local_end - local_start;
    let length = delta.length();
    let bounds = obb.local_bounds();
    if length < EPSILON {
        return bounds.contains(local_start).then_some(0.0);
    }
    let ray = Ray::new(local_start, delta / length);
    ray_box(&ray, &bounds).filter(|&t| t <= length)
}
