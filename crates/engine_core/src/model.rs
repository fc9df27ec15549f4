//! Model collections: small transform hierarchies attached to an entity.
//!
//! A collection owns a flat list of parts. A part may name an earlier part as
//! its parent; that ordering is checked on insertion so a single forward pass
//! resolves every world pose.

use glam::Vec3;

use crate::error::EngineError;
use crate::math::{rotate_xyz, Aabb, Axis, Orientation};

/// Where a part's mesh comes from. The renderer owns the actual geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshSource {
    #[default]
    Cube,
    Asset(u32),
}

/// Opaque renderable plus the local bounds the collision kernel needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Model {
    pub mesh: MeshSource,
    pub bounds: Aabb,
}

impl Model {
    /// Box of the given width/height/depth centred on the part origin.
    pub fn cube(width: f32, height: f32, depth: f32) -> Self {
        Self {
            mesh: MeshSource::Cube,
            bounds: Aabb::from_center_half_extents(
                Vec3::ZERO,
                Vec3::new(width, height, depth) * 0.5,
            ),
        }
    }

    pub fn asset(id: u32, bounds: Aabb) -> Self {
        Self {
            mesh: MeshSource::Asset(id),
            bounds,
        }
    }
}

/// One node of a collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPart {
    pub model: Model,
    pub offset: Vec3,
    pub orientation: Orientation,
    pub parent: Option<usize>,
    /// Yaw/pitch/roll: take the parent's resolved channel instead of the local one.
    pub rot_locks: [bool; 3],
    /// Yaw/pitch/roll: negate the resolved channel.
    pub rot_inverts: [bool; 3],
    pub local_rotation_offset: Orientation,
    pub is_active: bool,
    pub global_position: Vec3,
    pub global_orientation: Orientation,
}

impl ModelPart {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            offset: Vec3::ZERO,
            orientation: Orientation::IDENTITY,
            parent: None,
            rot_locks: [false; 3],
            rot_inverts: [false; 3],
            local_rotation_offset: Orientation::IDENTITY,
            is_active: true,
            global_position: Vec3::ZERO,
            global_orientation: Orientation::IDENTITY,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn locked(mut self, axis: Axis) -> Self {
        self.rot_locks[axis.index()] = true;
        self
    }

    pub fn inverted(mut self, axis: Axis) -> Self {
        self.rot_inverts[axis.index()] = true;
        self
    }

    pub fn with_rotation_offset(mut self, offset: Orientation) -> Self {
        self.local_rotation_offset = offset;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Ordered parts of one entity (visual, movement-collision or hitbox).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelCollection {
    parts: Vec<ModelPart>,
}

impl ModelCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a part, rejecting parents that are not strictly earlier.
    pub fn push(&mut self, part: ModelPart) -> Result<usize, EngineError> {
        let index = self.parts.len();
        if let Some(parent) = part.parent {
            if parent >= index {
                return Err(EngineError::InvalidParent {
                    part: index,
                    parent,
                });
            }
        }
        self.parts.push(part);
        Ok(index)
    }

    pub fn with_part(mut self, part: ModelPart) -> Result<Self, EngineError> {
        self.push(part)?;
        Ok(self)
    }

    /// Single root part; the common case for collision and hitbox collections.
    pub fn single(model: Model, offset: Vec3) -> Self {
        Self {
            parts: vec![ModelPart::new(model).with_offset(offset)],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[ModelPart] {
        &self.parts
    }

    pub fn part(&self, index: usize) -> Option<&ModelPart> {
        self.parts.get(index)
    }

    pub fn part_mut(&mut self, index: usize) -> Option<&mut ModelPart> {
        self.parts.get_mut(index)
    }

    pub fn clear(&mut self) {
        self.parts.clear();
    }

    pub fn set_active(&mut self, index: usize, active: bool) {
        if let Some(part) = self.parts.get_mut(index) {
            part.is_active = active;
        }
    }

    /// Drive the local orientation of every root part.
    pub fn set_root_orientation(&mut self, orientation: Orientation) {
        for part in self.parts.iter_mut().filter(|p| p.parent.is_none()) {
            part.orientation = orientation;
        }
    }

    /// Resolve world poses with root parts anchored at `anchor`.
    pub fn resolve(&mut self, anchor: Vec3) {
        for m in 0..self.parts.len() {
            let part = self.parts[m];

            let (mut orientation, position) = match part.parent {
                Some(p) => {
                    let parent = self.parts[p];
                    let mut o = part.orientation;
                    for axis in Axis::ALL {
                        if part.rot_locks[axis.index()] {
                            o.set_channel(axis, parent.global_orientation.channel(axis));
                        }
                    }
                    let turned = rotate_xyz(0.0, parent.global_orientation.yaw, 0.0) * part.offset;
                    (o, parent.global_position + turned)
                }
                None => (part.orientation, anchor + part.offset),
            };

            orientation = orientation + part.local_rotation_offset;
            for axis in Axis::ALL {
                if part.rot_inverts[axis.index()] {
                    orientation.set_channel(axis, -orientation.channel(axis));
                }
            }

            let out = &mut self.parts[m];
            out.global_position = position;
            out.global_orientation = orientation;
        }
    }
}
