//! Component registry: dynamically registered, fixed-capacity columns.
//!
//! Each column is one contiguous byte array of `capacity × element_size`
//! plus an occupancy bitmap. Typed access goes through `bytemuck`, so any
//! `Pod` type whose size matches the registered element size can be read or
//! written in place, and a whole column can be borrowed as `&mut [T]` for
//! vectorised kernels.

use bytemuck::Pod;

use crate::components::{
    ComponentId, MoveTarget, WeaponBank, C_COLLISION, C_COOLDOWN, C_GRAVITY, C_HITBOX,
    C_HITPOINT, C_MOVE_TARGET, C_POSITION, C_PREV_POSITION, C_RAYCAST, C_TRIGGER, C_VELOCITY,
    CORE_COMPONENT_COUNT,
};
use crate::error::EngineError;

/// The component mask is a `u64`.
pub const MAX_COMPONENTS: usize = 64;

struct Column {
    element_size: usize,
    /// Backing store; `u64` words keep every element at least 8-byte aligned
    /// relative to the column base.
    data: Vec<u64>,
    occupied: Vec<u64>,
}

impl Column {
    fn new(capacity: usize, element_size: usize) -> Self {
        let words = (capacity * element_size).div_ceil(8);
        Self {
            element_size,
            data: vec![0; words],
            occupied: vec![0; capacity.div_ceil(64)],
        }
    }

    #[inline]
    fn is_occupied(&self, entity: usize) -> bool {
        self.occupied[entity / 64] & (1u64 << (entity % 64)) != 0
    }

    #[inline]
    fn set_occupied(&mut self, entity: usize, on: bool) {
        let bit = 1u64 << (entity % 64);
        if on {
            self.occupied[entity / 64] |= bit;
        } else {
            self.occupied[entity / 64] &= !bit;
        }
    }

    fn bytes_mut(&mut self, capacity: usize) -> &mut [u8] {
        let len = capacity * self.element_size;
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.data)[..len]
    }

    fn slot(&self, entity: usize) -> &[u8] {
        let start = entity * self.element_size;
        &bytemuck::cast_slice::<u64, u8>(&self.data)[start..start + self.element_size]
    }

    fn slot_mut(&mut self, entity: usize) -> &mut [u8] {
        let start = entity * self.element_size;
        let size = self.element_size;
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.data)[start..start + size]
    }
}

/// Column store keyed by [`ComponentId`].
pub struct ComponentRegistry {
    capacity: usize,
    columns: Vec<Column>,
}

impl ComponentRegistry {
    /// Empty registry for `capacity` entities.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            columns: Vec::new(),
        }
    }

    /// Registry with the engine's built-in columns already registered, so the
    /// `C_*` constants are valid ids.
    pub fn with_core(capacity: usize) -> Self {
        let vec3 = std::mem::size_of::<glam::Vec3>();
        let layout: [(ComponentId, usize); CORE_COMPONENT_COUNT] = [
            (C_POSITION, vec3),
            (C_VELOCITY, vec3),
            (C_PREV_POSITION, vec3),
            (C_GRAVITY, 0),
            (C_COLLISION, 0),
            (C_HITBOX, 0),
            (C_RAYCAST, 0),
            (C_TRIGGER, 0),
            (C_HITPOINT, 0),
            (C_COOLDOWN, std::mem::size_of::<WeaponBank>()),
            (C_MOVE_TARGET, std::mem::size_of::<MoveTarget>()),
        ];
        let mut registry = Self::new(capacity);
        for (id, size) in layout {
            debug_assert_eq!(registry.columns.len(), id.raw() as usize);
            registry.columns.push(Column::new(capacity, size));
        }
        registry
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Allocate a column of `capacity × element_size` bytes. Zero-sized
    /// elements make tag components that only track occupancy.
    pub fn register(&mut self, element_size: usize) -> Result<ComponentId, EngineError> {
        if self.columns.len() >= MAX_COMPONENTS {
            return Err(EngineError::ComponentLimit(self.columns.len()));
        }
        let id = ComponentId(self.columns.len() as u8);
        self.columns.push(Column::new(self.capacity, element_size));
        log::trace!("registered component {} ({} bytes)", id.raw(), element_size);
        Ok(id)
    }

    pub fn element_size(&self, id: ComponentId) -> Option<usize> {
        self.columns.get(id.raw() as usize).map(|c| c.element_size)
    }

    fn column(&self, id: ComponentId) -> Result<&Column, EngineError> {
        self.columns
            .get(id.raw() as usize)
            .ok_or(EngineError::UnknownComponent { id: id.raw() })
    }

    fn column_mut_checked(&mut self, id: ComponentId) -> Result<&mut Column, EngineError> {
        self.columns
            .get_mut(id.raw() as usize)
            .ok_or(EngineError::UnknownComponent { id: id.raw() })
    }

    fn check_entity(&self, entity: usize) -> Result<(), EngineError> {
        if entity >= self.capacity {
            return Err(EngineError::OutOfRange {
                category: crate::Category::Actor,
                index: entity,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Copy `bytes` into the entity's slot and mark it occupied.
    pub fn add_bytes(
        &mut self,
        entity: usize,
        id: ComponentId,
        bytes: &[u8],
    ) -> Result<(), EngineError> {
        self.check_entity(entity)?;
        let column = self.column_mut_checked(id)?;
        if bytes.len() != column.element_size {
            return Err(EngineError::ComponentSize {
                id: id.raw(),
                expected: column.element_size,
                actual: bytes.len(),
            });
        }
        column.slot_mut(entity).copy_from_slice(bytes);
        column.set_occupied(entity, true);
        Ok(())
    }

    pub fn insert<T: Pod>(
        &mut self,
        entity: usize,
        id: ComponentId,
        value: &T,
    ) -> Result<(), EngineError> {
        self.add_bytes(entity, id, bytemuck::bytes_of(value))
    }

    /// Mark a tag (or any) component occupied without touching its bytes.
    pub fn add_tag(&mut self, entity: usize, id: ComponentId) -> Result<(), EngineError> {
        self.check_entity(entity)?;
        self.column_mut_checked(id)?.set_occupied(entity, true);
        Ok(())
    }

    pub fn remove(&mut self, entity: usize, id: ComponentId) {
        if entity >= self.capacity {
            return;
        }
        if let Some(column) = self.columns.get_mut(id.raw() as usize) {
            column.set_occupied(entity, false);
        }
    }

    /// Drop every component of `entity`.
    pub fn clear_entity(&mut self, entity: usize) {
        if entity >= self.capacity {
            return;
        }
        for column in &mut self.columns {
            column.set_occupied(entity, false);
        }
    }

    pub fn has(&self, entity: usize, id: ComponentId) -> bool {
        entity < self.capacity
            && self
                .columns
                .get(id.raw() as usize)
                .is_some_and(|c| c.is_occupied(entity))
    }

    /// Raw slot bytes; `None` when the entity does not carry the component.
    pub fn get_bytes(&self, entity: usize, id: ComponentId) -> Option<&[u8]> {
        if !self.has(entity, id) {
            return None;
        }
        self.column(id).ok().map(|c| c.slot(entity))
    }

    pub fn get_bytes_mut(&mut self, entity: usize, id: ComponentId) -> Option<&mut [u8]> {
        if !self.has(entity, id) {
            return None;
        }
        self.column_mut_checked(id).ok().map(|c| c.slot_mut(entity))
    }

    /// Typed view of a slot. `None` when absent or when `T` does not match the
    /// registered element size.
    pub fn get<T: Pod>(&self, entity: usize, id: ComponentId) -> Option<&T> {
        self.get_bytes(entity, id)
            .and_then(|bytes| bytemuck::try_from_bytes(bytes).ok())
    }

    pub fn get_mut<T: Pod>(&mut self, entity: usize, id: ComponentId) -> Option<&mut T> {
        self.get_bytes_mut(entity, id)
            .and_then(|bytes| bytemuck::try_from_bytes_mut(bytes).ok())
    }

    /// Whole column as a typed slice indexed by entity, occupied or not.
    /// Tag columns and size mismatches give `None`.
    pub fn column_as_mut<T: Pod>(&mut self, id: ComponentId) -> Option<&mut [T]> {
        let capacity = self.capacity;
        let column = self.columns.get_mut(id.raw() as usize)?;
        if column.element_size != std::mem::size_of::<T>() || column.element_size == 0 {
            return None;
        }
        bytemuck::try_cast_slice_mut(column.bytes_mut(capacity)).ok()
    }
}
