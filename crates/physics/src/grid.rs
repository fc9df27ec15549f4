//! Uniform broad-phase grid over the XZ plane.
//!
//! Each cell owns a fixed-capacity bucket of entity handles stored in one flat
//! array. A back-reference table records which cell currently holds each
//! entity, so removal never has to search the whole grid.

use engine_core::{Category, Handle, Vec3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("grid cell ({cx}, {cz}) is full ({capacity} handles)")]
    BucketOverflow {
        cx: usize,
        cz: usize,
        capacity: usize,
    },

    #[error("{0:?} does not fit the grid's entity table")]
    HandleOutOfRange(Handle),
}

/// Sizes of the three handle categories; they share one back-reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub actors: usize,
    pub statics: usize,
    pub projectiles: usize,
}

impl GridLayout {
    pub fn max_entities(&self) -> usize {
        self.actors + self.statics + self.projectiles
    }

    fn slot(&self, handle: Handle) -> Option<usize> {
        let (base, len) = match handle.category {
            Category::Actor => (0, self.actors),
            Category::Static => (self.actors, self.statics),
            Category::Projectile => (self.actors + self.statics, self.projectiles),
        };
        (handle.index() < len).then(|| base + handle.index())
    }
}

/// Grid construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridDesc {
    pub min_x: f32,
    pub min_z: f32,
    pub width: f32,
    pub depth: f32,
    pub cell_size: f32,
    pub bucket_capacity: usize,
}

pub struct SpatialGrid {
    min_x: f32,
    min_z: f32,
    cell_size: f32,
    cols: usize,
    rows: usize,
    bucket_capacity: usize,
    /// `cols * rows * bucket_capacity` handle slots.
    slots: Vec<Handle>,
    lens: Vec<usize>,
    layout: GridLayout,
    /// Cell index per entity, `None` when not inserted.
    node_for: Vec<Option<usize>>,
}

impl SpatialGrid {
    pub fn new(desc: GridDesc, layout: GridLayout) -> Self {
        let cell_size = if desc.cell_size > 0.0 { desc.cell_size } else { 1.0 };
        let cols = ((desc.width / cell_size).ceil() as usize).max(1);
        let rows = ((desc.depth / cell_size).ceil() as usize).max(1);
        let bucket_capacity = desc.bucket_capacity.max(1);
        log::debug!(
            "spatial grid {}x{} cells of {:.1}, {} handles per cell",
            cols,
            rows,
            cell_size,
            bucket_capacity
        );
        Self {
            min_x: desc.min_x,
            min_z: desc.min_z,
            cell_size,
            cols,
            rows,
            bucket_capacity,
            slots: vec![Handle::actor(0); cols * rows * bucket_capacity],
            lens: vec![0; cols * rows],
            layout,
            node_for: vec![None; layout.max_entities()],
        }
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    /// Cell coordinates of a world position, clamped to the grid.
    pub fn cell_of(&self, position: Vec3) -> (usize, usize) {
        let fx = ((position.x - self.min_x) / self.cell_size).floor();
        let fz = ((position.z - self.min_z) / self.cell_size).floor();
        // `as` saturates and maps NaN to 0.
        let cx = (fx.max(0.0) as usize).min(self.cols - 1);
        let cz = (fz.max(0.0) as usize).min(self.rows - 1);
        (cx, cz)
    }

    #[inline]
    fn cell_index(&self, cx: usize, cz: usize) -> usize {
        cz * self.cols + cx
    }

    /// Handles currently stored in a cell.
    pub fn bucket(&self, cx: usize, cz: usize) -> &[Handle] {
        if cx >= self.cols || cz >= self.rows {
            return &[];
        }
        let cell = self.cell_index(cx, cz);
        let start = cell * self.bucket_capacity;
        &self.slots[start..start + self.lens[cell]]
    }

    /// Cell holding `handle`, if it is inserted.
    pub fn node_for(&self, handle: Handle) -> Option<(usize, usize)> {
        let cell = (*self.node_for.get(self.layout.slot(handle)?)?)?;
        Some((cell % self.cols, cell / self.cols))
    }

    pub fn add_entity(&mut self, handle: Handle, position: Vec3) -> Result<(), GridError> {
        let slot = self
            .layout
            .slot(handle)
            .ok_or(GridError::HandleOutOfRange(handle))?;
        let (cx, cz) = self.cell_of(position);
        let cell = self.cell_index(cx, cz);
        let len = self.lens[cell];
        if len >= self.bucket_capacity {
            return Err(GridError::BucketOverflow {
                cx,
                cz,
                capacity: self.bucket_capacity,
            });
        }
        self.slots[cell * self.bucket_capacity + len] = handle;
        self.lens[cell] = len + 1;
        self.node_for[slot] = Some(cell);
        Ok(())
    }

    /// Remove `handle` from the cell of its pre-move `position`. Falls back to
    /// the recorded cell when the caller's position has drifted.
    pub fn remove_entity(&mut self, handle: Handle, position: Vec3) -> bool {
        let Some(slot) = self.layout.slot(handle) else {
            return false;
        };
        let (cx, cz) = self.cell_of(position);
        let cell = self.cell_index(cx, cz);
        let recorded = self.node_for[slot];
        let removed = self.remove_from_cell(cell, handle)
            || matches!(recorded, Some(c) if c != cell && self.remove_from_cell(c, handle));
        if removed {
            self.node_for[slot] = None;
        }
        removed
    }

    fn remove_from_cell(&mut self, cell: usize, handle: Handle) -> bool {
        let start = cell * self.bucket_capacity;
        let len = self.lens[cell];
        let bucket = &mut self.slots[start..start + len];
        let Some(pos) = bucket.iter().position(|h| *h == handle) else {
            return false;
        };
        // Shift down so insertion order inside the bucket is preserved.
        bucket.copy_within(pos + 1.., pos);
        self.lens[cell] = len - 1;
        true
    }

    /// Move `handle` between cells when the move crosses a cell boundary.
    pub fn update_entity(
        &mut self,
        handle: Handle,
        old_position: Vec3,
        new_position: Vec3,
    ) -> Result<(), GridError> {
        let old_cell = self.cell_of(old_position);
        let new_cell = self.cell_of(new_position);
        let inserted = self.node_for(handle).is_some();
        if inserted && old_cell == new_cell {
            return Ok(());
        }
        if inserted {
            self.remove_entity(handle, old_position);
        }
        self.add_entity(handle, new_position)
    }

    /// Handles in the 3x3 cells centred on `(cx, cz)`, skipping cells outside
    /// the grid.
    pub fn neighbourhood(&self, cx: usize, cz: usize) -> impl Iterator<Item = Handle> + '_ {
        let cx = cx as isize;
        let cz = cz as isize;
        (-1..=1)
            .flat_map(move |dz| (-1..=1).map(move |dx| (cx + dx, cz + dz)))
            .filter(|&(x, z)| {
                x >= 0 && z >= 0 && (x as usize) < self.cols && (z as usize) < self.rows
            })
            .flat_map(|(x, z)| self.bucket(x as usize, z as usize).iter().copied())
    }

    /// Handles around a world position.
    pub fn neighbourhood_of(&self, position: Vec3) -> impl Iterator<Item = Handle> + '_ {
        let (cx, cz) = self.cell_of(position);
        self.neighbourhood(cx, cz)
    }

    /// Handles in every cell of the rectangle spanned by a segment, grown by
    /// one cell on each side. For a segment inside one cell this is the 3x3
    /// stencil.
    pub fn swept(&self, from: Vec3, to: Vec3) -> impl Iterator<Item = Handle> + '_ {
        let (ax, az) = self.cell_of(from);
        let (bx, bz) = self.cell_of(to);
        let x0 = ax.min(bx).saturating_sub(1);
        let z0 = az.min(bz).saturating_sub(1);
        let x1 = (ax.max(bx) + 1).min(self.cols - 1);
        let z1 = (az.max(bz) + 1).min(self.rows - 1);
        (z0..=z1)
            .flat_map(move |z| (x0..=x1).map(move |x| (x, z)))
            .flat_map(|(x, z)| self.bucket(x, z).iter().copied())
    }

    /// Whether the cell of `position` holds `handle`.
    pub fn contains(&self, handle: Handle, position: Vec3) -> bool {
        let (cx, cz) = self.cell_of(position);
        self.bucket(cx, cz).contains(&handle)
    }

    /// Total handles stored.
    pub fn len(&self) -> usize {
        self.lens.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
