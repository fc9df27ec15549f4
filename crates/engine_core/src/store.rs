//! Fixed-capacity structure-of-arrays entity tables.
//!
//! Actors keep their optional data in a [`ComponentRegistry`] and declare it
//! in a per-entity [`ComponentMask`]; everything else is a plain column.
//! Statics, projectiles and particles are simple pooled tables. No table
//! grows after construction.

use bytemuck::Pod;
use glam::Vec3;

use crate::components::{ComponentId, ComponentMask, C_POSITION, C_VELOCITY};
use crate::entity::{Category, EntityKind, ParticleKind, ProjectileKind};
use crate::error::EngineError;
use crate::math::{Orientation, Ray};
use crate::model::ModelCollection;
use crate::registry::ComponentRegistry;

/// Aiming rays per actor.
pub const MAX_RAYS_PER_ENTITY: usize = 4;

/// Aiming ray attached to a visual part.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Raycast {
    /// Visual part the ray leaves from.
    pub part: usize,
    /// Muzzle offset in the part's frame.
    pub muzzle: Vec3,
    /// Weapon slot fired along this ray.
    pub weapon: usize,
    pub range: f32,
    pub ray: Ray,
    /// Distance to the first blocker found by the last refresh.
    pub hit_distance: Option<f32>,
}

/// Table capacities, taken from the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldCapacity {
    pub actors: usize,
    pub statics: usize,
    pub projectiles: usize,
    pub particles: usize,
}

/// Dynamic entities.
pub struct Actors {
    capacity: usize,
    /// Iteration range is `[0, count)`.
    count: usize,
    pub alive: Vec<bool>,
    /// Slots owned by a pool; never handed out by [`Actors::allocate`].
    pub pooled: Vec<bool>,
    pub mask: Vec<ComponentMask>,
    pub components: ComponentRegistry,
    pub kind: Vec<EntityKind>,
    pub hit_points: Vec<i32>,
    pub heat: Vec<f32>,
    /// Body yaw and aim pitch.
    pub facing: Vec<Orientation>,
    pub step_cycle: Vec<f32>,
    pub prev_step_cycle: Vec<f32>,
    pub step_rate: Vec<f32>,
    /// Trigger edge state.
    pub is_colliding: Vec<bool>,
    pub visual: Vec<ModelCollection>,
    pub collision: Vec<ModelCollection>,
    pub hitbox: Vec<ModelCollection>,
    rays: Vec<[Raycast; MAX_RAYS_PER_ENTITY]>,
    ray_count: Vec<u8>,
}

impl Actors {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            count: 0,
            alive: vec![false; capacity],
            pooled: vec![false; capacity],
            mask: vec![ComponentMask::EMPTY; capacity],
            components: ComponentRegistry::with_core(capacity),
            kind: vec![EntityKind::default(); capacity],
            hit_points: vec![0; capacity],
            heat: vec![0.0; capacity],
            facing: vec![Orientation::IDENTITY; capacity],
            step_cycle: vec![0.0; capacity],
            prev_step_cycle: vec![0.0; capacity],
            step_rate: vec![0.0; capacity],
            is_colliding: vec![false; capacity],
            visual: vec![ModelCollection::new(); capacity],
            collision: vec![ModelCollection::new(); capacity],
            hitbox: vec![ModelCollection::new(); capacity],
            rays: vec![[Raycast::default(); MAX_RAYS_PER_ENTITY]; capacity],
            ray_count: vec![0; capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// High-water mark of used slots.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Claim the first dead, unpooled slot and wipe it.
    pub fn allocate(&mut self) -> Result<usize, EngineError> {
        let index = (0..self.capacity)
            .find(|&i| !self.alive[i] && !self.pooled[i])
            .ok_or(EngineError::TableFull {
                category: Category::Actor,
                capacity: self.capacity,
            })?;
        self.reset(index);
        self.count = self.count.max(index + 1);
        Ok(index)
    }

    fn reset(&mut self, i: usize) {
        self.components.clear_entity(i);
        self.pooled[i] = false;
        self.mask[i] = ComponentMask::EMPTY;
        self.kind[i] = EntityKind::default();
        self.hit_points[i] = 0;
        self.heat[i] = 0.0;
        self.facing[i] = Orientation::IDENTITY;
        self.step_cycle[i] = 0.0;
        self.prev_step_cycle[i] = 0.0;
        self.step_rate[i] = 0.0;
        self.is_colliding[i] = false;
        self.visual[i].clear();
        self.collision[i].clear();
        self.hitbox[i].clear();
        self.ray_count[i] = 0;
    }

    /// Mark a slot live. Live actors always carry a position.
    pub fn set_alive(&mut self, i: usize) -> Result<(), EngineError> {
        if !self.components.has(i, C_POSITION) {
            return Err(EngineError::MissingPosition(i));
        }
        self.alive[i] = true;
        Ok(())
    }

    #[inline]
    pub fn is_alive(&self, i: usize) -> bool {
        i < self.count && self.alive[i]
    }

    /// Store a typed component and set its mask bit.
    pub fn add_component<T: Pod>(
        &mut self,
        i: usize,
        id: ComponentId,
        value: &T,
    ) -> Result<(), EngineError> {
        self.components.insert(i, id, value)?;
        self.mask[i].insert(id);
        Ok(())
    }

    /// Set a data-less component bit.
    pub fn add_tag(&mut self, i: usize, id: ComponentId) -> Result<(), EngineError> {
        self.components.add_tag(i, id)?;
        self.mask[i].insert(id);
        Ok(())
    }

    pub fn remove_component(&mut self, i: usize, id: ComponentId) {
        self.components.remove(i, id);
        self.mask[i].remove(id);
    }

    #[inline]
    pub fn has(&self, i: usize, id: ComponentId) -> bool {
        self.mask[i].contains(id)
    }

    pub fn get<T: Pod>(&self, i: usize, id: ComponentId) -> Option<&T> {
        self.components.get(i, id)
    }

    pub fn get_mut<T: Pod>(&mut self, i: usize, id: ComponentId) -> Option<&mut T> {
        self.components.get_mut(i, id)
    }

    pub fn position(&self, i: usize) -> Option<Vec3> {
        self.get::<Vec3>(i, C_POSITION).copied()
    }

    pub fn set_position(&mut self, i: usize, position: Vec3) {
        if let Some(p) = self.get_mut::<Vec3>(i, C_POSITION) {
            *p = position;
        }
    }

    pub fn velocity(&self, i: usize) -> Option<Vec3> {
        self.get::<Vec3>(i, C_VELOCITY).copied()
    }

    pub fn set_velocity(&mut self, i: usize, velocity: Vec3) {
        if let Some(v) = self.get_mut::<Vec3>(i, C_VELOCITY) {
            *v = velocity;
        }
    }

    /// Live actor indices in ascending order.
    pub fn iter_alive(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.count).filter(|&i| self.alive[i])
    }

    /// Live actors whose mask contains every bit of `required`.
    pub fn iter_with(&self, required: ComponentMask) -> impl Iterator<Item = usize> + '_ {
        self.iter_alive()
            .filter(move |&i| self.mask[i].contains_all(required))
    }

    /// Attach an aiming ray. Returns false when the actor already has
    /// [`MAX_RAYS_PER_ENTITY`] rays.
    pub fn add_ray(&mut self, i: usize, ray: Raycast) -> bool {
        let n = self.ray_count[i] as usize;
        if n >= MAX_RAYS_PER_ENTITY {
            return false;
        }
        self.rays[i][n] = ray;
        self.ray_count[i] += 1;
        true
    }

    pub fn rays(&self, i: usize) -> &[Raycast] {
        &self.rays[i][..self.ray_count[i] as usize]
    }

    pub fn rays_mut(&mut self, i: usize) -> &mut [Raycast] {
        let n = self.ray_count[i] as usize;
        &mut self.rays[i][..n]
    }

    /// Resolve the three collections. `visual_lift` raises only the visual
    /// root (player headbob).
    pub fn resolve_models(&mut self, i: usize, visual_lift: Vec3) {
        let Some(position) = self.position(i) else {
            return;
        };
        let facing = self.facing[i];
        let body = Orientation::from_yaw(facing.yaw);

        self.visual[i].set_root_orientation(facing);
        self.visual[i].resolve(position + visual_lift);
        self.collision[i].set_root_orientation(body);
        self.collision[i].resolve(position);
        self.hitbox[i].set_root_orientation(body);
        self.hitbox[i].resolve(position);
    }
}

/// Non-moving entities. A slot is free when its visual collection is empty.
pub struct Statics {
    capacity: usize,
    count: usize,
    pub kind: Vec<EntityKind>,
    pub position: Vec<Vec3>,
    pub yaw: Vec<f32>,
    pub visual: Vec<ModelCollection>,
    pub collision: Vec<ModelCollection>,
    pub hitbox: Vec<ModelCollection>,
}

impl Statics {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            count: 0,
            kind: vec![EntityKind::Environment; capacity],
            position: vec![Vec3::ZERO; capacity],
            yaw: vec![0.0; capacity],
            visual: vec![ModelCollection::new(); capacity],
            collision: vec![ModelCollection::new(); capacity],
            hitbox: vec![ModelCollection::new(); capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_occupied(&self, i: usize) -> bool {
        i < self.count && !self.visual[i].is_empty()
    }

    pub fn iter_occupied(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.count).filter(|&i| !self.visual[i].is_empty())
    }

    /// Place a static and resolve its collections once.
    pub fn spawn(
        &mut self,
        kind: EntityKind,
        position: Vec3,
        yaw: f32,
        visual: ModelCollection,
        collision: ModelCollection,
        hitbox: ModelCollection,
    ) -> Result<usize, EngineError> {
        if visual.is_empty() {
            return Err(EngineError::EmptyStatic);
        }
        let index = self
            .visual
            .iter()
            .position(|v| v.is_empty())
            .ok_or(EngineError::TableFull {
                category: Category::Static,
                capacity: self.capacity,
            })?;
        self.kind[index] = kind;
        self.position[index] = position;
        self.yaw[index] = yaw;
        self.visual[index] = visual;
        self.collision[index] = collision;
        self.hitbox[index] = hitbox;
        self.count = self.count.max(index + 1);
        self.resolve_models(index);
        Ok(index)
    }

    pub fn resolve_models(&mut self, i: usize) {
        let position = self.position[i];
        let body = Orientation::from_yaw(self.yaw[i]);
        for collection in [
            &mut self.visual[i],
            &mut self.collision[i],
            &mut self.hitbox[i],
        ] {
            collection.set_root_orientation(body);
            collection.resolve(position);
        }
    }

    /// Free the slot.
    pub fn clear(&mut self, i: usize) {
        self.visual[i].clear();
        self.collision[i].clear();
        self.hitbox[i].clear();
    }
}

/// Parameters for a new projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpawn {
    pub kind: ProjectileKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub drop_rate: f32,
    /// Firing actor; never hit by its own rounds.
    pub owner: Option<usize>,
}

/// Pooled projectiles. `active[i] == false` means the slot is reusable.
pub struct Projectiles {
    capacity: usize,
    pub active: Vec<bool>,
    pub position: Vec<Vec3>,
    pub velocity: Vec<Vec3>,
    pub lifetime: Vec<f32>,
    pub radius: Vec<f32>,
    pub drop_rate: Vec<f32>,
    pub owner: Vec<Option<usize>>,
    pub kind: Vec<ProjectileKind>,
}

impl Projectiles {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            active: vec![false; capacity],
            position: vec![Vec3::ZERO; capacity],
            velocity: vec![Vec3::ZERO; capacity],
            lifetime: vec![0.0; capacity],
            radius: vec![0.0; capacity],
            drop_rate: vec![0.0; capacity],
            owner: vec![None; capacity],
            kind: vec![ProjectileKind::default(); capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// First free slot, if any.
    pub fn spawn(&mut self, spawn: ProjectileSpawn) -> Option<usize> {
        let i = self.active.iter().position(|a| !a)?;
        self.active[i] = true;
        self.position[i] = spawn.position;
        self.velocity[i] = spawn.velocity;
        self.lifetime[i] = spawn.kind.lifetime();
        self.radius[i] = spawn.kind.radius();
        self.drop_rate[i] = spawn.drop_rate;
        self.owner[i] = spawn.owner;
        self.kind[i] = spawn.kind;
        Some(i)
    }

    pub fn deactivate(&mut self, i: usize) {
        self.active[i] = false;
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }
}

/// Pooled visual particles.
pub struct Particles {
    capacity: usize,
    pub active: Vec<bool>,
    pub position: Vec<Vec3>,
    pub lifetime: Vec<f32>,
    pub start_lifetime: Vec<f32>,
    pub kind: Vec<ParticleKind>,
}

impl Particles {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            active: vec![false; capacity],
            position: vec![Vec3::ZERO; capacity],
            lifetime: vec![0.0; capacity],
            start_lifetime: vec![0.0; capacity],
            kind: vec![ParticleKind::default(); capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn spawn(&mut self, kind: ParticleKind, position: Vec3) -> Option<usize> {
        let i = self.active.iter().position(|a| !a)?;
        let life = kind.start_lifetime();
        self.active[i] = true;
        self.position[i] = position;
        self.lifetime[i] = life;
        self.start_lifetime[i] = life;
        self.kind[i] = kind;
        Some(i)
    }

    /// Age every live particle; returns how many expired.
    pub fn age(&mut self, dt: f32) -> usize {
        let mut expired = 0;
        for i in 0..self.capacity {
            if !self.active[i] {
                continue;
            }
            self.lifetime[i] -= dt;
            if self.lifetime[i] <= 0.0 {
                self.lifetime[i] = 0.0;
                self.active[i] = false;
                expired += 1;
            }
        }
        expired
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }

    pub fn count_of(&self, kind: ParticleKind) -> usize {
        (0..self.capacity)
            .filter(|&i| self.active[i] && self.kind[i] == kind)
            .count()
    }
}

/// Every entity table.
pub struct World {
    pub actors: Actors,
    pub statics: Statics,
    pub projectiles: Projectiles,
    pub particles: Particles,
}

impl World {
    pub fn new(capacity: WorldCapacity) -> Self {
        log::debug!(
            "allocating world: {} actors, {} statics, {} projectiles, {} particles",
            capacity.actors,
            capacity.statics,
            capacity.projectiles,
            capacity.particles
        );
        Self {
            actors: Actors::new(capacity.actors),
            statics: Statics::new(capacity.statics),
            projectiles: Projectiles::new(capacity.projectiles),
            particles: Particles::new(capacity.particles),
        }
    }
}
