//! The engine value: every table, index and collaborator queue the simulation
//! owns, plus entity creation.
//!
//! There is no process-wide engine. Hosts own one `Engine` and pass it to the
//! systems explicitly; behaviour hooks receive it as `&mut Engine`.

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use audio::{SoundEvent, SoundKind, SoundQueue};
use engine_core::{
    ComponentMask, EngineError, EntityKind, Handle, ModelCollection, MoveTarget, Orientation,
    ParticleKind, ProjectileSpawn, Raycast, WeaponBank, World, C_COLLISION, C_COOLDOWN,
    C_GRAVITY, C_HITBOX, C_HITPOINT, C_MOVE_TARGET, C_POSITION, C_PREV_POSITION, C_RAYCAST,
    C_TRIGGER, C_VELOCITY,
};
use input::PlayerCommand;
use physics::{GridDesc, GridError, KinematicParams, SpatialGrid};
use procgen::{generate_arena_mesh, ArenaMeshConfig, Heightmap, MapError, SourceMesh};

use crate::behaviour::BehaviourTable;
use crate::config::{ConfigError, EngineConfig, SimTuning};
use crate::events::EventLog;
use crate::spawner::WaveSpawner;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("engine is {0:?}, not running")]
    NotRunning(EnginePhase),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Map(#[from] MapError),
}

// ── Lifecycle ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Init,
    Running,
    Shutdown,
}

/// Interface to the menu and banner front end, which lives outside the core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameFlow {
    pub menu_active: bool,
    pub cursor_enabled: bool,
    pub banner: Option<String>,
    /// Current wave number; 0 before the first wave.
    pub wave: u32,
    /// Tank-family enemies of the current wave still alive.
    pub live_wave: u32,
}

/// Running counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    pub frames: u64,
    pub projectiles_fired: u64,
    pub projectile_hits: u64,
    pub kills: u64,
    /// Projectile spawns dropped because the pool or a grid cell was full.
    pub projectile_drops: u64,
    pub particle_drops: u64,
}

// ── Entity descriptions ────────────────────────────────────────────────────

/// Everything needed to create one actor.
#[derive(Debug, Clone)]
pub struct ActorDesc {
    pub kind: EntityKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub facing: Orientation,
    pub hit_points: i32,
    /// Tag components to set (gravity, collision, hitbox, raycast, trigger, hitpoint).
    pub tags: ComponentMask,
    pub visual: ModelCollection,
    pub collision: ModelCollection,
    pub hitbox: ModelCollection,
    pub weapons: Option<WeaponBank>,
    pub move_target: Option<MoveTarget>,
    pub rays: Vec<Raycast>,
    /// Step-cycle radians per unit travelled.
    pub step_rate: f32,
}

impl ActorDesc {
    pub fn new(kind: EntityKind, position: Vec3) -> Self {
        Self {
            kind,
            position,
            velocity: Vec3::ZERO,
            facing: Orientation::IDENTITY,
            hit_points: 0,
            tags: ComponentMask::EMPTY,
            visual: ModelCollection::new(),
            collision: ModelCollection::new(),
            hitbox: ModelCollection::new(),
            weapons: None,
            move_target: None,
            rays: Vec::new(),
            step_rate: 0.0,
        }
    }

    /// Same single box for the visual, collision and hitbox collections.
    pub fn with_box(mut self, size: Vec3) -> Self {
        let single =
            ModelCollection::single(engine_core::Model::cube(size.x, size.y, size.z), Vec3::ZERO);
        self.visual = single.clone();
        self.collision = single.clone();
        self.hitbox = single;
        self
    }

    pub fn with_tag(mut self, id: engine_core::ComponentId) -> Self {
        self.tags.insert(id);
        self
    }

    pub fn with_hit_points(mut self, hit_points: i32) -> Self {
        self.hit_points = hit_points;
        self.tags.insert(C_HITPOINT);
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_facing(mut self, facing: Orientation) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_weapons(mut self, weapons: WeaponBank) -> Self {
        self.weapons = Some(weapons);
        self
    }
}

/// Everything needed to place one static.
#[derive(Debug, Clone)]
pub struct StaticDesc {
    pub kind: EntityKind,
    pub position: Vec3,
    pub yaw: f32,
    pub visual: ModelCollection,
    pub collision: ModelCollection,
    pub hitbox: ModelCollection,
}

impl StaticDesc {
    /// Box static with identical collections.
    pub fn boxed(kind: EntityKind, position: Vec3, size: Vec3) -> Self {
        let single =
            ModelCollection::single(engine_core::Model::cube(size.x, size.y, size.z), Vec3::ZERO);
        Self {
            kind,
            position,
            yaw: 0.0,
            visual: single.clone(),
            collision: single.clone(),
            hitbox: single,
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }
}

// ── Engine ─────────────────────────────────────────────────────────────────

pub struct Engine {
    pub config: EngineConfig,
    phase: EnginePhase,
    pub world: World,
    pub grid: SpatialGrid,
    pub terrain: Heightmap,
    pub sounds: SoundQueue,
    pub behaviours: BehaviourTable,
    pub events: EventLog,
    pub stats: SimStats,
    pub flow: GameFlow,
    pub waves: WaveSpawner,
    /// Player actor index, once spawned.
    pub player: Option<usize>,
    pub(crate) command: PlayerCommand,
    pub(crate) kinematics: KinematicParams,
    pub(crate) rng: StdRng,
    /// Reused broad-phase buffer.
    pub(crate) scratch: Vec<Handle>,
    time: f32,
}

impl Engine {
    /// Engine over the generated arena ground.
    pub fn new(config: EngineConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mesh = generate_arena_mesh(&ArenaMeshConfig {
            size: config.arena_size,
            resolution: (config.heightmap_resolution as u32 / 2).max(2),
            seed: config.seed,
            ..Default::default()
        });
        Self::with_ground(config, &mesh)
    }

    /// Engine over a caller-supplied ground mesh.
    pub fn with_ground(config: EngineConfig, ground: &SourceMesh) -> Result<Self, SimError> {
        config.validate()?;
        let half = config.arena_size * 0.5;
        let terrain = Heightmap::from_mesh(
            ground,
            Vec2::splat(-half),
            Vec2::splat(config.arena_size),
            config.heightmap_resolution,
            config.heightmap_resolution,
        );
        let grid = SpatialGrid::new(
            GridDesc {
                min_x: -half,
                min_z: -half,
                width: config.arena_size,
                depth: config.arena_size,
                cell_size: config.grid_cell_size,
                bucket_capacity: config.grid_bucket_capacity,
            },
            config.grid_layout(),
        );
        log::info!(
            "engine init: arena {:.0}, {} actors, {} statics, {} projectiles, {} particles",
            config.arena_size,
            config.max_actors,
            config.max_statics,
            config.max_projectiles,
            config.max_particles
        );
        Ok(Self {
            world: World::new(config.world_capacity()),
            grid,
            terrain,
            sounds: SoundQueue::default(),
            behaviours: BehaviourTable::standard(),
            events: EventLog::default(),
            stats: SimStats::default(),
            flow: GameFlow::default(),
            waves: WaveSpawner::default(),
            player: None,
            command: PlayerCommand::idle(),
            kinematics: config.tuning.kinematics(),
            rng: StdRng::seed_from_u64(config.seed),
            scratch: Vec::new(),
            time: 0.0,
            phase: EnginePhase::Init,
            config,
        })
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Enter the running phase. Only valid from `Init`.
    pub fn start(&mut self) -> Result<(), SimError> {
        if self.phase != EnginePhase::Init {
            return Err(SimError::NotRunning(self.phase));
        }
        self.phase = EnginePhase::Running;
        log::info!("engine running");
        Ok(())
    }

    /// Stop the simulation and flush the sound queue.
    pub fn shutdown(&mut self) {
        if self.phase == EnginePhase::Shutdown {
            return;
        }
        let pending = self.sounds.drain().count();
        self.phase = EnginePhase::Shutdown;
        log::info!(
            "engine shutdown after {} frames ({:.1}s): {} shots, {} hits, {} kills, {} sounds flushed",
            self.stats.frames,
            self.time,
            self.stats.projectiles_fired,
            self.stats.projectile_hits,
            self.stats.kills,
            pending
        );
    }

    pub(crate) fn check_running(&self) -> Result<(), SimError> {
        match self.phase {
            EnginePhase::Running => Ok(()),
            other => Err(SimError::NotRunning(other)),
        }
    }

    pub(crate) fn advance_time(&mut self, dt: f32) {
        self.time += dt;
        self.stats.frames += 1;
    }

    /// Simulated seconds since start.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn tuning(&self) -> &SimTuning {
        &self.config.tuning
    }

    /// Command applied to the player on the next update.
    pub fn set_command(&mut self, command: PlayerCommand) {
        self.command = command;
    }

    pub fn push_sound(&mut self, kind: SoundKind, position: Vec3) {
        self.sounds.push(SoundEvent::new(kind, position));
    }

    // ── Entity creation ────────────────────────────────────────────────────

    pub fn spawn_actor(&mut self, desc: ActorDesc) -> Result<Handle, SimError> {
        let actors = &mut self.world.actors;
        let i = actors.allocate()?;
        actors.add_component(i, C_POSITION, &desc.position)?;
        actors.add_component(i, C_VELOCITY, &desc.velocity)?;
        actors.add_component(i, C_PREV_POSITION, &desc.position)?;
        for tag in [C_GRAVITY, C_COLLISION, C_HITBOX, C_RAYCAST, C_TRIGGER, C_HITPOINT] {
            if desc.tags.contains(tag) {
                actors.add_tag(i, tag)?;
            }
        }
        if let Some(weapons) = desc.weapons {
            actors.add_component(i, C_COOLDOWN, &weapons)?;
        }
        if let Some(target) = desc.move_target {
            actors.add_component(i, C_MOVE_TARGET, &target)?;
        }

        actors.kind[i] = desc.kind;
        actors.hit_points[i] = desc.hit_points;
        actors.facing[i] = desc.facing;
        actors.step_rate[i] = desc.step_rate;
        actors.visual[i] = desc.visual;
        actors.collision[i] = desc.collision;
        actors.hitbox[i] = desc.hitbox;
        for ray in desc.rays {
            if !actors.add_ray(i, ray) {
                log::warn!("actor {} has more rays than fit, extra ignored", i);
                break;
            }
        }

        let handle = Handle::actor(i);
        self.grid.add_entity(handle, desc.position)?;
        if let Err(e) = self.world.actors.set_alive(i) {
            self.grid.remove_entity(handle, desc.position);
            return Err(e.into());
        }
        self.resolve_actor_models(i);
        if desc.kind == EntityKind::Player {
            self.player = Some(i);
        }
        log::debug!("spawned {:?} as actor {}", desc.kind, i);
        Ok(handle)
    }

    pub fn spawn_static(&mut self, desc: StaticDesc) -> Result<Handle, SimError> {
        let i = self.world.statics.spawn(
            desc.kind,
            desc.position,
            desc.yaw,
            desc.visual,
            desc.collision,
            desc.hitbox,
        )?;
        let handle = Handle::static_entity(i);
        self.grid.add_entity(handle, desc.position)?;
        Ok(handle)
    }

    /// Teleport an actor, keeping the grid in step.
    pub fn set_actor_position(&mut self, i: usize, position: Vec3) -> Result<(), SimError> {
        let Some(old) = self.world.actors.position(i) else {
            return Ok(());
        };
        self.world.actors.set_position(i, position);
        if self.world.actors.is_alive(i) {
            self.grid.update_entity(Handle::actor(i), old, position)?;
        }
        self.resolve_actor_models(i);
        Ok(())
    }

    /// Take a live actor out of play without running death hooks and hand
    /// its slot to a pool.
    pub fn stash_actor(&mut self, i: usize) {
        if let Some(position) = self.world.actors.position(i) {
            if self.world.actors.is_alive(i) {
                self.grid.remove_entity(Handle::actor(i), position);
            }
        }
        self.world.actors.alive[i] = false;
        self.world.actors.pooled[i] = true;
    }

    /// Bring a stashed actor back at `position` with fresh hit points.
    pub fn revive_actor(&mut self, i: usize, position: Vec3, hit_points: i32) -> Result<(), SimError> {
        let actors = &mut self.world.actors;
        actors.set_position(i, position);
        actors.set_velocity(i, Vec3::ZERO);
        if let Some(prev) = actors.get_mut::<Vec3>(i, C_PREV_POSITION) {
            *prev = position;
        }
        actors.hit_points[i] = hit_points;
        actors.heat[i] = 0.0;
        actors.is_colliding[i] = false;

        // A full cell leaves the slot in the pool.
        let handle = Handle::actor(i);
        self.grid.add_entity(handle, position)?;
        if let Err(e) = self.world.actors.set_alive(i) {
            self.grid.remove_entity(handle, position);
            return Err(e.into());
        }
        self.world.actors.pooled[i] = false;
        self.resolve_actor_models(i);
        Ok(())
    }

    /// Spawn a projectile and register it with the grid. Full pool or full
    /// cell drops the spawn.
    pub fn fire_projectile(&mut self, spawn: ProjectileSpawn) -> Option<usize> {
        let Some(p) = self.world.projectiles.spawn(spawn) else {
            self.note_projectile_drop();
            return None;
        };
        if let Err(e) = self.grid.add_entity(Handle::projectile(p), spawn.position) {
            log::trace!("projectile {} not indexed: {}", p, e);
            self.world.projectiles.deactivate(p);
            self.note_projectile_drop();
            return None;
        }
        self.stats.projectiles_fired += 1;
        Some(p)
    }

    pub(crate) fn note_projectile_drop(&mut self) {
        if self.stats.projectile_drops == 0 {
            log::warn!("projectile spawn dropped (pool or grid cell full)");
        }
        self.stats.projectile_drops += 1;
    }

    pub fn spawn_particle(&mut self, kind: ParticleKind, position: Vec3) -> Option<usize> {
        let spawned = self.world.particles.spawn(kind, position);
        if spawned.is_none() {
            if self.stats.particle_drops == 0 {
                log::warn!("particle pool full, dropping spawns");
            }
            self.stats.particle_drops += 1;
        }
        spawned
    }

    /// Resolve one actor's collections. The player's visual collection bobs
    /// with its step cycle.
    pub fn resolve_actor_models(&mut self, i: usize) {
        let actors = &mut self.world.actors;
        let lift = if actors.kind[i] == EntityKind::Player {
            Vec3::Y * actors.step_cycle[i].sin() * self.config.tuning.headbob_amplitude
        } else {
            Vec3::ZERO
        };
        actors.resolve_models(i, lift);
    }

    pub(crate) fn resolve_all_models(&mut self) {
        for i in 0..self.world.actors.count() {
            if self.world.actors.is_alive(i) {
                self.resolve_actor_models(i);
            }
        }
    }

    pub fn player_position(&self) -> Option<Vec3> {
        let p = self.player?;
        if !self.world.actors.is_alive(p) {
            return None;
        }
        self.world.actors.position(p)
    }

    pub fn ground_height(&self, x: f32, z: f32) -> f32 {
        self.terrain.height_at(x, z)
    }
}
