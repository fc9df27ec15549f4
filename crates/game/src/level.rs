//! Arena construction from a chunk map.
//!
//! The map is stretched over the whole arena; each chunk becomes at most one
//! entity standing on the terrain, raised by the chunk height and turned by
//! its quarter-turn rotation.

use engine_core::{Orientation, Vec2, Vec3};
use procgen::{ChunkKind, Map};

use crate::prefabs;
use crate::state::{Engine, SimError};

/// Wall height in world units.
const WALL_HEIGHT: f32 = 6.0;

/// Trigger volume height.
const TRIGGER_HEIGHT: f32 = 8.0;

/// What a map produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelSummary {
    pub walls: usize,
    pub rocks: usize,
    pub destructibles: usize,
    pub turrets: usize,
    pub mechs: usize,
    pub spawn_points: usize,
    pub triggers: usize,
}

impl Engine {
    /// World-space centre (XZ) and footprint of chunk `(x, z)`.
    pub fn chunk_bounds(&self, map: &Map, x: i32, z: i32) -> (Vec2, Vec2) {
        let size = self.config.arena_size;
        let footprint = Vec2::new(size / map.width() as f32, size / map.height() as f32);
        let min = Vec2::splat(-size * 0.5);
        let centre = min + (Vec2::new(x as f32, z as f32) + 0.5) * footprint;
        (centre, footprint)
    }

    /// Populate the arena from `map`, spawn the player at the centre and
    /// reserve the wave pool.
    pub fn build_level(&mut self, map: &Map) -> Result<LevelSummary, SimError> {
        let mut summary = LevelSummary::default();
        let feet = self.kinematics.feet_offset;

        for (x, z, chunk) in map.iter() {
            let Some(kind) = chunk.chunk_kind() else {
                log::warn!("chunk ({}, {}) has unknown type {}", x, z, chunk.kind);
                continue;
            };
            let (centre, footprint) = self.chunk_bounds(map, x, z);
            let base = self.ground_height(centre.x, centre.y) + chunk.height as f32;
            let yaw = chunk.yaw();

            match kind {
                ChunkKind::Empty => {}
                ChunkKind::Wall => {
                    let size = Vec3::new(footprint.x, WALL_HEIGHT, footprint.y);
                    let at = Vec3::new(centre.x, base + WALL_HEIGHT * 0.5, centre.y);
                    self.spawn_static(prefabs::wall(at, size, yaw))?;
                    summary.walls += 1;
                }
                ChunkKind::Rock => {
                    let side = footprint.min_element() * 0.6;
                    let size = Vec3::new(side, side * 0.7, side * 0.8);
                    let at = Vec3::new(centre.x, base + size.y * 0.5, centre.y);
                    self.spawn_static(prefabs::rock(at, size, yaw))?;
                    summary.rocks += 1;
                }
                ChunkKind::Destruct => {
                    let at = Vec3::new(centre.x, base + 1.0, centre.y);
                    self.spawn_actor(prefabs::destructible(at)?)?;
                    summary.destructibles += 1;
                }
                ChunkKind::Turret => {
                    let at = Vec3::new(centre.x, base + feet, centre.y);
                    self.spawn_actor(prefabs::turret(at)?)?;
                    summary.turrets += 1;
                }
                ChunkKind::Mech => {
                    let at = Vec3::new(centre.x, base + feet, centre.y);
                    let desc = prefabs::mech(at, &self.config.tuning)?;
                    self.spawn_actor(desc.with_facing(Orientation::from_yaw(yaw)))?;
                    summary.mechs += 1;
                }
                ChunkKind::TankSpawn => {
                    self.waves
                        .spawn_points
                        .push(Vec3::new(centre.x, base + feet, centre.y));
                    summary.spawn_points += 1;
                }
                ChunkKind::Trigger => {
                    let size = Vec3::new(footprint.x, TRIGGER_HEIGHT, footprint.y);
                    let at = Vec3::new(centre.x, base + TRIGGER_HEIGHT * 0.5, centre.y);
                    self.spawn_actor(prefabs::trigger_zone(at, size))?;
                    summary.triggers += 1;
                }
            }
        }

        let spawn = Vec3::new(0.0, self.ground_height(0.0, 0.0) + feet, 0.0);
        self.spawn_actor(prefabs::player(spawn)?)?;
        self.reserve_wave_pool(self.config.tuning.wave_pool_size)?;

        log::info!(
            "level built from {}x{} map: {} walls, {} rocks, {} destructibles, {} turrets, {} mechs, {} triggers, {} tank spawns",
            map.width(),
            map.height(),
            summary.walls,
            summary.rocks,
            summary.destructibles,
            summary.turrets,
            summary.mechs,
            summary.triggers,
            summary.spawn_points
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::EntityKind;
    use procgen::{MapChunk, SourceMesh};

    use crate::config::EngineConfig;

    fn engine() -> Engine {
        let config = EngineConfig {
            arena_size: 100.0,
            heightmap_resolution: 11,
            ..Default::default()
        };
        Engine::with_ground(config, &SourceMesh::flat_quad(100.0, 0.0)).unwrap()
    }

    #[test]
    fn chunk_centres_tile_the_arena() {
        let e = engine();
        let map = Map::new(10, 5).unwrap();
        let (c, f) = e.chunk_bounds(&map, 0, 0);
        assert_eq!(f, Vec2::new(10.0, 20.0));
        assert_eq!(c, Vec2::new(-45.0, -40.0));
        let (c, _) = e.chunk_bounds(&map, 9, 4);
        assert_eq!(c, Vec2::new(45.0, 40.0));
    }

    #[test]
    fn chunks_become_entities() {
        let mut e = engine();
        let mut map = Map::new(10, 10).unwrap();
        map.set(0, 0, MapChunk::new(ChunkKind::Wall, 2, 1));
        map.set(1, 0, MapChunk::new(ChunkKind::Rock, 0, 0));
        map.set(2, 0, MapChunk::new(ChunkKind::Destruct, 0, 0));
        map.set(3, 0, MapChunk::new(ChunkKind::Turret, 0, 0));
        map.set(4, 0, MapChunk::new(ChunkKind::TankSpawn, 0, 0));
        map.set(5, 0, MapChunk::new(ChunkKind::Mech, 0, 2));
        map.set(6, 6, MapChunk::new(ChunkKind::Trigger, 0, 0));
        let summary = e.build_level(&map).unwrap();

        assert_eq!(
            summary,
            LevelSummary {
                walls: 1,
                rocks: 1,
                destructibles: 1,
                turrets: 1,
                mechs: 1,
                spawn_points: 1,
                triggers: 1,
            }
        );
        assert_eq!(e.world.statics.count(), 2);
        let wall = e.world.statics.position[0];
        assert!((wall.y - (2.0 + WALL_HEIGHT * 0.5)).abs() < 1e-4);
        assert!((e.world.statics.yaw[0] - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let mech = (0..e.world.actors.count())
            .find(|&i| e.world.actors.kind[i] == EntityKind::Mech)
            .unwrap();
        assert_eq!(e.world.actors.visual[mech].len(), 3);
        assert!(e.world.actors.has(mech, engine_core::C_MOVE_TARGET));
        assert!((e.world.actors.facing[mech].yaw - std::f32::consts::PI).abs() < 1e-6);

        let player = e.player.unwrap();
        assert_eq!(e.world.actors.kind[player], EntityKind::Player);
        assert_eq!(e.waves.pool.len(), e.config.tuning.wave_pool_size);
        assert!(e.waves.enabled);
    }
}
