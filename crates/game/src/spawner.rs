//! Enemy waves from a pool of pre-built tank slots.
//!
//! Tank-family actors are created once at level load and stashed. When the
//! live wave is cleared the next wave revives pooled slots around the player.

use std::f32::consts::TAU;

use rand::Rng;

use audio::SoundKind;
use engine_core::{EntityKind, Vec3};

use crate::events::SimEvent;
use crate::prefabs;
use crate::state::{Engine, SimError};

/// Distance band around the player for waves without spawn points.
const RING_MIN: f32 = 40.0;
const RING_MAX: f32 = 60.0;

#[derive(Debug, Clone, Default)]
pub struct WaveSpawner {
    /// Actor slots reserved for wave enemies.
    pub pool: Vec<usize>,
    /// Tank spawn chunks from the map, used round-robin.
    pub spawn_points: Vec<Vec3>,
    pub enabled: bool,
    next_point: usize,
}

impl WaveSpawner {
    fn next_spawn_point(&mut self) -> Option<Vec3> {
        if self.spawn_points.is_empty() {
            return None;
        }
        let point = self.spawn_points[self.next_point % self.spawn_points.len()];
        self.next_point = self.next_point.wrapping_add(1);
        Some(point)
    }
}

impl Engine {
    /// Build `count` pooled tank slots, cycling through the tank kinds, and
    /// enable waves.
    pub fn reserve_wave_pool(&mut self, count: usize) -> Result<(), SimError> {
        const KINDS: [EntityKind; 3] = [EntityKind::Tank, EntityKind::Harasser, EntityKind::TankAlpha];
        for n in 0..count {
            let kind = KINDS[n % KINDS.len()];
            let desc = prefabs::tank(kind, Vec3::ZERO, &self.config.tuning)?;
            let i = self.spawn_actor(desc)?.index();
            self.stash_actor(i);
            self.waves.pool.push(i);
        }
        self.waves.enabled = count > 0;
        log::info!("reserved {} wave slots", count);
        Ok(())
    }

    pub(crate) fn update_waves(&mut self) -> Result<(), SimError> {
        if !self.waves.enabled || self.flow.live_wave > 0 {
            return Ok(());
        }
        let Some(player) = self.player_position() else {
            return Ok(());
        };
        let available: Vec<usize> = self
            .waves
            .pool
            .iter()
            .copied()
            .filter(|&i| self.world.actors.pooled[i])
            .collect();
        if available.is_empty() {
            return Ok(());
        }

        let wave = self.flow.wave + 1;
        let wanted = (self.config.tuning.first_wave_size + wave - 1) as usize;
        let size = wanted.min(available.len());
        for &i in available.iter().take(size) {
            let mut at = self.wave_spawn_position(player);
            at.y = self.ground_height(at.x, at.z) + self.kinematics.feet_offset;
            let hit_points = prefabs::max_hit_points(self.world.actors.kind[i]);
            self.revive_actor(i, at, hit_points)?;
        }

        self.flow.wave = wave;
        self.flow.live_wave = size as u32;
        self.flow.banner = Some(format!("Wave {}", wave));
        self.push_sound(SoundKind::WaveStart, player);
        self.events.push(SimEvent::WaveStarted {
            wave,
            size: size as u32,
        });
        log::info!("wave {} started with {} enemies", wave, size);
        Ok(())
    }

    fn wave_spawn_position(&mut self, player: Vec3) -> Vec3 {
        if let Some(point) = self.waves.next_spawn_point() {
            return point;
        }
        let angle = self.rng.gen_range(0.0..TAU);
        let distance = self.rng.gen_range(RING_MIN..RING_MAX);
        let limit = self.config.arena_size * 0.5 - 2.0;
        Vec3::new(
            (player.x + angle.cos() * distance).clamp(-limit, limit),
            player.y,
            (player.z + angle.sin() * distance).clamp(-limit, limit),
        )
    }
}
