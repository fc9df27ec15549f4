//! Per-kind behaviour hooks.
//!
//! Each entity kind may register a collision hook, a collision-exit hook and
//! a death hook. Hooks are plain function pointers taking the engine, so they
//! can spawn particles, queue sounds or touch the game flow directly.

use audio::SoundKind;
use engine_core::{EntityKind, Handle, ParticleKind};

use crate::state::Engine;

/// `(engine, self, other)`; `other` is `None` on exit notifications.
pub type CollisionHook = fn(&mut Engine, Handle, Option<Handle>);

/// `(engine, actor index)`, run after the actor is marked dead.
pub type DeathHook = fn(&mut Engine, usize);

#[derive(Debug, Clone, Copy, Default)]
pub struct Behaviour {
    pub on_collision: Option<CollisionHook>,
    pub on_collision_exit: Option<CollisionHook>,
    pub on_death: Option<DeathHook>,
}

/// Dispatch table indexed by [`EntityKind`].
#[derive(Debug, Clone)]
pub struct BehaviourTable {
    entries: [Behaviour; EntityKind::COUNT],
}

impl Default for BehaviourTable {
    fn default() -> Self {
        Self {
            entries: [Behaviour::default(); EntityKind::COUNT],
        }
    }
}

impl BehaviourTable {
    /// Hooks for the stock arena kinds.
    pub fn standard() -> Self {
        let mut table = Self::default();
        table.set(
            EntityKind::Player,
            Behaviour {
                on_death: Some(player_death),
                ..Default::default()
            },
        );
        for kind in [EntityKind::Tank, EntityKind::TankAlpha, EntityKind::Harasser] {
            table.set(
                kind,
                Behaviour {
                    on_death: Some(wave_enemy_death),
                    ..Default::default()
                },
            );
        }
        for kind in [EntityKind::Mech, EntityKind::Turret] {
            table.set(
                kind,
                Behaviour {
                    on_death: Some(explode),
                    ..Default::default()
                },
            );
        }
        table.set(
            EntityKind::Destruct,
            Behaviour {
                on_death: Some(destruct_death),
                ..Default::default()
            },
        );
        table.set(
            EntityKind::Environment,
            Behaviour {
                on_collision: Some(trigger_enter),
                on_collision_exit: Some(trigger_exit),
                ..Default::default()
            },
        );
        table
    }

    #[inline]
    pub fn get(&self, kind: EntityKind) -> Behaviour {
        self.entries[kind.index()]
    }

    pub fn set(&mut self, kind: EntityKind, behaviour: Behaviour) {
        self.entries[kind.index()] = behaviour;
    }
}

// ── Stock hooks ────────────────────────────────────────────────────────────

fn explode(engine: &mut Engine, i: usize) {
    if let Some(p) = engine.world.actors.position(i) {
        engine.spawn_particle(ParticleKind::Explosion, p);
        engine.push_sound(SoundKind::Explosion, p);
    }
}

fn player_death(engine: &mut Engine, i: usize) {
    explode(engine, i);
    engine.flow.menu_active = true;
    engine.flow.cursor_enabled = true;
    engine.flow.banner = Some(format!("Destroyed on wave {}", engine.flow.wave));
    log::info!("player destroyed on wave {}", engine.flow.wave);
}

/// Return the slot to the wave pool. Tanks placed outside the pool die like
/// any other enemy and leave the wave count alone.
fn wave_enemy_death(engine: &mut Engine, i: usize) {
    explode(engine, i);
    if engine.waves.pool.contains(&i) {
        engine.world.actors.pooled[i] = true;
        engine.flow.live_wave = engine.flow.live_wave.saturating_sub(1);
    }
}

/// Swap the intact shell (part 0) for the wreck (part 1).
fn destruct_death(engine: &mut Engine, i: usize) {
    let visual = &mut engine.world.actors.visual[i];
    visual.set_active(0, false);
    visual.set_active(1, true);
    explode(engine, i);
}

fn trigger_enter(engine: &mut Engine, trigger: Handle, other: Option<Handle>) {
    let i = trigger.index();
    if let Some(p) = engine.world.actors.position(i) {
        engine.push_sound(SoundKind::TriggerEnter, p);
    }
    log::debug!("trigger {} entered by {:?}", i, other);
}

fn trigger_exit(_engine: &mut Engine, trigger: Handle, _other: Option<Handle>) {
    log::debug!("trigger {} cleared", trigger.index());
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Vec3;
    use procgen::SourceMesh;

    use crate::config::EngineConfig;
    use crate::state::ActorDesc;

    fn engine() -> Engine {
        let config = EngineConfig {
            arena_size: 100.0,
            heightmap_resolution: 11,
            ..Default::default()
        };
        Engine::with_ground(config, &SourceMesh::flat_quad(100.0, 0.0)).unwrap()
    }

    fn tank(e: &mut Engine) -> usize {
        e.spawn_actor(ActorDesc::new(EntityKind::Tank, Vec3::new(0.0, 1.0, 0.0)).with_hit_points(10))
            .unwrap()
            .index()
    }

    #[test]
    fn stray_tank_death_keeps_its_slot_and_the_wave() {
        let mut e = engine();
        let i = tank(&mut e);
        e.flow.live_wave = 3;
        e.apply_damage(i, 10);

        assert!(!e.world.actors.is_alive(i));
        assert!(!e.world.actors.pooled[i]);
        assert_eq!(e.flow.live_wave, 3);
        let next = tank(&mut e);
        assert_eq!(next, i);
    }

    #[test]
    fn pooled_tank_death_returns_the_slot() {
        let mut e = engine();
        let i = tank(&mut e);
        e.waves.pool.push(i);
        e.flow.live_wave = 2;
        e.apply_damage(i, 10);

        assert!(e.world.actors.pooled[i]);
        assert_eq!(e.flow.live_wave, 1);
    }

    #[test]
    fn standard_table_wires_death_hooks() {
        let table = BehaviourTable::standard();
        assert!(table.get(EntityKind::Player).on_death.is_some());
        assert!(table.get(EntityKind::Harasser).on_death.is_some());
        assert!(table.get(EntityKind::Environment).on_collision.is_some());
        assert!(table.get(EntityKind::Wall).on_death.is_none());
    }
}
