//! Hit-point bookkeeping and entity destruction.

use engine_core::{Category, Handle, C_HITPOINT};

use crate::events::SimEvent;
use crate::state::Engine;

impl Engine {
    /// Subtract hit points from a live actor carrying `C_HITPOINT`, killing
    /// it at zero. Dead or unarmoured targets are ignored.
    pub fn apply_damage(&mut self, target: usize, amount: i32) {
        let actors = &mut self.world.actors;
        if !actors.is_alive(target) || !actors.has(target, C_HITPOINT) {
            return;
        }
        actors.hit_points[target] -= amount;
        let remaining = actors.hit_points[target];
        self.events.push(SimEvent::Damaged {
            target,
            amount,
            remaining,
        });
        if remaining <= 0 {
            self.kill_entity(Handle::actor(target));
        }
    }

    /// Mark an entity dead and run its kind's death hook. Killing a dead
    /// actor is a no-op.
    pub fn kill_entity(&mut self, handle: Handle) {
        let i = handle.index();
        match handle.category {
            Category::Actor => {
                if !self.world.actors.is_alive(i) {
                    return;
                }
                let kind = self.world.actors.kind[i];
                if let Some(position) = self.world.actors.position(i) {
                    self.grid.remove_entity(handle, position);
                }
                self.world.actors.alive[i] = false;
                self.stats.kills += 1;
                self.events.push(SimEvent::Killed { handle, kind });
                log::debug!("{:?} {} destroyed", kind, i);

                if let Some(hook) = self.behaviours.get(kind).on_death {
                    hook(self, i);
                }
            }
            Category::Static => {
                if !self.world.statics.is_occupied(i) {
                    return;
                }
                let kind = self.world.statics.kind[i];
                let position = self.world.statics.position[i];
                self.grid.remove_entity(handle, position);
                self.world.statics.clear(i);
                self.events.push(SimEvent::Killed { handle, kind });
                log::debug!("static {:?} {} removed", kind, i);
            }
            Category::Projectile => {
                if self.world.projectiles.active[i] {
                    let position = self.world.projectiles.position[i];
                    self.grid.remove_entity(handle, position);
                    self.world.projectiles.deactivate(i);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_core::{EntityKind, Vec3};
    use procgen::SourceMesh;

    use crate::config::EngineConfig;
    use crate::state::{ActorDesc, Engine};
    use crate::events::SimEvent;

    fn engine() -> Engine {
        let config = EngineConfig {
            arena_size: 100.0,
            heightmap_resolution: 11,
            ..Default::default()
        };
        Engine::with_ground(config, &SourceMesh::flat_quad(100.0, 0.0)).unwrap()
    }

    #[test]
    fn lethal_damage_kills_once() {
        let mut e = engine();
        let i = e
            .spawn_actor(ActorDesc::new(EntityKind::Mech, Vec3::ZERO).with_hit_points(10))
            .unwrap()
            .index();
        e.apply_damage(i, 10);
        e.apply_damage(i, 10);
        assert!(!e.world.actors.is_alive(i));
        assert_eq!(e.world.actors.hit_points[i], 0);
        assert_eq!(e.events.count(|ev| matches!(ev, SimEvent::Killed { .. })), 1);
        assert_eq!(e.stats.kills, 1);
    }

    #[test]
    fn player_death_opens_menu() {
        let mut e = engine();
        let i = e
            .spawn_actor(ActorDesc::new(EntityKind::Player, Vec3::ZERO).with_hit_points(5))
            .unwrap()
            .index();
        e.apply_damage(i, 50);
        assert!(e.flow.menu_active);
        assert!(e.flow.cursor_enabled);
        assert!(e.flow.banner.is_some());
    }

    #[test]
    fn tank_death_returns_slot_to_pool() {
        let mut e = engine();
        e.flow.live_wave = 2;
        let i = e
            .spawn_actor(ActorDesc::new(EntityKind::Tank, Vec3::ZERO).with_hit_points(10))
            .unwrap()
            .index();
        e.apply_damage(i, 10);
        assert!(e.world.actors.pooled[i]);
        assert_eq!(e.flow.live_wave, 1);
    }
}
