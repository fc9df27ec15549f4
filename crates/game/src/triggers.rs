//! Edge-detected trigger volumes.
//!
//! Runs after collision resolution, so hooks observe settled positions.

use engine_core::{ComponentMask, Handle, C_COLLISION, C_TRIGGER};
use physics::{obb_overlap, Obb};

use crate::events::SimEvent;
use crate::state::Engine;

impl Engine {
    pub(crate) fn dispatch_triggers(&mut self) {
        for t in 0..self.world.actors.count() {
            let actors = &self.world.actors;
            if !actors.is_alive(t) || !actors.has(t, C_TRIGGER) {
                continue;
            }
            let Some(volume) = actors.collision[t].part(0).map(Obb::from_part) else {
                continue;
            };

            let first = actors.iter_with(ComponentMask::EMPTY.with(C_COLLISION)).find(|&j| {
                j != t
                    && actors.collision[j]
                        .part(0)
                        .is_some_and(|part| obb_overlap(&volume, &Obb::from_part(part)).is_some())
            });
            let was_colliding = actors.is_colliding[t];
            let behaviour = self.behaviours.get(actors.kind[t]);

            match (was_colliding, first) {
                (false, Some(other)) => {
                    self.world.actors.is_colliding[t] = true;
                    self.events.push(SimEvent::TriggerEnter { trigger: t, other });
                    if let Some(hook) = behaviour.on_collision {
                        hook(self, Handle::actor(t), Some(Handle::actor(other)));
                    }
                }
                (true, None) => {
                    self.world.actors.is_colliding[t] = false;
                    self.events.push(SimEvent::TriggerExit { trigger: t });
                    if let Some(hook) = behaviour.on_collision_exit {
                        hook(self, Handle::actor(t), None);
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{EntityKind, Vec3};
    use procgen::SourceMesh;

    use crate::config::EngineConfig;
    use crate::state::ActorDesc;

    #[test]
    fn enter_and_exit_fire_once_each() {
        let config = EngineConfig {
            arena_size: 100.0,
            heightmap_resolution: 11,
            ..Default::default()
        };
        let mut e = Engine::with_ground(config, &SourceMesh::flat_quad(100.0, 0.0)).unwrap();
        let t = e
            .spawn_actor(
                ActorDesc::new(EntityKind::Environment, Vec3::ZERO)
                    .with_box(Vec3::splat(10.0))
                    .with_tag(C_TRIGGER)
                    .with_tag(C_COLLISION),
            )
            .unwrap()
            .index();
        let a = e
            .spawn_actor(
                ActorDesc::new(EntityKind::Mech, Vec3::new(0.0, 0.0, 30.0))
                    .with_box(Vec3::ONE)
                    .with_tag(C_COLLISION),
            )
            .unwrap()
            .index();

        let mut enters = 0;
        let mut exits = 0;
        for z in [30.0, 20.0, 4.0, 0.0, -4.0, -20.0, -30.0] {
            e.events.clear();
            e.set_actor_position(a, Vec3::new(0.0, 0.0, z)).unwrap();
            e.dispatch_triggers();
            enters += e.events.count(|ev| {
                matches!(ev, SimEvent::TriggerEnter { trigger, other } if *trigger == t && *other == a)
            });
            exits += e.events.count(|ev| matches!(ev, SimEvent::TriggerExit { trigger } if *trigger == t));
        }
        assert_eq!(enters, 1);
        assert_eq!(exits, 1);
        assert!(!e.world.actors.is_colliding[t]);
    }
}
