//! Actor step: gravity, terrain clamp, damping, step cycle and grid upkeep.

use std::f32::consts::PI;

use audio::SoundKind;
use engine_core::{horizontal, Handle, Vec3, C_GRAVITY, C_PREV_POSITION, C_VELOCITY};

use crate::events::SimEvent;
use crate::state::{Engine, SimError};

impl Engine {
    pub(crate) fn update_actors(&mut self, dt: f32) -> Result<(), SimError> {
        for i in 0..self.world.actors.count() {
            let actors = &mut self.world.actors;
            if !actors.is_alive(i) || !actors.kind[i].is_mobile() {
                continue;
            }
            let (Some(old), Some(mut velocity)) = (actors.position(i), actors.velocity(i)) else {
                continue;
            };
            if let Some(prev) = actors.get_mut::<Vec3>(i, C_PREV_POSITION) {
                *prev = old;
            }

            let mut position = old;
            if actors.has(i, C_GRAVITY) {
                let ahead = old + velocity * dt;
                let ground = self.terrain.height_at(ahead.x, ahead.z);
                self.kinematics
                    .step_gravity(&mut position, &mut velocity, ground, dt);
            } else {
                position += velocity * dt;
            }
            actors.set_position(i, position);
            actors.set_velocity(i, velocity);

            // Footfalls land on every half cycle.
            let before = actors.step_cycle[i];
            let after = before + actors.step_rate[i] * horizontal(position - old).length();
            actors.prev_step_cycle[i] = before;
            actors.step_cycle[i] = after;
            if (after / PI).floor() > (before / PI).floor() {
                self.push_sound(SoundKind::Footstep, position);
                self.events.push(SimEvent::Footstep { actor: i });
            }

            self.grid.update_entity(Handle::actor(i), old, position)?;
        }
        self.damp_actors();
        Ok(())
    }

    /// Horizontal damping over the whole velocity column.
    fn damp_actors(&mut self) {
        let count = self.world.actors.count();
        let actors = &mut self.world.actors;
        let Some(velocities) = actors.components.column_as_mut::<Vec3>(C_VELOCITY) else {
            return;
        };
        for (i, velocity) in velocities.iter_mut().enumerate().take(count) {
            if actors.alive[i] && actors.kind[i].is_mobile() {
                self.kinematics.damp_horizontal(velocity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::EntityKind;
    use procgen::SourceMesh;

    use crate::config::EngineConfig;
    use crate::state::ActorDesc;

    fn engine(ground: f32) -> Engine {
        let config = EngineConfig {
            arena_size: 100.0,
            heightmap_resolution: 11,
            ..Default::default()
        };
        Engine::with_ground(config, &SourceMesh::flat_quad(100.0, ground)).unwrap()
    }

    #[test]
    fn gravity_actor_settles_on_raised_ground() {
        let mut e = engine(3.0);
        let i = e
            .spawn_actor(ActorDesc::new(EntityKind::Mech, Vec3::new(0.0, 20.0, 0.0)).with_tag(C_GRAVITY))
            .unwrap()
            .index();
        let mut landed_at = None;
        for step in 0..200 {
            e.update_actors(1.0 / 60.0).unwrap();
            let y = e.world.actors.position(i).unwrap().y;
            assert!(y >= 4.0 - 1e-4);
            if landed_at.is_none() && (y - 4.0).abs() < 1e-4 {
                landed_at = Some(step);
                assert_eq!(e.world.actors.velocity(i).unwrap().y, 0.0);
            }
        }
        assert!(landed_at.is_some());
        assert!((e.world.actors.position(i).unwrap().y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn actor_at_rest_holds_height_for_one_step() {
        let mut e = engine(0.0);
        let i = e
            .spawn_actor(ActorDesc::new(EntityKind::Mech, Vec3::new(0.0, 100.0, 0.0)).with_tag(C_GRAVITY))
            .unwrap()
            .index();
        e.update_actors(0.1).unwrap();
        assert_eq!(e.world.actors.position(i).unwrap().y, 100.0);
        let fall = -e.kinematics.gravity * 0.1;
        assert!((e.world.actors.velocity(i).unwrap().y - fall).abs() < 1e-5);
    }

    #[test]
    fn crossing_cells_moves_the_grid_entry() {
        let mut e = engine(0.0);
        let h = e
            .spawn_actor(
                ActorDesc::new(EntityKind::Tank, Vec3::new(0.5, 1.0, 0.5))
                    .with_velocity(Vec3::new(400.0, 0.0, 0.0)),
            )
            .unwrap();
        e.update_actors(0.1).unwrap();
        let p = e.world.actors.position(h.index()).unwrap();
        assert!((p.x - 40.5).abs() < 1e-4);
        assert!(e.grid.contains(h, p));
        let v = e.world.actors.velocity(h.index()).unwrap();
        assert!((v.x - 260.0).abs() < 1e-3);
    }

    #[test]
    fn walking_produces_footsteps() {
        let mut e = engine(0.0);
        let desc = ActorDesc {
            step_rate: 1.0,
            ..ActorDesc::new(EntityKind::Mech, Vec3::new(0.0, 1.0, 0.0))
                .with_velocity(Vec3::new(0.0, 0.0, -40.0))
        };
        let i = e.spawn_actor(desc).unwrap().index();
        e.update_actors(0.1).unwrap();
        // 4 units travelled crosses the first half cycle at pi
        assert_eq!(e.events.count(|ev| matches!(ev, SimEvent::Footstep { actor } if *actor == i)), 1);
        assert_eq!(e.sounds.len(), 1);
    }

    #[test]
    fn immobile_kinds_are_not_integrated() {
        let mut e = engine(0.0);
        let i = e
            .spawn_actor(
                ActorDesc::new(EntityKind::Turret, Vec3::new(0.0, 1.0, 0.0))
                    .with_velocity(Vec3::X * 10.0),
            )
            .unwrap()
            .index();
        e.update_actors(0.1).unwrap();
        assert_eq!(e.world.actors.position(i).unwrap(), Vec3::new(0.0, 1.0, 0.0));
    }
}
