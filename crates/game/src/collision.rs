//! Movement-collision resolution between actors and against statics.
//!
//! Every mobile actor with `C_COLLISION` is tested against its 3x3 grid
//! neighbourhood using part 0 of each movement-collision collection. Two
//! mobile actors split the MTV; a mobile actor against an immobile actor or a
//! static takes all of it. Velocity pointing into the contact is removed.

use engine_core::{Category, Handle, Vec3, C_COLLISION, C_GRAVITY, C_TRIGGER};
use physics::{obb_overlap, Obb};

use crate::state::{Engine, SimError};

impl Engine {
    pub(crate) fn resolve_collisions(&mut self) -> Result<(), SimError> {
        let mut scratch = std::mem::take(&mut self.scratch);
        let result = self.resolve_with(&mut scratch);
        self.scratch = scratch;
        result
    }

    fn resolve_with(&mut self, scratch: &mut Vec<Handle>) -> Result<(), SimError> {
        for i in 0..self.world.actors.count() {
            let actors = &self.world.actors;
            if !actors.is_alive(i)
                || !actors.kind[i].is_mobile()
                || !actors.has(i, C_COLLISION)
                || actors.has(i, C_TRIGGER)
            {
                continue;
            }
            let Some(position) = actors.position(i) else {
                continue;
            };
            scratch.clear();
            scratch.extend(self.grid.neighbourhood_of(position));

            for &other in scratch.iter() {
                let Some(a) = self.actor_collider(i) else {
                    break;
                };
                match other.category {
                    Category::Actor => {
                        let j = other.index();
                        let actors = &self.world.actors;
                        if j == i
                            || !actors.is_alive(j)
                            || !actors.has(j, C_COLLISION)
                            || actors.has(j, C_TRIGGER)
                        {
                            continue;
                        }
                        let mobile = actors.kind[j].is_mobile();
                        // Mobile pairs are handled once, from the lower index.
                        if mobile && j < i {
                            continue;
                        }
                        let Some(b) = self.actor_collider(j) else {
                            continue;
                        };
                        if let Some(mtv) = obb_overlap(&a, &b) {
                            if mobile {
                                let half = mtv.push_a() * 0.5;
                                self.displace_actor(i, half, mtv.axis)?;
                                self.displace_actor(j, -half, -mtv.axis)?;
                            } else {
                                self.displace_actor(i, mtv.push_a(), mtv.axis)?;
                            }
                        }
                    }
                    Category::Static => {
                        let Some(part) = self.world.statics.collision[other.index()].part(0) else {
                            continue;
                        };
                        let b = Obb::from_part(part);
                        if let Some(mtv) = obb_overlap(&a, &b) {
                            self.displace_actor(i, mtv.push_a(), mtv.axis)?;
                        }
                    }
                    Category::Projectile => {}
                }
            }
        }
        Ok(())
    }

    fn actor_collider(&self, i: usize) -> Option<Obb> {
        self.world.actors.collision[i].part(0).map(Obb::from_part)
    }

    /// Move an actor by `delta`, drop any velocity along `into` (the direction
    /// of the contact), keep it above ground and re-index it.
    fn displace_actor(&mut self, i: usize, delta: Vec3, into: Vec3) -> Result<(), SimError> {
        let actors = &mut self.world.actors;
        let (Some(old), Some(mut velocity)) = (actors.position(i), actors.velocity(i)) else {
            return Ok(());
        };
        let mut position = old + delta;
        let closing = velocity.dot(into);
        if closing > 0.0 {
            velocity -= into * closing;
        }
        if actors.has(i, C_GRAVITY) {
            let ground = self.terrain.height_at(position.x, position.z);
            self.kinematics
                .clamp_to_ground(&mut position, &mut velocity, ground);
        }
        actors.set_position(i, position);
        actors.set_velocity(i, velocity);
        self.grid.update_entity(Handle::actor(i), old, position)?;
        self.resolve_actor_models(i);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::EntityKind;
    use procgen::SourceMesh;

    use crate::config::EngineConfig;
    use crate::state::{ActorDesc, StaticDesc};

    fn engine() -> Engine {
        let config = EngineConfig {
            arena_size: 100.0,
            heightmap_resolution: 11,
            ..Default::default()
        };
        Engine::with_ground(config, &SourceMesh::flat_quad(100.0, 0.0)).unwrap()
    }

    fn body(e: &mut Engine, kind: EntityKind, position: Vec3, velocity: Vec3) -> usize {
        e.spawn_actor(
            ActorDesc::new(kind, position)
                .with_box(Vec3::splat(2.0))
                .with_tag(C_COLLISION)
                .with_velocity(velocity),
        )
        .unwrap()
        .index()
    }

    #[test]
    fn mobile_pair_splits_the_push() {
        let mut e = engine();
        let a = body(&mut e, EntityKind::Mech, Vec3::new(0.0, 1.0, 0.0), Vec3::X * 5.0);
        let b = body(&mut e, EntityKind::Mech, Vec3::new(1.5, 1.0, 0.0), Vec3::ZERO);
        e.resolve_collisions().unwrap();

        let pa = e.world.actors.position(a).unwrap();
        let pb = e.world.actors.position(b).unwrap();
        assert!((pa.x + 0.25).abs() < 1e-4);
        assert!((pb.x - 1.75).abs() < 1e-4);
        assert!(e.world.actors.velocity(a).unwrap().x.abs() < 1e-5);
        assert!(obb_overlap(
            &e.actor_collider(a).unwrap(),
            &e.actor_collider(b).unwrap()
        )
        .is_none());
    }

    #[test]
    fn static_takes_no_push() {
        let mut e = engine();
        e.spawn_static(StaticDesc::boxed(
            EntityKind::Wall,
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::splat(2.0),
        ))
        .unwrap();
        let a = body(&mut e, EntityKind::Tank, Vec3::new(0.5, 1.0, 0.0), Vec3::ZERO);
        e.resolve_collisions().unwrap();
        assert!((e.world.actors.position(a).unwrap().x).abs() < 1e-4);
        assert_eq!(e.world.statics.position[0], Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn immobile_actor_pushes_fully() {
        let mut e = engine();
        let turret = body(&mut e, EntityKind::Turret, Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO);
        let mech = body(&mut e, EntityKind::Mech, Vec3::new(0.0, 1.0, 1.0), Vec3::ZERO);
        e.resolve_collisions().unwrap();
        assert_eq!(e.world.actors.position(turret).unwrap(), Vec3::new(0.0, 1.0, 0.0));
        assert!((e.world.actors.position(mech).unwrap().z - 2.0).abs() < 1e-4);
    }
}
