//! Enemy behaviour: wander targets around the player, facing, aiming rays
//! and firing when the player is in sight.

use std::f32::consts::TAU;

use rand::Rng;

use engine_core::{
    horizontal, yaw_towards, Category, Handle, ModelPart, MoveTarget, Orientation, Ray, Vec3,
    WeaponBank, C_COOLDOWN, C_HITBOX, C_MOVE_TARGET, C_VELOCITY,
};
use physics::{line_of_sight, raycast, Obb, RaycastHit};

use crate::state::Engine;

/// Height above an actor's origin that enemies aim at.
const AIM_HEIGHT: f32 = 0.5;

impl Engine {
    pub(crate) fn update_ai(&mut self, dt: f32) {
        let player = self.player_position();
        for i in 0..self.world.actors.count() {
            if !self.world.actors.is_alive(i) || !self.world.actors.kind[i].is_ai_driven() {
                continue;
            }
            let Some(position) = self.world.actors.position(i) else {
                continue;
            };

            if self.world.actors.has(i, C_MOVE_TARGET) {
                self.steer(i, position, player, dt);
            }
            if let Some(target) = player {
                self.world.actors.facing[i] = Orientation::from_yaw(yaw_towards(position, target));
            }
            self.resolve_actor_models(i);
            self.refresh_rays(i);

            if let Some(target) = player {
                self.engage(i, target + Vec3::Y * AIM_HEIGHT);
            }
        }
    }

    /// Count down the retarget timer, resample on expiry, and head for the
    /// current target. Steering replaces the whole velocity, vertical
    /// included.
    fn steer(&mut self, i: usize, position: Vec3, player: Option<Vec3>, dt: f32) {
        let Some(mut goal) = self.world.actors.get::<MoveTarget>(i, C_MOVE_TARGET).copied() else {
            return;
        };
        goal.retime -= dt;
        if goal.retime <= 0.0 {
            if let Some(centre) = player {
                goal.target = self.sample_disk(centre, goal.radius);
            }
            goal.retime = goal.interval;
        }

        let to_target = horizontal(goal.target - position);
        if to_target.length_squared() > 1.0 {
            let direction = to_target.normalize();
            if let Some(velocity) = self.world.actors.get_mut::<Vec3>(i, C_VELOCITY) {
                *velocity = direction * goal.speed;
            }
        }
        if let Some(stored) = self.world.actors.get_mut::<MoveTarget>(i, C_MOVE_TARGET) {
            *stored = goal;
        }
    }

    /// Uniform point on the XZ disk of `radius` around `centre`.
    fn sample_disk(&mut self, centre: Vec3, radius: f32) -> Vec3 {
        let r = radius * self.rng.gen::<f32>().sqrt();
        let theta = self.rng.gen_range(0.0..TAU);
        Vec3::new(centre.x + r * theta.cos(), centre.y, centre.z + r * theta.sin())
    }

    /// Re-anchor every aiming ray on its visual part and record what it hits.
    pub(crate) fn refresh_rays(&mut self, i: usize) {
        for r in 0..self.world.actors.rays(i).len() {
            let slot = self.world.actors.rays(i)[r];
            let Some(part) = self.world.actors.visual[i].part(slot.part) else {
                continue;
            };
            let muzzle = part.global_position + part.global_orientation.matrix() * slot.muzzle;
            let ray = Ray::new(muzzle, part.global_orientation.forward());
            let hit = self.cast_ray(&ray, slot.range, Some(i));

            let slot = &mut self.world.actors.rays_mut(i)[r];
            slot.ray = ray;
            slot.hit_distance = hit.map(|h| h.distance);
        }
    }

    /// Closest static or actor hitbox along `ray` within `range`.
    pub fn cast_ray(&mut self, ray: &Ray, range: f32, ignore: Option<usize>) -> Option<RaycastHit> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend(self.grid.swept(ray.position, ray.at(range)));

        let actors = &self.world.actors;
        let candidates = scratch
            .iter()
            .copied()
            .filter(|h| match h.category {
                Category::Actor => {
                    let j = h.index();
                    Some(j) != ignore && actors.is_alive(j) && actors.has(j, C_HITBOX)
                }
                Category::Static => true,
                Category::Projectile => false,
            })
            .flat_map(|h| self.active_hitboxes(h));
        let hit = raycast(ray, range, candidates);

        self.scratch = scratch;
        hit
    }

    /// True when no static hitbox lies between `from` and `to`.
    pub fn static_line_of_sight(&mut self, from: Vec3, to: Vec3) -> bool {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend(self.grid.swept(from, to));
        let blockers = scratch
            .iter()
            .copied()
            .filter(|h| h.category == Category::Static)
            .flat_map(|h| self.active_hitboxes(h));
        let clear = line_of_sight(from, to, blockers);
        self.scratch = scratch;
        clear
    }

    /// Active hitbox parts of an actor or static as world boxes.
    pub(crate) fn active_hitboxes(&self, handle: Handle) -> impl Iterator<Item = (Handle, Obb)> + '_ {
        let i = handle.index();
        let parts: &[ModelPart] = match handle.category {
            Category::Actor => self.world.actors.hitbox[i].parts(),
            Category::Static => self.world.statics.hitbox[i].parts(),
            Category::Projectile => &[],
        };
        parts
            .iter()
            .filter(|part| part.is_active)
            .map(move |part| (handle, Obb::from_part(part)))
    }

    /// Fire along the first ray whose weapon can reach a visible target.
    fn engage(&mut self, i: usize, target: Vec3) {
        if !self.world.actors.has(i, C_COOLDOWN) {
            return;
        }
        let rays: Vec<_> = self.world.actors.rays(i).to_vec();
        for slot in rays {
            let muzzle = slot.ray.position;
            if muzzle.distance(target) > slot.range || !self.static_line_of_sight(muzzle, target) {
                continue;
            }
            if let Some(bank) = self.world.actors.get_mut::<WeaponBank>(i, C_COOLDOWN) {
                if slot.weapon < bank.len() {
                    bank.active = slot.weapon as u32;
                }
            }
            if self.fire_weapon(i, muzzle, target - muzzle).is_some() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{EntityKind, Raycast};
    use procgen::SourceMesh;

    use crate::config::EngineConfig;
    use crate::state::{ActorDesc, StaticDesc};

    fn engine() -> Engine {
        let config = EngineConfig {
            arena_size: 200.0,
            heightmap_resolution: 11,
            ..Default::default()
        };
        Engine::with_ground(config, &SourceMesh::flat_quad(200.0, 0.0)).unwrap()
    }

    fn turret(e: &mut Engine, position: Vec3) -> usize {
        let desc = ActorDesc {
            weapons: Some(WeaponBank::default().with_weapon(1.0, 100.0, 0.0, 5.0)),
            rays: vec![Raycast {
                muzzle: Vec3::new(0.0, 0.0, -1.0),
                range: 90.0,
                ..Default::default()
            }],
            ..ActorDesc::new(EntityKind::Turret, position).with_box(Vec3::ONE)
        };
        e.spawn_actor(desc).unwrap().index()
    }

    fn player(e: &mut Engine, position: Vec3) -> usize {
        e.spawn_actor(
            ActorDesc::new(EntityKind::Player, position)
                .with_box(Vec3::new(1.0, 2.0, 1.0))
                .with_tag(C_HITBOX),
        )
        .unwrap()
        .index()
    }

    #[test]
    fn turret_faces_and_fires_at_visible_player() {
        let mut e = engine();
        let t = turret(&mut e, Vec3::new(0.0, 1.0, 20.0));
        player(&mut e, Vec3::new(0.0, 1.0, 0.0));
        e.update_ai(0.016);

        assert!(e.world.actors.facing[t].yaw.abs() < 1e-5);
        let ray = e.world.actors.rays(t)[0];
        assert!((ray.ray.position - Vec3::new(0.0, 1.0, 19.0)).length() < 1e-4);
        let hit = ray.hit_distance.unwrap();
        assert!((hit - 18.5).abs() < 1e-3);
        assert_eq!(e.world.projectiles.active_count(), 1);
    }

    #[test]
    fn wall_blocks_line_of_sight() {
        let mut e = engine();
        turret(&mut e, Vec3::new(0.0, 1.0, 20.0));
        player(&mut e, Vec3::new(0.0, 1.0, 0.0));
        e.spawn_static(StaticDesc::boxed(
            EntityKind::Wall,
            Vec3::new(0.0, 2.0, 10.0),
            Vec3::new(6.0, 4.0, 1.0),
        ))
        .unwrap();
        e.update_ai(0.016);
        assert_eq!(e.world.projectiles.active_count(), 0);
    }

    #[test]
    fn wander_target_lies_on_the_disk_and_sets_speed() {
        let mut e = engine();
        player(&mut e, Vec3::new(0.0, 1.0, 0.0));
        let desc = ActorDesc {
            move_target: Some(MoveTarget::new(5.0, 10.0, 3.0)),
            ..ActorDesc::new(EntityKind::Tank, Vec3::new(50.0, 1.0, 50.0))
        };
        let i = e.spawn_actor(desc).unwrap().index();
        e.update_ai(0.016);

        let goal = *e.world.actors.get::<MoveTarget>(i, C_MOVE_TARGET).unwrap();
        assert!(horizontal(goal.target).length() <= 10.0 + 1e-4);
        assert_eq!(goal.retime, 3.0);
        let v = e.world.actors.velocity(i).unwrap();
        assert!((horizontal(v).length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn steering_clears_vertical_speed() {
        let mut e = engine();
        player(&mut e, Vec3::new(0.0, 1.0, 0.0));
        let desc = ActorDesc {
            move_target: Some(MoveTarget::new(5.0, 10.0, 3.0)),
            ..ActorDesc::new(EntityKind::Tank, Vec3::new(50.0, 1.0, 50.0))
                .with_velocity(Vec3::new(0.0, 5.0, 0.0))
        };
        let i = e.spawn_actor(desc).unwrap().index();
        e.update_ai(0.016);

        let v = e.world.actors.velocity(i).unwrap();
        assert_eq!(v.y, 0.0);
        assert!((v.length() - 5.0).abs() < 1e-4);
    }
}
