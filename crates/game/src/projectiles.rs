//! Projectile stage: ageing, ballistics, grid upkeep, terrain impacts and
//! swept hit tests against static and actor hitboxes.

use audio::SoundKind;
use engine_core::{normalize_or_zero, Category, Handle, ParticleKind, Vec3, C_HITBOX};
use physics::segment_obb;

use crate::events::SimEvent;
use crate::state::Engine;

/// First contact of a projectile segment.
#[derive(Debug, Clone, Copy)]
struct Contact {
    target: usize,
    distance: f32,
}

impl Engine {
    pub(crate) fn update_projectiles(&mut self, dt: f32) {
        for p in 0..self.world.projectiles.capacity() {
            if !self.world.projectiles.active[p] {
                continue;
            }
            let handle = Handle::projectile(p);
            let prev = self.world.projectiles.position[p];

            self.world.projectiles.lifetime[p] -= dt;
            if self.world.projectiles.lifetime[p] <= 0.0 {
                self.kill_entity(handle);
                self.events.push(SimEvent::ProjectileExpired { projectile: p });
                continue;
            }

            let projectiles = &mut self.world.projectiles;
            let next = self.kinematics.step_projectile(
                prev,
                &mut projectiles.velocity[p],
                &mut projectiles.drop_rate[p],
                dt,
            );
            projectiles.position[p] = next;

            if let Err(e) = self.grid.update_entity(handle, prev, next) {
                log::trace!("projectile {} lost its cell: {}", p, e);
                self.kill_entity(handle);
                self.note_projectile_drop();
                continue;
            }

            if self.ground_height(next.x, next.z) >= next.y {
                self.kill_entity(handle);
                self.spawn_particle(ParticleKind::Dust, prev);
                self.events.push(SimEvent::TerrainImpact {
                    projectile: p,
                    position: prev,
                });
                continue;
            }

            let direction = normalize_or_zero(next - prev);
            let (static_hit, actor_hit) = self.sweep_contacts(p, prev, next);

            if let Some(contact) = static_hit {
                let point = prev + direction * contact.distance;
                self.kill_entity(handle);
                self.stats.projectile_hits += 1;
                self.spawn_particle(ParticleKind::MetalDust, point);
                self.push_sound(SoundKind::MetalImpact, point);
                self.events.push(SimEvent::HitStatic {
                    projectile: p,
                    target: contact.target,
                    point,
                });
                continue;
            }

            if let Some(contact) = actor_hit {
                let point = prev + direction * contact.distance;
                self.kill_entity(handle);
                self.stats.projectile_hits += 1;
                self.spawn_particle(ParticleKind::Smoke, point);
                self.push_sound(SoundKind::Impact, point);
                self.events.push(SimEvent::HitActor {
                    projectile: p,
                    target: contact.target,
                    point,
                });
                self.apply_damage(contact.target, self.config.tuning.damage_per_hit);
            }
        }
    }

    /// Nearest static and nearest live, non-owner actor crossed by the
    /// segment `prev -> next`, using active hitbox parts grown by the round's
    /// radius.
    fn sweep_contacts(
        &mut self,
        p: usize,
        prev: Vec3,
        next: Vec3,
    ) -> (Option<Contact>, Option<Contact>) {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend(self.grid.swept(prev, next));

        let owner = self.world.projectiles.owner[p];
        let radius = self.world.projectiles.radius[p];
        let actors = &self.world.actors;
        let mut static_hit: Option<Contact> = None;
        let mut actor_hit: Option<Contact> = None;

        for &handle in &scratch {
            let target = handle.index();
            let best = match handle.category {
                Category::Static => &mut static_hit,
                Category::Actor => {
                    if Some(target) == owner
                        || !actors.is_alive(target)
                        || !actors.has(target, C_HITBOX)
                    {
                        continue;
                    }
                    &mut actor_hit
                }
                Category::Projectile => continue,
            };
            for (_, obb) in self.active_hitboxes(handle) {
                if let Some(distance) = segment_obb(prev, next, &obb.inflated(radius)) {
                    if best.map_or(true, |b| distance < b.distance) {
                        *best = Some(Contact { target, distance });
                    }
                }
            }
        }

        self.scratch = scratch;
        (static_hit, actor_hit)
    }
}
