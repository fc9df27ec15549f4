//! Weapon firing, cooldowns and heat.

use audio::SoundKind;
use engine_core::{
    normalize_or_zero, ParticleKind, ProjectileKind, ProjectileSpawn, Vec3, WeaponBank,
    C_COOLDOWN,
};

use crate::events::SimEvent;
use crate::state::Engine;

impl Engine {
    /// Fire the active weapon of `shooter` from `muzzle` along `direction`.
    /// Returns the projectile slot, or `None` when the weapon is cooling
    /// down, the actor is overheated, or the projectile pool is full.
    pub fn fire_weapon(&mut self, shooter: usize, muzzle: Vec3, direction: Vec3) -> Option<usize> {
        let actors = &self.world.actors;
        if actors.heat[shooter] >= self.config.tuning.max_heat {
            return None;
        }
        let bank = *actors.get::<WeaponBank>(shooter, C_COOLDOWN)?;
        let slot = bank.active as usize;
        if !bank.ready(slot) {
            return None;
        }
        let kind = if actors.kind[shooter].is_tank_family() {
            ProjectileKind::Cannon
        } else {
            ProjectileKind::Bullet
        };

        let projectile = self.fire_projectile(ProjectileSpawn {
            kind,
            position: muzzle,
            velocity: normalize_or_zero(direction) * bank.muzzle_velocities[slot],
            drop_rate: bank.drop_rates[slot],
            owner: Some(shooter),
        })?;

        if let Some(bank) = self.world.actors.get_mut::<WeaponBank>(shooter, C_COOLDOWN) {
            bank.trigger(slot);
        }
        self.world.actors.heat[shooter] += bank.heat_per_shot[slot];
        self.spawn_particle(ParticleKind::MuzzleFlash, muzzle);
        let sound = match kind {
            ProjectileKind::Cannon => SoundKind::CannonFire,
            ProjectileKind::Bullet => SoundKind::Fire,
        };
        self.push_sound(sound, muzzle);
        self.events.push(SimEvent::Fired {
            shooter,
            projectile,
            kind,
        });
        Some(projectile)
    }

    /// Count down every cooldown and bleed off heat.
    pub(crate) fn tick_weapons(&mut self, dt: f32) {
        let decay = self.config.tuning.heat_decay * dt;
        let actors = &mut self.world.actors;
        for i in 0..actors.count() {
            if !actors.is_alive(i) {
                continue;
            }
            if let Some(bank) = actors.get_mut::<WeaponBank>(i, C_COOLDOWN) {
                bank.tick(dt);
            }
            actors.heat[i] = (actors.heat[i] - decay).max(0.0);
        }
    }

    /// Step the active weapon slot of `actor`.
    pub fn cycle_weapon(&mut self, actor: usize, step: i32) {
        if step == 0 {
            return;
        }
        if let Some(bank) = self.world.actors.get_mut::<WeaponBank>(actor, C_COOLDOWN) {
            bank.cycle(step);
        }
    }
}
