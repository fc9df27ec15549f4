//! Component ids, the per-entity component mask, and the plain-data component
//! payloads stored in registry columns.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Index of a registered component column. Doubles as the mask bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub(crate) u8);

impl ComponentId {
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn bit(self) -> u64 {
        1u64 << self.0
    }
}

/// World-space position (`Vec3`).
pub const C_POSITION: ComponentId = ComponentId(0);
/// Linear velocity (`Vec3`).
pub const C_VELOCITY: ComponentId = ComponentId(1);
/// Position at the start of the current actor step (`Vec3`).
pub const C_PREV_POSITION: ComponentId = ComponentId(2);
/// Tag: integrate velocity, apply gravity and terrain clamp.
pub const C_GRAVITY: ComponentId = ComponentId(3);
/// Tag: movement-collision collection takes part in resolution.
pub const C_COLLISION: ComponentId = ComponentId(4);
/// Tag: hitbox collection can be struck by projectiles.
pub const C_HITBOX: ComponentId = ComponentId(5);
/// Tag: aiming raycasts are refreshed every frame.
pub const C_RAYCAST: ComponentId = ComponentId(6);
/// Tag: overlaps fire behaviour callbacks instead of resolving.
pub const C_TRIGGER: ComponentId = ComponentId(7);
/// Tag: projectile hits subtract hit points.
pub const C_HITPOINT: ComponentId = ComponentId(8);
/// Per-weapon cooldowns and ballistics ([`WeaponBank`]).
pub const C_COOLDOWN: ComponentId = ComponentId(9);
/// Wandering movement target ([`MoveTarget`]).
pub const C_MOVE_TARGET: ComponentId = ComponentId(10);

/// Number of columns registered by [`crate::ComponentRegistry::with_core`].
pub const CORE_COMPONENT_COUNT: usize = 11;

/// Bitset of the components an entity carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentMask(u64);

impl ComponentMask {
    pub const EMPTY: Self = Self(0);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn contains(self, id: ComponentId) -> bool {
        self.0 & id.bit() != 0
    }

    #[inline]
    pub fn contains_all(self, other: ComponentMask) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, id: ComponentId) {
        self.0 |= id.bit();
    }

    #[inline]
    pub fn remove(&mut self, id: ComponentId) {
        self.0 &= !id.bit();
    }

    pub const fn with(self, id: ComponentId) -> Self {
        Self(self.0 | id.bit())
    }
}

/// Weapon slots per actor.
pub const MAX_WEAPONS: usize = 4;

/// Per-weapon state, one column entry per actor.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct WeaponBank {
    /// Seconds until each slot may fire again.
    pub cooldowns: [f32; MAX_WEAPONS],
    /// Shots per second.
    pub fire_rates: [f32; MAX_WEAPONS],
    pub muzzle_velocities: [f32; MAX_WEAPONS],
    /// Initial gravity scalar handed to spawned projectiles.
    pub drop_rates: [f32; MAX_WEAPONS],
    pub heat_per_shot: [f32; MAX_WEAPONS],
    pub count: u32,
    pub active: u32,
}

impl WeaponBank {
    /// Append a weapon slot. Extra slots beyond [`MAX_WEAPONS`] are ignored.
    pub fn with_weapon(
        mut self,
        fire_rate: f32,
        muzzle_velocity: f32,
        drop_rate: f32,
        heat_per_shot: f32,
    ) -> Self {
        let slot = self.count as usize;
        if slot < MAX_WEAPONS {
            self.fire_rates[slot] = fire_rate;
            self.muzzle_velocities[slot] = muzzle_velocity;
            self.drop_rates[slot] = drop_rate;
            self.heat_per_shot[slot] = heat_per_shot;
            self.count += 1;
        }
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn ready(&self, slot: usize) -> bool {
        slot < self.len() && self.cooldowns[slot] <= 0.0
    }

    /// Decrement every cooldown, clamped at zero.
    pub fn tick(&mut self, dt: f32) {
        for cd in self.cooldowns.iter_mut().take(self.count as usize) {
            *cd = (*cd - dt).max(0.0);
        }
    }

    /// Restart the cooldown of `slot` after a shot.
    pub fn trigger(&mut self, slot: usize) {
        if slot < self.len() {
            let rate = self.fire_rates[slot];
            self.cooldowns[slot] = if rate > 0.0 { 1.0 / rate } else { 0.0 };
        }
    }

    /// Advance the active slot, wrapping.
    pub fn cycle(&mut self, step: i32) {
        if self.count == 0 {
            return;
        }
        let n = self.count as i32;
        self.active = (self.active as i32 + step).rem_euclid(n) as u32;
    }
}

/// Wander target resampled on a disk around the player.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct MoveTarget {
    pub target: Vec3,
    /// Seconds until the next resample.
    pub retime: f32,
    pub interval: f32,
    pub speed: f32,
    /// Radius of the sampling disk.
    pub radius: f32,
}

impl MoveTarget {
    pub fn new(speed: f32, radius: f32, interval: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            retime: 0.0,
            interval,
            speed,
            radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_insert_remove() {
        let mut mask = ComponentMask::EMPTY;
        mask.insert(C_GRAVITY);
        mask.insert(C_HITBOX);
        assert!(mask.contains(C_GRAVITY));
        assert!(mask.contains_all(ComponentMask::EMPTY.with(C_GRAVITY).with(C_HITBOX)));
        mask.remove(C_GRAVITY);
        assert!(!mask.contains(C_GRAVITY));
        assert!(mask.contains(C_HITBOX));
    }

    #[test]
    fn weapon_cooldown_clamps_at_zero() {
        let mut bank = WeaponBank::default().with_weapon(4.0, 80.0, 0.0, 5.0);
        bank.trigger(0);
        assert!((bank.cooldowns[0] - 0.25).abs() < 1e-6);
        assert!(!bank.ready(0));
        bank.tick(1.0);
        assert_eq!(bank.cooldowns[0], 0.0);
        assert!(bank.ready(0));
    }

    #[test]
    fn weapon_slots_are_bounded() {
        let mut bank = WeaponBank::default();
        for _ in 0..MAX_WEAPONS + 2 {
            bank = bank.with_weapon(1.0, 1.0, 0.0, 0.0);
        }
        assert_eq!(bank.len(), MAX_WEAPONS);
        assert!(!bank.ready(MAX_WEAPONS));
    }

    #[test]
    fn weapon_cycle_wraps_both_ways() {
        let mut bank = WeaponBank::default()
            .with_weapon(1.0, 1.0, 0.0, 0.0)
            .with_weapon(1.0, 1.0, 0.0, 0.0)
            .with_weapon(1.0, 1.0, 0.0, 0.0);
        bank.cycle(-1);
        assert_eq!(bank.active, 2);
        bank.cycle(2);
        assert_eq!(bank.active, 1);
    }
}
