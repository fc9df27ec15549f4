//! Kinematic integration: gravity, terrain clamp, damping and projectile
//! ballistics. There are no rigid bodies; positions are integrated directly.

use engine_core::Vec3;

/// Integration constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicParams {
    /// Downward acceleration in units/s².
    pub gravity: f32,
    /// Largest downward speed.
    pub terminal_velocity: f32,
    /// Height of an actor's origin above the ground it stands on.
    pub feet_offset: f32,
    /// Per-step multiplier on horizontal velocity.
    pub damping: f32,
    /// Added to a projectile's drop rate every step.
    pub drop_step: f32,
}

impl Default for KinematicParams {
    fn default() -> Self {
        Self {
            gravity: 30.0,
            terminal_velocity: 60.0,
            feet_offset: 1.0,
            damping: 0.65,
            drop_step: 0.5,
        }
    }
}

impl KinematicParams {
    /// Integrate position with the current velocity, then accelerate
    /// downwards and clamp to the terrain. An actor at rest keeps its height
    /// for the first step. Returns true when the actor ends the step on the
    /// ground.
    pub fn step_gravity(
        &self,
        position: &mut Vec3,
        velocity: &mut Vec3,
        ground: f32,
        dt: f32,
    ) -> bool {
        *position += *velocity * dt;
        velocity.y = (velocity.y - self.gravity * dt).max(-self.terminal_velocity);
        self.clamp_to_ground(position, velocity, ground);
        position.y <= ground + self.feet_offset
    }

    /// Snap onto the ground and kill vertical speed when below it. Returns
    /// true when a snap happened.
    pub fn clamp_to_ground(&self, position: &mut Vec3, velocity: &mut Vec3, ground: f32) -> bool {
        let floor = ground + self.feet_offset;
        if position.y < floor {
            position.y = floor;
            velocity.y = 0.0;
            true
        } else {
            false
        }
    }

    /// Damp the XZ components, leaving vertical speed alone.
    pub fn damp_horizontal(&self, velocity: &mut Vec3) {
        velocity.x *= self.damping;
        velocity.z *= self.damping;
    }

    /// Advance a projectile one step and return its next position. The drop
    /// rate grows every step, so rounds curve down faster the longer they fly.
    pub fn step_projectile(
        &self,
        position: Vec3,
        velocity: &mut Vec3,
        drop_rate: &mut f32,
        dt: f32,
    ) -> Vec3 {
        *drop_rate += self.drop_step;
        velocity.y -= *drop_rate * dt;
        position + *velocity * dt
    }
}
