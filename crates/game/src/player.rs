//! Player control: the per-frame `PlayerCommand` drives facing, movement
//! impulses, jumping, weapon selection and firing.

use engine_core::{horizontal, Orientation, Vec3};

use crate::state::Engine;

/// Look pitch limit in radians.
pub const MAX_PITCH: f32 = 1.2;

/// Muzzle distance in front of the eye when the player has no aiming ray.
const EYE_MUZZLE: f32 = 1.5;

/// Eye height above the actor origin.
const EYE_HEIGHT: f32 = 0.6;

impl Engine {
    pub(crate) fn update_player(&mut self) {
        let Some(i) = self.player else {
            return;
        };
        if !self.world.actors.is_alive(i) {
            return;
        }
        let command = self.command;
        let (Some(position), Some(mut velocity)) =
            (self.world.actors.position(i), self.world.actors.velocity(i))
        else {
            return;
        };

        // Mouse look
        let facing = &mut self.world.actors.facing[i];
        facing.yaw += command.look_delta.x;
        facing.pitch = (facing.pitch + command.look_delta.y).clamp(-MAX_PITCH, MAX_PITCH);
        let facing = *facing;

        // Movement impulse in the body frame
        let body = Orientation::from_yaw(facing.yaw);
        let forward = horizontal(body.forward());
        let right = Vec3::new(facing.yaw.cos(), 0.0, facing.yaw.sin());
        let axis = command.move_axis.clamp_length_max(1.0);
        velocity += (forward * axis.y + right * axis.x) * self.config.tuning.player_impulse;

        let ground = self.ground_height(position.x, position.z) + self.kinematics.feet_offset;
        if command.jump && position.y <= ground + 1e-3 {
            velocity.y = self.config.tuning.jump_speed;
        }
        self.world.actors.set_velocity(i, velocity);

        self.cycle_weapon(i, command.weapon_cycle);

        if command.fire {
            let (muzzle, direction) = self.player_muzzle(i, position, facing);
            self.fire_weapon(i, muzzle, direction);
        }
    }

    /// Muzzle point and aim direction: the first aiming ray when the player
    /// has one, otherwise straight out of the eye.
    fn player_muzzle(&self, i: usize, position: Vec3, facing: Orientation) -> (Vec3, Vec3) {
        let actors = &self.world.actors;
        if let Some(ray) = actors.rays(i).first() {
            if let Some(part) = actors.visual[i].part(ray.part) {
                let m = part.global_orientation.matrix();
                return (
                    part.global_position + m * ray.muzzle,
                    part.global_orientation.forward(),
                );
            }
        }
        let eye = position + Vec3::Y * EYE_HEIGHT;
        let direction = facing.forward();
        (eye + direction * EYE_MUZZLE, direction)
    }
}
