//! Particle upkeep.

use crate::state::Engine;

impl Engine {
    /// Age every live particle and free the expired ones.
    pub(crate) fn age_particles(&mut self, dt: f32) {
        let expired = self.world.particles.age(dt);
        if expired > 0 {
            log::trace!(
                "{} particles expired, {} live",
                expired,
                self.world.particles.active_count()
            );
        }
    }
}
