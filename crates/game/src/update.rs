//! The per-frame simulation pipeline.

use crate::state::{Engine, SimError};

impl Engine {
    /// Advance the simulation by `dt` seconds.
    ///
    /// Stages run in a fixed order: player input, AI, weapon cooldowns,
    /// projectiles, actor integration, collision resolution, triggers,
    /// particles, then waves. The event log is cleared on entry, so after
    /// the call it describes exactly this frame. A non-positive or
    /// non-finite `dt` runs nothing.
    pub fn update(&mut self, dt: f32) -> Result<(), SimError> {
        self.check_running()?;
        self.events.clear();
        if !(dt.is_finite() && dt > 0.0) {
            log::trace!("skipping frame with dt {}", dt);
            return Ok(());
        }

        self.update_player();
        self.update_ai(dt);
        self.tick_weapons(dt);

        self.resolve_all_models();
        self.update_projectiles(dt);

        self.update_actors(dt)?;
        self.resolve_all_models();
        self.resolve_collisions()?;

        self.dispatch_triggers();
        self.age_particles(dt);
        self.update_waves()?;

        self.advance_time(dt);
        Ok(())
    }
}
