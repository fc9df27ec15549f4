//! Engine configuration. Loaded from `config.ron` at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use engine_core::WorldCapacity;
use physics::{GridLayout, KinematicParams};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window size {width}x{height} is out of range")]
    Window { width: u32, height: u32 },

    #[error("projection is invalid (fov {fov_deg}, near {near}, far {far})")]
    Projection { fov_deg: f32, near: f32, far: f32 },

    #[error("{0} must be greater than zero")]
    ZeroCapacity(&'static str),

    #[error("max_entities {max_entities} cannot hold {required} actors, statics and projectiles")]
    EntityBudget { max_entities: usize, required: usize },

    #[error("{0} must be a positive, finite number")]
    NonPositive(&'static str),
}

/// Simulation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimTuning {
    pub gravity: f32,
    pub terminal_velocity: f32,
    /// Actor origin height above the ground.
    pub feet_offset: f32,
    /// Per-step multiplier on horizontal velocity.
    pub damping: f32,
    /// Added to a projectile's drop rate every step.
    pub projectile_drop_step: f32,
    pub damage_per_hit: i32,
    /// Radius of the disk wander targets are sampled on.
    pub ai_retarget_radius: f32,
    pub ai_retarget_interval: f32,
    pub max_heat: f32,
    /// Heat lost per second.
    pub heat_decay: f32,
    pub headbob_amplitude: f32,
    /// Horizontal impulse per step at full stick.
    pub player_impulse: f32,
    pub jump_speed: f32,
    /// Tanks in the first wave.
    pub first_wave_size: u32,
    /// Pooled tank slots reserved for waves.
    pub wave_pool_size: usize,
}

impl Default for SimTuning {
    fn default() -> Self {
        Self {
            gravity: 30.0,
            terminal_velocity: 60.0,
            feet_offset: 1.0,
            damping: 0.65,
            projectile_drop_step: 0.5,
            damage_per_hit: 10,
            ai_retarget_radius: 25.0,
            ai_retarget_interval: 3.0,
            max_heat: 100.0,
            heat_decay: 25.0,
            headbob_amplitude: 0.08,
            player_impulse: 4.0,
            jump_speed: 12.0,
            first_wave_size: 2,
            wave_pool_size: 8,
        }
    }
}

impl SimTuning {
    pub fn kinematics(&self) -> KinematicParams {
        KinematicParams {
            gravity: self.gravity,
            terminal_velocity: self.terminal_velocity,
            feet_offset: self.feet_offset,
            damping: self.damping,
            drop_step: self.projectile_drop_step,
        }
    }
}

/// Persistent engine settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window width in logical pixels.
    pub window_width: u32,
    /// Window height in logical pixels.
    pub window_height: u32,
    pub fov_deg: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// Size of the grid's back-reference table.
    pub max_entities: usize,
    pub max_projectiles: usize,
    pub max_actors: usize,
    pub max_particles: usize,
    pub max_statics: usize,
    pub seed: u64,
    /// Side length of the square arena.
    pub arena_size: f32,
    /// Heightmap samples per side.
    pub heightmap_resolution: usize,
    pub grid_cell_size: f32,
    pub grid_bucket_capacity: usize,
    /// Fixed simulation rate of the headless host.
    pub tick_rate: f64,
    /// Mouse counts to radians.
    pub mouse_sensitivity: f32,
    pub tuning: SimTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_deg: 70.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            max_entities: 1024,
            max_projectiles: 256,
            max_actors: 128,
            max_particles: 512,
            max_statics: 512,
            seed: 0x5eed,
            arena_size: 256.0,
            heightmap_resolution: 129,
            grid_cell_size: 16.0,
            grid_bucket_capacity: 64,
            tick_rate: 60.0,
            mouse_sensitivity: 0.002,
            tuning: SimTuning::default(),
        }
    }
}

impl EngineConfig {
    /// Load config from `config.ron` in the current directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(config_path())
    }

    /// Missing file: defaults. Unparseable file: warning plus defaults.
    /// Either way the result must validate.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(data) => match ron::from_str(&data) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config at {:?}, using defaults", path);
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Save current config. Logs on error.
    pub fn save(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialise config: {}", e),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_width == 0
            || self.window_height == 0
            || self.window_width > 16384
            || self.window_height > 16384
        {
            return Err(ConfigError::Window {
                width: self.window_width,
                height: self.window_height,
            });
        }
        if !(self.fov_deg > 0.0 && self.fov_deg < 180.0)
            || self.near_plane <= 0.0
            || self.far_plane <= self.near_plane
        {
            return Err(ConfigError::Projection {
                fov_deg: self.fov_deg,
                near: self.near_plane,
                far: self.far_plane,
            });
        }
        for (name, value) in [
            ("max_actors", self.max_actors),
            ("max_statics", self.max_statics),
            ("max_projectiles", self.max_projectiles),
            ("max_particles", self.max_particles),
            ("grid_bucket_capacity", self.grid_bucket_capacity),
            ("heightmap_resolution", self.heightmap_resolution),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroCapacity(name));
            }
        }
        let required = self.max_actors + self.max_statics + self.max_projectiles;
        if self.max_entities < required {
            return Err(ConfigError::EntityBudget {
                max_entities: self.max_entities,
                required,
            });
        }
        for (name, value) in [
            ("arena_size", self.arena_size),
            ("grid_cell_size", self.grid_cell_size),
            ("tick_rate", self.tick_rate as f32),
            ("tuning.gravity", self.tuning.gravity),
            ("tuning.terminal_velocity", self.tuning.terminal_velocity),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive(name));
            }
        }
        Ok(())
    }

    pub fn world_capacity(&self) -> WorldCapacity {
        WorldCapacity {
            actors: self.max_actors,
            statics: self.max_statics,
            projectiles: self.max_projectiles,
            particles: self.max_particles,
        }
    }

    pub fn grid_layout(&self) -> GridLayout {
        GridLayout {
            actors: self.max_actors,
            statics: self.max_statics,
            projectiles: self.max_projectiles,
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_window_and_projection() {
        let mut c = EngineConfig {
            window_width: 0,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::Window { .. })));
        c.window_width = 800;
        c.far_plane = 0.05;
        assert!(matches!(c.validate(), Err(ConfigError::Projection { .. })));
    }

    #[test]
    fn rejects_entity_budget_overrun() {
        let c = EngineConfig {
            max_entities: 10,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::EntityBudget { .. })));
    }

    #[test]
    fn rejects_empty_pools() {
        let c = EngineConfig {
            max_particles: 0,
            ..Default::default()
        };
        assert_eq!(c.validate(), Err(ConfigError::ZeroCapacity("max_particles")));
    }

    #[test]
    fn partial_ron_fills_defaults() {
        let c: EngineConfig = ron::from_str("(seed: 42, tuning: (gravity: 9.81))").unwrap();
        assert_eq!(c.seed, 42);
        assert_eq!(c.tuning.gravity, 9.81);
        assert_eq!(c.tuning.damage_per_hit, 10);
        assert_eq!(c.max_actors, EngineConfig::default().max_actors);
    }

    #[test]
    fn missing_file_gives_defaults_and_garbage_warns() {
        let dir = std::env::temp_dir();
        let missing = dir.join("mech-arena-no-such-config.ron");
        assert_eq!(EngineConfig::load_from(&missing).unwrap(), EngineConfig::default());

        let garbage = dir.join(format!("mech-arena-bad-{}.ron", std::process::id()));
        std::fs::write(&garbage, "(((not ron").unwrap();
        let loaded = EngineConfig::load_from(&garbage);
        let _ = std::fs::remove_file(&garbage);
        assert_eq!(loaded.unwrap(), EngineConfig::default());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("mech-arena-cfg-{}.ron", std::process::id()));
        let config = EngineConfig {
            seed: 7,
            max_actors: 64,
            ..Default::default()
        };
        config.save(&path);
        let loaded = EngineConfig::load_from(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.unwrap(), config);
    }
}
