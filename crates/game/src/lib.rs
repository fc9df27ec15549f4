//! Mech arena simulation: the `Engine` value, its configuration, level
//! building and every per-frame system.

mod ai;
mod collision;
mod damage;
mod effects;
mod movement;
mod player;
mod projectiles;
mod triggers;
mod update;
mod weapons;

pub mod behaviour;
pub mod config;
pub mod events;
pub mod level;
pub mod prefabs;
pub mod spawner;
pub mod state;

pub use behaviour::{Behaviour, BehaviourTable, CollisionHook, DeathHook};
pub use config::{ConfigError, EngineConfig, SimTuning};
pub use events::{EventLog, SimEvent};
pub use level::LevelSummary;
pub use player::MAX_PITCH;
pub use spawner::WaveSpawner;
pub use state::{ActorDesc, Engine, EnginePhase, GameFlow, SimError, SimStats, StaticDesc};
