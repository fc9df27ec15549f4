//! Broad phase, collision kernel and kinematic integration for the arena.

pub mod collision;
pub mod grid;
pub mod kinematics;
pub mod raycast;

pub use collision::*;
pub use grid::*;
pub use kinematics::*;
pub use raycast::*;
