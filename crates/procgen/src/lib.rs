//! Procedural arena ground, terrain heightmap and the map chunk format.

pub mod map;
pub mod terrain;

pub use map::*;
pub use terrain::*;
