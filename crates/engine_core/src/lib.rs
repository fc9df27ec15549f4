//! Core simulation types for the mech arena.
//!
//! This crate provides the foundational data shared by every engine system:
//! - Euler orientation, ray and box math
//! - Entity handles and kinds
//! - The component registry and the SoA entity tables
//! - Hierarchical model collections
//! - Fixed-step frame timing

pub mod components;
pub mod entity;
pub mod error;
pub mod math;
pub mod model;
pub mod registry;
pub mod store;
pub mod time;

pub use components::*;
pub use entity::*;
pub use error::*;
pub use math::*;
pub use model::*;
pub use registry::*;
pub use store::*;
pub use time::*;

// Re-export commonly used types
pub use glam::{Mat3, Vec2, Vec3};
