//! Errors raised by the core tables and registries.

use thiserror::Error;

use crate::entity::Category;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// The component mask is 64 bits wide.
    #[error("component limit reached ({0} components already registered)")]
    ComponentLimit(usize),

    #[error("component {id} is not registered")]
    UnknownComponent { id: u8 },

    #[error("component {id} stores {expected}-byte elements, got {actual} bytes")]
    ComponentSize {
        id: u8,
        expected: usize,
        actual: usize,
    },

    #[error("{category:?} index {index} is outside capacity {capacity}")]
    OutOfRange {
        category: Category,
        index: usize,
        capacity: usize,
    },

    #[error("{category:?} table is full ({capacity} slots)")]
    TableFull { category: Category, capacity: usize },

    /// Parts may only parent to an earlier part.
    #[error("part {part} cannot use part {parent} as its parent")]
    InvalidParent { part: usize, parent: usize },

    #[error("actor {0} was spawned without a position")]
    MissingPosition(usize),

    /// A static with no visual parts is indistinguishable from a free slot.
    #[error("static spawned without visual parts")]
    EmptyStatic,
}
