//! Protocol module - the vault state machine and its call surface.
//!
//! This module provides the vault aggregate that executes every operation
//! atomically against its external collaborators.

pub mod events;
pub mod operations;
pub mod state_machine;

pub use events::*;
pub use operations::*;
pub use state_machine::*;
