//! Gatehouse Core - forms, validation and identity types
//!
//! Everything here is pure: no I/O, no async. The web crate layers storage
//! and HTTP on top.

pub mod logging;
pub mod types;
pub mod validation;

pub use logging::*;
pub use types::*;
pub use validation::*;
