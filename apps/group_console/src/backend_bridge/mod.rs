//! Bridge between the single-threaded controller and the async remote client.

pub mod commands;
pub mod runtime;
