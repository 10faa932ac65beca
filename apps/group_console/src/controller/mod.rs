//! Controller layer: backend events, session state transitions, and command orchestration.

pub mod events;
pub mod orchestration;
pub mod panel;
pub mod session;
