//! Text presentation: status badges, page rendering, and console commands.

pub mod console;
pub mod status;
pub mod view;
