//! Wire and domain types shared by the group client and the console.

pub mod domain;
pub mod error;
pub mod protocol;
