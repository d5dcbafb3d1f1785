//! CLI subcommand implementations.

pub mod inputs;
pub mod patterns;
pub mod tabs;
pub mod util;
pub mod verify;
