//! Configuration model and persistence for porygo
//!
//! A [`Config`] starts from [`Config::default`], is optionally replaced by a
//! TOML file through [`ConfigManager`], and finally receives the flags the user
//! passed explicitly ([`ConfigOverrides`]). [`FetchSettings`] is the slice of
//! it the orchestrator consumes.

pub mod config;
pub mod loader;
pub mod settings;

#[cfg(test)]
mod config_tests;

pub use config::*;
pub use loader::*;
pub use settings::*;
