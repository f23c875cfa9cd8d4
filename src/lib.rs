//! Build orchestration helpers for a native CMake project.
//!
//! The `ptools` binary collects build artifacts and coverage reports after a
//! build, cleans sources up before one, and bootstraps a development
//! environment from a JSON requirements file.
//!
//! The public API is organised into layers:
//!
//! - **[`fs`]** and **[`exec`]**: filesystem and process primitives
//! - **[`copy`]**: extension-based file collection with up-front validation
//! - **[`config`]**: explicit per-command configuration and the typed requirements document
//! - **[`resources`]** and **[`tasks`]**: bootstrap actions and the ordered phases running them
//! - **[`pipeline`]**: artifact collection and coverage
//! - **[`commands`]**: subcommand entry points
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod copy;
pub mod error;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod resources;
pub mod tasks;
