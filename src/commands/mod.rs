//! Subcommand entry points.
//!
//! Each command turns its options into an explicit configuration, runs the
//! matching component with the production executor, and returns the first
//! error to `main`.
pub mod bootstrap;
pub mod copy;
pub mod post_build;
pub mod pre_build;
pub mod version;
